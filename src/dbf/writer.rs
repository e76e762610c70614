use std::io::Write;
use chrono::Datelike;
use encoding::{EncoderTrap, EncodingRef};
use buffer::WriteBuffer;
use value::Value;
use super::header::{DbfField, DbfFieldType, DbfHeader, END_OF_FILE};
use super::DbfError;

/// Append-only ".dbf" writer.
///
/// The header, record count included, is written by `new()`; rows are then
/// appended one by one. Nothing is patched on close, so the header passed in
/// must already declare the number of rows that will be written.
#[derive(Debug)]
pub struct DbfWriter<W: Write> {
    header: DbfHeader,
    buffer: WriteBuffer<W>,
    null_values: Vec<Vec<u8>>,
    written: usize,
}

/// Fill byte for a null in a field of type `type_code`.
fn null_byte(type_code: u8) -> u8 {
    match type_code {
        b'C' | b'c' => 0,
        b'L' | b'l' => b'?',
        b'N' | b'n' | b'F' | b'f' | b'O' | b'o' => b'*',
        _ => b'0',
    }
}

impl<W: Write> DbfWriter<W> {
    pub fn new(channel: W, header: DbfHeader, buffer_size: usize) -> Result<DbfWriter<W>, DbfError> {
        let mut buffer = WriteBuffer::with_capacity(channel, buffer_size);
        header.write(&mut buffer)?;

        let null_values = header.fields().iter()
            .map(|f| vec![ null_byte(f.type_code); f.length ])
            .collect();

        Ok(DbfWriter {
            header: header,
            buffer: buffer,
            null_values: null_values,
            written: 0,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// Rows written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Formats `values` into one record without writing it, so a caller can
    /// validate a row before committing anything.
    pub fn encode_row(&self, values: &[Value]) -> Result<Vec<u8>, DbfError> {
        if values.len() != self.header.field_count() {
            return Err(DbfError::RowError(format!("Wrong number of fields {} expected {}", values.len(), self.header.field_count())));
        }

        let mut record = Vec::with_capacity(self.header.record_length());
        record.push(b' ');
        for (i, (field, value)) in self.header.fields().iter().zip(values.iter()).enumerate() {
            match encode_value(field, value, self.header.encoding())? {
                Some(bytes) => record.extend_from_slice(&bytes),
                None => record.extend_from_slice(&self.null_values[i]),
            }
        }
        if record.len() != self.header.record_length() {
            return Err(DbfError::RowError(format!("Record is {} bytes, expected {}", record.len(), self.header.record_length())));
        }
        Ok(record)
    }

    /// Appends a record produced by `encode_row()`.
    pub fn write_encoded(&mut self, record: &[u8]) -> Result<(), DbfError> {
        if record.len() != self.header.record_length() {
            return Err(DbfError::RowError(format!("Record is {} bytes, expected {}", record.len(), self.header.record_length())));
        }
        self.buffer.put_bytes(record)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_row(&mut self, values: &[Value]) -> Result<(), DbfError> {
        let record = self.encode_row(values)?;
        self.write_encoded(&record)
    }

    /// Writes the end-of-file marker, flushes and hands back the channel.
    pub fn close(mut self) -> Result<W, DbfError> {
        if self.written != self.header.record_count() {
            warn!(declared = self.header.record_count(), written = self.written, "dbf header declares a different number of records than were written");
        }
        self.buffer.put(END_OF_FILE)?;
        let channel = self.buffer.into_inner()?;
        debug!(records = self.written, "closed dbf writer");
        Ok(channel)
    }
}

fn mismatch(field: &DbfField, value: &Value) -> DbfError {
    DbfError::RowError(format!("Field {} of type {} cannot hold a {} value", field.name, field.type_code as char, value.type_name()))
}

/// Encodes `text`, dropping trailing characters until it fits in `length`
/// bytes, then pads it with spaces.
fn fit_text(text: &str, length: usize, encoding: EncodingRef) -> Vec<u8> {
    let encode = |s: &str| encoding.encode(s, EncoderTrap::Replace).unwrap_or_else(|_| s.as_bytes().to_vec());

    let mut bytes = encode(text);
    if bytes.len() > length {
        let mut end = text.len();
        while bytes.len() > length && end > 0 {
            end -= 1;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            bytes = encode(&text[..end]);
        }
    }
    bytes.resize(length, b' ');
    bytes
}

/// Right-aligns `text` in a numeric field. `None` if it does not fit.
fn fit_number(field: &DbfField, text: String) -> Option<Vec<u8>> {
    let padded = format!("{:>1$}", text, field.length);
    if padded.len() != field.length {
        warn!(field = %field.name, value = %text, length = field.length, "number does not fit its field, writing null");
        return None;
    }
    Some(padded.into_bytes())
}

/// Formats one value. `Ok(None)` means "write the field's null filler".
fn encode_value(field: &DbfField, value: &Value, encoding: EncodingRef) -> Result<Option<Vec<u8>>, DbfError> {
    if value.is_null() {
        return Ok(None);
    }

    match field.field_type {
        DbfFieldType::Varchar => {
            let text = match *value {
                Value::Geometry(_) => return Err(mismatch(field, value)),
                Value::Varchar(ref s) => s.clone(),
                ref v => v.to_string(),
            };
            Ok(Some(fit_text(&text, field.length, encoding)))
        }
        DbfFieldType::Boolean => {
            match *value {
                Value::Boolean(b) => Ok(Some(vec![ if b { b'T' } else { b'F' } ])),
                _ => Err(mismatch(field, value)),
            }
        }
        DbfFieldType::Date => {
            match *value {
                Value::Date(ref d) if d.year() >= 0 && d.year() <= 9999 => Ok(Some(d.format("%Y%m%d").to_string().into_bytes())),
                Value::Date(ref d) => Err(DbfError::RowError(format!("Field {} cannot hold date {}: years run from 0 to 9999", field.name, d))),
                _ => Err(mismatch(field, value)),
            }
        }
        DbfFieldType::Int | DbfFieldType::BigInt => {
            let text = match *value {
                Value::Int(n) => n.to_string(),
                Value::BigInt(n) => n.to_string(),
                Value::Double(n) => format!("{:.0}", n),
                _ => return Err(mismatch(field, value)),
            };
            Ok(fit_number(field, text))
        }
        DbfFieldType::Double => {
            let n = match value.as_f64() {
                Some(n) => n,
                None => return Err(mismatch(field, value)),
            };
            if !n.is_finite() {
                return Ok(None);
            }
            Ok(fit_number(field, format!("{:.*}", field.decimal_count, n)))
        }
    }
}
