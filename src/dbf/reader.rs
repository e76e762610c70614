use std::io::{Read, Seek};
use chrono::NaiveDate;
use encoding::{DecoderTrap, EncodingRef};
use buffer::ReadBuffer;
use value::Value;
use super::header::{DbfField, DbfFieldType, DbfHeader};
use super::DbfError;

/// Random-access ".dbf" reader: any field of any row, in any order.
#[derive(Debug)]
pub struct DbfReader<R> {
    header: DbfHeader,
    buffer: ReadBuffer<R>,
}

impl<R: Read + Seek> DbfReader<R> {
    /// Reads the header. `forced_encoding` overrides whatever the header says.
    pub fn new(channel: R, buffer_size: usize, forced_encoding: Option<EncodingRef>) -> Result<DbfReader<R>, DbfError> {
        let mut buffer = ReadBuffer::with_capacity(channel, buffer_size)?;
        let header = DbfHeader::read(&mut buffer, forced_encoding)?;
        Ok(DbfReader {
            header: header,
            buffer: buffer,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count()
    }

    pub fn field_count(&self) -> usize {
        self.header.field_count()
    }

    /// Sum of the field widths: the bytes a row takes, deletion flag aside.
    pub fn estimated_row_size(&self) -> usize {
        self.header.fields().iter().map(|f| f.length).sum()
    }

    fn check_row(&self, row: usize) -> Result<(), DbfError> {
        if row >= self.header.record_count() {
            return Err(DbfError::RowError(format!("Row {} requested, but the file has {} records", row, self.header.record_count())));
        }
        Ok(())
    }

    fn record_position(&self, row: usize) -> u64 {
        self.header.header_length() as u64 + row as u64 * self.header.record_length() as u64
    }

    pub fn field_value(&mut self, row: usize, column: usize) -> Result<Value, DbfError> {
        self.check_row(row)?;
        let field = match self.header.field(column) {
            Some(f) => f.clone(),
            None => return Err(DbfError::RowError(format!("Column {} requested, but the file has {} fields", column, self.header.field_count()))),
        };

        let mut bytes = vec![ 0u8; field.length ];
        let pos = self.record_position(row) + field.offset as u64;
        self.buffer.get_bytes_at(pos, &mut bytes)?;
        parse_field(&field, &bytes, self.header.encoding())
    }

    /// Reads a whole record with one buffer access.
    pub fn row(&mut self, row: usize) -> Result<Vec<Value>, DbfError> {
        self.check_row(row)?;
        let mut bytes = vec![ 0u8; self.header.record_length() ];
        let pos = self.record_position(row);
        self.buffer.get_bytes_at(pos, &mut bytes)?;

        let encoding = self.header.encoding();
        let mut values = Vec::with_capacity(self.header.field_count());
        for field in self.header.fields() {
            let end = field.offset + field.length;
            if end > bytes.len() {
                return Err(DbfError::ParseError(format!("Field {} ends at byte {}, past the {}-byte record", field.name, end, bytes.len())));
            }
            values.push(parse_field(field, &bytes[field.offset..end], encoding)?);
        }
        Ok(values)
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c == '\0' || c.is_whitespace())
}

fn trim(text: &str) -> &str {
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

/// Numbers as producers write them: possibly padded, possibly with a decimal
/// comma.
fn parse_f64(text: &str) -> Option<f64> {
    let text = trim(text);
    text.parse::<f64>().ok()
        .or_else(|| text.replace(',', ".").parse::<f64>().ok())
}

fn parse_number(field: &DbfField, text: &str) -> Value {
    let t = trim(text);
    if t.is_empty() || t.starts_with('*') {
        return Value::Null;
    }

    let parsed = match field.field_type {
        DbfFieldType::Int => {
            t.parse::<i32>().map(Value::Int).ok()
                .or_else(|| t.parse::<i64>().map(Value::BigInt).ok())
                .or_else(|| parse_f64(t).map(Value::Double))
        }
        DbfFieldType::BigInt => {
            t.parse::<i64>().map(Value::BigInt).ok()
                .or_else(|| parse_f64(t).map(Value::Double))
        }
        _ => parse_f64(t).map(Value::Double),
    };

    match parsed {
        Some(v) => v,
        None => {
            warn!(field = %field.name, text = t, "unparseable numeric value, reading it as null");
            Value::Null
        }
    }
}

fn parse_field(field: &DbfField, bytes: &[u8], encoding: EncodingRef) -> Result<Value, DbfError> {
    match field.field_type {
        DbfFieldType::Varchar => {
            if bytes.iter().all(|&b| b == 0) {
                return Ok(Value::Null);
            }
            let text = encoding.decode(bytes, DecoderTrap::Replace)
                .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
            Ok(Value::Varchar(trim(&text).to_string()))
        }
        DbfFieldType::Boolean => {
            match bytes.first().cloned().unwrap_or(b'?') {
                b't' | b'T' | b'y' | b'Y' => Ok(Value::Boolean(true)),
                b'f' | b'F' | b'n' | b'N' => Ok(Value::Boolean(false)),
                b'?' | b' ' | 0 => Ok(Value::Null),
                b => Err(DbfError::RowError(format!("Unknown logical value '{}' in field {}", b as char, field.name))),
            }
        }
        DbfFieldType::Date => {
            let text = String::from_utf8_lossy(bytes);
            let t = trim(&text);
            if t.is_empty() || t.chars().all(|c| c == '0') {
                return Ok(Value::Null);
            }
            match NaiveDate::parse_from_str(t, "%Y%m%d") {
                Ok(d) => Ok(Value::Date(d)),
                Err(err) => {
                    warn!(field = %field.name, text = t, error = %err, "unparseable date, reading it as null");
                    Ok(Value::Null)
                }
            }
        }
        DbfFieldType::Int | DbfFieldType::BigInt | DbfFieldType::Double => {
            let text = String::from_utf8_lossy(bytes);
            if is_blank(&text) {
                return Ok(Value::Null);
            }
            Ok(parse_number(field, &text))
        }
    }
}
