use std::fmt;
use std::io;
use std::io::{Read, Seek, Write};
use chrono::{Datelike, Local, NaiveDate};
use encoding::{EncoderTrap, EncodingRef};
use buffer::{Endian, ReadBuffer, WriteBuffer};
use value::Value;
use super::codepage;
use super::DbfError;

pub const DBF_MAGIC: u8 = 0x03;
pub const HEADER_TERMINATOR: u8 = 0x0D;
pub const END_OF_FILE: u8 = 0x1A;

const MINIMUM_HEADER_LENGTH: usize = 33;
const FIELD_DESCRIPTOR_LENGTH: usize = 32;
const MAX_FIELD_NAME_LENGTH: usize = 10;

/// What a field's text means, derived from its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbfFieldType {
    Boolean,
    Varchar,
    Date,
    Int,
    BigInt,
    Double,
}

impl DbfFieldType {
    /// Maps a field descriptor to a value type.
    ///
    /// Numeric fields without decimals hold integers: 32-bit ones below ten
    /// digits, 64-bit ones from ten digits on.
    pub fn from_descriptor(type_code: u8, length: usize, decimal_count: usize) -> Result<DbfFieldType, DbfError> {
        match type_code {
            b'L' | b'l' => Ok(DbfFieldType::Boolean),
            b'C' | b'c' => Ok(DbfFieldType::Varchar),
            b'D' | b'd' => Ok(DbfFieldType::Date),
            b'N' | b'n' if decimal_count == 0 && length < 10 => Ok(DbfFieldType::Int),
            b'N' | b'n' if decimal_count == 0 => Ok(DbfFieldType::BigInt),
            b'N' | b'n' | b'F' | b'f' | b'O' | b'o' => Ok(DbfFieldType::Double),
            _ => Err(DbfError::ParseError(format!("unknown DBF field type '{}'", type_code as char))),
        }
    }

    /// The field type able to store `value`, or `None` for nulls and
    /// geometries.
    pub fn for_value(value: &Value) -> Option<DbfFieldType> {
        match *value {
            Value::Boolean(_) => Some(DbfFieldType::Boolean),
            Value::Int(_) => Some(DbfFieldType::Int),
            Value::BigInt(_) => Some(DbfFieldType::BigInt),
            Value::Double(_) => Some(DbfFieldType::Double),
            Value::Varchar(_) => Some(DbfFieldType::Varchar),
            Value::Date(_) => Some(DbfFieldType::Date),
            Value::Null | Value::Geometry(_) => None,
        }
    }

    /// `(type code, length, decimal count)` for a new column of this type.
    /// `precision` is clamped to what dBase readers accept.
    pub fn descriptor(self, precision: Option<usize>) -> (char, usize, usize) {
        fn clamp(precision: Option<usize>, max: usize) -> usize {
            match precision {
                Some(p) if p > 0 && p < max => p,
                _ => max,
            }
        }

        match self {
            DbfFieldType::Boolean => ('L', 1, 0),
            DbfFieldType::Date => ('D', 8, 0),
            DbfFieldType::Int => ('N', clamp(precision, 10), 0),
            DbfFieldType::BigInt => ('N', clamp(precision, 18), 0),
            DbfFieldType::Double => ('F', 20, 10),
            DbfFieldType::Varchar => ('C', clamp(precision, 254), 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbfField {
    pub name: String,
    pub type_code: u8,
    pub length: usize,
    pub decimal_count: usize,
    /// Position of the field within a record. Byte 0 is the deletion flag,
    /// so the first field is at 1.
    pub offset: usize,
    pub field_type: DbfFieldType,
}

/// Everything before the first record: the field list, the record count and
/// the text encoding.
///
/// Build one with `add_column()` to create a file, or get one from
/// `DbfReader::header()`.
#[derive(Clone)]
pub struct DbfHeader {
    last_update: Option<NaiveDate>,
    record_count: usize,
    header_length: usize,
    record_length: usize,
    fields: Vec<DbfField>,
    encoding: EncodingRef,
}

// encoding::EncodingRef does not implement std::fmt::Debug
impl fmt::Debug for DbfHeader {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("DbfHeader")
            .field("last_update", &self.last_update)
            .field("record_count", &self.record_count)
            .field("header_length", &self.header_length)
            .field("record_length", &self.record_length)
            .field("fields", &self.fields)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

impl Default for DbfHeader {
    fn default() -> DbfHeader {
        DbfHeader::new()
    }
}

fn truncate_name(name: &str) -> String {
    let mut ret = String::new();
    for c in name.chars() {
        if ret.len() + c.len_utf8() > MAX_FIELD_NAME_LENGTH {
            break;
        }
        ret.push(c);
    }
    ret
}

impl DbfHeader {
    pub fn new() -> DbfHeader {
        DbfHeader {
            last_update: Some(Local::now().date_naive()),
            record_count: 0,
            header_length: MINIMUM_HEADER_LENGTH,
            record_length: 1,
            fields: Vec::new(),
            encoding: codepage::default_encoding(),
        }
    }

    pub fn fields(&self) -> &[DbfField] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&DbfField> {
        self.fields.get(index)
    }

    /// Index of the field called `name`, ignoring case.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.fields.iter().position(|f| f.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Sets the record count written in the header. A writer declares it up
    /// front and never patches it.
    pub fn set_record_count(&mut self, record_count: usize) {
        self.record_count = record_count;
    }

    pub fn header_length(&self) -> usize {
        self.header_length
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }

    pub fn last_update(&self) -> Option<NaiveDate> {
        self.last_update
    }

    pub fn set_last_update(&mut self, date: NaiveDate) {
        self.last_update = Some(date);
    }

    pub fn encoding(&self) -> EncodingRef {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: EncodingRef) {
        self.encoding = encoding;
    }

    /// Appends a field descriptor.
    ///
    /// Descriptors are normalized the way dBase III writers do it: names are
    /// cut to 10 bytes, `D` fields are 8 long, `L` fields are 1 long, `S`
    /// means an 8-long `C`, and `N` decimals are clamped to `length - 1`.
    pub fn add_column(&mut self, name: &str, type_code: char, length: usize, decimal_count: usize) -> Result<(), DbfError> {
        if length == 0 {
            return Err(DbfError::FieldError(format!("Field {} has length 0", name)));
        }

        let mut field_name = truncate_name(name);
        if field_name.is_empty() {
            field_name = "NoName".to_string();
        }
        if field_name != name {
            warn!(name = name, truncated = %field_name, "field name is longer than 10 bytes, truncating");
        }

        let (code, length, decimal_count) = match type_code {
            'C' | 'c' => {
                if length > 254 {
                    warn!(field = %field_name, length = length, "character field longer than 254, not consistent with dBase III");
                }
                (b'C', length, 0)
            }
            'S' | 's' => {
                warn!(field = %field_name, "field type S is not a dBase type, storing it as an 8-long C field");
                (b'C', 8, 0)
            }
            'D' | 'd' => {
                if length != 8 {
                    warn!(field = %field_name, length = length, "setting date field length to 8 (YYYYMMDD)");
                }
                (b'D', 8, 0)
            }
            'F' | 'f' => {
                if length > 20 {
                    warn!(field = %field_name, length = length, "float field longer than 20, not valid for dBase IV");
                }
                (b'F', length, decimal_count)
            }
            'N' | 'n' => {
                if length > 18 {
                    warn!(field = %field_name, length = length, "numeric field longer than 18, not valid for dBase III");
                }
                let decimals = if decimal_count > length - 1 {
                    warn!(field = %field_name, decimal_count = decimal_count, "clamping decimal count to {}", length - 1);
                    length - 1
                } else {
                    decimal_count
                };
                (b'N', length, decimals)
            }
            'L' | 'l' => {
                if length != 1 {
                    warn!(field = %field_name, length = length, "setting logical field length to 1");
                }
                (b'L', 1, 0)
            }
            _ => return Err(DbfError::FieldError(format!("Undefined field type {} for column {}", type_code, name))),
        };

        if length > 255 {
            return Err(DbfError::FieldError(format!("Field {} has length {}; the limit is 255", field_name, length)));
        }

        let field_type = DbfFieldType::from_descriptor(code, length, decimal_count)?;
        self.fields.push(DbfField {
            name: field_name,
            type_code: code,
            length: length,
            decimal_count: decimal_count,
            offset: self.record_length,
            field_type: field_type,
        });
        self.record_length += length;
        self.header_length = MINIMUM_HEADER_LENGTH + FIELD_DESCRIPTOR_LENGTH * self.fields.len();
        Ok(())
    }

    /// Appends a field that can hold values of `field_type`.
    pub fn add_column_of_type(&mut self, name: &str, field_type: DbfFieldType, precision: Option<usize>) -> Result<(), DbfError> {
        let (code, length, decimal_count) = field_type.descriptor(precision);
        self.add_column(name, code, length, decimal_count)
    }

    /// Removes the field called `name` (ignoring case) and returns its former
    /// index.
    pub fn remove_column(&mut self, name: &str) -> Result<usize, DbfError> {
        let index = match self.field_index(name) {
            Some(i) => i,
            None => return Err(DbfError::FieldError(format!("Could not find a field named '{}' for removal", name))),
        };

        self.fields.remove(index);
        let mut offset = 1;
        for field in self.fields.iter_mut() {
            field.offset = offset;
            offset += field.length;
        }
        self.record_length = offset;
        self.header_length = MINIMUM_HEADER_LENGTH + FIELD_DESCRIPTOR_LENGTH * self.fields.len();
        Ok(index)
    }

    /// Reads a header from the start of the file.
    ///
    /// `forced_encoding`, when given, wins over the language driver byte.
    pub fn read<R: Read + Seek>(buffer: &mut ReadBuffer<R>, forced_encoding: Option<EncodingRef>) -> Result<DbfHeader, DbfError> {
        buffer.order(Endian::Little);
        buffer.set_position(0);

        let magic = buffer.get()?;
        if magic != DBF_MAGIC {
            warn!(magic = magic, "unsupported dBase file type, reading it as dBase III");
        }

        let yy = buffer.get()? as i32;
        let mm = buffer.get()? as u32;
        let dd = buffer.get()? as u32;
        let year = if yy > 90 { 1900 + yy } else { 2000 + yy };
        let last_update = NaiveDate::from_ymd_opt(year, mm, dd);

        let record_count = buffer.get_i32()?;
        if record_count < 0 {
            return Err(DbfError::ParseError(format!("File declares {} records", record_count)));
        }
        let header_length = buffer.get_i16()? as u16 as usize;
        let record_length = buffer.get_i16()? as u16 as usize;
        if header_length < MINIMUM_HEADER_LENGTH {
            return Err(DbfError::ParseError(format!("Header length is {}, but it must be at least {}", header_length, MINIMUM_HEADER_LENGTH)));
        }

        buffer.skip(17);
        let language_driver = buffer.get()?;
        buffer.skip(2);

        let encoding = forced_encoding
            .or_else(|| codepage::encoding_for_language_driver(language_driver))
            .unwrap_or_else(codepage::default_encoding);

        let n_descriptors = (header_length - MINIMUM_HEADER_LENGTH) / FIELD_DESCRIPTOR_LENGTH;
        let mut fields = Vec::with_capacity(n_descriptors);
        let mut offset = 1;
        for _ in 0..n_descriptors {
            let mut name_bytes = [0u8; 11];
            buffer.get_bytes(&mut name_bytes)?;
            let type_code = buffer.get()?;
            buffer.skip(4); // data address: we compute our own
            let length = buffer.get()? as usize;
            let decimal_count = buffer.get()? as usize;
            buffer.skip(14);

            if length == 0 {
                continue;
            }

            let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
            let name = String::from_utf8_lossy(&name_bytes[..name_end]).trim().to_string();
            let field_type = DbfFieldType::from_descriptor(type_code, length, decimal_count)?;

            fields.push(DbfField {
                name: name,
                type_code: type_code,
                length: length,
                decimal_count: decimal_count,
                offset: offset,
                field_type: field_type,
            });
            offset += length;
        }

        if offset != record_length {
            warn!(declared = record_length, computed = offset, "record length does not match the field descriptors");
        }

        debug!(records = record_count, fields = fields.len(), encoding = encoding.name(), "read dbf header");

        Ok(DbfHeader {
            last_update: last_update,
            record_count: record_count as usize,
            header_length: header_length,
            record_length: record_length,
            fields: fields,
            encoding: encoding,
        })
    }

    /// Writes the header and the terminator byte; the first record comes
    /// next.
    pub fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>) -> io::Result<()> {
        buffer.order(Endian::Little);

        let date = self.last_update.unwrap_or_else(|| Local::now().date_naive());
        buffer.put(DBF_MAGIC)?;
        buffer.put((date.year() % 100) as u8)?;
        buffer.put(date.month() as u8)?;
        buffer.put(date.day() as u8)?;

        buffer.put_i32(self.record_count as i32)?;
        buffer.put_i16(self.header_length as u16 as i16)?;
        buffer.put_i16(self.record_length as u16 as i16)?;
        buffer.put_bytes(&[ 0; 17 ])?;
        buffer.put(codepage::language_driver_for(self.encoding))?;
        buffer.put_bytes(&[ 0; 2 ])?;

        for field in self.fields.iter() {
            let mut name = self.encoding.encode(&field.name, EncoderTrap::Replace).unwrap_or_else(|_| field.name.clone().into_bytes());
            name.resize(11, 0);
            name[MAX_FIELD_NAME_LENGTH] = 0;
            buffer.put_bytes(&name)?;
            buffer.put(field.type_code)?;
            buffer.put_i32(field.offset as i32)?;
            buffer.put(field.length as u8)?;
            buffer.put(field.decimal_count as u8)?;
            buffer.put_bytes(&[ 0; 14 ])?;
        }

        buffer.put(HEADER_TERMINATOR)
    }
}

impl fmt::Display for DbfHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DbfHeader[ records {} fields", self.record_count)?;
        for field in self.fields.iter() {
            write!(f, " {} {}({},{})", field.name, field.type_code as char, field.length, field.decimal_count)?;
        }
        write!(f, " encoding {} ]", self.encoding.name())
    }
}
