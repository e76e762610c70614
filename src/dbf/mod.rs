//! Reads and writes xBase ".dbf" attribute tables, as per
//! https://www.clicketyclick.dk/databases/xbase/format/dbf.html
//!
//! A ".dbf" file is a header (record count, record length, one 32-byte
//! descriptor per field) followed by fixed-width records. Every record starts
//! with a one-byte deletion flag, then holds each field's text, padded to the
//! field's declared length. Text is in whatever encoding the producer used;
//! see `codepage` for how that gets resolved.

use std::error;
use std::fmt;
use std::io;

pub mod codepage;
pub mod driver;
pub mod header;
pub mod reader;
pub mod writer;

pub use self::driver::DbfDriver;
pub use self::header::{DbfField, DbfFieldType, DbfHeader};
pub use self::reader::DbfReader;
pub use self::writer::DbfWriter;

#[derive(Debug)]
pub enum DbfError {
    IOError(io::Error),
    /// The file is not a ".dbf" file we can read.
    ParseError(String),
    /// A field descriptor cannot be added or removed.
    FieldError(String),
    /// A row cannot be read or written as given.
    RowError(String),
    /// The driver is in the wrong mode for the requested operation.
    InvalidState(String),
}

impl error::Error for DbfError {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            DbfError::IOError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DbfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DbfError::IOError(ref err) => err.fmt(f),
            DbfError::ParseError(ref description) => write!(f, "Parse error: {}", description),
            DbfError::FieldError(ref description) => write!(f, "Field error: {}", description),
            DbfError::RowError(ref description) => write!(f, "Row error: {}", description),
            DbfError::InvalidState(ref description) => write!(f, "Invalid state: {}", description),
        }
    }
}

impl From<io::Error> for DbfError {
    fn from(err: io::Error) -> DbfError {
        DbfError::IOError(err)
    }
}
