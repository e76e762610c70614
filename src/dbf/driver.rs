use std::fs::File;
use std::path::{Path, PathBuf};
use encoding::EncodingRef;
use value::Value;
use super::header::DbfHeader;
use super::reader::DbfReader;
use super::writer::DbfWriter;
use super::DbfError;

/// A ".dbf" file opened either for reading or for writing, never both.
#[derive(Debug)]
pub enum DbfDriver {
    Reading { path: PathBuf, reader: DbfReader<File> },
    Writing { path: PathBuf, writer: DbfWriter<File> },
}

impl DbfDriver {
    /// Opens an existing file. `forced_encoding` wins over the header's
    /// language driver byte.
    pub fn open(path: &Path, forced_encoding: Option<EncodingRef>, buffer_size: usize) -> Result<DbfDriver, DbfError> {
        let file = File::open(path)?;
        let reader = DbfReader::new(file, buffer_size, forced_encoding)?;
        debug!(path = %path.display(), records = reader.record_count(), encoding = reader.header().encoding().name(), "opened dbf file");
        Ok(DbfDriver::Reading { path: path.to_path_buf(), reader: reader })
    }

    /// Creates (or truncates) a file and writes `header` to it.
    pub fn create(path: &Path, header: DbfHeader, buffer_size: usize) -> Result<DbfDriver, DbfError> {
        let file = File::create(path)?;
        let writer = DbfWriter::new(file, header, buffer_size)?;
        debug!(path = %path.display(), fields = writer.header().field_count(), "created dbf file");
        Ok(DbfDriver::Writing { path: path.to_path_buf(), writer: writer })
    }

    pub fn path(&self) -> &Path {
        match *self {
            DbfDriver::Reading { ref path, .. } | DbfDriver::Writing { ref path, .. } => path,
        }
    }

    pub fn header(&self) -> &DbfHeader {
        match *self {
            DbfDriver::Reading { ref reader, .. } => reader.header(),
            DbfDriver::Writing { ref writer, .. } => writer.header(),
        }
    }

    /// Records declared by the header when reading; records written so far
    /// when writing.
    pub fn row_count(&self) -> usize {
        match *self {
            DbfDriver::Reading { ref reader, .. } => reader.record_count(),
            DbfDriver::Writing { ref writer, .. } => writer.written(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.header().field_count()
    }

    pub fn estimated_row_size(&self) -> usize {
        self.header().fields().iter().map(|f| f.length).sum()
    }

    fn reader(&mut self) -> Result<&mut DbfReader<File>, DbfError> {
        match *self {
            DbfDriver::Reading { ref mut reader, .. } => Ok(reader),
            DbfDriver::Writing { .. } => Err(DbfError::InvalidState("The driver is not in read mode".to_string())),
        }
    }

    fn writer(&mut self) -> Result<&mut DbfWriter<File>, DbfError> {
        match *self {
            DbfDriver::Writing { ref mut writer, .. } => Ok(writer),
            DbfDriver::Reading { .. } => Err(DbfError::InvalidState("The driver is not in write mode".to_string())),
        }
    }

    pub fn get_row(&mut self, row: usize) -> Result<Vec<Value>, DbfError> {
        self.reader()?.row(row)
    }

    pub fn get_field(&mut self, row: usize, column: usize) -> Result<Value, DbfError> {
        self.reader()?.field_value(row, column)
    }

    /// Validates and formats a row without writing it.
    pub fn encode_row(&self, values: &[Value]) -> Result<Vec<u8>, DbfError> {
        match *self {
            DbfDriver::Writing { ref writer, .. } => writer.encode_row(values),
            DbfDriver::Reading { .. } => Err(DbfError::InvalidState("The driver is not in write mode".to_string())),
        }
    }

    pub fn write_encoded(&mut self, record: &[u8]) -> Result<(), DbfError> {
        self.writer()?.write_encoded(record)
    }

    pub fn insert_row(&mut self, values: &[Value]) -> Result<(), DbfError> {
        self.writer()?.write_row(values)
    }

    /// Closes the file; a writer first appends the end-of-file marker.
    pub fn close(self) -> Result<(), DbfError> {
        match self {
            DbfDriver::Reading { .. } => Ok(()),
            DbfDriver::Writing { writer, .. } => writer.close().map(|_| ()),
        }
    }
}

#[cfg(test)]
mod test {
    extern crate tempfile;

    use dbf::header::DbfHeader;
    use value::Value;
    use super::DbfDriver;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.dbf");

        let mut header = DbfHeader::new();
        header.add_column("name", 'C', 10, 0).unwrap();
        header.add_column("age", 'N', 3, 0).unwrap();
        header.set_record_count(2);

        let mut driver = DbfDriver::create(&path, header, 1024).unwrap();
        driver.insert_row(&[ Value::from("Ada"), Value::Int(36) ]).unwrap();
        driver.insert_row(&[ Value::from("Alan"), Value::Null ]).unwrap();
        assert_eq!(2, driver.row_count());
        assert!(driver.get_row(0).is_err());
        driver.close().unwrap();

        let mut driver = DbfDriver::open(&path, None, 1024).unwrap();
        assert_eq!(2, driver.row_count());
        assert_eq!(2, driver.field_count());
        assert_eq!(13, driver.estimated_row_size());
        assert_eq!(vec![ Value::from("Ada"), Value::Int(36) ], driver.get_row(0).unwrap());
        assert_eq!(Value::Null, driver.get_field(1, 1).unwrap());
        assert!(driver.insert_row(&[ Value::Null, Value::Null ]).is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DbfDriver::open(&dir.path().join("nope.dbf"), None, 1024).is_err());
    }
}
