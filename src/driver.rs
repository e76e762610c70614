//! One table over a ".shp"/".shx"/".dbf" triple.
//!
//! A row is the ".dbf" record with the geometry from the ".shp" record of the
//! same number spliced in at `geometry_field_index`. A driver is opened once,
//! either for writing (`init_driver`) or for reading (`init_driver_from_file`),
//! and closed once; it cannot be reopened.

use std::error;
use std::fmt;
use std::fs;
use std::fs::File;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use encoding::EncodingRef;
use dbf::{codepage, DbfDriver, DbfError, DbfHeader};
use options::DriverOptions;
use prj;
use row;
use shapefile::{IndexFile, ShapeType, ShapefileHeader, ShpError, ShpReader, ShpWriter};
use value::Value;

#[derive(Debug)]
pub enum ShapefileError {
    Shp(ShpError),
    Dbf(DbfError),
    IOError(io::Error),
    /// A required companion file does not exist.
    NotFound(PathBuf),
    /// The geometry column of an inserted row is null.
    NullGeometry(usize),
    /// The geometry column of an inserted row holds something else.
    TypeMismatch { index: usize, found: &'static str },
    InvalidState(String),
    RowOutOfRange { row: usize, count: usize },
    WrongFieldCount { found: usize, expected: usize },
    /// ".shx" and ".dbf" hold different numbers of records.
    RecordCountMismatch { shx: usize, dbf: usize },
}

impl error::Error for ShapefileError {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            ShapefileError::Shp(ref err) => Some(err),
            ShapefileError::Dbf(ref err) => Some(err),
            ShapefileError::IOError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ShapefileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShapefileError::Shp(ref err) => err.fmt(f),
            ShapefileError::Dbf(ref err) => err.fmt(f),
            ShapefileError::IOError(ref err) => err.fmt(f),
            ShapefileError::NotFound(ref path) => write!(f, "File not found: {}", path.display()),
            ShapefileError::NullGeometry(index) => write!(f, "Shapefiles cannot store a null geometry (column {})", index),
            ShapefileError::TypeMismatch { index, found } => write!(f, "Column {} must hold a geometry, found {}", index, found),
            ShapefileError::InvalidState(ref description) => write!(f, "Invalid state: {}", description),
            ShapefileError::RowOutOfRange { row, count } => write!(f, "Row {} requested, but the table has {} rows", row, count),
            ShapefileError::WrongFieldCount { found, expected } => write!(f, "Wrong number of fields {} expected {}", found, expected),
            ShapefileError::RecordCountMismatch { shx, dbf } => write!(f, "'.shx' file has {} records but '.dbf' file has {}", shx, dbf),
        }
    }
}

impl From<ShpError> for ShapefileError {
    fn from(err: ShpError) -> ShapefileError {
        ShapefileError::Shp(err)
    }
}

impl From<DbfError> for ShapefileError {
    fn from(err: DbfError) -> ShapefileError {
        ShapefileError::Dbf(err)
    }
}

impl From<io::Error> for ShapefileError {
    fn from(err: io::Error) -> ShapefileError {
        ShapefileError::IOError(err)
    }
}

/// Where the pieces of one shapefile live.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionFiles {
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
    pub prj: Option<PathBuf>,
    pub cpg: Option<PathBuf>,
}

impl CompanionFiles {
    /// Paths for a new shapefile: `path` with each extension swapped in.
    fn for_writing(path: &Path) -> CompanionFiles {
        CompanionFiles {
            shp: path.with_extension("shp"),
            shx: path.with_extension("shx"),
            dbf: path.with_extension("dbf"),
            prj: None,
            cpg: None,
        }
    }

    /// Finds the files next to `shp` that share its base name, whatever the
    /// case of their extension. ".shx" and ".dbf" are required.
    pub fn find(shp: &Path) -> Result<CompanionFiles, ShapefileError> {
        if !shp.is_file() {
            return Err(ShapefileError::NotFound(shp.to_path_buf()));
        }

        let shx = find_companion(shp, "shx")?;
        let dbf = find_companion(shp, "dbf")?;
        Ok(CompanionFiles {
            shp: shp.to_path_buf(),
            shx: shx.ok_or_else(|| ShapefileError::NotFound(shp.with_extension("shx")))?,
            dbf: dbf.ok_or_else(|| ShapefileError::NotFound(shp.with_extension("dbf")))?,
            prj: find_companion(shp, "prj")?,
            cpg: find_companion(shp, "cpg")?,
        })
    }
}

fn find_companion(shp: &Path, extension: &str) -> Result<Option<PathBuf>, ShapefileError> {
    let exact = shp.with_extension(extension);
    if exact.is_file() {
        return Ok(Some(exact));
    }

    let stem = match shp.file_stem() {
        Some(stem) => stem.to_os_string(),
        None => return Ok(None),
    };
    let dir = match shp.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        let matches = path.file_stem() == Some(stem.as_os_str())
            && path.extension().and_then(|e| e.to_str()).map_or(false, |e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn read_code_page(path: &Path) -> Result<Option<EncodingRef>, ShapefileError> {
    let bytes = fs::read(path)?;
    let label = String::from_utf8_lossy(&bytes);
    let label = label.trim();
    match codepage::encoding_from_label(label) {
        Some(encoding) => Ok(Some(encoding)),
        None => {
            warn!(path = %path.display(), label = label, "unknown code page, falling back to the dbf header");
            Ok(None)
        }
    }
}

fn write_code_page(path: &Path, encoding: EncodingRef) -> Result<(), ShapefileError> {
    let label = encoding.whatwg_name().unwrap_or_else(|| encoding.name());
    fs::write(path, label.as_bytes())?;
    Ok(())
}

fn forced_encoding(label: &str) -> Result<EncodingRef, ShapefileError> {
    codepage::encoding_from_label(label)
        .ok_or_else(|| ShapefileError::Dbf(DbfError::ParseError(format!("Unknown encoding '{}'", label))))
}

#[derive(Debug)]
enum DriverState {
    Unopened,
    Reading {
        shp: ShpReader<File>,
        shx: IndexFile<File>,
        dbf: DbfDriver,
    },
    Writing {
        shp: ShpWriter<File>,
        dbf: DbfDriver,
    },
    Closed,
}

impl DriverState {
    fn name(&self) -> &'static str {
        match *self {
            DriverState::Unopened => "unopened",
            DriverState::Reading { .. } => "open for reading",
            DriverState::Writing { .. } => "open for writing",
            DriverState::Closed => "closed",
        }
    }
}

/// Reads or writes a shapefile as rows of `Value`s.
///
/// # Examples
///
/// ```
/// extern crate shpdriver;
/// extern crate tempfile;
///
/// # fn main() {
/// use shpdriver::{DbfHeader, Geometry, ShapeType, ShapefileDriver, Value};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("cities.shp");
///
/// let mut header = DbfHeader::new();
/// header.add_column("name", 'C', 20, 0).unwrap();
/// header.set_record_count(1);
///
/// let mut driver = ShapefileDriver::new();
/// driver.init_driver(&path, ShapeType::Point, header).unwrap();
/// driver.insert_row(&[ Value::Geometry(Geometry::point(2.35, 48.85)), Value::from("Paris") ]).unwrap();
/// driver.close().unwrap();
///
/// let mut driver = ShapefileDriver::new();
/// driver.init_driver_from_file(&path, None).unwrap();
/// assert_eq!(1, driver.row_count());
/// assert_eq!(Value::from("Paris"), driver.get_row(0).unwrap()[1]);
/// # }
/// ```
#[derive(Debug)]
pub struct ShapefileDriver {
    options: DriverOptions,
    state: DriverState,
    files: Option<CompanionFiles>,
    geometry_field_index: usize,
    srid: i32,
}

impl Default for ShapefileDriver {
    fn default() -> ShapefileDriver {
        ShapefileDriver::with_options(DriverOptions::default())
    }
}

impl ShapefileDriver {
    pub fn new() -> ShapefileDriver {
        ShapefileDriver::default()
    }

    pub fn with_options(options: DriverOptions) -> ShapefileDriver {
        ShapefileDriver {
            options: options,
            state: DriverState::Unopened,
            files: None,
            geometry_field_index: 0,
            srid: 0,
        }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    fn invalid_state(&self, operation: &str) -> ShapefileError {
        ShapefileError::InvalidState(format!("Cannot {} a driver that is {}", operation, self.state.name()))
    }

    fn check_unopened(&self) -> Result<(), ShapefileError> {
        match self.state {
            DriverState::Unopened => Ok(()),
            _ => Err(self.invalid_state("open")),
        }
    }

    /// Creates a new shapefile at `path` (any extension is replaced). The
    /// ".dbf" header must already declare how many rows will be inserted.
    pub fn init_driver(&mut self, path: &Path, shape_type: ShapeType, header: DbfHeader) -> Result<(), ShapefileError> {
        self.check_unopened()?;
        let mut files = CompanionFiles::for_writing(path);

        if !codepage::is_default(header.encoding()) {
            let cpg = path.with_extension("cpg");
            write_code_page(&cpg, header.encoding())?;
            files.cpg = Some(cpg);
        }

        let shp = ShpWriter::new(
            File::create(&files.shp)?,
            File::create(&files.shx)?,
            shape_type,
            self.options.write_buffer_size,
        )?;
        let dbf = DbfDriver::create(&files.dbf, header, self.options.write_buffer_size)?;

        debug!(path = %files.shp.display(), shape_type = %shape_type, fields = dbf.field_count(), "created shapefile");
        self.state = DriverState::Writing { shp: shp, dbf: dbf };
        self.files = Some(files);
        Ok(())
    }

    /// Opens an existing shapefile. `force_encoding` (or, failing that, the
    /// options' `force_encoding`) beats the ".cpg" file, which beats the
    /// ".dbf" header.
    pub fn init_driver_from_file(&mut self, path: &Path, force_encoding: Option<&str>) -> Result<(), ShapefileError> {
        self.check_unopened()?;
        let files = CompanionFiles::find(path)?;

        let forced = match force_encoding.or(self.options.force_encoding.as_ref().map(|s| s.as_str())) {
            Some(label) => Some(forced_encoding(label)?),
            None => None,
        };
        let encoding = match (forced, files.cpg.as_ref()) {
            (Some(encoding), _) => Some(encoding),
            (None, Some(cpg)) => read_code_page(cpg)?,
            (None, None) => None,
        };

        let shx = IndexFile::new(File::open(&files.shx)?, self.options.index_buffer_size)?;
        let dbf = DbfDriver::open(&files.dbf, encoding, self.options.read_buffer_size)?;

        if shx.record_count() != dbf.row_count() {
            if self.options.validate_record_counts {
                return Err(ShapefileError::RecordCountMismatch { shx: shx.record_count(), dbf: dbf.row_count() });
            }
            warn!(shx = shx.record_count(), dbf = dbf.row_count(), "'.shx' and '.dbf' record counts differ, trusting '.dbf'");
        }

        let shp = ShpReader::new(File::open(&files.shp)?, self.options.read_buffer_size)?;

        if let Some(ref prj_path) = files.prj {
            match prj::read_srid(prj_path)? {
                Some(srid) => self.srid = srid,
                None => debug!(path = %prj_path.display(), "no EPSG code in '.prj' file"),
            }
        }

        debug!(
            path = %files.shp.display(),
            shape_type = %shp.header().shape_type,
            rows = dbf.row_count(),
            encoding = dbf.header().encoding().name(),
            srid = self.srid,
            "opened shapefile"
        );
        self.state = DriverState::Reading { shp: shp, shx: shx, dbf: dbf };
        self.files = Some(files);
        Ok(())
    }

    pub fn files(&self) -> Option<&CompanionFiles> {
        self.files.as_ref()
    }

    pub fn geometry_field_index(&self) -> usize {
        self.geometry_field_index
    }

    pub fn set_geometry_field_index(&mut self, index: usize) {
        self.geometry_field_index = index;
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// Sets the SRID stamped on every geometry read. It is not written to any
    /// file.
    pub fn set_srid(&mut self, srid: i32) {
        self.srid = srid;
    }

    fn dbf(&self) -> Option<&DbfDriver> {
        match self.state {
            DriverState::Reading { ref dbf, .. } | DriverState::Writing { ref dbf, .. } => Some(dbf),
            DriverState::Unopened | DriverState::Closed => None,
        }
    }

    pub fn dbf_header(&self) -> Option<&DbfHeader> {
        self.dbf().map(|dbf| dbf.header())
    }

    /// The header of the file being read.
    pub fn shapefile_header(&self) -> Option<&ShapefileHeader> {
        match self.state {
            DriverState::Reading { ref shp, .. } => Some(shp.header()),
            _ => None,
        }
    }

    pub fn shape_type(&self) -> Option<ShapeType> {
        match self.state {
            DriverState::Reading { ref shp, .. } => Some(shp.header().shape_type),
            DriverState::Writing { ref shp, .. } => Some(shp.shape_type()),
            DriverState::Unopened | DriverState::Closed => None,
        }
    }

    /// Rows in the ".dbf" file when reading, rows inserted so far when
    /// writing.
    pub fn row_count(&self) -> usize {
        self.dbf().map_or(0, |dbf| dbf.row_count())
    }

    /// Attribute fields plus the geometry field.
    pub fn field_count(&self) -> usize {
        self.dbf().map_or(0, |dbf| dbf.field_count() + 1)
    }

    fn check_geometry_index(&self, field_count: usize) -> Result<usize, ShapefileError> {
        let k = self.geometry_field_index;
        if k >= field_count {
            return Err(ShapefileError::InvalidState(format!("Geometry field index {} is past the last of {} fields", k, field_count)));
        }
        Ok(k)
    }

    /// Appends a row. Nothing is written unless the whole row is valid.
    pub fn insert_row(&mut self, values: &[Value]) -> Result<(), ShapefileError> {
        let k = self.geometry_field_index;
        let (shp, dbf) = match self.state {
            DriverState::Writing { ref mut shp, ref mut dbf } => (shp, dbf),
            _ => return Err(ShapefileError::InvalidState("Cannot insert a row unless the driver is open for writing".to_string())),
        };

        let expected = dbf.field_count() + 1;
        if values.len() != expected {
            return Err(ShapefileError::WrongFieldCount { found: values.len(), expected: expected });
        }
        if k >= expected {
            return Err(ShapefileError::InvalidState(format!("Geometry field index {} is past the last of {} fields", k, expected)));
        }

        let (geometry, attributes) = row::split(values, k);
        let geometry = match *geometry {
            Value::Geometry(ref g) => g,
            Value::Null => return Err(ShapefileError::NullGeometry(k)),
            ref other => return Err(ShapefileError::TypeMismatch { index: k, found: other.type_name() }),
        };

        shp.check(geometry)?;
        let record = dbf.encode_row(&attributes)?;

        shp.write_geometry(geometry)?;
        dbf.write_encoded(&record)?;
        Ok(())
    }

    fn reading(&mut self) -> Result<(&mut ShpReader<File>, &mut IndexFile<File>, &mut DbfDriver), ShapefileError> {
        match self.state {
            DriverState::Reading { ref mut shp, ref mut shx, ref mut dbf } => Ok((shp, shx, dbf)),
            _ => Err(ShapefileError::InvalidState("Cannot read a row unless the driver is open for reading".to_string())),
        }
    }

    /// Checks `row` and returns the geometry field index.
    fn check_row(&mut self, row: usize) -> Result<usize, ShapefileError> {
        let field_count = self.field_count();
        let count = {
            let (_, _, dbf) = self.reading()?;
            dbf.row_count()
        };
        if row >= count {
            return Err(ShapefileError::RowOutOfRange { row: row, count: count });
        }
        self.check_geometry_index(field_count)
    }

    fn read_geometry(&mut self, row: usize) -> Result<Value, ShapefileError> {
        let srid = self.srid;
        let (shp, shx, _) = self.reading()?;
        let offset = shx.offset_in_bytes(row)?;
        Ok(match shp.geom_at(offset)? {
            Some(geometry) => Value::Geometry(geometry.with_srid(srid)),
            None => Value::Null,
        })
    }

    /// Reads row `row`: its geometry (stamped with `srid()`) at
    /// `geometry_field_index`, its attributes around it.
    pub fn get_row(&mut self, row: usize) -> Result<Vec<Value>, ShapefileError> {
        let k = self.check_row(row)?;
        let geometry = self.read_geometry(row)?;
        let (_, _, dbf) = self.reading()?;
        let attributes = dbf.get_row(row)?;
        Ok(row::splice(geometry, attributes, k))
    }

    /// Reads one column of row `row`.
    pub fn get_field(&mut self, row: usize, column: usize) -> Result<Value, ShapefileError> {
        let k = self.check_row(row)?;
        let field_count = self.field_count();
        if column >= field_count {
            return Err(ShapefileError::InvalidState(format!("Column {} requested, but the table has {} columns", column, field_count)));
        }

        match row::attribute_column(column, k) {
            None => self.read_geometry(row),
            Some(column) => {
                let (_, _, dbf) = self.reading()?;
                Ok(dbf.get_field(row, column)?)
            }
        }
    }

    /// Bytes row `row` takes on disk: its ".dbf" fields plus its ".shp"
    /// record content.
    pub fn estimated_row_size(&mut self, row: usize) -> Result<usize, ShapefileError> {
        self.check_row(row)?;
        let (_, shx, dbf) = self.reading()?;
        let shp_bytes = shx.content_length(row)? as usize * 2;
        Ok(dbf.estimated_row_size() + shp_bytes)
    }

    /// Closes every file. A writer first rewrites the ".shp" and ".shx"
    /// headers with the final length and bounding box.
    pub fn close(&mut self) -> Result<(), ShapefileError> {
        match mem::replace(&mut self.state, DriverState::Closed) {
            DriverState::Unopened => Ok(()),
            DriverState::Reading { dbf, .. } => {
                dbf.close()?;
                debug!("closed shapefile reader");
                Ok(())
            }
            DriverState::Writing { shp, dbf } => {
                if shp.record_count() as usize != dbf.row_count() {
                    warn!(shp = shp.record_count(), dbf = dbf.row_count(), "'.shp' and '.dbf' record counts differ");
                }
                shp.close()?;
                dbf.close()?;
                Ok(())
            }
            DriverState::Closed => Err(ShapefileError::InvalidState("Driver is already closed".to_string())),
        }
    }
}

/// Opens a shapefile for reading with default options.
pub fn open(path: &Path) -> Result<ShapefileDriver, ShapefileError> {
    let mut driver = ShapefileDriver::new();
    driver.init_driver_from_file(path, None)?;
    Ok(driver)
}
