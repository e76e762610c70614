//! Reads and writes ESRI shapefiles as tables of rows.
//!
//! A shapefile is really three files: geometries in ".shp", their offsets in
//! ".shx" and their attributes in ".dbf". `ShapefileDriver` presents them as
//! one table whose rows hold the attributes with the geometry inserted at a
//! chosen column, and `ScanCursor` walks that table.

extern crate byteorder;
extern crate chrono;
extern crate encoding;
extern crate itertools;
#[macro_use] extern crate lazy_static;
extern crate regex;
#[macro_use] extern crate tracing;

pub mod buffer;
pub mod cursor;
pub mod dbf;
pub mod driver;
pub mod geo;
pub mod options;
pub mod prj;
pub mod row;
pub mod shapefile;
pub mod value;

pub use cursor::ScanCursor;
pub use dbf::{DbfError, DbfFieldType, DbfHeader};
pub use driver::{open, CompanionFiles, ShapefileDriver, ShapefileError};
pub use geo::{Coordinate, Geometry, GeometryKind, Polygon};
pub use options::DriverOptions;
pub use shapefile::{ShapeType, ShpError};
pub use value::Value;
