//! Reads and writes the geometry half of a shapefile: the ".shp" records and
//! the ".shx" index that locates them.
//!
//! Rows are addressed by number. The ".shx" file maps a row number to a byte
//! offset in the ".shp" file, and `ShpReader::geom_at()` decodes whatever is
//! there:
//!
//! ```
//! # extern crate shpdriver;
//! # fn main() {
//! use std::io::Cursor;
//! use shpdriver::geo::Geometry;
//! use shpdriver::shapefile::{IndexFile, ShapeType, ShpReader, ShpWriter};
//!
//! let mut shp = Cursor::new(Vec::new());
//! let mut shx = Cursor::new(Vec::new());
//! {
//!     let mut writer = ShpWriter::new(&mut shp, &mut shx, ShapeType::Point, 1024).unwrap();
//!     writer.write_geometry(&Geometry::point(1., 2.)).unwrap();
//!     writer.close().unwrap();
//! }
//!
//! let mut index = IndexFile::new(Cursor::new(shx.into_inner()), 1024).unwrap();
//! let mut reader = ShpReader::new(Cursor::new(shp.into_inner()), 1024).unwrap();
//! let offset = index.offset_in_bytes(0).unwrap();
//! assert_eq!(Some(Geometry::point(1., 2.)), reader.geom_at(offset).unwrap());
//! # }
//! ```

pub mod codec;
pub mod header;
pub mod shp;
pub mod shx;

pub use self::codec::{ShapeCodec, ShapeHandler};
pub use self::header::{ShapeType, ShapefileHeader};
pub use self::shp::{ShpError, ShpReader, ShpWriter};
pub use self::shx::IndexFile;
