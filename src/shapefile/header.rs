//! The 100-byte header shared by ".shp" and ".shx" files, as per
//! https://www.esri.com/library/whitepapers/pdfs/shapefile.pdf
//!
//! Byte order is mixed: the magic number, five reserved words and the file
//! length are big-endian; everything after them is little-endian. Nothing
//! outside this module has to care.

use std::fmt;
use std::io;
use std::io::{Read, Seek, Write};
use buffer::{Endian, ReadBuffer, WriteBuffer};
use geo::Envelope;
use super::shp::ShpError;

pub const SHP_HEADER_LENGTH: usize = 100;
pub const SHP_MAGIC_NUMBER: i32 = 9994;
pub const SHP_VERSION: i32 = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn from_id(id: i32) -> Option<ShapeType> {
        match id {
            0  => Some(ShapeType::Null),
            1  => Some(ShapeType::Point),
            3  => Some(ShapeType::PolyLine),
            5  => Some(ShapeType::Polygon),
            8  => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            31 => Some(ShapeType::MultiPatch),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    pub fn has_z(self) -> bool {
        match self {
            ShapeType::PointZ | ShapeType::PolyLineZ | ShapeType::PolygonZ | ShapeType::MultiPointZ => true,
            _ => false,
        }
    }

    /// True for the variants that carry a measure block (Z variants included).
    pub fn has_m(self) -> bool {
        match self {
            ShapeType::PointM | ShapeType::PolyLineM | ShapeType::PolygonM | ShapeType::MultiPointM => true,
            _ => self.has_z(),
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.id())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapefileHeader {
    /// Total file length in 16-bit words, header included.
    pub file_length: i32,
    pub version: i32,
    pub shape_type: ShapeType,
    pub bbox: Envelope,
}

impl ShapefileHeader {
    pub fn file_length_bytes(&self) -> u64 {
        self.file_length as u64 * 2
    }

    /// Reads the header at the reader's cursor and leaves the cursor just
    /// past it. The trailing 32 reserved bytes are skipped, not validated.
    pub fn read<R: Read + Seek>(buffer: &mut ReadBuffer<R>) -> Result<ShapefileHeader, ShpError> {
        buffer.order(Endian::Big);
        let magic_number = buffer.get_i32()?;
        if magic_number != SHP_MAGIC_NUMBER {
            return Err(ShpError::ParseError(format!("File has wrong magic number: found {}, expected {}", magic_number, SHP_MAGIC_NUMBER)));
        }

        buffer.skip(20);
        let file_length = buffer.get_i32()?;

        buffer.order(Endian::Little);
        let version = buffer.get_i32()?;
        if version != SHP_VERSION {
            return Err(ShpError::ParseError(format!("File has wrong version: found {}, expected {}", version, SHP_VERSION)));
        }

        let shape_type_id = buffer.get_i32()?;
        let shape_type = match ShapeType::from_id(shape_type_id) {
            Some(shape_type) => shape_type,
            None => return Err(ShpError::ParseError(format!("File has nonexistent shape type {}", shape_type_id))),
        };

        let bbox = Envelope::new(
            buffer.get_f64()?,
            buffer.get_f64()?,
            buffer.get_f64()?,
            buffer.get_f64()?,
        );

        buffer.order(Endian::Big);
        buffer.skip(32);

        Ok(ShapefileHeader {
            file_length: file_length,
            version: version,
            shape_type: shape_type,
            bbox: bbox,
        })
    }

    /// Writes a header. `file_length` is in 16-bit words.
    pub fn write<W: Write>(buffer: &mut WriteBuffer<W>, shape_type: ShapeType, file_length: i32, bbox: &Envelope) -> io::Result<()> {
        buffer.order(Endian::Big);
        buffer.put_i32(SHP_MAGIC_NUMBER)?;
        for _ in 0..5 {
            buffer.put_i32(0)?;
        }
        buffer.put_i32(file_length)?;

        buffer.order(Endian::Little);
        buffer.put_i32(SHP_VERSION)?;
        buffer.put_i32(shape_type.id())?;
        buffer.put_f64(bbox.min_x)?;
        buffer.put_f64(bbox.min_y)?;
        buffer.put_f64(bbox.max_x)?;
        buffer.put_f64(bbox.max_y)?;

        buffer.order(Endian::Big);
        for _ in 0..8 {
            buffer.put_i32(0)?;
        }
        Ok(())
    }
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ShapefileHeader[ size {} version {} shapeType {} bounds {},{},{},{} ]",
            self.file_length, self.version, self.shape_type,
            self.bbox.min_x, self.bbox.min_y, self.bbox.max_x, self.bbox.max_y)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;
    use buffer::{ReadBuffer, WriteBuffer};
    use geo::Envelope;
    use super::{ShapeType, ShapefileHeader, SHP_HEADER_LENGTH, SHP_VERSION};

    fn written(shape_type: ShapeType, file_length: i32, bbox: &Envelope) -> Vec<u8> {
        let mut writer = WriteBuffer::new(Vec::new());
        ShapefileHeader::write(&mut writer, shape_type, file_length, bbox).unwrap();
        writer.into_inner().unwrap()
    }

    #[test]
    fn round_trip() {
        let bbox = Envelope::new(-73.5, 45.25, -73.1, 45.75);
        for &shape_type in &[ ShapeType::Point, ShapeType::PolyLineZ, ShapeType::MultiPointM, ShapeType::PolygonM ] {
            let bytes = written(shape_type, 1234, &bbox);
            assert_eq!(SHP_HEADER_LENGTH, bytes.len());

            let mut reader = ReadBuffer::new(Cursor::new(bytes)).unwrap();
            let header = ShapefileHeader::read(&mut reader).unwrap();
            assert_eq!(shape_type, header.shape_type);
            assert_eq!(SHP_VERSION, header.version);
            assert_eq!(1234, header.file_length);
            assert_eq!(2468, header.file_length_bytes());
            assert_eq!(bbox, header.bbox);
            assert_eq!(100, reader.position());
        }
    }

    #[test]
    fn mixed_byte_order_layout() {
        let bytes = written(ShapeType::Polygon, 50, &Envelope::new(1., 2., 3., 4.));
        assert_eq!([ 0, 0, 0x27, 0x0a ], bytes[0..4]);
        assert_eq!([ 0, 0, 0, 50 ], bytes[24..28]);
        assert_eq!([ 0xe8, 0x03, 0, 0 ], bytes[28..32]);
        assert_eq!([ 5, 0, 0, 0 ], bytes[32..36]);
        assert_eq!([ 0, 0, 0, 0, 0, 0, 0xf0, 0x3f ], bytes[36..44]);
        assert!(bytes[68..].iter().all(|&b| b == 0));
    }

    #[test]
    fn wrong_magic_number() {
        let mut bytes = written(ShapeType::Point, 50, &Envelope::default());
        bytes[3] = 0;
        let mut reader = ReadBuffer::new(Cursor::new(bytes)).unwrap();
        let err = ShapefileHeader::read(&mut reader).unwrap_err();
        assert!(err.to_string().contains("wrong magic number"));
    }

    #[test]
    fn wrong_version() {
        let mut bytes = written(ShapeType::Point, 50, &Envelope::default());
        bytes[28] = 0xe9;
        let mut reader = ReadBuffer::new(Cursor::new(bytes)).unwrap();
        let err = ShapefileHeader::read(&mut reader).unwrap_err();
        assert!(err.to_string().contains("wrong version"));
    }

    #[test]
    fn nonexistent_shape_type() {
        let mut bytes = written(ShapeType::Point, 50, &Envelope::default());
        bytes[32] = 2;
        let mut reader = ReadBuffer::new(Cursor::new(bytes)).unwrap();
        assert!(ShapefileHeader::read(&mut reader).is_err());
    }

    #[test]
    fn truncated_header_is_io_error() {
        let bytes = written(ShapeType::Point, 50, &Envelope::default());
        let mut reader = ReadBuffer::new(Cursor::new(bytes[..60].to_vec())).unwrap();
        assert!(ShapefileHeader::read(&mut reader).is_err());
    }
}
