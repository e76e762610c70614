//! Reads and writes ESRI ".shp" geometry files (and, when writing, the ".shx"
//! index alongside them).

use std::error;
use std::fmt;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use buffer::{Endian, ReadBuffer, WriteBuffer};
use geo::{Envelope, Geometry};
use super::codec::{ShapeCodec, ShapeHandler};
use super::header::{ShapeType, ShapefileHeader, SHP_HEADER_LENGTH};

const SHP_RECORD_HEADER_LENGTH: u64 = 8;
const SHX_RECORD_LENGTH: i32 = 8;

#[derive(Debug)]
pub enum ShpError {
    IOError(io::Error),
    ParseError(String),
    UnsupportedShape(String),
}

impl error::Error for ShpError {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            ShpError::IOError(ref err) => Some(err),
            ShpError::ParseError(_) | ShpError::UnsupportedShape(_) => None,
        }
    }
}

impl fmt::Display for ShpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShpError::IOError(ref err) => err.fmt(f),
            ShpError::ParseError(ref description) => write!(f, "Parse error: {}", description),
            ShpError::UnsupportedShape(ref description) => write!(f, "Unsupported shape: {}", description),
        }
    }
}

impl From<io::Error> for ShpError {
    fn from(err: io::Error) -> ShpError {
        ShpError::IOError(err)
    }
}

/// Random-access ".shp" reader.
///
/// It does not know where records start: ask an `IndexFile` for the byte
/// offset of a row, then call `geom_at()`.
#[derive(Debug)]
pub struct ShpReader<R> {
    header: ShapefileHeader,
    codec: ShapeCodec,
    buffer: ReadBuffer<R>,
}

impl<R: Read + Seek> ShpReader<R> {
    pub fn new(channel: R, buffer_size: usize) -> Result<ShpReader<R>, ShpError> {
        let mut buffer = ReadBuffer::with_capacity(channel, buffer_size)?;
        let header = ShapefileHeader::read(&mut buffer)?;
        let codec = ShapeCodec::for_type(header.shape_type)?;
        Ok(ShpReader {
            header: header,
            codec: codec,
            buffer: buffer,
        })
    }

    pub fn header(&self) -> &ShapefileHeader {
        &self.header
    }

    /// Decodes the record starting at byte `offset`. A record of type Null
    /// yields `None`.
    pub fn geom_at(&mut self, offset: u64) -> Result<Option<Geometry>, ShpError> {
        self.buffer.set_position(offset);
        self.buffer.skip(SHP_RECORD_HEADER_LENGTH);

        self.buffer.order(Endian::Little);
        let type_id = self.buffer.get_i32()?;
        let record_type = match ShapeType::from_id(type_id) {
            Some(t) => t,
            None => return Err(ShpError::ParseError(format!("Record at offset {} has nonexistent shape type {}", offset, type_id))),
        };

        if record_type != ShapeType::Null && record_type != self.header.shape_type {
            return Err(ShpError::ParseError(format!("Shape type changed illegally from {} to {}", self.header.shape_type, record_type)));
        }

        self.codec.read(&mut self.buffer, record_type)
    }
}

/// Streaming ".shp" + ".shx" writer.
///
/// Provisional headers go out in `new()`; the real ones, with the final file
/// length and bounding box, are written by `close()`, which is why this
/// writer carries the running record count, offset and envelope and why
/// `close()` consumes it.
#[derive(Debug)]
pub struct ShpWriter<W: Write + Seek> {
    shp: WriteBuffer<W>,
    shx: WriteBuffer<W>,
    codec: ShapeCodec,
    record_count: i32,
    offset: i32,
    bounds: Option<Envelope>,
    buffer_size: usize,
}

impl<W: Write + Seek> ShpWriter<W> {
    pub fn new(shp: W, shx: W, shape_type: ShapeType, buffer_size: usize) -> Result<ShpWriter<W>, ShpError> {
        let codec = ShapeCodec::for_type(shape_type)?;
        let mut writer = ShpWriter {
            shp: WriteBuffer::with_capacity(shp, buffer_size),
            shx: WriteBuffer::with_capacity(shx, buffer_size),
            codec: codec,
            record_count: 0,
            offset: (SHP_HEADER_LENGTH / 2) as i32,
            bounds: None,
            buffer_size: buffer_size,
        };

        let header_words = (SHP_HEADER_LENGTH / 2) as i32;
        ShapefileHeader::write(&mut writer.shp, shape_type, header_words, &Envelope::default())?;
        ShapefileHeader::write(&mut writer.shx, shape_type, header_words, &Envelope::default())?;
        Ok(writer)
    }

    pub fn shape_type(&self) -> ShapeType {
        self.codec.shape_type()
    }

    pub fn record_count(&self) -> i32 {
        self.record_count
    }

    pub fn bounds(&self) -> Option<Envelope> {
        self.bounds
    }

    /// Checks that `geometry` is something this file's codec can encode,
    /// without writing anything.
    pub fn check(&self, geometry: &Geometry) -> Result<(), ShpError> {
        self.codec.length(geometry).map(|_| ())
    }

    pub fn write_geometry(&mut self, geometry: &Geometry) -> Result<(), ShpError> {
        let length = self.codec.length(geometry)? as i32;

        if let Some(env) = geometry.envelope() {
            match self.bounds {
                Some(ref mut bounds) => bounds.expand_to_include(&env),
                None => self.bounds = Some(env),
            }
        }

        let shape_type = self.codec.shape_type();
        self.write_record_header(length / 2, shape_type)?;
        self.codec.write(&mut self.shp, geometry)
    }

    /// Writes a Null-type record: four bytes of shape type and nothing else.
    pub fn write_null(&mut self) -> Result<(), ShpError> {
        self.write_record_header(2, ShapeType::Null)
    }

    fn write_record_header(&mut self, length_words: i32, shape_type: ShapeType) -> Result<(), ShpError> {
        self.record_count += 1;

        self.shp.order(Endian::Big);
        self.shp.put_i32(self.record_count)?;
        self.shp.put_i32(length_words)?;
        self.shp.order(Endian::Little);
        self.shp.put_i32(shape_type.id())?;

        self.shx.order(Endian::Big);
        self.shx.put_i32(self.offset)?;
        self.shx.put_i32(length_words)?;
        self.offset += length_words + (SHP_RECORD_HEADER_LENGTH / 2) as i32;
        Ok(())
    }

    /// Flushes everything and rewrites both headers with the final length
    /// and bounding box.
    pub fn close(self) -> Result<(), ShpError> {
        let shape_type = self.codec.shape_type();
        let shp_length = (self.shp.written() / 2) as i32;
        let shx_length = (SHP_HEADER_LENGTH as i32 + self.record_count * SHX_RECORD_LENGTH) / 2;
        let bounds = self.bounds.unwrap_or_default();

        let mut shp = self.shp.into_inner()?;
        let mut shx = self.shx.into_inner()?;

        rewrite_header(&mut shp, shape_type, shp_length, &bounds, self.buffer_size)?;
        rewrite_header(&mut shx, shape_type, shx_length, &bounds, self.buffer_size)?;

        debug!(records = self.record_count, shape_type = %shape_type, "closed shapefile writer");
        Ok(())
    }
}

fn rewrite_header<W: Write + Seek>(channel: &mut W, shape_type: ShapeType, file_length: i32, bbox: &Envelope, buffer_size: usize) -> Result<(), ShpError> {
    channel.seek(SeekFrom::Start(0))?;
    let mut buffer = WriteBuffer::with_capacity(channel, buffer_size);
    ShapefileHeader::write(&mut buffer, shape_type, file_length, bbox)?;
    buffer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;
    use geo::{Envelope, Geometry};
    use shapefile::header::{ShapeType, ShapefileHeader};
    use buffer::ReadBuffer;
    use super::{ShpReader, ShpWriter};

    fn write_points(points: &[(f64, f64)]) -> (Vec<u8>, Vec<u8>) {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        {
            let mut writer = ShpWriter::new(&mut shp, &mut shx, ShapeType::Point, 64).unwrap();
            for &(x, y) in points {
                writer.write_geometry(&Geometry::point(x, y)).unwrap();
            }
            writer.close().unwrap();
        }
        (shp.into_inner(), shx.into_inner())
    }

    #[test]
    fn final_header_has_length_and_bounds() {
        let (shp, shx) = write_points(&[ (0., 0.), (5., 5.), (-1., 2.) ]);

        // 100 header + 3 * (8 record header + 20 payload)
        assert_eq!(184, shp.len());
        assert_eq!(124, shx.len());

        let header = ShapefileHeader::read(&mut ReadBuffer::new(Cursor::new(shp)).unwrap()).unwrap();
        assert_eq!(92, header.file_length);
        assert_eq!(ShapeType::Point, header.shape_type);
        assert_eq!(Envelope::new(-1., 0., 5., 5.), header.bbox);

        let header = ShapefileHeader::read(&mut ReadBuffer::new(Cursor::new(shx)).unwrap()).unwrap();
        assert_eq!(62, header.file_length);
    }

    #[test]
    fn record_headers_are_big_endian() {
        let (shp, shx) = write_points(&[ (1., 2.) ]);
        assert_eq!([ 0, 0, 0, 1 ], shp[100..104]);
        assert_eq!([ 0, 0, 0, 10 ], shp[104..108]);
        assert_eq!([ 1, 0, 0, 0 ], shp[108..112]);
        assert_eq!([ 0, 0, 0, 50, 0, 0, 0, 10 ], shx[100..108]);
    }

    #[test]
    fn read_back_by_offset() {
        let (shp, _) = write_points(&[ (0., 0.), (10.5, -3.25) ]);
        let mut reader = ShpReader::new(Cursor::new(shp), 32).unwrap();
        assert_eq!(Some(Geometry::point(0., 0.)), reader.geom_at(100).unwrap());
        assert_eq!(Some(Geometry::point(10.5, -3.25)), reader.geom_at(128).unwrap());
    }

    #[test]
    fn null_record_reads_as_none() {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        {
            let mut writer = ShpWriter::new(&mut shp, &mut shx, ShapeType::Point, 64).unwrap();
            writer.write_null().unwrap();
            writer.write_geometry(&Geometry::point(1., 1.)).unwrap();
            writer.close().unwrap();
        }
        let mut reader = ShpReader::new(Cursor::new(shp.into_inner()), 64).unwrap();
        assert_eq!(None, reader.geom_at(100).unwrap());
        assert_eq!(Some(Geometry::point(1., 1.)), reader.geom_at(112).unwrap());
        assert_eq!(Envelope::new(1., 1., 1., 1.), reader.header().bbox);
    }

    #[test]
    fn wrong_geometry_kind_writes_nothing() {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        let mut writer = ShpWriter::new(&mut shp, &mut shx, ShapeType::Point, 64).unwrap();
        let line = Geometry::new(::geo::GeometryKind::LineString(vec![]));
        assert!(writer.write_geometry(&line).is_err());
        assert_eq!(0, writer.record_count());
        assert_eq!(None, writer.bounds());
    }

    #[test]
    fn record_type_must_match_header() {
        let (mut shp, _) = write_points(&[ (1., 2.) ]);
        shp[108] = 8;
        let mut reader = ShpReader::new(Cursor::new(shp), 64).unwrap();
        let err = reader.geom_at(100).unwrap_err();
        assert!(err.to_string().contains("changed illegally"));
    }
}
