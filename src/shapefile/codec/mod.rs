//! One codec per shape-type family.
//!
//! A file commits to a single shape type in its header, so the codec is
//! picked once, when the file is opened, and used for every record. Record
//! payloads start right after the 4-byte shape type tag; `length()` counts
//! that tag but not the 8-byte record header.

use std::f64;
use std::io::{Read, Seek, Write};
use buffer::{ReadBuffer, WriteBuffer};
use geo::{Coordinate, Envelope, Geometry};
use super::header::ShapeType;
use super::shp::ShpError;

mod multipoint;
mod point;
mod polygon;
mod polyline;

pub use self::multipoint::MultiPointCodec;
pub use self::point::PointCodec;
pub use self::polygon::PolygonCodec;
pub use self::polyline::PolyLineCodec;

/// Written in every measure slot. Readers treat anything below -10^38 as
/// "no data".
pub const NO_DATA_MEASURE: f64 = -10E40;

pub trait ShapeHandler {
    fn shape_type(&self) -> ShapeType;

    /// Payload length in bytes, shape type tag included, record header
    /// excluded. Fails if the geometry is not one this codec can encode.
    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError>;

    /// Decodes one record. The reader's cursor must be just past the shape
    /// type tag, and the byte order little-endian.
    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError>;

    /// Encodes one record payload, tag excluded.
    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError>;
}

#[derive(Debug, Clone, Copy)]
pub enum ShapeCodec {
    Point(PointCodec),
    MultiPoint(MultiPointCodec),
    PolyLine(PolyLineCodec),
    Polygon(PolygonCodec),
}

impl ShapeCodec {
    pub fn for_type(shape_type: ShapeType) -> Result<ShapeCodec, ShpError> {
        match shape_type {
            ShapeType::Point | ShapeType::PointM | ShapeType::PointZ => {
                PointCodec::new(shape_type).map(ShapeCodec::Point)
            }
            ShapeType::MultiPoint | ShapeType::MultiPointM | ShapeType::MultiPointZ => {
                MultiPointCodec::new(shape_type).map(ShapeCodec::MultiPoint)
            }
            ShapeType::PolyLine | ShapeType::PolyLineM | ShapeType::PolyLineZ => {
                PolyLineCodec::new(shape_type).map(ShapeCodec::PolyLine)
            }
            ShapeType::Polygon | ShapeType::PolygonM | ShapeType::PolygonZ => {
                PolygonCodec::new(shape_type).map(ShapeCodec::Polygon)
            }
            ShapeType::Null | ShapeType::MultiPatch => {
                Err(ShpError::UnsupportedShape(format!("No codec for shape type {}", shape_type)))
            }
        }
    }
}

impl ShapeHandler for ShapeCodec {
    fn shape_type(&self) -> ShapeType {
        match *self {
            ShapeCodec::Point(ref c) => c.shape_type(),
            ShapeCodec::MultiPoint(ref c) => c.shape_type(),
            ShapeCodec::PolyLine(ref c) => c.shape_type(),
            ShapeCodec::Polygon(ref c) => c.shape_type(),
        }
    }

    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError> {
        match *self {
            ShapeCodec::Point(ref c) => c.length(geometry),
            ShapeCodec::MultiPoint(ref c) => c.length(geometry),
            ShapeCodec::PolyLine(ref c) => c.length(geometry),
            ShapeCodec::Polygon(ref c) => c.length(geometry),
        }
    }

    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError> {
        match *self {
            ShapeCodec::Point(ref c) => c.read(buffer, record_type),
            ShapeCodec::MultiPoint(ref c) => c.read(buffer, record_type),
            ShapeCodec::PolyLine(ref c) => c.read(buffer, record_type),
            ShapeCodec::Polygon(ref c) => c.read(buffer, record_type),
        }
    }

    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
        match *self {
            ShapeCodec::Point(ref c) => c.write(buffer, geometry),
            ShapeCodec::MultiPoint(ref c) => c.write(buffer, geometry),
            ShapeCodec::PolyLine(ref c) => c.write(buffer, geometry),
            ShapeCodec::Polygon(ref c) => c.write(buffer, geometry),
        }
    }
}

fn wrong_family(shape_type: ShapeType, expected: &str) -> ShpError {
    ShpError::UnsupportedShape(format!("Codec constructed with shape type {}, expected one of {}", shape_type, expected))
}

fn wrong_geometry(shape_type: ShapeType, geometry: &Geometry) -> ShpError {
    ShpError::UnsupportedShape(format!("A {} cannot be stored in a {} file", geometry.type_name(), shape_type))
}

/// Bytes taken by the z and measure blocks of a multi-coordinate record.
fn extra_dimensions_length(shape_type: ShapeType, n_points: usize) -> usize {
    let block = 16 + 8 * n_points;
    match (shape_type.has_z(), shape_type.has_m()) {
        (true, _) => 2 * block,
        (false, true) => block,
        (false, false) => 0,
    }
}

/// `0.0` stands in for a missing elevation.
fn z_or_zero(z: f64) -> f64 {
    if z.is_nan() { 0. } else { z }
}

fn z_range(coordinates: &[Coordinate]) -> (f64, f64) {
    let mut zs = coordinates.iter().map(|c| c.z).filter(|z| !z.is_nan());
    match zs.next() {
        None => (0., 0.),
        Some(first) => zs.fold((first, first), |(lo, hi), z| (lo.min(z), hi.max(z))),
    }
}

fn write_bbox<W: Write>(buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
    let bbox = geometry.envelope().unwrap_or_else(Envelope::default);
    buffer.put_f64(bbox.min_x)?;
    buffer.put_f64(bbox.min_y)?;
    buffer.put_f64(bbox.max_x)?;
    buffer.put_f64(bbox.max_y)?;
    Ok(())
}

fn write_xy<W: Write>(buffer: &mut WriteBuffer<W>, coordinates: &[Coordinate]) -> Result<(), ShpError> {
    for c in coordinates {
        buffer.put_f64(c.x)?;
        buffer.put_f64(c.y)?;
    }
    Ok(())
}

/// Writes the z block (Z variants) and the measure block (M and Z variants).
fn write_extra_dimensions<W: Write>(buffer: &mut WriteBuffer<W>, shape_type: ShapeType, coordinates: &[Coordinate]) -> Result<(), ShpError> {
    if shape_type.has_z() {
        let (lo, hi) = z_range(coordinates);
        buffer.put_f64(lo)?;
        buffer.put_f64(hi)?;
        for c in coordinates {
            buffer.put_f64(z_or_zero(c.z))?;
        }
    }

    if shape_type.has_m() {
        buffer.put_f64(NO_DATA_MEASURE)?;
        buffer.put_f64(NO_DATA_MEASURE)?;
        for _ in coordinates {
            buffer.put_f64(NO_DATA_MEASURE)?;
        }
    }
    Ok(())
}

/// Fails unless `n_items` items of `item_size` bytes fit in what is left of
/// the file. Counts come straight from the record, so they are checked before
/// anything is allocated for them.
fn check_fits<R: Read + Seek>(buffer: &ReadBuffer<R>, n_items: usize, item_size: u64, what: &str) -> Result<(), ShpError> {
    let needed = (n_items as u64).saturating_mul(item_size);
    if needed > buffer.remaining() {
        return Err(ShpError::ParseError(format!("Record declares {} {}, which need {} bytes, but only {} remain in the file", n_items, what, needed, buffer.remaining())));
    }
    Ok(())
}

fn read_xy<R: Read + Seek>(buffer: &mut ReadBuffer<R>, n_points: usize) -> Result<Vec<Coordinate>, ShpError> {
    check_fits(buffer, n_points, 16, "points")?;
    let mut coordinates = Vec::with_capacity(n_points);
    for _ in 0..n_points {
        let x = buffer.get_f64()?;
        let y = buffer.get_f64()?;
        coordinates.push(Coordinate::new(x, y));
    }
    Ok(coordinates)
}

/// Reads the z block into `coordinates` if the shape type has one. Measures
/// are never materialized.
fn read_z<R: Read + Seek>(buffer: &mut ReadBuffer<R>, shape_type: ShapeType, coordinates: &mut [Coordinate]) -> Result<(), ShpError> {
    if shape_type.has_z() {
        buffer.skip(16);
        for c in coordinates.iter_mut() {
            c.z = buffer.get_f64()?;
        }
    }
    Ok(())
}

fn read_count<R: Read + Seek>(buffer: &mut ReadBuffer<R>, what: &str) -> Result<usize, ShpError> {
    let n = buffer.get_i32()?;
    if n < 0 {
        return Err(ShpError::ParseError(format!("Record has a negative {}: {}", what, n)));
    }
    Ok(n as usize)
}

/// Reads the part table of a polyline or polygon record, and returns each
/// part as a `[start, end)` point range.
fn read_parts<R: Read + Seek>(buffer: &mut ReadBuffer<R>, n_parts: usize, n_points: usize) -> Result<Vec<(usize, usize)>, ShpError> {
    check_fits(buffer, n_parts, 4, "parts")?;
    let mut starts = Vec::with_capacity(n_parts);
    for _ in 0..n_parts {
        starts.push(read_count(buffer, "part offset")?);
    }

    let mut parts = Vec::with_capacity(n_parts);
    for (i, &start) in starts.iter().enumerate() {
        let end = if i + 1 == n_parts { n_points } else { starts[i + 1] };
        if start > end || end > n_points {
            return Err(ShpError::ParseError(format!("Record has a part with points {}-{}, but there are only {} points in the record", start, end, n_points)));
        }
        parts.push((start, end));
    }
    Ok(parts)
}

/// Writes part count, point count and part start offsets.
fn write_parts<W: Write>(buffer: &mut WriteBuffer<W>, parts: &[&[Coordinate]]) -> Result<(), ShpError> {
    let n_points: usize = parts.iter().map(|p| p.len()).sum();
    buffer.put_i32(parts.len() as i32)?;
    buffer.put_i32(n_points as i32)?;
    let mut start = 0;
    for part in parts {
        buffer.put_i32(start as i32)?;
        start += part.len();
    }
    Ok(())
}
