use std::io::{Read, Seek, Write};
use buffer::{ReadBuffer, WriteBuffer};
use geo::{Coordinate, Geometry, GeometryKind};
use shapefile::header::ShapeType;
use shapefile::shp::ShpError;
use super::{extra_dimensions_length, read_count, read_parts, read_xy, read_z, write_bbox, write_extra_dimensions, write_parts, write_xy};
use super::{wrong_family, wrong_geometry, ShapeHandler};

/// PolyLine records: one or more parts, each a line string. Always read as
/// a MultiLineString.
#[derive(Debug, Clone, Copy)]
pub struct PolyLineCodec {
    shape_type: ShapeType,
}

impl PolyLineCodec {
    pub fn new(shape_type: ShapeType) -> Result<PolyLineCodec, ShpError> {
        match shape_type {
            ShapeType::PolyLine | ShapeType::PolyLineM | ShapeType::PolyLineZ => Ok(PolyLineCodec { shape_type: shape_type }),
            _ => Err(wrong_family(shape_type, "PolyLine, PolyLineM, PolyLineZ")),
        }
    }

    fn parts<'a>(&self, geometry: &'a Geometry) -> Result<Vec<&'a [Coordinate]>, ShpError> {
        match geometry.kind {
            GeometryKind::LineString(ref line) => Ok(vec![ &line[..] ]),
            GeometryKind::MultiLineString(ref lines) => Ok(lines.iter().map(|l| &l[..]).collect()),
            _ => Err(wrong_geometry(self.shape_type, geometry)),
        }
    }
}

impl ShapeHandler for PolyLineCodec {
    fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError> {
        let parts = self.parts(geometry)?;
        let n = geometry.num_points();
        Ok(44 + 4 * parts.len() + 16 * n + extra_dimensions_length(self.shape_type, n))
    }

    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError> {
        if record_type == ShapeType::Null {
            return Ok(None);
        }

        buffer.skip(32); // bbox
        let n_parts = read_count(buffer, "part count")?;
        let n_points = read_count(buffer, "point count")?;
        let parts = read_parts(buffer, n_parts, n_points)?;

        let mut coordinates = read_xy(buffer, n_points)?;
        read_z(buffer, self.shape_type, &mut coordinates)?;
        if self.shape_type.has_m() {
            buffer.skip(16 + 8 * n_points as u64);
        }

        let lines = parts.iter()
            .map(|&(start, end)| {
                let mut line = coordinates[start..end].to_vec();
                // A one-point part is not a line; repeat the point.
                if line.len() == 1 {
                    let c = line[0];
                    line.push(c);
                }
                line
            })
            .collect();

        Ok(Some(Geometry::new(GeometryKind::MultiLineString(lines))))
    }

    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
        let parts = self.parts(geometry)?;
        let coordinates = geometry.coordinates();

        write_bbox(buffer, geometry)?;
        write_parts(buffer, &parts)?;
        write_xy(buffer, &coordinates)?;
        write_extra_dimensions(buffer, self.shape_type, &coordinates)
    }
}
