use std::io::{Read, Seek, Write};
use buffer::{ReadBuffer, WriteBuffer};
use geo::{Geometry, GeometryKind};
use shapefile::header::ShapeType;
use shapefile::shp::ShpError;
use super::{extra_dimensions_length, read_count, read_xy, read_z, write_bbox, write_extra_dimensions, write_xy};
use super::{wrong_family, wrong_geometry, ShapeHandler};

/// MultiPoint records. A lone Point is accepted on write and stored as a
/// one-point set.
#[derive(Debug, Clone, Copy)]
pub struct MultiPointCodec {
    shape_type: ShapeType,
}

impl MultiPointCodec {
    pub fn new(shape_type: ShapeType) -> Result<MultiPointCodec, ShpError> {
        match shape_type {
            ShapeType::MultiPoint | ShapeType::MultiPointM | ShapeType::MultiPointZ => Ok(MultiPointCodec { shape_type: shape_type }),
            _ => Err(wrong_family(shape_type, "MultiPoint, MultiPointM, MultiPointZ")),
        }
    }

    fn check(&self, geometry: &Geometry) -> Result<(), ShpError> {
        match geometry.kind {
            GeometryKind::Point(_) | GeometryKind::MultiPoint(_) => Ok(()),
            _ => Err(wrong_geometry(self.shape_type, geometry)),
        }
    }
}

impl ShapeHandler for MultiPointCodec {
    fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError> {
        self.check(geometry)?;
        let n = geometry.num_points();
        Ok(40 + 16 * n + extra_dimensions_length(self.shape_type, n))
    }

    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError> {
        if record_type == ShapeType::Null {
            return Ok(None);
        }

        buffer.skip(32); // bbox
        let n_points = read_count(buffer, "point count")?;
        let mut coordinates = read_xy(buffer, n_points)?;
        read_z(buffer, self.shape_type, &mut coordinates)?;
        if self.shape_type.has_m() {
            buffer.skip(16 + 8 * n_points as u64);
        }

        Ok(Some(Geometry::new(GeometryKind::MultiPoint(coordinates))))
    }

    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
        self.check(geometry)?;
        let coordinates = geometry.coordinates();

        write_bbox(buffer, geometry)?;
        buffer.put_i32(coordinates.len() as i32)?;
        write_xy(buffer, &coordinates)?;
        write_extra_dimensions(buffer, self.shape_type, &coordinates)
    }
}

#[cfg(test)]
mod test {
    use geo::{Coordinate, Geometry, GeometryKind};
    use shapefile::codec::test::encode_decode;
    use shapefile::header::ShapeType;

    fn multipoint(points: Vec<Coordinate>) -> Geometry {
        Geometry::new(GeometryKind::MultiPoint(points))
    }

    #[test]
    fn three_points() {
        let g = multipoint(vec![ Coordinate::new(0., 0.), Coordinate::new(1., 2.), Coordinate::new(-3., 4.) ]);
        assert_eq!(Some(g.clone()), encode_decode(ShapeType::MultiPoint, &g));
    }

    #[test]
    fn lone_point_becomes_multipoint() {
        let ret = encode_decode(ShapeType::MultiPoint, &Geometry::point(7., 8.));
        assert_eq!(Some(multipoint(vec![ Coordinate::new(7., 8.) ])), ret);
    }

    #[test]
    fn z_values_survive() {
        let g = multipoint(vec![ Coordinate::new_z(0., 0., 5.), Coordinate::new_z(1., 1., -2.) ]);
        assert_eq!(Some(g.clone()), encode_decode(ShapeType::MultiPointZ, &g));
    }

    #[test]
    fn measured_multipoint() {
        let g = multipoint(vec![ Coordinate::new(3., 3.) ]);
        assert_eq!(Some(g.clone()), encode_decode(ShapeType::MultiPointM, &g));
    }

    #[test]
    fn empty_multipoint() {
        let g = multipoint(vec![]);
        assert_eq!(Some(g.clone()), encode_decode(ShapeType::MultiPoint, &g));
    }
}
