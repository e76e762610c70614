use std::f64;
use std::io::{Read, Seek, Write};
use buffer::{ReadBuffer, WriteBuffer};
use geo::{Coordinate, Geometry, GeometryKind};
use shapefile::header::ShapeType;
use shapefile::shp::ShpError;
use super::{wrong_family, wrong_geometry, z_or_zero, ShapeHandler, NO_DATA_MEASURE};

/// Point, PointM and PointZ records: one coordinate.
#[derive(Debug, Clone, Copy)]
pub struct PointCodec {
    shape_type: ShapeType,
}

impl PointCodec {
    pub fn new(shape_type: ShapeType) -> Result<PointCodec, ShpError> {
        match shape_type {
            ShapeType::Point | ShapeType::PointM | ShapeType::PointZ => Ok(PointCodec { shape_type: shape_type }),
            _ => Err(wrong_family(shape_type, "Point, PointM, PointZ")),
        }
    }
}

impl ShapeHandler for PointCodec {
    fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError> {
        match geometry.kind {
            GeometryKind::Point(_) => {}
            _ => return Err(wrong_geometry(self.shape_type, geometry)),
        }

        Ok(match self.shape_type {
            ShapeType::PointZ => 36,
            ShapeType::PointM => 28,
            _ => 20,
        })
    }

    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError> {
        if record_type == ShapeType::Null {
            return Ok(None);
        }

        let x = buffer.get_f64()?;
        let y = buffer.get_f64()?;
        let z = match self.shape_type {
            ShapeType::PointZ => buffer.get_f64()?,
            _ => f64::NAN,
        };
        if self.shape_type.has_m() {
            buffer.skip(8);
        }

        Ok(Some(Geometry::new(GeometryKind::Point(Coordinate::new_z(x, y, z)))))
    }

    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
        let c = match geometry.kind {
            GeometryKind::Point(c) => c,
            _ => return Err(wrong_geometry(self.shape_type, geometry)),
        };

        buffer.put_f64(c.x)?;
        buffer.put_f64(c.y)?;
        if self.shape_type.has_z() {
            buffer.put_f64(z_or_zero(c.z))?;
        }
        if self.shape_type.has_m() {
            buffer.put_f64(NO_DATA_MEASURE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use geo::{Geometry, GeometryKind};
    use shapefile::codec::test::encode_decode;
    use shapefile::header::ShapeType;
    use super::PointCodec;

    #[test]
    fn plain_point() {
        let p = Geometry::point(10.5, -3.25);
        assert_eq!(Some(p.clone()), encode_decode(ShapeType::Point, &p));
    }

    #[test]
    fn missing_z_reads_back_as_zero() {
        let ret = encode_decode(ShapeType::PointZ, &Geometry::point(1., 2.)).unwrap();
        match ret.kind {
            GeometryKind::Point(c) => {
                assert_eq!(1., c.x);
                assert_eq!(2., c.y);
                assert_eq!(0., c.z);
            }
            _ => panic!("expected a point"),
        }
    }

    #[test]
    fn point_z() {
        let p = Geometry::point_z(1., 2., 3.);
        assert_eq!(Some(p.clone()), encode_decode(ShapeType::PointZ, &p));
    }

    #[test]
    fn measure_is_dropped() {
        let p = Geometry::point(4., 5.);
        assert_eq!(Some(p.clone()), encode_decode(ShapeType::PointM, &p));
    }

    #[test]
    fn refuses_other_families() {
        assert!(PointCodec::new(ShapeType::PolyLine).is_err());
        assert!(PointCodec::new(ShapeType::MultiPointZ).is_err());
    }

    #[test]
    fn refuses_lines() {
        use shapefile::codec::ShapeHandler;
        let codec = PointCodec::new(ShapeType::Point).unwrap();
        let line = Geometry::new(GeometryKind::LineString(vec![]));
        assert!(codec.length(&line).is_err());
    }
}
