use std::io::{Read, Seek, Write};
use buffer::{ReadBuffer, WriteBuffer};
use geo::{Coordinate, Envelope, Geometry, GeometryKind, Polygon};
use geo::winding::{ring_contains, winding_order, with_winding_order, WindingOrder};
use shapefile::header::ShapeType;
use shapefile::shp::ShpError;
use super::{extra_dimensions_length, read_count, read_parts, read_xy, read_z, write_bbox, write_extra_dimensions, write_parts, write_xy};
use super::{wrong_family, wrong_geometry, ShapeHandler};

/// Polygon records: a flat list of rings. Clockwise rings are shells and
/// counter-clockwise rings are holes, so the writer reorients rings and the
/// reader has to work out which shell owns each hole.
#[derive(Debug, Clone, Copy)]
pub struct PolygonCodec {
    shape_type: ShapeType,
}

impl PolygonCodec {
    pub fn new(shape_type: ShapeType) -> Result<PolygonCodec, ShpError> {
        match shape_type {
            ShapeType::Polygon | ShapeType::PolygonM | ShapeType::PolygonZ => Ok(PolygonCodec { shape_type: shape_type }),
            _ => Err(wrong_family(shape_type, "Polygon, PolygonM, PolygonZ")),
        }
    }

    fn polygons<'a>(&self, geometry: &'a Geometry) -> Result<Vec<&'a Polygon>, ShpError> {
        match geometry.kind {
            GeometryKind::Polygon(ref p) => Ok(vec![ p ]),
            GeometryKind::MultiPolygon(ref ps) => Ok(ps.iter().collect()),
            _ => Err(wrong_geometry(self.shape_type, geometry)),
        }
    }
}

/// Every ring in storage order: each shell clockwise, followed by its holes
/// counter-clockwise.
fn oriented_rings(polygons: &[&Polygon]) -> Vec<Vec<Coordinate>> {
    let mut rings = Vec::new();
    for polygon in polygons {
        rings.push(with_winding_order(&polygon.exterior, WindingOrder::Clockwise));
        for hole in polygon.interiors.iter() {
            rings.push(with_winding_order(hole, WindingOrder::CounterClockwise));
        }
    }
    rings
}

fn ring_envelope(ring: &[Coordinate]) -> Envelope {
    Envelope::of(ring).unwrap_or_default()
}

/// Index of the smallest shell whose envelope holds the hole's envelope and
/// whose ring holds a hole vertex that is not also a shell vertex.
fn find_owner(polygons: &[Polygon], hole: &[Coordinate]) -> Option<usize> {
    let hole_env = ring_envelope(hole);
    let mut best: Option<(usize, Envelope)> = None;

    for (i, polygon) in polygons.iter().enumerate() {
        let shell = &polygon.exterior;
        let shell_env = ring_envelope(shell);
        if !shell_env.contains(&hole_env) {
            continue;
        }

        let sample = hole.iter()
            .find(|c| !shell.iter().any(|s| s.equals_2d(c)))
            .unwrap_or(&hole[0]);
        if !ring_contains(shell, sample) {
            continue;
        }

        let smaller = match best {
            None => true,
            Some((_, ref best_env)) => best_env.contains(&shell_env),
        };
        if smaller {
            best = Some((i, shell_env));
        }
    }

    best.map(|(i, _)| i)
}

/// Turns a flat ring list into polygons.
fn assemble(rings: Vec<Vec<Coordinate>>) -> Vec<Polygon> {
    let mut shells = Vec::new();
    let mut holes = Vec::new();
    for ring in rings {
        match winding_order(&ring) {
            WindingOrder::Clockwise => shells.push(ring),
            WindingOrder::CounterClockwise => holes.push(ring),
        }
    }

    if shells.len() == 1 {
        let shell = shells.remove(0);
        return vec![ Polygon::new(shell, holes) ];
    }

    let mut polygons: Vec<Polygon> = shells.into_iter().map(|s| Polygon::new(s, vec![])).collect();
    for hole in holes {
        match find_owner(&polygons, &hole) {
            Some(i) => polygons[i].interiors.push(hole),
            None => {
                // Nothing encloses it: it was a shell wound the wrong way.
                let shell = with_winding_order(&hole, WindingOrder::Clockwise);
                polygons.push(Polygon::new(shell, vec![]));
            }
        }
    }
    polygons
}

impl ShapeHandler for PolygonCodec {
    fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn length(&self, geometry: &Geometry) -> Result<usize, ShpError> {
        let polygons = self.polygons(geometry)?;
        let n_rings: usize = polygons.iter().map(|p| 1 + p.interiors.len()).sum();
        let n = geometry.num_points();
        Ok(44 + 4 * n_rings + 16 * n + extra_dimensions_length(self.shape_type, n))
    }

    fn read<R: Read + Seek>(&self, buffer: &mut ReadBuffer<R>, record_type: ShapeType) -> Result<Option<Geometry>, ShpError> {
        if record_type == ShapeType::Null {
            return Ok(None);
        }

        buffer.skip(32); // bbox
        let n_rings = read_count(buffer, "ring count")?;
        let n_points = read_count(buffer, "point count")?;
        let parts = read_parts(buffer, n_rings, n_points)?;

        let mut coordinates = read_xy(buffer, n_points)?;
        read_z(buffer, self.shape_type, &mut coordinates)?;
        if self.shape_type.has_m() {
            buffer.skip(16 + 8 * n_points as u64);
        }

        let mut rings = Vec::with_capacity(parts.len());
        for &(start, end) in parts.iter() {
            let mut ring = coordinates[start..end].to_vec();
            let open = match (ring.first(), ring.last()) {
                (Some(first), Some(last)) => !first.equals_2d(last),
                _ => false,
            };
            if open {
                let first = ring[0];
                ring.push(first);
            }
            if ring.len() >= 4 {
                rings.push(ring);
            }
        }

        Ok(Some(Geometry::new(GeometryKind::MultiPolygon(assemble(rings)))))
    }

    fn write<W: Write>(&self, buffer: &mut WriteBuffer<W>, geometry: &Geometry) -> Result<(), ShpError> {
        let polygons = self.polygons(geometry)?;
        let rings = oriented_rings(&polygons);
        let parts: Vec<&[Coordinate]> = rings.iter().map(|r| &r[..]).collect();
        let coordinates: Vec<Coordinate> = rings.iter().flat_map(|r| r.iter().cloned()).collect();

        write_bbox(buffer, geometry)?;
        write_parts(buffer, &parts)?;
        write_xy(buffer, &coordinates)?;
        write_extra_dimensions(buffer, self.shape_type, &coordinates)
    }
}

#[cfg(test)]
mod test {
    use geo::{Coordinate, Geometry, GeometryKind, Polygon};
    use shapefile::codec::test::encode_decode;
    use shapefile::header::ShapeType;

    fn ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect()
    }

    /// Clockwise square.
    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coordinate> {
        ring(&[ (x0, y0), (x0, y0 + size), (x0 + size, y0 + size), (x0 + size, y0), (x0, y0) ])
    }

    /// Counter-clockwise square.
    fn ccw_square(x0: f64, y0: f64, size: f64) -> Vec<Coordinate> {
        let mut r = square(x0, y0, size);
        r.reverse();
        r
    }

    fn multi(polygons: Vec<Polygon>) -> Geometry {
        Geometry::new(GeometryKind::MultiPolygon(polygons))
    }

    fn read_back(shape_type: ShapeType, polygons: Vec<Polygon>) -> Vec<Polygon> {
        match encode_decode(shape_type, &multi(polygons)).unwrap().kind {
            GeometryKind::MultiPolygon(ps) => ps,
            _ => panic!("expected a multipolygon"),
        }
    }

    #[test]
    fn polygon_with_hole() {
        let p = Polygon::new(square(0., 0., 10.), vec![ ccw_square(2., 2., 2.) ]);
        let g = Geometry::new(GeometryKind::Polygon(p.clone()));
        assert_eq!(Some(multi(vec![ p ])), encode_decode(ShapeType::Polygon, &g));
    }

    #[test]
    fn rings_are_reoriented_on_write() {
        let p = Polygon::new(ccw_square(0., 0., 10.), vec![ square(2., 2., 2.) ]);
        let ret = read_back(ShapeType::Polygon, vec![ p ]);
        assert_eq!(vec![ Polygon::new(square(0., 0., 10.), vec![ ccw_square(2., 2., 2.) ]) ], ret);
    }

    #[test]
    fn open_rings_are_closed_and_short_rings_dropped() {
        let p = Polygon::new(
            ring(&[ (0., 0.), (0., 1.), (1., 1.), (1., 0.) ]),
            vec![ ring(&[ (5., 5.), (6., 6.) ]) ]
        );
        let ret = read_back(ShapeType::Polygon, vec![ p ]);
        assert_eq!(vec![ Polygon::new(square(0., 0., 1.), vec![]) ], ret);
    }

    #[test]
    fn holes_find_their_shell() {
        let a = Polygon::new(square(0., 0., 10.), vec![]);
        let b = Polygon::new(square(20., 0., 10.), vec![ ccw_square(22., 2., 2.) ]);
        let ret = read_back(ShapeType::Polygon, vec![ a.clone(), b.clone() ]);
        assert_eq!(vec![ a, b ], ret);
    }

    #[test]
    fn smallest_enclosing_shell_wins() {
        let big = Polygon::new(square(0., 0., 100.), vec![]);
        let small = Polygon::new(square(10., 10., 10.), vec![ ccw_square(12., 12., 2.) ]);
        let ret = read_back(ShapeType::Polygon, vec![ big.clone(), small.clone() ]);
        assert_eq!(vec![ big, small ], ret);
    }

    #[test]
    fn orphan_hole_becomes_shell() {
        let a = Polygon::new(square(0., 0., 10.), vec![]);
        let b = Polygon::new(square(20., 0., 10.), vec![ ccw_square(50., 50., 2.) ]);
        let ret = read_back(ShapeType::Polygon, vec![ a.clone(), b ]);
        assert_eq!(3, ret.len());
        assert_eq!(a, ret[0]);
        assert_eq!(square(50., 50., 2.), ret[2].exterior);
    }

    #[test]
    fn polygon_z() {
        let shell = vec![
            Coordinate::new_z(0., 0., 1.),
            Coordinate::new_z(0., 1., 2.),
            Coordinate::new_z(1., 1., 3.),
            Coordinate::new_z(0., 0., 1.),
        ];
        let p = Polygon::new(shell, vec![]);
        assert_eq!(vec![ p.clone() ], read_back(ShapeType::PolygonZ, vec![ p ]));
    }

    #[test]
    fn empty_multipolygon() {
        assert_eq!(Vec::<Polygon>::new(), read_back(ShapeType::PolygonM, vec![]));
    }
}
