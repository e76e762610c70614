//! Geometry values carried in the geometry column of a row.
//!
//! Coordinates are plain `f64` pairs with an optional elevation. Shapefiles
//! have no use for a richer model: every record is a point, a set of points,
//! a set of lines or a set of polygons.

use std::f64;
use std::fmt;

pub mod winding;

pub use self::winding::WindingOrder;

/// A position. `z` is NaN when the coordinate has no elevation.
#[derive(Clone, Copy, Debug)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Coordinate {
        Coordinate { x: x, y: y, z: f64::NAN }
    }

    pub fn new_z(x: f64, y: f64, z: f64) -> Coordinate {
        Coordinate { x: x, y: y, z: z }
    }

    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }

    pub fn equals_2d(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Two missing elevations are equal, so a 2D coordinate equals itself.
impl PartialEq for Coordinate {
    fn eq(&self, other: &Coordinate) -> bool {
        self.equals_2d(other) && (self.z == other.z || (self.z.is_nan() && other.z.is_nan()))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_z() {
            write!(f, "{} {} {}", self.x, self.y, self.z)
        } else {
            write!(f, "{} {}", self.x, self.y)
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
        Envelope { min_x: min_x, min_y: min_y, max_x: max_x, max_y: max_y }
    }

    /// The box around `coordinates`, or `None` if there are none.
    pub fn of(coordinates: &[Coordinate]) -> Option<Envelope> {
        let mut iter = coordinates.iter();
        iter.next().map(|first| {
            let mut env = Envelope::new(first.x, first.y, first.x, first.y);
            for c in iter {
                env.expand_to_include_coordinate(c);
            }
            env
        })
    }

    pub fn expand_to_include_coordinate(&mut self, c: &Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn expand_to_include(&mut self, other: &Envelope) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn contains(&self, other: &Envelope) -> bool {
        other.min_x >= self.min_x && other.max_x <= self.max_x
            && other.min_y >= self.min_y && other.max_y <= self.max_y
    }
}

impl Default for Envelope {
    fn default() -> Envelope {
        Envelope::new(0., 0., 0., 0.)
    }
}

/// A shell plus any number of holes. Rings are closed: first == last.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Coordinate>,
    pub interiors: Vec<Vec<Coordinate>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coordinate>, interiors: Vec<Vec<Coordinate>>) -> Polygon {
        Polygon { exterior: exterior, interiors: interiors }
    }

    pub fn rings(&self) -> Vec<&[Coordinate]> {
        let mut rings: Vec<&[Coordinate]> = Vec::with_capacity(1 + self.interiors.len());
        rings.push(&self.exterior);
        for ring in self.interiors.iter() {
            rings.push(ring);
        }
        rings
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeometryKind {
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

/// A geometry tagged with its spatial reference identifier.
///
/// The SRID never reaches the `.shp` bytes; the driver stamps it on every
/// geometry it reads.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub srid: i32,
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Geometry {
        Geometry { kind: kind, srid: 0 }
    }

    pub fn point(x: f64, y: f64) -> Geometry {
        Geometry::new(GeometryKind::Point(Coordinate::new(x, y)))
    }

    pub fn point_z(x: f64, y: f64, z: f64) -> Geometry {
        Geometry::new(GeometryKind::Point(Coordinate::new_z(x, y, z)))
    }

    pub fn with_srid(mut self, srid: i32) -> Geometry {
        self.srid = srid;
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            GeometryKind::Point(_) => "Point",
            GeometryKind::MultiPoint(_) => "MultiPoint",
            GeometryKind::LineString(_) => "LineString",
            GeometryKind::MultiLineString(_) => "MultiLineString",
            GeometryKind::Polygon(_) => "Polygon",
            GeometryKind::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// All coordinates, in storage order: polygons list each shell before its
    /// holes.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self.kind {
            GeometryKind::Point(c) => vec![ c ],
            GeometryKind::MultiPoint(ref cs) | GeometryKind::LineString(ref cs) => cs.clone(),
            GeometryKind::MultiLineString(ref lines) => lines.iter().flat_map(|l| l.iter().cloned()).collect(),
            GeometryKind::Polygon(ref p) => polygon_coordinates(p),
            GeometryKind::MultiPolygon(ref ps) => ps.iter().flat_map(|p| polygon_coordinates(p)).collect(),
        }
    }

    pub fn num_points(&self) -> usize {
        match self.kind {
            GeometryKind::Point(_) => 1,
            GeometryKind::MultiPoint(ref cs) | GeometryKind::LineString(ref cs) => cs.len(),
            GeometryKind::MultiLineString(ref lines) => lines.iter().map(|l| l.len()).sum(),
            GeometryKind::Polygon(ref p) => p.rings().iter().map(|r| r.len()).sum(),
            GeometryKind::MultiPolygon(ref ps) => ps.iter().flat_map(|p| p.rings()).map(|r| r.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::of(&self.coordinates())
    }
}

fn polygon_coordinates(p: &Polygon) -> Vec<Coordinate> {
    p.rings().iter().flat_map(|r| r.iter().cloned()).collect()
}

fn fmt_coordinates(f: &mut fmt::Formatter, coordinates: &[Coordinate]) -> fmt::Result {
    let mut ret = write!(f, "(");
    for (i, c) in coordinates.iter().enumerate() {
        if i > 0 {
            ret = ret.and_then(|_| write!(f, ", "));
        }
        ret = ret.and_then(|_| write!(f, "{}", c));
    }
    ret.and_then(|_| write!(f, ")"))
}

fn fmt_polygon(f: &mut fmt::Formatter, polygon: &Polygon) -> fmt::Result {
    let mut ret = write!(f, "(");
    for (i, ring) in polygon.rings().iter().enumerate() {
        if i > 0 {
            ret = ret.and_then(|_| write!(f, ", "));
        }
        ret = ret.and_then(|_| fmt_coordinates(f, ring));
    }
    ret.and_then(|_| write!(f, ")"))
}

/// Well-known text.
impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            GeometryKind::Point(ref c) => write!(f, "POINT ({})", c),
            GeometryKind::MultiPoint(ref cs) => {
                write!(f, "MULTIPOINT ").and_then(|_| fmt_coordinates(f, cs))
            }
            GeometryKind::LineString(ref cs) => {
                write!(f, "LINESTRING ").and_then(|_| fmt_coordinates(f, cs))
            }
            GeometryKind::MultiLineString(ref lines) => {
                let mut ret = write!(f, "MULTILINESTRING (");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        ret = ret.and_then(|_| write!(f, ", "));
                    }
                    ret = ret.and_then(|_| fmt_coordinates(f, line));
                }
                ret.and_then(|_| write!(f, ")"))
            }
            GeometryKind::Polygon(ref p) => {
                write!(f, "POLYGON ").and_then(|_| fmt_polygon(f, p))
            }
            GeometryKind::MultiPolygon(ref ps) => {
                let mut ret = write!(f, "MULTIPOLYGON (");
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        ret = ret.and_then(|_| write!(f, ", "));
                    }
                    ret = ret.and_then(|_| fmt_polygon(f, p));
                }
                ret.and_then(|_| write!(f, ")"))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::f64;
    use super::{Coordinate, Envelope, Geometry, GeometryKind, Polygon};

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0., 0.),
            Coordinate::new(0., 4.),
            Coordinate::new(4., 4.),
            Coordinate::new(4., 0.),
            Coordinate::new(0., 0.),
        ]
    }

    #[test]
    fn missing_elevations_compare_equal() {
        assert_eq!(Coordinate::new(1., 2.), Coordinate::new(1., 2.));
        assert!(Coordinate::new(1., 2.) != Coordinate::new_z(1., 2., 0.));
        assert!(Coordinate::new_z(1., 2., f64::NAN) == Coordinate::new(1., 2.));
    }

    #[test]
    fn envelope_of_polygon() {
        let g = Geometry::new(GeometryKind::Polygon(Polygon::new(square(), vec![])));
        assert_eq!(Some(Envelope::new(0., 0., 4., 4.)), g.envelope());
        assert_eq!(5, g.num_points());
    }

    #[test]
    fn empty_geometry_has_no_envelope() {
        let g = Geometry::new(GeometryKind::MultiPoint(vec![]));
        assert!(g.is_empty());
        assert_eq!(None, g.envelope());
    }

    #[test]
    fn display_is_wkt() {
        assert_eq!("POINT (10.5 -3.25)", Geometry::point(10.5, -3.25).to_string());
        let lines = Geometry::new(GeometryKind::MultiLineString(vec![
            vec![ Coordinate::new(0., 0.), Coordinate::new(1., 1.) ],
        ]));
        assert_eq!("MULTILINESTRING ((0 0, 1 1))", lines.to_string());
    }

    #[test]
    fn envelope_containment() {
        let outer = Envelope::new(0., 0., 10., 10.);
        assert!(outer.contains(&Envelope::new(1., 1., 2., 2.)));
        assert!(!outer.contains(&Envelope::new(-1., 1., 2., 2.)));
    }
}
