//! Moves the geometry column in and out of a row.
//!
//! A driver row is the ".dbf" attributes with the geometry inserted at some
//! index `k`. `split` takes it out and `splice` puts it back; `k` may be
//! anything from 0 to the attribute count, inclusive.

use value::Value;

/// Returns (the value at `k`, every other value in order).
///
/// Panics if `k >= row.len()`; callers check first.
pub fn split(row: &[Value], k: usize) -> (&Value, Vec<Value>) {
    let mut attributes = Vec::with_capacity(row.len() - 1);
    attributes.extend_from_slice(&row[..k]);
    attributes.extend_from_slice(&row[k + 1..]);
    (&row[k], attributes)
}

/// Inserts `geometry` at `k`, shifting later attributes up one slot.
///
/// Panics if `k > attributes.len()`; callers check first.
pub fn splice(geometry: Value, attributes: Vec<Value>, k: usize) -> Vec<Value> {
    let mut row = Vec::with_capacity(attributes.len() + 1);
    row.extend_from_slice(&attributes[..k]);
    row.push(geometry);
    row.extend_from_slice(&attributes[k..]);
    row
}

/// Maps a driver column to its ".dbf" column. `None` for the geometry column.
pub fn attribute_column(column: usize, k: usize) -> Option<usize> {
    if column < k {
        Some(column)
    } else if column == k {
        None
    } else {
        Some(column - 1)
    }
}

#[cfg(test)]
mod test {
    use geo::Geometry;
    use value::Value;
    use super::{attribute_column, splice, split};

    fn attributes() -> Vec<Value> {
        vec![ Value::Int(1), Value::from("two"), Value::Double(3.), Value::Boolean(true) ]
    }

    #[test]
    fn split_then_splice_at_every_index() {
        let geometry = Value::Geometry(Geometry::point(1., 2.));
        for k in 0..5 {
            let row = splice(geometry.clone(), attributes(), k);
            assert_eq!(5, row.len());
            assert_eq!(geometry, row[k]);

            let (g, rest) = split(&row, k);
            assert_eq!(&geometry, g);
            assert_eq!(attributes(), rest);
        }
    }

    #[test]
    fn splice_keeps_order_around_the_gap() {
        let row = splice(Value::Null, attributes(), 2);
        assert_eq!(vec![ Value::Int(1), Value::from("two"), Value::Null, Value::Double(3.), Value::Boolean(true) ], row);
    }

    #[test]
    fn geometry_only() {
        let row = splice(Value::Null, vec![], 0);
        assert_eq!(vec![ Value::Null ], row);
        let (g, rest) = split(&row, 0);
        assert_eq!(&Value::Null, g);
        assert!(rest.is_empty());
    }

    #[test]
    fn column_mapping() {
        assert_eq!(Some(0), attribute_column(0, 1));
        assert_eq!(None, attribute_column(1, 1));
        assert_eq!(Some(1), attribute_column(2, 1));
        assert_eq!(None, attribute_column(0, 0));
        assert_eq!(Some(0), attribute_column(1, 0));
    }
}
