//! Cell values passed to `insert_row()` and returned by `get_row()`.

use std::fmt;
use chrono::NaiveDate;
use geo::Geometry;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Varchar(String),
    Date(NaiveDate),
    Geometry(Geometry),
}

impl Value {
    /// Name of the runtime type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Double(_) => "DOUBLE",
            Value::Varchar(_) => "VARCHAR",
            Value::Date(_) => "DATE",
            Value::Geometry(_) => "GEOMETRY",
        }
    }

    pub fn is_null(&self) -> bool {
        match *self {
            Value::Null => true,
            _ => false,
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match *self {
            Value::Geometry(ref g) => Some(g),
            _ => None,
        }
    }

    /// Numeric values widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(n) => Some(n as f64),
            Value::BigInt(n) => Some(n as f64),
            Value::Double(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Varchar(ref s) => write!(f, "{}", s),
            Value::Date(ref d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Geometry(ref g) => write!(f, "{}", g),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::BigInt(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Double(n)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::Varchar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Varchar(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Value {
        Value::Date(d)
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Value {
        Value::Geometry(g)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Value {
        match o {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use geo::Geometry;
    use super::Value;

    #[test]
    fn conversions() {
        assert_eq!(Value::Int(3), Value::from(3));
        assert_eq!(Value::BigInt(3), Value::from(3i64));
        assert_eq!(Value::Varchar("a".to_string()), Value::from("a"));
        assert_eq!(Value::Null, Value::from(None::<i32>));
        assert_eq!(Value::Boolean(true), Value::from(Some(true)));
    }

    #[test]
    fn display() {
        assert_eq!("2017-03-04", Value::from(NaiveDate::from_ymd_opt(2017, 3, 4).unwrap()).to_string());
        assert_eq!("POINT (1 2)", Value::from(Geometry::point(1., 2.)).to_string());
        assert_eq!("NULL", Value::Null.to_string());
    }

    #[test]
    fn type_names() {
        assert_eq!("GEOMETRY", Value::from(Geometry::point(0., 0.)).type_name());
        assert_eq!("VARCHAR", Value::from("x").type_name());
    }
}
