use driver::{ShapefileDriver, ShapefileError};
use value::Value;

/// Walks a driver's rows forwards or backwards.
///
/// The cursor holds nothing but a row id, starting just before the first
/// row. `get()` reads the current row from the driver on every call.
#[derive(Debug)]
pub struct ScanCursor<'a> {
    driver: &'a mut ShapefileDriver,
    position: i64,
    begin: i64,
    end: i64,
}

impl<'a> ScanCursor<'a> {
    pub fn new(driver: &'a mut ShapefileDriver) -> ScanCursor<'a> {
        let end = driver.row_count() as i64 - 1;
        ScanCursor {
            driver: driver,
            position: -1,
            begin: 0,
            end: end,
        }
    }

    /// A cursor over row ids `begin..=end` only, clipped to the driver's rows.
    pub fn with_range(driver: &'a mut ShapefileDriver, begin: usize, end: usize) -> ScanCursor<'a> {
        let last = driver.row_count() as i64 - 1;
        let begin = begin as i64;
        ScanCursor {
            driver: driver,
            position: begin - 1,
            begin: begin,
            end: (end as i64).min(last),
        }
    }

    /// The current row id; -1 (or `begin - 1`) before the first `next()`.
    pub fn row_id(&self) -> i64 {
        self.position
    }

    fn on_row(&self) -> bool {
        self.position >= self.begin && self.position <= self.end
    }

    /// Moves to the next row. At the last row, returns false and stays put.
    pub fn next(&mut self) -> bool {
        if self.position >= self.end {
            return false;
        }
        self.position += 1;
        true
    }

    /// Moves to the previous row. At the first row, returns false and stays
    /// put.
    pub fn previous(&mut self) -> bool {
        if self.position <= self.begin {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Jumps to the first (or last) row. `None`, and no move, if there are no
    /// rows.
    pub fn find_first_or_last(&mut self, first: bool) -> Option<usize> {
        if self.begin > self.end {
            return None;
        }
        self.position = if first { self.begin } else { self.end };
        Some(self.position as usize)
    }

    pub fn first(&mut self) -> bool {
        self.find_first_or_last(true).is_some()
    }

    pub fn last(&mut self) -> bool {
        self.find_first_or_last(false).is_some()
    }

    pub fn get(&mut self) -> Result<Vec<Value>, ShapefileError> {
        if !self.on_row() {
            return Err(ShapefileError::InvalidState(format!("Cursor is at row {}, not on a row", self.position)));
        }
        self.driver.get_row(self.position as usize)
    }
}

#[cfg(test)]
mod test {
    extern crate tempfile;

    use std::path::Path;
    use dbf::DbfHeader;
    use driver::ShapefileDriver;
    use geo::Geometry;
    use shapefile::ShapeType;
    use value::Value;
    use super::ScanCursor;

    fn driver(dir: &Path, n: usize) -> ShapefileDriver {
        let path = dir.join("points.shp");
        let mut header = DbfHeader::new();
        header.add_column("id", 'N', 9, 0).unwrap();
        header.set_record_count(n);

        let mut driver = ShapefileDriver::new();
        driver.init_driver(&path, ShapeType::Point, header).unwrap();
        for i in 0..n {
            driver.insert_row(&[ Value::Geometry(Geometry::point(i as f64, 0.)), Value::Int(i as i32) ]).unwrap();
        }
        driver.close().unwrap();

        let mut driver = ShapefileDriver::new();
        driver.init_driver_from_file(&path, None).unwrap();
        driver
    }

    fn id(row: Vec<Value>) -> Value {
        row[1].clone()
    }

    #[test]
    fn forwards_then_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(dir.path(), 3);
        let mut cursor = ScanCursor::new(&mut driver);
        assert_eq!(-1, cursor.row_id());
        assert!(cursor.get().is_err());

        let mut ids = vec![];
        while cursor.next() {
            ids.push(id(cursor.get().unwrap()));
        }
        assert_eq!(vec![ Value::Int(0), Value::Int(1), Value::Int(2) ], ids);
        assert_eq!(2, cursor.row_id());
        assert!(!cursor.next());
        assert_eq!(2, cursor.row_id());

        assert!(cursor.previous());
        assert!(cursor.previous());
        assert_eq!(0, cursor.row_id());
        assert!(!cursor.previous());
        assert_eq!(0, cursor.row_id());
    }

    #[test]
    fn first_and_last() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(dir.path(), 4);
        let mut cursor = ScanCursor::new(&mut driver);
        assert_eq!(Some(3), cursor.find_first_or_last(false));
        assert_eq!(Value::Int(3), id(cursor.get().unwrap()));
        assert!(!cursor.next());
        assert_eq!(Some(0), cursor.find_first_or_last(true));
        assert!(!cursor.previous());
        assert!(cursor.last());
        assert_eq!(3, cursor.row_id());
    }

    #[test]
    fn repeated_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(dir.path(), 2);
        let mut cursor = ScanCursor::new(&mut driver);
        assert!(cursor.next());
        assert_eq!(cursor.get().unwrap(), cursor.get().unwrap());
    }

    #[test]
    fn empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(dir.path(), 0);
        let mut cursor = ScanCursor::new(&mut driver);
        assert!(!cursor.next());
        assert!(!cursor.previous());
        assert_eq!(None, cursor.find_first_or_last(true));
        assert!(!cursor.last());
        assert!(cursor.get().is_err());
    }

    #[test]
    fn range() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(dir.path(), 5);
        let mut cursor = ScanCursor::with_range(&mut driver, 1, 3);
        assert_eq!(0, cursor.row_id());
        assert!(cursor.get().is_err());

        let mut ids = vec![];
        while cursor.next() {
            ids.push(id(cursor.get().unwrap()));
        }
        assert_eq!(vec![ Value::Int(1), Value::Int(2), Value::Int(3) ], ids);
        assert_eq!(Some(1), cursor.find_first_or_last(true));
        assert!(!cursor.previous());

        let mut cursor = ScanCursor::with_range(&mut driver, 2, 10);
        assert_eq!(Some(4), cursor.find_first_or_last(false));
    }
}
