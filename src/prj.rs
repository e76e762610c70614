//! Pulls an SRID out of the WKT in a ".prj" file.
//!
//! Only the EPSG authority code matters here. The outermost `AUTHORITY`
//! clause comes last in WKT, so the last match wins: in a projected system
//! the inner clauses name the datum, spheroid and so on.

use std::fs;
use std::io;
use std::path::Path;
use regex::Regex;

lazy_static! {
    static ref EPSG_AUTHORITY: Regex = Regex::new(r#"AUTHORITY\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).unwrap();
}

pub fn srid_from_wkt(wkt: &str) -> Option<i32> {
    EPSG_AUTHORITY.captures_iter(wkt)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Reads a ".prj" file. `Ok(None)` if it names no EPSG code.
pub fn read_srid(path: &Path) -> io::Result<Option<i32>> {
    let bytes = fs::read(path)?;
    Ok(srid_from_wkt(&String::from_utf8_lossy(&bytes)))
}
