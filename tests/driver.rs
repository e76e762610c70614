extern crate chrono;
extern crate encoding;
extern crate shpdriver;
extern crate tempfile;

use std::fs;
use std::path::Path;
use chrono::NaiveDate;
use encoding::all::WINDOWS_1251;
use shpdriver::{Coordinate, DbfHeader, Geometry, GeometryKind, Polygon, ShapeType, ShapefileDriver, ShapefileError, ShpError, Value};

fn c(x: f64, y: f64) -> Coordinate {
    Coordinate::new(x, y)
}

fn id_header(n: usize) -> DbfHeader {
    let mut header = DbfHeader::new();
    header.add_column("id", 'N', 9, 0).unwrap();
    header.set_record_count(n);
    header
}

/// Writes `geometries` as rows `(id, geometry)` and reopens the file.
fn round_trip(path: &Path, shape_type: ShapeType, geometries: Vec<Geometry>) -> ShapefileDriver {
    let mut driver = ShapefileDriver::new();
    driver.set_geometry_field_index(1);
    driver.init_driver(path, shape_type, id_header(geometries.len())).unwrap();
    for (i, g) in geometries.into_iter().enumerate() {
        driver.insert_row(&[ Value::Int(i as i32), Value::Geometry(g) ]).unwrap();
    }
    driver.close().unwrap();

    let mut driver = ShapefileDriver::new();
    driver.set_geometry_field_index(1);
    driver.init_driver_from_file(path, None).unwrap();
    driver
}

#[test]
fn write_and_read_two_points() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    let mut driver = round_trip(&path, ShapeType::Point, vec![ Geometry::point(0., 0.), Geometry::point(5., 5.) ]);

    assert_eq!(2, driver.row_count());
    assert_eq!(2, driver.field_count());
    assert_eq!(vec![ Value::Int(0), Value::Geometry(Geometry::point(0., 0.)) ], driver.get_row(0).unwrap());
    assert_eq!(vec![ Value::Int(1), Value::Geometry(Geometry::point(5., 5.)) ], driver.get_row(1).unwrap());

    let header = *driver.shapefile_header().unwrap();
    assert_eq!(ShapeType::Point, header.shape_type);
    assert_eq!((0., 0., 5., 5.), (header.bbox.min_x, header.bbox.min_y, header.bbox.max_x, header.bbox.max_y));
    // 100-byte header plus two 28-byte records
    assert_eq!(156, fs::metadata(&path).unwrap().len());
    assert_eq!(116, fs::metadata(dir.path().join("points.shx")).unwrap().len());
    assert_eq!(156 / 2, header.file_length);
}

#[test]
fn null_geometry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");

    let mut driver = ShapefileDriver::new();
    driver.set_geometry_field_index(1);
    driver.init_driver(&path, ShapeType::Point, id_header(0)).unwrap();
    match driver.insert_row(&[ Value::Int(1), Value::Null ]) {
        Err(ShapefileError::NullGeometry(1)) => (),
        other => panic!("expected NullGeometry, got {:?}", other),
    }
    driver.close().unwrap();

    let mut driver = ShapefileDriver::new();
    driver.init_driver_from_file(&path, None).unwrap();
    assert_eq!(0, driver.row_count());
    assert_eq!(100, fs::metadata(&path).unwrap().len());
    assert_eq!(100, fs::metadata(dir.path().join("points.shx")).unwrap().len());
}

#[test]
fn missing_dbf_fails_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    round_trip(&path, ShapeType::Point, vec![ Geometry::point(0., 0.) ]);
    fs::remove_file(dir.path().join("points.dbf")).unwrap();

    let mut driver = ShapefileDriver::new();
    match driver.init_driver_from_file(&path, None) {
        Err(ShapefileError::NotFound(p)) => assert_eq!(dir.path().join("points.dbf"), p),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn missing_shp() {
    let dir = tempfile::tempdir().unwrap();
    match shpdriver::open(&dir.path().join("nothing.shp")) {
        Err(ShapefileError::NotFound(_)) => (),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn geometry_column_anywhere() {
    for k in 0..3 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.shp");

        let mut header = DbfHeader::new();
        header.add_column("name", 'C', 10, 0).unwrap();
        header.add_column("area", 'N', 12, 3).unwrap();
        header.set_record_count(2);

        let rows = vec![
            vec![ Value::from("first"), Value::Double(1.5) ],
            vec![ Value::from("second"), Value::Null ],
        ];
        let rows: Vec<Vec<Value>> = rows.into_iter().enumerate().map(|(i, mut row)| {
            row.insert(k, Value::Geometry(Geometry::point(i as f64, -(i as f64))));
            row
        }).collect();

        let mut driver = ShapefileDriver::new();
        driver.set_geometry_field_index(k);
        driver.init_driver(&path, ShapeType::Point, header).unwrap();
        for row in rows.iter() {
            driver.insert_row(row).unwrap();
        }
        driver.close().unwrap();

        let mut driver = ShapefileDriver::new();
        driver.set_geometry_field_index(k);
        driver.init_driver_from_file(&path, None).unwrap();
        assert_eq!(3, driver.field_count());
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row, &driver.get_row(i).unwrap());
        }
    }
}

#[test]
fn polygon_with_hole() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polygons.shp");

    let exterior = vec![ c(0., 0.), c(0., 10.), c(10., 10.), c(10., 0.), c(0., 0.) ];
    let hole = vec![ c(2., 2.), c(4., 2.), c(4., 4.), c(2., 4.), c(2., 2.) ];
    let island = vec![ c(20., 0.), c(20., 1.), c(21., 1.), c(21., 0.), c(20., 0.) ];
    let geometry = Geometry::new(GeometryKind::MultiPolygon(vec![
        Polygon::new(exterior.clone(), vec![ hole.clone() ]),
        Polygon::new(island.clone(), vec![]),
    ]));

    let mut driver = round_trip(&path, ShapeType::Polygon, vec![ geometry.clone() ]);
    assert_eq!(Value::Geometry(geometry), driver.get_field(0, 1).unwrap());
    assert_eq!(ShapeType::Polygon, driver.shape_type().unwrap());
}

#[test]
fn lines_read_back_as_multilines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lines.shp");

    let line = vec![ c(0., 0.), c(1., 1.), c(2., 0.) ];
    let mut driver = round_trip(&path, ShapeType::PolyLine, vec![ Geometry::new(GeometryKind::LineString(line.clone())) ]);
    assert_eq!(
        Value::Geometry(Geometry::new(GeometryKind::MultiLineString(vec![ line ]))),
        driver.get_field(0, 1).unwrap()
    );
}

#[test]
fn points_with_z() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    let mut driver = round_trip(&path, ShapeType::PointZ, vec![ Geometry::point_z(1., 2., 3.), Geometry::point_z(4., 5., std::f64::NAN) ]);
    assert_eq!(Value::Geometry(Geometry::point_z(1., 2., 3.)), driver.get_field(0, 1).unwrap());
    assert_eq!(Value::Geometry(Geometry::point_z(4., 5., 0.)), driver.get_field(1, 1).unwrap());
}

#[test]
fn code_page_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.shp");

    let mut header = DbfHeader::new();
    header.add_column("name", 'C', 20, 0).unwrap();
    header.set_encoding(WINDOWS_1251);
    header.set_record_count(1);

    let mut driver = ShapefileDriver::new();
    driver.init_driver(&path, ShapeType::Point, header).unwrap();
    driver.insert_row(&[ Value::Geometry(Geometry::point(37.6, 55.75)), Value::from("Москва") ]).unwrap();
    driver.close().unwrap();

    assert_eq!("windows-1251", fs::read_to_string(dir.path().join("cities.cpg")).unwrap());

    let mut driver = shpdriver::open(&path).unwrap();
    assert_eq!(Some(dir.path().join("cities.cpg")), driver.files().unwrap().cpg.clone());
    assert_eq!(Value::from("Москва"), driver.get_field(0, 1).unwrap());

    // A forced encoding beats the ".cpg" file.
    let mut driver = ShapefileDriver::new();
    driver.init_driver_from_file(&path, Some("windows-1252")).unwrap();
    assert!(driver.get_field(0, 1).unwrap() != Value::from("Москва"));
}

#[test]
fn default_encoding_writes_no_code_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    round_trip(&path, ShapeType::Point, vec![ Geometry::point(0., 0.) ]);
    assert!(!dir.path().join("points.cpg").exists());
}

#[test]
fn unknown_forced_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    round_trip(&path, ShapeType::Point, vec![ Geometry::point(0., 0.) ]);

    let mut driver = ShapefileDriver::new();
    assert!(driver.init_driver_from_file(&path, Some("no-such-encoding")).is_err());
}

#[test]
fn projection_sets_srid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    round_trip(&path, ShapeType::Point, vec![ Geometry::point(1., 2.) ]);
    fs::write(
        dir.path().join("points.prj"),
        r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]]"#,
    ).unwrap();

    let mut driver = ShapefileDriver::new();
    driver.init_driver_from_file(&path, None).unwrap();
    assert_eq!(4326, driver.srid());
    assert_eq!(Value::Geometry(Geometry::point(1., 2.).with_srid(4326)), driver.get_field(0, 0).unwrap());

    driver.set_srid(2154);
    assert_eq!(Value::Geometry(Geometry::point(1., 2.).with_srid(2154)), driver.get_field(0, 0).unwrap());
}

#[test]
fn rejected_date_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.shp");

    let mut header = DbfHeader::new();
    header.add_column("day", 'D', 8, 0).unwrap();
    header.set_record_count(0);

    let mut driver = ShapefileDriver::new();
    driver.init_driver(&path, ShapeType::Point, header).unwrap();
    let far_future = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
    assert!(driver.insert_row(&[ Value::Geometry(Geometry::point(1., 2.)), Value::Date(far_future) ]).is_err());
    driver.close().unwrap();

    assert_eq!(100, fs::metadata(&path).unwrap().len());
    assert_eq!(100, fs::metadata(dir.path().join("events.shx")).unwrap().len());
    // 32-byte header, one 32-byte field descriptor, terminator, end-of-file marker
    assert_eq!(66, fs::metadata(dir.path().join("events.dbf")).unwrap().len());

    let driver = shpdriver::open(&path).unwrap();
    assert_eq!(0, driver.row_count());
}

#[test]
fn corrupt_point_count_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.shp");
    let points = Geometry::new(GeometryKind::MultiPoint(vec![ c(0., 0.), c(1., 1.) ]));
    round_trip(&path, ShapeType::MultiPoint, vec![ points ]);

    // File header, record header, shape type, bbox, then the point count.
    let mut bytes = fs::read(&path).unwrap();
    bytes[144..148].copy_from_slice(&[ 0xf0, 0xff, 0xff, 0x7f ]);
    fs::write(&path, &bytes).unwrap();

    let mut driver = ShapefileDriver::new();
    driver.set_geometry_field_index(1);
    driver.init_driver_from_file(&path, None).unwrap();
    match driver.get_row(0) {
        Err(ShapefileError::Shp(ShpError::ParseError(_))) => (),
        other => panic!("expected ParseError, got {:?}", other),
    }
}
