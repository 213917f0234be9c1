//! Reading a raw extract, checking it, and writing the result back out.

use geo::{Geometry, LineString};
use mapcheck_core::{DataModel, DataModelSpec, Feature, PropertyValue, ValidateOptions, check_data_model};
use mapcheck_io::{GeoJsonError, read_collection, write_collection};
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn extract() -> Vec<Feature> {
    let mut ditch = Feature::with_empty_properties(Geometry::LineString(LineString::from(vec![
        (10.0, 52.0),
        (10.5, 52.1),
    ])));
    ditch.set("osm_id", "w42");
    ditch.set("waterway", "ditch");
    ditch.set("width", PropertyValue::Real(1.5));
    vec![ditch]
}

#[rstest]
fn checked_collection_survives_disk(extract: Vec<Feature>) {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("raw.geojson");
    let checked_path = dir.path().join("checked.geojson");
    write_collection(&raw_path, &extract).unwrap();

    let spec: DataModelSpec = serde_json::from_str(
        r#"{"types": {"width": "real"}, "ranges": {"width": [0.5, 30.0]}, "conditions": {}}"#,
    )
    .unwrap();
    let model = DataModel::from_spec(spec).unwrap();
    let checked = check_data_model(
        &read_collection(&raw_path).unwrap(),
        &model,
        &ValidateOptions::default(),
    );
    write_collection(&checked_path, &checked).unwrap();

    let reloaded = read_collection(&checked_path).unwrap();
    assert_eq!(reloaded, checked);
    assert_eq!(
        reloaded[0].get("width_flag"),
        Some(&PropertyValue::Integer(0))
    );
}

#[rstest]
fn parse_errors_carry_the_path(extract: Vec<Feature>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truncated.geojson");
    write_collection(&path, &extract).unwrap();
    let mut body = std::fs::read_to_string(&path).unwrap();
    body.truncate(body.len() / 2);
    std::fs::write(&path, body).unwrap();

    let error = read_collection(&path).unwrap_err();
    assert!(matches!(error, GeoJsonError::Parse { .. }));
    assert!(error.to_string().contains("truncated.geojson"));
}
