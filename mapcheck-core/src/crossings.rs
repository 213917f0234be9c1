//! The crossing detector.
//!
//! Finds every geometrically intersecting pair between two feature
//! classes (typically roads against waterways) and classifies each
//! crossing by its structural tags: a documented bridge or tunnel is
//! flagged `0`, an undocumented crossing is flagged `1` — the primary
//! data-quality signal.

use geo::{Geometry, Intersects, Point};
use log::{debug, warn};

use crate::feature::{Feature, Properties, PropertyValue};
use crate::filter::TagFilter;
use crate::geometry::{crossing_points, expanded_bounds};
use crate::index::BboxIndex;
use crate::report::CrossingSummary;

/// Parameters for one crossing detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingOptions {
    /// "Is-bridge" predicate, tested against the first class's properties.
    pub bridge: TagFilter,
    /// "Is-tunnel" predicate, tested against the second class's properties.
    pub tunnel: TagFilter,
    /// Name of the first class, used in the paired id property
    /// (`osm_id_<label>`).
    pub label_a: String,
    /// Name of the second class.
    pub label_b: String,
    /// Margin applied to index bounding boxes. Queries are bbox-overlap
    /// only; every candidate is still confirmed with an exact intersects
    /// test.
    pub bbox_margin: f64,
    /// Constants stamped on every crossing record (e.g. the bounding
    /// region name).
    pub extra_props: Properties,
}

impl CrossingOptions {
    /// Options for the usual road/water setup with the given structural
    /// predicates.
    pub fn new(bridge: TagFilter, tunnel: TagFilter) -> Self {
        Self {
            bridge,
            tunnel,
            label_a: "highway".to_owned(),
            label_b: "waterway".to_owned(),
            bbox_margin: 1e-4,
            extra_props: Properties::new(),
        }
    }
}

/// Outcome of a crossing detection run: one point feature per resolved
/// intersection vertex, plus summary counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingReport {
    /// Synthesized crossing-point features.
    pub records: Vec<Feature>,
    /// Tallies over the records.
    pub summary: CrossingSummary,
}

/// Detect and classify crossings between two feature classes.
///
/// Each confirmed intersecting pair is evaluated exactly once, and only
/// pairs resolving to at least one crossing vertex are classified and
/// counted. Pairs whose geometry the kernel cannot resolve are skipped
/// with a warning; the batch continues.
pub fn find_crossings(
    features_a: &[Feature],
    features_b: &[Feature],
    options: &CrossingOptions,
) -> CrossingReport {
    // One index over A ++ B; ids at or past `split` belong to B.
    let split = features_a.len();
    let mut entries = Vec::with_capacity(features_a.len() + features_b.len());
    for (id, feature) in features_a.iter().chain(features_b).enumerate() {
        match expanded_bounds(&feature.geometry, options.bbox_margin) {
            Some(rect) => entries.push((id, rect)),
            None => warn!("feature {id} has an empty geometry, excluded from crossing check"),
        }
    }
    let index = BboxIndex::build(entries);

    let mut records = Vec::new();
    let mut summary = CrossingSummary::default();
    for (id_a, feature_a) in features_a.iter().enumerate() {
        let Some(bounds) = expanded_bounds(&feature_a.geometry, options.bbox_margin) else {
            continue;
        };
        for id in index.query(&bounds) {
            if id < split {
                continue;
            }
            let feature_b = &features_b[id - split];
            // Exact confirmation; the index overlap is only a pre-filter.
            if !feature_a.geometry.intersects(&feature_b.geometry) {
                continue;
            }
            let Some(points) = crossing_points(&feature_a.geometry, &feature_b.geometry) else {
                warn!(
                    "cannot resolve intersection between features {id_a} and {}, skipping pair",
                    id - split
                );
                continue;
            };
            // Containment without a boundary crossing resolves to no
            // vertex; such a pair contributes neither records nor counts.
            if points.is_empty() {
                debug!(
                    "intersection of features {id_a} and {} has no crossing vertex, skipping pair",
                    id - split
                );
                continue;
            }
            let (structure, flag) = classify(feature_a, feature_b, options);
            summary.record(&structure, flag, &options.bridge.key, &options.tunnel.key);
            for point in points {
                records.push(crossing_record(
                    feature_a, feature_b, point.into(), &structure, flag, options,
                ));
            }
        }
    }
    debug!(
        "crossing check: {} record(s), {} undocumented pair(s)",
        records.len(),
        summary.undocumented
    );

    CrossingReport { records, summary }
}

/// Classify one confirmed pair by its structural tags.
///
/// Structure strings take the configured predicate keys, so a
/// non-default bridge or tunnel key surfaces verbatim in the records.
fn classify(
    feature_a: &Feature,
    feature_b: &Feature,
    options: &CrossingOptions,
) -> (String, i64) {
    let is_bridge = options.bridge.matches(&feature_a.properties);
    let is_tunnel = options.tunnel.matches(&feature_b.properties);
    match (is_bridge, is_tunnel) {
        (true, true) => (
            format!("{} and {}", options.bridge.key, options.tunnel.key),
            0,
        ),
        (true, false) => (options.bridge.key.clone(), 0),
        (false, true) => (options.tunnel.key.clone(), 0),
        (false, false) => (String::new(), 1),
    }
}

fn crossing_record(
    feature_a: &Feature,
    feature_b: &Feature,
    point: Point<f64>,
    structure: &str,
    flag: i64,
    options: &CrossingOptions,
) -> Feature {
    let mut properties = options.extra_props.clone();
    properties.insert(
        format!("osm_id_{}", options.label_a),
        feature_a.get("osm_id").cloned().unwrap_or(PropertyValue::Null),
    );
    properties.insert(
        format!("osm_id_{}", options.label_b),
        feature_b.get("osm_id").cloned().unwrap_or(PropertyValue::Null),
    );
    properties.insert("structure".to_owned(), structure.into());
    properties.insert("flag".to_owned(), PropertyValue::Integer(flag));
    Feature::new(Geometry::Point(point), properties)
}
