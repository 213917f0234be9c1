//! The connectivity tracer.
//!
//! Propagates a seed label across every feature reachable through a chain
//! of geometric touching within a distance tolerance. Seeds are features
//! whose `seed_key` value appears in the caller's allow-list; each seed's
//! component is fully expanded before the next seed begins.
//!
//! Expansion is a breadth-first flood fill with an explicit per-seed
//! visited set and candidates visited in ascending index order, so
//! re-running the tracer on identical input yields identical labels.
//! Contested features follow a first-seed-wins policy: a later seed never
//! relabels a feature claimed by an earlier one (seed features always
//! carry their own value).

use std::collections::{HashSet, VecDeque};

use log::{debug, warn};

use crate::error::CheckError;
use crate::feature::{Feature, PropertyValue};
use crate::geometry::{expanded_bounds, within_distance};
use crate::index::BboxIndex;

/// Property name the tracer stores its label under.
pub const CONNECTED_KEY: &str = "connected";

/// Parameters for one tracer run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityOptions {
    /// Property identifying candidate seed features.
    pub seed_key: String,
    /// Seed values (text form); features whose `seed_key` value is listed
    /// here become propagation origins.
    pub seed_values: Vec<String>,
    /// Distance under which two geometries are treated as touching.
    /// Must be positive.
    pub tolerance: f64,
    /// Upper bound on frontier visits per run, guarding against
    /// pathological dense-adjacency cases. `None` leaves the loop bounded
    /// only by the visited set.
    pub max_visits: Option<usize>,
}

impl ConnectivityOptions {
    /// Options with the given seed selector and tolerance, no visit bound.
    pub fn new(
        seed_key: impl Into<String>,
        seed_values: Vec<String>,
        tolerance: f64,
    ) -> Self {
        Self {
            seed_key: seed_key.into(),
            seed_values,
            tolerance,
            max_visits: None,
        }
    }
}

/// Label every feature reachable from a seed with that seed's value.
///
/// Returns a labelled copy of the input; the canonical collection is never
/// mutated. Every feature carries [`CONNECTED_KEY`] afterwards, holding
/// either `0` (unreached) or the propagated seed value.
///
/// # Errors
/// [`CheckError::NonPositiveTolerance`] when the tolerance is not positive
/// and [`CheckError::ExpansionBudgetExceeded`] when `max_visits` trips.
pub fn trace_connectivity(
    features: &[Feature],
    options: &ConnectivityOptions,
) -> Result<Vec<Feature>, CheckError> {
    if options.tolerance <= 0.0 {
        return Err(CheckError::NonPositiveTolerance {
            tolerance: options.tolerance,
        });
    }

    let mut labelled: Vec<Feature> = features.to_vec();
    for feature in &mut labelled {
        feature.set(CONNECTED_KEY, PropertyValue::Integer(0));
    }

    // Index over tolerance-expanded boxes; two touching geometries always
    // overlap in it. Features without a bounding box cannot participate.
    let mut entries = Vec::with_capacity(labelled.len());
    for (id, feature) in labelled.iter().enumerate() {
        match expanded_bounds(&feature.geometry, options.tolerance) {
            Some(rect) => entries.push((id, rect)),
            None => warn!("feature {id} has an empty geometry, excluded from connectivity"),
        }
    }
    let index = BboxIndex::build(entries);

    let seeds: Vec<usize> = labelled
        .iter()
        .enumerate()
        .filter(|(_, feature)| {
            feature
                .text_of(&options.seed_key)
                .is_some_and(|value| options.seed_values.contains(&value))
        })
        .map(|(id, _)| id)
        .collect();
    debug!("tracing connectivity from {} seed(s)", seeds.len());

    let mut visits = 0_usize;
    for seed in seeds {
        let label = labelled[seed]
            .get(&options.seed_key)
            .cloned()
            .unwrap_or(PropertyValue::Null);
        // A seed always carries its own value, even when an earlier
        // component already swept over it.
        labelled[seed].set(CONNECTED_KEY, label.clone());

        let mut visited: HashSet<usize> = HashSet::from([seed]);
        let mut frontier: VecDeque<usize> = VecDeque::from([seed]);
        while let Some(current) = frontier.pop_front() {
            visits += 1;
            if let Some(limit) = options.max_visits
                && visits > limit
            {
                return Err(CheckError::ExpansionBudgetExceeded { limit });
            }

            let Some(bounds) = expanded_bounds(&labelled[current].geometry, options.tolerance)
            else {
                continue;
            };
            for candidate in index.query(&bounds) {
                if candidate == current || visited.contains(&candidate) {
                    continue;
                }
                // First-seed-wins: an already claimed feature stays put.
                let claimed = labelled[candidate]
                    .get(CONNECTED_KEY)
                    .is_some_and(|value| *value != PropertyValue::Integer(0) && *value != label);
                if claimed {
                    continue;
                }
                let touching = within_distance(
                    &labelled[candidate].geometry,
                    &labelled[current].geometry,
                    options.tolerance,
                );
                match touching {
                    Some(true) => {
                        labelled[candidate].set(CONNECTED_KEY, label.clone());
                        visited.insert(candidate);
                        frontier.push_back(candidate);
                    }
                    Some(false) => {}
                    None => warn!(
                        "unsupported geometry pair ({current}, {candidate}), skipping adjacency test"
                    ),
                }
            }
        }
    }

    Ok(labelled)
}
