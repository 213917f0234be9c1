//! Bounding-box spatial index over feature collections.
//!
//! A thin wrapper around an R*-tree mapping axis-aligned rectangles to
//! feature positions. The index is rebuilt per check invocation and never
//! cached or shared; queries are bbox-overlap only, candidates still need
//! an exact geometric confirmation.

use geo::Rect;
use rstar::{AABB, RTree, RTreeObject};

#[derive(Debug, Clone)]
struct IndexedBounds {
    id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Spatial index from bounding boxes to feature positions.
#[derive(Debug)]
pub struct BboxIndex {
    tree: RTree<IndexedBounds>,
}

impl BboxIndex {
    /// Bulk-load an index from `(id, bounding box)` entries.
    pub fn build(entries: Vec<(usize, Rect<f64>)>) -> Self {
        let objects = entries
            .into_iter()
            .map(|(id, rect)| IndexedBounds {
                id,
                envelope: envelope_of(&rect),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(objects),
        }
    }

    /// Ids whose boxes overlap `bounds`, sorted ascending.
    ///
    /// Sorting fixes the candidate-iteration order so downstream checks
    /// behave deterministically across runs.
    pub fn query(&self, bounds: &Rect<f64>) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope_of(bounds))
            .map(|object| object.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
