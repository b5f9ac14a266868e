//! Spatial indexes for fast containment and nearest-facility lookups.

use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::geometry::{bounding_box, contains, distance, PlanarPoint};
use crate::error::Result;
use crate::models::{PointLayer, PolygonFeature, PolygonLayer};
use crate::projection::Projection;

/// Wrapper for R-tree indexing of a layer's polygons
#[derive(Clone)]
struct IndexedPolygon {
    /// Position of the feature in its layer
    id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Outcome of a containment query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Containment {
    /// Winning feature: the first containing polygon in layer order
    pub id: usize,
    /// Number of polygons containing the point (more than one is a data anomaly)
    pub matches: usize,
}

impl Containment {
    pub fn is_ambiguous(&self) -> bool {
        self.matches > 1
    }
}

/// R-tree over the bounding boxes of a polygon layer
pub struct PolygonIndex {
    layer: PolygonLayer,
    tree: RTree<IndexedPolygon>,
}

impl PolygonIndex {
    /// Build spatial index for a polygon layer
    pub fn build(layer: PolygonLayer) -> Self {
        info!(
            "Building spatial index for {} polygons of layer '{}'...",
            layer.len(),
            layer.name
        );

        // Empty geometries have no envelope and can never contain a point
        let indexed: Vec<IndexedPolygon> = layer
            .features
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| {
                let (min_x, min_y, max_x, max_y) = bounding_box(&feature.geometry)?;
                Some(IndexedPolygon {
                    id,
                    envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self { layer, tree }
    }

    /// Ids of features whose bounding box may contain the point, ascending
    pub fn candidates(&self, point: &Point<f64>) -> Vec<usize> {
        let query_envelope = AABB::from_point([point.x(), point.y()]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ip| ip.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Find the polygon containing a point.
    ///
    /// Candidates come from the R-tree and are confirmed with the exact
    /// predicate. When several polygons contain the point the earliest in
    /// layer order wins.
    pub fn locate(&self, point: &Point<f64>) -> Option<Containment> {
        let containing = self.containing(point);
        let id = *containing.first()?;
        Some(Containment {
            id,
            matches: containing.len(),
        })
    }

    /// Every feature containing the point, in layer order
    pub fn containing(&self, point: &Point<f64>) -> Vec<usize> {
        self.candidates(point)
            .into_iter()
            .filter(|&id| contains(&self.layer.features[id].geometry, point))
            .collect()
    }

    pub fn feature(&self, id: usize) -> &PolygonFeature {
        &self.layer.features[id]
    }

    pub fn attribute(&self, id: usize) -> &str {
        &self.layer.features[id].attribute
    }

    pub fn layer(&self) -> &PolygonLayer {
        &self.layer
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// A facility found by nearest search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Position of the facility in its layer
    pub id: usize,
    /// Planar distance from the query point
    pub distance: f64,
}

type IndexedFacility = GeomWithData<[f64; 2], usize>;

/// R-tree over the projected locations of a point layer
pub struct FacilityIndex {
    layer: PointLayer,
    projected: Vec<PlanarPoint>,
    tree: RTree<IndexedFacility>,
}

impl FacilityIndex {
    /// Project every facility and build the index
    pub fn build(layer: PointLayer, projection: &dyn Projection) -> Result<Self> {
        info!(
            "Building facility index for {} points of layer '{}'...",
            layer.len(),
            layer.name
        );

        let projected = layer
            .features
            .iter()
            .map(|f| projection.project(f.location.x(), f.location.y()))
            .collect::<Result<Vec<_>>>()?;

        let indexed: Vec<IndexedFacility> = projected
            .iter()
            .enumerate()
            .map(|(id, xy)| GeomWithData::new(*xy, id))
            .collect();
        let tree = RTree::bulk_load(indexed);

        info!("Facility index built with {} entries", tree.size());

        Ok(Self {
            layer,
            projected,
            tree,
        })
    }

    /// The `k` facilities closest to a projected query point.
    ///
    /// Ordered by distance, then by layer order. The tree is walked
    /// best-first, so every facility tied with the k-th one is examined
    /// before the walk stops.
    pub fn k_nearest(&self, query: PlanarPoint, k: usize) -> Vec<Nearest> {
        if k == 0 {
            return Vec::new();
        }

        let mut found: Vec<(usize, f64)> = Vec::with_capacity(k);
        for (facility, distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            if found.len() >= k && distance_2 > found[k - 1].1 {
                break;
            }
            found.push((facility.data, distance_2));
        }

        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.truncate(k);

        found
            .into_iter()
            .map(|(id, _)| Nearest {
                id,
                distance: distance(query, self.projected[id]),
            })
            .collect()
    }

    /// Closest facility, `None` only for an empty layer
    pub fn nearest(&self, query: PlanarPoint) -> Option<Nearest> {
        self.k_nearest(query, 1).into_iter().next()
    }

    pub fn attribute(&self, id: usize) -> &str {
        &self.layer.features[id].attribute
    }

    pub fn layer(&self) -> &PointLayer {
        &self.layer
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
