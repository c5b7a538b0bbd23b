use fan_model::error::ModelError;
use geo::{Buffer, Contains};
use geo_types::{MultiPolygon, Point, Polygon};
use log::warn;

/// Radius, in projection units, by which an assigned town's point is
/// expanded to form its near-miss catchment.
pub const CATCHMENT_RADIUS: f64 = 10_000.0;

/// A named point location potentially nested inside an ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct Town {
    pub name: String,
    pub point: Point<f64>,
}

/// An assigned town's point expanded by [`CATCHMENT_RADIUS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    pub name: String,
    pub area: MultiPolygon<f64>,
}

/// A named region of interest with its assigned towns and their derived
/// buffered catchments.
#[derive(Debug, Clone)]
pub struct Roi {
    pub name: String,
    pub boundary: Polygon<f64>,
    pub towns: Vec<Town>,
    pub catchments: Vec<Catchment>,
}

/// Ordered collection of ROIs with first-match town assignment.
///
/// ROIs are kept in load order because assignment is first-match: when two
/// boundaries overlap, the earlier-loaded ROI claims the town. That order
/// sensitivity is a visible contract, so the collection is a `Vec`, never
/// a set.
#[derive(Debug, Clone, Default)]
pub struct RoiIndex {
    rois: Vec<Roi>,
}

impl RoiIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from named boundaries, preserving iteration order.
    pub fn from_boundaries<I>(boundaries: I) -> Self
    where
        I: IntoIterator<Item = (String, Polygon<f64>)>,
    {
        let mut index = Self::new();
        for (name, boundary) in boundaries {
            index.push(name, boundary);
        }
        index
    }

    /// Append an ROI at the end of the match order.
    pub fn push(&mut self, name: String, boundary: Polygon<f64>) {
        self.rois.push(Roi {
            name,
            boundary,
            towns: Vec::new(),
            catchments: Vec::new(),
        });
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Assign each town to the first ROI whose boundary contains its point,
    /// then derive every ROI's buffered catchments from its assigned towns.
    ///
    /// Previous assignments are cleared first, so re-running on unchanged
    /// inputs is idempotent. Towns contained by no ROI are logged and
    /// returned as diagnostics; they are not an error. Assignment with zero
    /// ROIs loaded is meaningless and fails with
    /// [`ModelError::Precondition`].
    pub fn assign_towns(&mut self, towns: &[Town]) -> Result<Vec<Town>, ModelError> {
        if self.rois.is_empty() {
            return Err(ModelError::Precondition("no ROIs loaded"));
        }

        for roi in &mut self.rois {
            roi.towns.clear();
            roi.catchments.clear();
        }

        let mut unassigned = Vec::new();
        for town in towns {
            match self
                .rois
                .iter_mut()
                .find(|roi| roi.boundary.contains(&town.point))
            {
                Some(roi) => roi.towns.push(town.clone()),
                None => {
                    warn!(
                        "town {} at ({:.1}, {:.1}) lies outside every ROI",
                        town.name,
                        town.point.x(),
                        town.point.y()
                    );
                    unassigned.push(town.clone());
                }
            }
        }

        for roi in &mut self.rois {
            roi.catchments = roi
                .towns
                .iter()
                .map(|town| Catchment {
                    name: town.name.clone(),
                    area: town.point.buffer(CATCHMENT_RADIUS),
                })
                .collect();
        }
        Ok(unassigned)
    }
}
