use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::NfpKey;
use crate::entities::PolygonNode;
use crate::geometry::{BoundRect, Polygon};
use crate::util::PackedConfig;

/// Position of one part inside a bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index of the part in the node list of the placement job
    pub node_idx: u16,
    pub rotation_idx: u16,
    /// Translation applied to the rotated part
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinPlacement {
    pub placements: Vec<Placement>,
}

/// Everything a worker needs to place one phenotype: parts in placement order with their rotation,
/// the bin and every NFP between them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementJob {
    pub config: PackedConfig,
    pub bin_area: f64,
    pub cache: BTreeMap<NfpKey, Vec<Polygon>>,
    pub nodes: Vec<PolygonNode>,
    pub bin: PolygonNode,
}

/// Outcome of a placement pass. Lower fitness is better.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementResult {
    pub fitness: f64,
    pub placed_count: u16,
    pub total_count: u16,
    pub rotations: u8,
    /// Extent of the parts in the first bin, `None` when nothing was placed
    pub bounds: Option<BoundRect>,
    pub nodes: Vec<PolygonNode>,
    pub bins: Vec<BinPlacement>,
}

impl PlacementResult {
    pub fn has_result(&self) -> bool {
        self.bounds.is_some()
    }

    /// Share of the used bins' area covered by placed parts.
    pub fn efficiency(&self, bin_area: f64) -> f64 {
        let used: f64 = self
            .bins
            .iter()
            .flat_map(|b| &b.placements)
            .filter_map(|p| self.nodes.get(p.node_idx as usize))
            .map(|n| n.net_area())
            .sum();
        match self.bins.len() {
            0 => 0.0,
            n => used / (n as f64 * bin_area),
        }
    }
}
