use serde::{Deserialize, Serialize};

/// Nesting problem as read from a JSON file.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtInstance {
    #[serde(default)]
    pub name: String,
    /// Contour of the bin every part is placed in
    pub bin: ExtPolygon,
    pub parts: Vec<ExtPart>,
}

/// External representation of a part, optionally with holes and several copies.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtPart {
    /// Identifier reported in solutions. The index of the part in the instance if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Number of copies to place
    #[serde(default = "default_quantity")]
    pub quantity: usize,
    pub outer: ExtPolygon,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<ExtPolygon>,
}

fn default_quantity() -> usize {
    1
}

/// Simple polygon as a list of `[x, y]` points, first point not repeated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExtPolygon(pub Vec<(f64, f64)>);

/// External representation of a [`PlacementResult`](crate::entities::PlacementResult).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtSolution {
    pub fitness: f64,
    pub placed: usize,
    pub total: usize,
    /// Placed part area relative to the area of the used bins
    pub efficiency: f64,
    pub bins: Vec<ExtBin>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExtBin {
    pub placements: Vec<ExtPlacement>,
}

/// Pose of one part copy: first rotated around the origin, then translated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExtPlacement {
    pub part: u64,
    pub x: f64,
    pub y: f64,
    /// Degrees
    pub rotation: f64,
}
