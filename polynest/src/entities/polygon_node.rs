use log::debug;
use ordered_float::OrderedFloat;

use crate::clipper::{self, JoinType};
use crate::error::{NestError, Result};
use crate::geometry::Polygon;
use crate::geometry::geo_traits::{Shape, Transformable};
use crate::util::TOL;

/// Miter limit of the spacing offset
const OFFSET_MITER_LIMIT: f64 = 2.5;

/// Polygon in the containment tree of a part (or the bin).
///
/// Depth alternates between material and void: roots are outer contours, their children holes,
/// grandchildren islands inside those holes and so on.
/// Roots wind with negative area and every level winds opposite to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonNode {
    /// Index of the part (or of the input polygon) this node was built from, `-1` for the bin
    pub source: i32,
    /// Rotation in degrees applied before the node is used
    pub rotation: f64,
    pub polygon: Polygon,
    pub children: Vec<PolygonNode>,
}

impl PolygonNode {
    pub fn new(source: i32, rotation: f64, polygon: Polygon) -> Self {
        PolygonNode {
            source,
            rotation,
            polygon,
            children: vec![],
        }
    }

    /// Cleans every polygon and nests them by point containment.
    ///
    /// Polygons that do not survive cleaning are dropped. Each node keeps the index of its input polygon as `source`.
    pub fn build_tree(polygons: &[Polygon], curve_tolerance: f64, scale: f64) -> Vec<PolygonNode> {
        let nodes = polygons
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match clipper::clean(p, curve_tolerance, scale) {
                Some(cleaned) => Some(PolygonNode::new(i as i32, 0.0, cleaned)),
                None => {
                    debug!("[TREE] polygon {i} degenerated while cleaning, dropped");
                    None
                }
            })
            .collect();
        let mut roots = nest(nodes);
        for root in &mut roots {
            root.normalize_winding(false);
        }
        roots
    }

    /// Orients the node to negative area (or positive when `flip`) and alternates below it.
    pub fn normalize_winding(&mut self, flip: bool) {
        let area = self.polygon.area();
        if (area > 0.0) != flip {
            self.polygon.reverse();
        }
        for child in &mut self.children {
            child.normalize_winding(!flip);
        }
    }

    /// Copy of the tree rotated by its own `rotation`, which is kept.
    pub fn rotated(&self) -> PolygonNode {
        self.rotated_by(self.rotation)
    }

    fn rotated_by(&self, degrees: f64) -> PolygonNode {
        PolygonNode {
            source: self.source,
            rotation: self.rotation,
            polygon: self.polygon.rotated(degrees),
            children: self.children.iter().map(|c| c.rotated_by(degrees)).collect(),
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.polygon.translate(dx, dy);
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Area of the material: the outer contour minus its holes, plus islands, and so on.
    pub fn net_area(&self) -> f64 {
        self.polygon.area().abs() - self.children.iter().map(|c| c.net_area()).sum::<f64>()
    }

    /// Polygon with the child contours attached as holes.
    pub fn to_polygon(&self) -> Polygon {
        self.polygon
            .clone()
            .with_children(self.children.iter().map(|c| c.polygon.clone()).collect())
    }
}

/// Sorts `nodes` into trees. The parent of a node is the smallest other node containing its first vertex.
fn nest(nodes: Vec<PolygonNode>) -> Vec<PolygonNode> {
    let n = nodes.len();
    let containers: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            let first = nodes[i].polygon.at(0);
            (0..n)
                .filter(|&j| j != i && nodes[j].polygon.point_in(first, TOL) == Some(true))
                .collect()
        })
        .collect();
    let parent: Vec<Option<usize>> = containers
        .iter()
        .map(|c| {
            c.iter()
                .copied()
                .min_by_key(|&j| OrderedFloat(nodes[j].polygon.area().abs()))
        })
        .collect();

    // deepest first, so every node is complete before it moves into its parent
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(containers[i].len()));

    let mut slots: Vec<Option<PolygonNode>> = nodes.into_iter().map(Some).collect();
    for i in order {
        let Some(p) = parent[i] else { continue };
        if let Some(child) = slots[i].take() {
            if let Some(parent) = slots[p].as_mut() {
                parent.children.push(child);
            }
        }
    }
    slots.into_iter().flatten().collect()
}

/// Grows (positive `offset`) or shrinks every contour, flipping the sign at each level of the tree.
///
/// Fails with [`NestError::OffsetLoopCount`] when a contour does not come back as exactly one loop.
pub fn offset_tree(nodes: &mut [PolygonNode], offset: f64, curve_tolerance: f64, scale: f64) -> Result<()> {
    if offset.abs() < TOL {
        return Ok(());
    }
    for node in nodes.iter_mut() {
        let mut loops = clipper::offset(
            &node.polygon,
            offset,
            JoinType::Round,
            OFFSET_MITER_LIMIT,
            curve_tolerance,
            scale,
        );
        if loops.len() != 1 {
            return Err(NestError::OffsetLoopCount {
                expected: 1,
                got: loops.len(),
            });
        }
        let flip = node.polygon.area() > 0.0;
        node.polygon = loops.swap_remove(0);
        if (node.polygon.area() > 0.0) != flip {
            node.polygon.reverse();
        }
        offset_tree(&mut node.children, -offset, curve_tolerance, scale)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const SCALE: f64 = 1e7;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::rectangle(x, y, size, size)
    }

    #[test]
    fn holes_and_islands_alternate() {
        let polygons = vec![
            square(2.0, 2.0, 6.0),
            square(0.0, 0.0, 10.0),
            square(4.0, 4.0, 2.0),
            square(20.0, 0.0, 5.0),
        ];
        let roots = PolygonNode::build_tree(&polygons, 0.3, SCALE);
        assert_eq!(roots.len(), 2);
        let outer = roots.iter().find(|r| r.source == 1).unwrap();
        assert_eq!(outer.children.len(), 1);
        assert_eq!(outer.children[0].source, 0);
        assert_eq!(outer.children[0].children.len(), 1);
        assert_eq!(outer.children[0].children[0].source, 2);

        assert!(outer.polygon.area() < 0.0);
        assert!(outer.children[0].polygon.area() > 0.0);
        assert!(outer.children[0].children[0].polygon.area() < 0.0);
        assert!(approx_eq!(f64, outer.net_area(), 100.0 - 36.0 + 4.0, epsilon = 1e-6));
    }

    #[test]
    fn offset_grows_parts_and_shrinks_holes() {
        let polygons = vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 6.0)];
        let mut roots = PolygonNode::build_tree(&polygons, 0.3, SCALE);
        offset_tree(&mut roots, 1.0, 0.3, SCALE).unwrap();
        let root = &roots[0];
        // rounded corners lie between a single chamfer (142) and the true arc (140 + pi)
        let area = root.polygon.area().abs();
        assert!(area >= 142.0 - 1e-6 && area <= 140.0 + std::f64::consts::PI + 1e-6, "{area}");
        assert!(approx_eq!(f64, root.children[0].polygon.area().abs(), 16.0, epsilon = 1e-6));
        assert!(root.polygon.area() < 0.0);
        assert!(root.children[0].polygon.area() > 0.0);
    }

    #[test]
    fn finer_tolerance_follows_the_arc() {
        let mut roots = vec![PolygonNode::new(0, 0.0, square(0.0, 0.0, 10.0))];
        offset_tree(&mut roots, 1.0, 0.01, SCALE).unwrap();
        let area = roots[0].polygon.area().abs();
        assert!(area > 143.0 && area <= 140.0 + std::f64::consts::PI + 1e-6, "{area}");
        assert!(roots[0].polygon.len() > 8);
    }

    #[test]
    fn collapsing_offset_is_reported() {
        let mut roots = vec![PolygonNode::new(0, 0.0, square(0.0, 0.0, 1.0))];
        let err = offset_tree(&mut roots, -2.0, 0.3, SCALE).unwrap_err();
        assert_eq!(err, NestError::OffsetLoopCount { expected: 1, got: 0 });
    }
}
