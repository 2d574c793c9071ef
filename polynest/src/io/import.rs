use log::warn;

use crate::clipper::CLIPPER_SCALE;
use crate::entities::PolygonNode;
use crate::error::{NestError, Result};
use crate::geometry::Polygon;
use crate::geometry::geo_traits::Shape;
use crate::io::ext_repr::{ExtInstance, ExtPolygon};

/// A part with its containment tree, `source` set to the index of the part in the instance.
#[derive(Debug, Clone)]
pub struct Part {
    pub id: u64,
    pub quantity: usize,
    pub tree: PolygonNode,
}

/// Cleaned and nested representation of an [`ExtInstance`].
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    /// Bin tree with `source == -1`
    pub bin: PolygonNode,
    pub parts: Vec<Part>,
}

impl Instance {
    pub fn bin_area(&self) -> f64 {
        self.bin.polygon.area().abs()
    }

    pub fn total_quantity(&self) -> usize {
        self.parts.iter().map(|p| p.quantity).sum()
    }

    /// One tree per part copy, in instance order.
    pub fn expanded_nodes(&self) -> Vec<PolygonNode> {
        self.parts
            .iter()
            .flat_map(|p| std::iter::repeat_n(&p.tree, p.quantity))
            .cloned()
            .collect()
    }

    pub fn part_id(&self, source: i32) -> Option<u64> {
        usize::try_from(source).ok().and_then(|s| self.parts.get(s)).map(|p| p.id)
    }
}

pub fn import_instance(ext: &ExtInstance, curve_tolerance: f64) -> Result<Instance> {
    let bin = import_tree(&ext.bin, &[], curve_tolerance, -1)
        .ok_or_else(|| NestError::InvalidPolygon("bin has no area after cleaning".into()))?;

    let parts = ext
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let tree = import_tree(&part.outer, &part.holes, curve_tolerance, i as i32)
                .ok_or_else(|| NestError::InvalidPolygon(format!("part {i} has no area after cleaning")))?;
            Ok(Part {
                id: part.id.unwrap_or(i as u64),
                quantity: part.quantity,
                tree,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Instance {
        name: ext.name.clone(),
        bin,
        parts,
    })
}

fn import_tree(outer: &ExtPolygon, holes: &[ExtPolygon], curve_tolerance: f64, source: i32) -> Option<PolygonNode> {
    let polygons: Vec<Polygon> = std::iter::once(outer)
        .chain(holes)
        .map(|p| Polygon::from_points(p.0.iter().map(|&(x, y)| (x, y).into())))
        .collect();
    let mut roots = PolygonNode::build_tree(&polygons, curve_tolerance, CLIPPER_SCALE);
    let outer_idx = roots.iter().position(|r| r.source == 0)?;
    let mut tree = roots.swap_remove(outer_idx);
    if !roots.is_empty() {
        warn!("[IO] {} hole(s) of source {source} lie outside its contour, ignored", roots.len());
    }
    set_source(&mut tree, source);
    Some(tree)
}

fn set_source(node: &mut PolygonNode, source: i32) {
    node.source = source;
    for child in &mut node.children {
        set_source(child, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn instance() -> ExtInstance {
        serde_json::from_str(
            r#"{
                "bin": [[0, 0], [100, 0], [100, 100], [0, 100]],
                "parts": [
                    { "outer": [[0, 0], [40, 0], [40, 40], [0, 40]], "quantity": 2 },
                    { "id": 17, "outer": [[0, 0], [30, 0], [30, 30], [0, 30]],
                      "holes": [[[10, 10], [20, 10], [20, 20], [10, 20]]] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parts_are_nested_and_expanded() {
        let inst = import_instance(&instance(), 0.3).unwrap();
        assert_eq!(inst.bin.source, -1);
        assert!(approx_eq!(f64, inst.bin_area(), 10000.0, epsilon = 1e-6));
        assert_eq!(inst.part_id(0), Some(0));
        assert_eq!(inst.part_id(1), Some(17));
        assert_eq!(inst.part_id(-1), None);

        let holed = &inst.parts[1].tree;
        assert_eq!(holed.children.len(), 1);
        assert_eq!(holed.children[0].source, 1);
        assert!(approx_eq!(f64, holed.net_area(), 800.0, epsilon = 1e-6));

        let nodes = inst.expanded_nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(inst.total_quantity(), 3);
        assert_eq!(nodes.iter().map(|n| n.source).collect::<Vec<_>>(), vec![0, 0, 1]);
    }

    #[test]
    fn degenerate_bin_is_rejected() {
        let mut ext = instance();
        ext.bin = ExtPolygon(vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        assert!(matches!(import_instance(&ext, 0.3), Err(NestError::InvalidPolygon(_))));
    }
}
