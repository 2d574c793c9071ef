use crate::entities::PlacementResult;
use crate::io::ext_repr::{ExtBin, ExtPlacement, ExtSolution};
use crate::io::import::Instance;

/// Exports a placement result to its external representation.
/// Placements of nodes missing from the result are skipped.
pub fn export_solution(result: &PlacementResult, instance: &Instance) -> ExtSolution {
    let bins = result
        .bins
        .iter()
        .map(|bin| ExtBin {
            placements: bin
                .placements
                .iter()
                .filter_map(|p| {
                    let node = result.nodes.get(p.node_idx as usize)?;
                    Some(ExtPlacement {
                        part: instance.part_id(node.source)?,
                        x: p.x,
                        y: p.y,
                        rotation: node.rotation,
                    })
                })
                .collect(),
        })
        .collect();

    ExtSolution {
        fitness: result.fitness,
        placed: result.placed_count as usize,
        total: result.total_count as usize,
        efficiency: result.efficiency(instance.bin_area()),
        bins,
    }
}
