use std::collections::BinaryHeap;

use log::trace;

use crate::clipper::edge::{LocalMinimum, TEdge};
use crate::clipper::int_point::{IntPath, IntPoint};
use crate::clipper::out_rec::{GhostJoin, IntersectNode, Join, OutPt, OutRec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipType {
    Intersection,
    Union,
    Difference,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyType {
    Subject,
    Clip,
}

/// Winding rule deciding which regions count as filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyFillType {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    RightToLeft,
    LeftToRight,
}

/// Vatti sweep-line clipper over closed integer paths.
///
/// Edges, output points and output records live in flat arenas and refer to each other by index,
/// so splicing output rings is a matter of rewriting `next`/`prev` fields.
#[derive(Debug)]
pub struct Clipper {
    pub(crate) edges: Vec<TEdge>,
    pub(crate) minima: Vec<LocalMinimum>,
    pub(crate) current_lm: usize,
    pub(crate) scanbeam: BinaryHeap<i64>,
    pub(crate) active_edges: Option<usize>,
    pub(crate) sorted_edges: Option<usize>,
    pub(crate) intersections: Vec<IntersectNode>,
    pub(crate) maxima: Vec<i64>,
    pub(crate) out_pts: Vec<OutPt>,
    pub(crate) out_recs: Vec<OutRec>,
    pub(crate) joins: Vec<Join>,
    pub(crate) ghost_joins: Vec<GhostJoin>,
    pub(crate) clip_type: ClipType,
    pub(crate) subj_fill: PolyFillType,
    pub(crate) clip_fill: PolyFillType,
    pub(crate) bounds: Option<(IntPoint, IntPoint)>,
    /// Emit outer loops with negative lattice area instead of positive.
    pub reverse_output: bool,
    /// Split output rings at self-touching vertices.
    pub strictly_simple: bool,
    pub preserve_collinear: bool,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipper {
    pub fn new() -> Self {
        Clipper {
            edges: vec![],
            minima: vec![],
            current_lm: 0,
            scanbeam: BinaryHeap::new(),
            active_edges: None,
            sorted_edges: None,
            intersections: vec![],
            maxima: vec![],
            out_pts: vec![],
            out_recs: vec![],
            joins: vec![],
            ghost_joins: vec![],
            clip_type: ClipType::Union,
            subj_fill: PolyFillType::NonZero,
            clip_fill: PolyFillType::NonZero,
            bounds: None,
            reverse_output: false,
            strictly_simple: true,
            preserve_collinear: false,
        }
    }

    /// Adds a closed path. Returns false when the path collapses to fewer than three distinct vertices.
    pub fn add_path(&mut self, path: &[IntPoint], poly_type: PolyType) -> bool {
        let added = self.build_edges(path, poly_type);
        if added {
            for p in path {
                self.bounds = Some(match self.bounds {
                    None => (*p, *p),
                    Some((lo, hi)) => (
                        IntPoint::new(lo.x.min(p.x), lo.y.min(p.y)),
                        IntPoint::new(hi.x.max(p.x), hi.y.max(p.y)),
                    ),
                });
            }
        }
        added
    }

    pub fn add_paths(&mut self, paths: &[IntPath], poly_type: PolyType) -> bool {
        paths
            .iter()
            .fold(false, |acc, p| self.add_path(p, poly_type) || acc)
    }

    /// Lattice bounds `(min, max)` of every path added so far.
    pub fn bounds(&self) -> Option<(IntPoint, IntPoint)> {
        self.bounds
    }

    /// Runs the sweep. An empty result is a valid outcome (disjoint or fully removed input).
    pub fn execute(
        &mut self,
        clip_type: ClipType,
        subj_fill: PolyFillType,
        clip_fill: PolyFillType,
    ) -> Vec<IntPath> {
        self.clip_type = clip_type;
        self.subj_fill = subj_fill;
        self.clip_fill = clip_fill;
        let succeeded = self.execute_internal();
        let result = match succeeded {
            true => self.build_result(),
            false => {
                trace!("[CLIP] intersection ordering could not be resolved, empty result");
                vec![]
            }
        };
        self.dispose_output();
        result
    }

    fn execute_internal(&mut self) -> bool {
        self.reset();
        self.maxima.clear();
        self.sorted_edges = None;

        let Some(mut bot_y) = self.pop_scanbeam() else {
            return true;
        };
        self.insert_local_minima_into_ael(bot_y);
        let mut succeeded = true;
        loop {
            let top_y = match self.pop_scanbeam() {
                Some(y) => y,
                None if self.local_minima_pending() => bot_y,
                None => break,
            };
            self.process_horizontals();
            self.ghost_joins.clear();
            if !self.process_intersections(top_y) {
                succeeded = false;
                break;
            }
            self.process_edges_at_top_of_scanbeam(top_y);
            bot_y = top_y;
            self.insert_local_minima_into_ael(bot_y);
        }

        if succeeded {
            for i in 0..self.out_recs.len() {
                let Some(pts) = self.out_recs[i].pts else {
                    continue;
                };
                if (self.out_recs[i].is_hole ^ self.reverse_output) == (self.ring_area(pts) > 0.0) {
                    self.reverse_ring(pts);
                }
            }
            if !self.joins.is_empty() {
                self.join_common_edges();
            }
            for i in 0..self.out_recs.len() {
                if self.out_recs[i].pts.is_some() {
                    self.fixup_out_polygon(i);
                }
            }
            if self.strictly_simple {
                self.do_simple_polygons();
            }
        }
        self.joins.clear();
        self.ghost_joins.clear();
        succeeded
    }

    fn reset(&mut self) {
        self.current_lm = 0;
        self.scanbeam.clear();
        self.active_edges = None;
        // stable, so minima sharing a scanline keep insertion order
        self.minima.sort_by(|a, b| b.y.cmp(&a.y));
        for i in 0..self.minima.len() {
            let lm = self.minima[i];
            self.scanbeam.push(lm.y);
            for (e, side) in [(lm.left_bound, EdgeSide::Left), (lm.right_bound, EdgeSide::Right)] {
                let edge = &mut self.edges[e];
                edge.curr = edge.bot;
                edge.side = side;
                edge.out_idx = None;
            }
        }
    }

    pub(crate) fn insert_scanbeam(&mut self, y: i64) {
        self.scanbeam.push(y);
    }

    fn pop_scanbeam(&mut self) -> Option<i64> {
        let y = self.scanbeam.pop()?;
        while self.scanbeam.peek() == Some(&y) {
            self.scanbeam.pop();
        }
        Some(y)
    }

    fn local_minima_pending(&self) -> bool {
        self.current_lm < self.minima.len()
    }

    pub(crate) fn pop_local_minima(&mut self, y: i64) -> Option<LocalMinimum> {
        match self.minima.get(self.current_lm) {
            Some(lm) if lm.y == y => {
                self.current_lm += 1;
                Some(*lm)
            }
            _ => None,
        }
    }

    fn build_result(&self) -> Vec<IntPath> {
        let mut result = Vec::with_capacity(self.out_recs.len());
        for rec in &self.out_recs {
            let Some(pts) = rec.pts else { continue };
            let start = self.out_pts[pts].prev;
            let cnt = self.ring_len(start);
            if cnt < 2 {
                continue;
            }
            let mut path = Vec::with_capacity(cnt);
            let mut p = start;
            for _ in 0..cnt {
                path.push(self.out_pts[p].pt);
                p = self.out_pts[p].prev;
            }
            result.push(path);
        }
        result
    }

    /// Clears the output state so the same input edges can be executed again.
    fn dispose_output(&mut self) {
        self.out_pts.clear();
        self.out_recs.clear();
        self.intersections.clear();
        self.active_edges = None;
        self.sorted_edges = None;
    }
}
