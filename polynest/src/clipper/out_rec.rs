use crate::clipper::edge::HORIZONTAL;
use crate::clipper::engine::Clipper;
use crate::clipper::int_point::{IntPoint, crossing_step, pt2_is_between_pt1_and_pt3, slopes_equal3};

/// Vertex of an output ring. `idx` is the owning [`OutRec`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutPt {
    pub idx: usize,
    pub pt: IntPoint,
    pub next: usize,
    pub prev: usize,
}

/// Output polygon under construction.
/// `pts` is the left-most vertex of the ring and `pts.prev` the right-most.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutRec {
    pub idx: usize,
    pub is_hole: bool,
    pub first_left: Option<usize>,
    pub pts: Option<usize>,
    pub bottom_pt: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Join {
    pub out_pt1: usize,
    pub out_pt2: usize,
    pub off_pt: IntPoint,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GhostJoin {
    pub out_pt: usize,
    pub off_pt: IntPoint,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct IntersectNode {
    pub edge1: usize,
    pub edge2: usize,
    pub pt: IntPoint,
}

fn get_dx(p1: IntPoint, p2: IntPoint) -> f64 {
    match p1.y == p2.y {
        true => HORIZONTAL,
        false => (p2.x - p1.x) as f64 / (p2.y - p1.y) as f64,
    }
}

impl Clipper {
    pub(crate) fn create_out_rec(&mut self) -> usize {
        let idx = self.out_recs.len();
        self.out_recs.push(OutRec {
            idx,
            is_hole: false,
            first_left: None,
            pts: None,
            bottom_pt: None,
        });
        idx
    }

    pub(crate) fn new_out_pt(&mut self, idx: usize, pt: IntPoint) -> usize {
        let op = self.out_pts.len();
        self.out_pts.push(OutPt { idx, pt, next: op, prev: op });
        op
    }

    /// Follows merge redirections to the record that currently owns the ring.
    pub(crate) fn get_out_rec(&self, mut idx: usize) -> usize {
        while self.out_recs[idx].idx != idx {
            idx = self.out_recs[idx].idx;
        }
        idx
    }

    pub(crate) fn ring_len(&self, start: usize) -> usize {
        let mut n = 0;
        let mut p = start;
        loop {
            n += 1;
            p = self.out_pts[p].next;
            if p == start {
                return n;
            }
        }
    }

    pub(crate) fn ring_area(&self, start: usize) -> f64 {
        let mut a = 0.0;
        let mut op = start;
        loop {
            let prev = self.out_pts[self.out_pts[op].prev].pt;
            let cur = self.out_pts[op].pt;
            a += (prev.x as f64 + cur.x as f64) * (prev.y as f64 - cur.y as f64);
            op = self.out_pts[op].next;
            if op == start {
                return a * 0.5;
            }
        }
    }

    pub(crate) fn reverse_ring(&mut self, start: usize) {
        let mut p1 = start;
        loop {
            let p2 = self.out_pts[p1].next;
            self.out_pts[p1].next = self.out_pts[p1].prev;
            self.out_pts[p1].prev = p2;
            p1 = p2;
            if p1 == start {
                break;
            }
        }
    }

    pub(crate) fn dup_out_pt(&mut self, op: usize, insert_after: bool) -> usize {
        let src = self.out_pts[op];
        let r = self.new_out_pt(src.idx, src.pt);
        if insert_after {
            self.out_pts[r].next = src.next;
            self.out_pts[r].prev = op;
            self.out_pts[src.next].prev = r;
            self.out_pts[op].next = r;
        } else {
            self.out_pts[r].prev = src.prev;
            self.out_pts[r].next = op;
            self.out_pts[src.prev].next = r;
            self.out_pts[op].prev = r;
        }
        r
    }

    pub(crate) fn update_out_pt_idxs(&mut self, rec: usize) {
        let Some(start) = self.out_recs[rec].pts else { return };
        let idx = self.out_recs[rec].idx;
        let mut op = start;
        loop {
            self.out_pts[op].idx = idx;
            op = self.out_pts[op].prev;
            if op == start {
                break;
            }
        }
    }

    /// Crossing test of `pt` against an output ring: 0 outside, 1 inside, -1 on the ring.
    fn point_in_ring(&self, pt: IntPoint, start: usize) -> i32 {
        let mut result = 0;
        let mut op = start;
        let mut p0 = self.out_pts[op].pt;
        loop {
            op = self.out_pts[op].next;
            let p1 = self.out_pts[op].pt;
            if let Some(r) = crossing_step(pt, p0, p1, &mut result) {
                return r;
            }
            p0 = p1;
            if op == start {
                return result;
            }
        }
    }

    /// True when ring `outer` contains ring `inner`, judged by the first vertex not on `outer`.
    pub(crate) fn poly2_contains_poly1(&self, inner: usize, outer: usize) -> bool {
        let mut op = inner;
        loop {
            let res = self.point_in_ring(self.out_pts[op].pt, outer);
            if res >= 0 {
                return res > 0;
            }
            op = self.out_pts[op].next;
            if op == inner {
                return true;
            }
        }
    }

    fn get_bottom_pt(&self, mut pp: usize) -> usize {
        let pts = &self.out_pts;
        let mut dups: Option<usize> = None;
        let mut p = pts[pp].next;
        while p != pp {
            if pts[p].pt.y > pts[pp].pt.y {
                pp = p;
                dups = None;
            } else if pts[p].pt.y == pts[pp].pt.y && pts[p].pt.x <= pts[pp].pt.x {
                if pts[p].pt.x < pts[pp].pt.x {
                    dups = None;
                    pp = p;
                } else if pts[p].next != pp && pts[p].prev != pp {
                    dups = Some(p);
                }
            }
            p = pts[p].next;
        }
        if let Some(mut d) = dups {
            // several vertices share the bottom point
            while d != p {
                if !self.first_is_bottom_pt(p, d) {
                    pp = d;
                }
                d = pts[d].next;
                while pts[d].pt != pts[pp].pt {
                    d = pts[d].next;
                }
            }
        }
        pp
    }

    fn first_is_bottom_pt(&self, b1: usize, b2: usize) -> bool {
        let pts = &self.out_pts;
        let side_dx = |b: usize, forward: bool| {
            let mut p = if forward { pts[b].next } else { pts[b].prev };
            while pts[p].pt == pts[b].pt && p != b {
                p = if forward { pts[p].next } else { pts[p].prev };
            }
            get_dx(pts[b].pt, pts[p].pt).abs()
        };
        let dx1p = side_dx(b1, false);
        let dx1n = side_dx(b1, true);
        let dx2p = side_dx(b2, false);
        let dx2n = side_dx(b2, true);
        if dx1p.max(dx1n) == dx2p.max(dx2n) && dx1p.min(dx1n) == dx2p.min(dx2n) {
            self.ring_area(b1) > 0.0
        } else {
            (dx1p >= dx2p && dx1p >= dx2n) || (dx1n >= dx2p && dx1n >= dx2n)
        }
    }

    pub(crate) fn get_lowermost_rec(&mut self, r1: usize, r2: usize) -> usize {
        for r in [r1, r2] {
            if self.out_recs[r].bottom_pt.is_none() {
                if let Some(pts) = self.out_recs[r].pts {
                    self.out_recs[r].bottom_pt = Some(self.get_bottom_pt(pts));
                }
            }
        }
        let (Some(b1), Some(b2)) = (self.out_recs[r1].bottom_pt, self.out_recs[r2].bottom_pt) else {
            return r1;
        };
        let (p1, p2) = (self.out_pts[b1], self.out_pts[b2]);
        if p1.pt.y > p2.pt.y {
            r1
        } else if p1.pt.y < p2.pt.y {
            r2
        } else if p1.pt.x < p2.pt.x {
            r1
        } else if p1.pt.x > p2.pt.x {
            r2
        } else if p1.next == b1 {
            r2
        } else if p2.next == b2 {
            r1
        } else if self.first_is_bottom_pt(b1, b2) {
            r1
        } else {
            r2
        }
    }

    /// True when `r2` is reached by walking `r1`'s first-left chain.
    pub(crate) fn out_rec1_right_of_out_rec2(&self, r1: usize, r2: usize) -> bool {
        let mut r = self.out_recs[r1].first_left;
        while let Some(fl) = r {
            if fl == r2 {
                return true;
            }
            r = self.out_recs[fl].first_left;
        }
        false
    }

    /// Drops duplicate vertices and collinear middles; rings with fewer than three vertices vanish.
    pub(crate) fn fixup_out_polygon(&mut self, rec: usize) {
        let mut last_ok: Option<usize> = None;
        self.out_recs[rec].bottom_pt = None;
        let Some(mut pp) = self.out_recs[rec].pts else { return };
        let preserve = self.preserve_collinear || self.strictly_simple;
        loop {
            let op = self.out_pts[pp];
            if op.prev == pp || op.prev == op.next {
                self.out_recs[rec].pts = None;
                return;
            }
            let (prev_pt, next_pt) = (self.out_pts[op.prev].pt, self.out_pts[op.next].pt);
            if op.pt == next_pt
                || op.pt == prev_pt
                || (slopes_equal3(prev_pt, op.pt, next_pt)
                    && (!preserve || !pt2_is_between_pt1_and_pt3(prev_pt, op.pt, next_pt)))
            {
                last_ok = None;
                self.out_pts[op.prev].next = op.next;
                self.out_pts[op.next].prev = op.prev;
                pp = op.prev;
            } else if Some(pp) == last_ok {
                break;
            } else {
                if last_ok.is_none() {
                    last_ok = Some(pp);
                }
                pp = op.next;
            }
        }
        self.out_recs[rec].pts = Some(pp);
    }
}
