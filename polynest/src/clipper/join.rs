use crate::clipper::engine::{Clipper, Direction, EdgeSide};
use crate::clipper::int_point::{IntPoint, slopes_equal3, slopes_equal4};
use crate::clipper::out_rec::Join;

fn get_overlap(a1: i64, a2: i64, b1: i64, b2: i64) -> Option<(i64, i64)> {
    let (left, right) = if a1 < a2 {
        if b1 < b2 { (a1.max(b1), a2.min(b2)) } else { (a1.max(b2), a2.min(b1)) }
    } else if b1 < b2 {
        (a2.max(b1), a1.min(b2))
    } else {
        (a2.max(b2), a1.min(b1))
    };
    (left < right).then_some((left, right))
}

impl Clipper {
    pub(crate) fn add_join(&mut self, out_pt1: usize, out_pt2: usize, off_pt: IntPoint) {
        self.joins.push(Join { out_pt1, out_pt2, off_pt });
    }

    /// Appends `pt` to the ring of edge `e`, opening a new ring if the edge has none.
    pub(crate) fn add_out_pt(&mut self, e: usize, pt: IntPoint) -> usize {
        match self.edges[e].out_idx {
            None => {
                let rec = self.create_out_rec();
                let op = self.new_out_pt(rec, pt);
                self.out_recs[rec].pts = Some(op);
                self.set_hole_state(e, rec);
                self.edges[e].out_idx = Some(rec);
                op
            }
            Some(rec) => {
                let Some(op) = self.out_recs[rec].pts else {
                    let op = self.new_out_pt(rec, pt);
                    self.out_recs[rec].pts = Some(op);
                    return op;
                };
                let to_front = self.edges[e].side == EdgeSide::Left;
                let op_prev = self.out_pts[op].prev;
                if to_front && pt == self.out_pts[op].pt {
                    return op;
                } else if !to_front && pt == self.out_pts[op_prev].pt {
                    return op_prev;
                }
                let new_op = self.new_out_pt(rec, pt);
                self.out_pts[new_op].next = op;
                self.out_pts[new_op].prev = op_prev;
                self.out_pts[op_prev].next = new_op;
                self.out_pts[op].prev = new_op;
                if to_front {
                    self.out_recs[rec].pts = Some(new_op);
                }
                new_op
            }
        }
    }

    pub(crate) fn get_last_out_pt(&self, e: usize) -> usize {
        let ed = &self.edges[e];
        let rec = ed.out_idx.map(|r| self.out_recs[r]);
        match rec.and_then(|r| r.pts) {
            Some(pts) if ed.side == EdgeSide::Left => pts,
            Some(pts) => self.out_pts[pts].prev,
            None => 0,
        }
    }

    fn set_hole_state(&mut self, e: usize, rec: usize) {
        let mut e2 = self.edges[e].prev_in_ael;
        let mut e_tmp: Option<usize> = None;
        while let Some(i) = e2 {
            let ed = self.edges[i];
            if ed.out_idx.is_some() && ed.wind_delta != 0 {
                match e_tmp {
                    None => e_tmp = Some(i),
                    Some(t) if self.edges[t].out_idx == ed.out_idx => e_tmp = None,
                    _ => {}
                }
            }
            e2 = ed.prev_in_ael;
        }
        match e_tmp.and_then(|t| self.edges[t].out_idx) {
            None => {
                self.out_recs[rec].first_left = None;
                self.out_recs[rec].is_hole = false;
            }
            Some(fl) => {
                self.out_recs[rec].first_left = Some(fl);
                self.out_recs[rec].is_hole = !self.out_recs[fl].is_hole;
            }
        }
    }

    pub(crate) fn add_local_min_poly(&mut self, e1: usize, e2: usize, pt: IntPoint) -> usize {
        let (result, e, prev_e);
        if self.edges[e2].is_horizontal() || self.edges[e1].dx > self.edges[e2].dx {
            result = self.add_out_pt(e1, pt);
            self.edges[e2].out_idx = self.edges[e1].out_idx;
            self.edges[e1].side = EdgeSide::Left;
            self.edges[e2].side = EdgeSide::Right;
            e = e1;
            prev_e = match self.edges[e].prev_in_ael == Some(e2) {
                true => self.edges[e2].prev_in_ael,
                false => self.edges[e].prev_in_ael,
            };
        } else {
            result = self.add_out_pt(e2, pt);
            self.edges[e1].out_idx = self.edges[e2].out_idx;
            self.edges[e1].side = EdgeSide::Right;
            self.edges[e2].side = EdgeSide::Left;
            e = e2;
            prev_e = match self.edges[e].prev_in_ael == Some(e1) {
                true => self.edges[e1].prev_in_ael,
                false => self.edges[e].prev_in_ael,
            };
        }

        if let Some(pe) = prev_e {
            let (p, c) = (self.edges[pe], self.edges[e]);
            if p.out_idx.is_some() && p.top.y < pt.y && c.top.y < pt.y {
                let x_prev = p.top_x(pt.y);
                let x_e = c.top_x(pt.y);
                if x_prev == x_e
                    && c.wind_delta != 0
                    && p.wind_delta != 0
                    && slopes_equal4(IntPoint::new(x_prev, pt.y), p.top, IntPoint::new(x_e, pt.y), c.top)
                {
                    let out_pt = self.add_out_pt(pe, pt);
                    self.add_join(result, out_pt, c.top);
                }
            }
        }
        result
    }

    pub(crate) fn add_local_max_poly(&mut self, e1: usize, e2: usize, pt: IntPoint) {
        self.add_out_pt(e1, pt);
        if self.edges[e2].wind_delta == 0 {
            self.add_out_pt(e2, pt);
        }
        match (self.edges[e1].out_idx, self.edges[e2].out_idx) {
            (Some(a), Some(b)) if a == b => {
                self.edges[e1].out_idx = None;
                self.edges[e2].out_idx = None;
            }
            (Some(a), Some(b)) if a < b => self.append_polygon(e1, e2),
            _ => self.append_polygon(e2, e1),
        }
    }

    /// Splices the ring of `e2` onto the ring of `e1` and retires the former.
    fn append_polygon(&mut self, e1: usize, e2: usize) {
        let (Some(r1), Some(r2)) = (self.edges[e1].out_idx, self.edges[e2].out_idx) else {
            return;
        };
        let hole_state_rec = if self.out_rec1_right_of_out_rec2(r1, r2) {
            r2
        } else if self.out_rec1_right_of_out_rec2(r2, r1) {
            r1
        } else {
            self.get_lowermost_rec(r1, r2)
        };

        let (Some(p1_lft), Some(p2_lft)) = (self.out_recs[r1].pts, self.out_recs[r2].pts) else {
            return;
        };
        let p1_rt = self.out_pts[p1_lft].prev;
        let p2_rt = self.out_pts[p2_lft].prev;
        let side1 = self.edges[e1].side;
        let side2 = self.edges[e2].side;

        match (side1, side2) {
            (EdgeSide::Left, EdgeSide::Left) => {
                // z y x a b c
                self.reverse_ring(p2_lft);
                self.out_pts[p2_lft].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_lft;
                self.out_pts[p1_rt].next = p2_rt;
                self.out_pts[p2_rt].prev = p1_rt;
                self.out_recs[r1].pts = Some(p2_rt);
            }
            (EdgeSide::Left, EdgeSide::Right) => {
                // x y z a b c
                self.out_pts[p2_rt].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_rt;
                self.out_pts[p2_lft].prev = p1_rt;
                self.out_pts[p1_rt].next = p2_lft;
                self.out_recs[r1].pts = Some(p2_lft);
            }
            (EdgeSide::Right, EdgeSide::Right) => {
                // a b c z y x
                self.reverse_ring(p2_lft);
                self.out_pts[p1_rt].next = p2_rt;
                self.out_pts[p2_rt].prev = p1_rt;
                self.out_pts[p2_lft].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_lft;
            }
            (EdgeSide::Right, EdgeSide::Left) => {
                // a b c x y z
                self.out_pts[p1_rt].next = p2_lft;
                self.out_pts[p2_lft].prev = p1_rt;
                self.out_pts[p1_lft].prev = p2_rt;
                self.out_pts[p2_rt].next = p1_lft;
            }
        }

        self.out_recs[r1].bottom_pt = None;
        if hole_state_rec == r2 {
            if self.out_recs[r2].first_left != Some(r1) {
                self.out_recs[r1].first_left = self.out_recs[r2].first_left;
            }
            self.out_recs[r1].is_hole = self.out_recs[r2].is_hole;
        }
        self.out_recs[r2].pts = None;
        self.out_recs[r2].bottom_pt = None;
        self.out_recs[r2].first_left = Some(r1);

        self.edges[e1].out_idx = None;
        self.edges[e2].out_idx = None;

        let mut e = self.active_edges;
        while let Some(ei) = e {
            if self.edges[ei].out_idx == Some(r2) {
                self.edges[ei].out_idx = Some(r1);
                self.edges[ei].side = side1;
                break;
            }
            e = self.edges[ei].next_in_ael;
        }
        self.out_recs[r2].idx = self.out_recs[r1].idx;
    }

    pub(crate) fn join_common_edges(&mut self) {
        for i in 0..self.joins.len() {
            let mut join = self.joins[i];
            let r1 = self.get_out_rec(self.out_pts[join.out_pt1].idx);
            let mut r2 = self.get_out_rec(self.out_pts[join.out_pt2].idx);
            if self.out_recs[r1].pts.is_none() || self.out_recs[r2].pts.is_none() {
                continue;
            }

            // the fragment with the correct hole state, captured before the rings change
            let hole_state_rec = if r1 == r2 {
                r1
            } else if self.out_rec1_right_of_out_rec2(r1, r2) {
                r2
            } else if self.out_rec1_right_of_out_rec2(r2, r1) {
                r1
            } else {
                self.get_lowermost_rec(r1, r2)
            };

            if !self.join_points(&mut join, r1, r2) {
                continue;
            }

            if r1 == r2 {
                // one ring was split in two
                self.out_recs[r1].pts = Some(join.out_pt1);
                self.out_recs[r1].bottom_pt = None;
                r2 = self.create_out_rec();
                self.out_recs[r2].pts = Some(join.out_pt2);
                self.update_out_pt_idxs(r2);

                if self.poly2_contains_poly1(join.out_pt2, join.out_pt1) {
                    self.out_recs[r2].is_hole = !self.out_recs[r1].is_hole;
                    self.out_recs[r2].first_left = Some(r1);
                    self.normalize_ring(r2);
                } else if self.poly2_contains_poly1(join.out_pt1, join.out_pt2) {
                    self.out_recs[r2].is_hole = self.out_recs[r1].is_hole;
                    self.out_recs[r1].is_hole = !self.out_recs[r2].is_hole;
                    self.out_recs[r2].first_left = self.out_recs[r1].first_left;
                    self.out_recs[r1].first_left = Some(r2);
                    self.normalize_ring(r1);
                } else {
                    self.out_recs[r2].is_hole = self.out_recs[r1].is_hole;
                    self.out_recs[r2].first_left = self.out_recs[r1].first_left;
                }
            } else {
                // two rings were joined
                self.out_recs[r2].pts = None;
                self.out_recs[r2].bottom_pt = None;
                self.out_recs[r2].idx = r1;
                self.out_recs[r1].is_hole = self.out_recs[hole_state_rec].is_hole;
                if hole_state_rec == r2 {
                    self.out_recs[r1].first_left = self.out_recs[r2].first_left;
                }
                self.out_recs[r2].first_left = Some(r1);
            }
        }
    }

    /// Reverses a ring whose orientation disagrees with its hole state.
    fn normalize_ring(&mut self, rec: usize) {
        if let Some(pts) = self.out_recs[rec].pts {
            if (self.out_recs[rec].is_hole ^ self.reverse_output) == (self.ring_area(pts) > 0.0) {
                self.reverse_ring(pts);
            }
        }
    }

    fn join_points(&mut self, j: &mut Join, r1: usize, r2: usize) -> bool {
        let mut op1 = j.out_pt1;
        let mut op2 = j.out_pt2;
        let pt = |me: &Self, o: usize| me.out_pts[o].pt;
        let next = |me: &Self, o: usize| me.out_pts[o].next;
        let prev = |me: &Self, o: usize| me.out_pts[o].prev;

        let is_horizontal = pt(self, op1).y == j.off_pt.y;

        if is_horizontal && j.off_pt == pt(self, op1) && j.off_pt == pt(self, op2) {
            // touching edges that are not collinear
            if r1 != r2 {
                return false;
            }
            let mut op1b = next(self, op1);
            while op1b != op1 && pt(self, op1b) == j.off_pt {
                op1b = next(self, op1b);
            }
            let reverse1 = pt(self, op1b).y > j.off_pt.y;
            let mut op2b = next(self, op2);
            while op2b != op2 && pt(self, op2b) == j.off_pt {
                op2b = next(self, op2b);
            }
            let reverse2 = pt(self, op2b).y > j.off_pt.y;
            if reverse1 == reverse2 {
                return false;
            }
            self.splice_join(j, op1, op2, reverse1);
            true
        } else if is_horizontal {
            // the horizontal overlap is not known yet; find the extremes of both runs
            let mut op1b = op1;
            while pt(self, prev(self, op1)).y == pt(self, op1).y && prev(self, op1) != op1b && prev(self, op1) != op2 {
                op1 = prev(self, op1);
            }
            while pt(self, next(self, op1b)).y == pt(self, op1b).y && next(self, op1b) != op1 && next(self, op1b) != op2 {
                op1b = next(self, op1b);
            }
            if next(self, op1b) == op1 || next(self, op1b) == op2 {
                return false;
            }
            let mut op2b = op2;
            while pt(self, prev(self, op2)).y == pt(self, op2).y && prev(self, op2) != op2b && prev(self, op2) != op1b {
                op2 = prev(self, op2);
            }
            while pt(self, next(self, op2b)).y == pt(self, op2b).y && next(self, op2b) != op2 && next(self, op2b) != op1 {
                op2b = next(self, op2b);
            }
            if next(self, op2b) == op2 || next(self, op2b) == op1 {
                return false;
            }
            let (p1, p1b, p2, p2b) = (pt(self, op1), pt(self, op1b), pt(self, op2), pt(self, op2b));
            let Some((left, right)) = get_overlap(p1.x, p1b.x, p2.x, p2b.x) else {
                return false;
            };

            // keep op1/op2 off the discarded side, they may serve later joins
            let (jpt, discard_left) = if p1.x >= left && p1.x <= right {
                (p1, p1.x > p1b.x)
            } else if p2.x >= left && p2.x <= right {
                (p2, p2.x > p2b.x)
            } else if p1b.x >= left && p1b.x <= right {
                (p1b, p1b.x > p1.x)
            } else {
                (p2b, p2b.x > p2.x)
            };
            j.out_pt1 = op1;
            j.out_pt2 = op2;
            self.join_horz(op1, op1b, op2, op2b, jpt, discard_left)
        } else {
            // non-horizontal: both points sit at the bottom of the shared segment
            let mut op1b = next(self, op1);
            while pt(self, op1b) == pt(self, op1) && op1b != op1 {
                op1b = next(self, op1b);
            }
            let reverse1 = pt(self, op1b).y > pt(self, op1).y || !slopes_equal3(pt(self, op1), pt(self, op1b), j.off_pt);
            if reverse1 {
                op1b = prev(self, op1);
                while pt(self, op1b) == pt(self, op1) && op1b != op1 {
                    op1b = prev(self, op1b);
                }
                if pt(self, op1b).y > pt(self, op1).y || !slopes_equal3(pt(self, op1), pt(self, op1b), j.off_pt) {
                    return false;
                }
            }
            let mut op2b = next(self, op2);
            while pt(self, op2b) == pt(self, op2) && op2b != op2 {
                op2b = next(self, op2b);
            }
            let reverse2 = pt(self, op2b).y > pt(self, op2).y || !slopes_equal3(pt(self, op2), pt(self, op2b), j.off_pt);
            if reverse2 {
                op2b = prev(self, op2);
                while pt(self, op2b) == pt(self, op2) && op2b != op2 {
                    op2b = prev(self, op2b);
                }
                if pt(self, op2b).y > pt(self, op2).y || !slopes_equal3(pt(self, op2), pt(self, op2b), j.off_pt) {
                    return false;
                }
            }
            if op1b == op1 || op2b == op2 || op1b == op2b || (r1 == r2 && reverse1 == reverse2) {
                return false;
            }
            self.splice_join(j, op1, op2, reverse1);
            true
        }
    }

    fn splice_join(&mut self, j: &mut Join, op1: usize, op2: usize, reverse1: bool) {
        if reverse1 {
            let op1b = self.dup_out_pt(op1, false);
            let op2b = self.dup_out_pt(op2, true);
            self.out_pts[op1].prev = op2;
            self.out_pts[op2].next = op1;
            self.out_pts[op1b].next = op2b;
            self.out_pts[op2b].prev = op1b;
            j.out_pt1 = op1;
            j.out_pt2 = op1b;
        } else {
            let op1b = self.dup_out_pt(op1, true);
            let op2b = self.dup_out_pt(op2, false);
            self.out_pts[op1].next = op2;
            self.out_pts[op2].prev = op1;
            self.out_pts[op1b].prev = op2b;
            self.out_pts[op2b].next = op1b;
            j.out_pt1 = op1;
            j.out_pt2 = op1b;
        }
    }

    /// Positions a run endpoint at `jpt` and duplicates it, returning `(op, op_b)`.
    fn align_horz_run(&mut self, mut op: usize, dir: Direction, jpt: IntPoint, discard_left: bool) -> (usize, usize) {
        let insert_after = match dir {
            Direction::LeftToRight => {
                loop {
                    let n = self.out_pts[op].next;
                    let (np, cp) = (self.out_pts[n].pt, self.out_pts[op].pt);
                    if np.x <= jpt.x && np.x >= cp.x && np.y == jpt.y {
                        op = n;
                    } else {
                        break;
                    }
                }
                if discard_left && self.out_pts[op].pt.x != jpt.x {
                    op = self.out_pts[op].next;
                }
                !discard_left
            }
            Direction::RightToLeft => {
                loop {
                    let n = self.out_pts[op].next;
                    let (np, cp) = (self.out_pts[n].pt, self.out_pts[op].pt);
                    if np.x >= jpt.x && np.x <= cp.x && np.y == jpt.y {
                        op = n;
                    } else {
                        break;
                    }
                }
                if !discard_left && self.out_pts[op].pt.x != jpt.x {
                    op = self.out_pts[op].next;
                }
                discard_left
            }
        };
        let mut op_b = self.dup_out_pt(op, insert_after);
        if self.out_pts[op_b].pt != jpt {
            op = op_b;
            self.out_pts[op].pt = jpt;
            op_b = self.dup_out_pt(op, insert_after);
        }
        (op, op_b)
    }

    fn join_horz(&mut self, op1: usize, op1b: usize, op2: usize, op2b: usize, jpt: IntPoint, discard_left: bool) -> bool {
        let dir_of = |a: IntPoint, b: IntPoint| match a.x > b.x {
            true => Direction::RightToLeft,
            false => Direction::LeftToRight,
        };
        let dir1 = dir_of(self.out_pts[op1].pt, self.out_pts[op1b].pt);
        let dir2 = dir_of(self.out_pts[op2].pt, self.out_pts[op2b].pt);
        if dir1 == dir2 {
            return false;
        }
        let (op1, op1b) = self.align_horz_run(op1, dir1, jpt, discard_left);
        let (op2, op2b) = self.align_horz_run(op2, dir2, jpt, discard_left);

        if (dir1 == Direction::LeftToRight) == discard_left {
            self.out_pts[op1].prev = op2;
            self.out_pts[op2].next = op1;
            self.out_pts[op1b].next = op2b;
            self.out_pts[op2b].prev = op1b;
        } else {
            self.out_pts[op1].next = op2;
            self.out_pts[op2].prev = op1;
            self.out_pts[op1b].prev = op2b;
            self.out_pts[op2b].next = op1b;
        }
        true
    }

    /// Splits rings at vertices they touch themselves, so every output ring is simple.
    pub(crate) fn do_simple_polygons(&mut self) {
        let mut i = 0;
        while i < self.out_recs.len() {
            let rec = i;
            i += 1;
            let Some(mut op) = self.out_recs[rec].pts else { continue };
            loop {
                let mut op2 = self.out_pts[op].next;
                while Some(op2) != self.out_recs[rec].pts {
                    let (o, o2) = (self.out_pts[op], self.out_pts[op2]);
                    if o.pt == o2.pt && o2.next != op && o2.prev != op {
                        let op3 = o.prev;
                        let op4 = o2.prev;
                        self.out_pts[op].prev = op4;
                        self.out_pts[op4].next = op;
                        self.out_pts[op2].prev = op3;
                        self.out_pts[op3].next = op2;

                        self.out_recs[rec].pts = Some(op);
                        let rec2 = self.create_out_rec();
                        self.out_recs[rec2].pts = Some(op2);
                        self.update_out_pt_idxs(rec2);

                        if self.poly2_contains_poly1(op2, op) {
                            self.out_recs[rec2].is_hole = !self.out_recs[rec].is_hole;
                            self.out_recs[rec2].first_left = Some(rec);
                        } else if self.poly2_contains_poly1(op, op2) {
                            self.out_recs[rec2].is_hole = self.out_recs[rec].is_hole;
                            self.out_recs[rec].is_hole = !self.out_recs[rec2].is_hole;
                            self.out_recs[rec2].first_left = self.out_recs[rec].first_left;
                            self.out_recs[rec].first_left = Some(rec2);
                        } else {
                            self.out_recs[rec2].is_hole = self.out_recs[rec].is_hole;
                            self.out_recs[rec2].first_left = self.out_recs[rec].first_left;
                        }
                        op2 = op;
                    }
                    op2 = self.out_pts[op2].next;
                }
                op = self.out_pts[op].next;
                if Some(op) == self.out_recs[rec].pts {
                    break;
                }
            }
        }
    }
}
