use crate::clipper::edge::TEdge;
use crate::clipper::engine::{ClipType, Clipper, PolyFillType, PolyType};
use crate::clipper::int_point::{IntPoint, round};
use crate::clipper::out_rec::IntersectNode;

fn intersect_point(e1: &TEdge, e2: &TEdge) -> IntPoint {
    let mut ip = IntPoint::default();
    if e1.dx == e2.dx {
        ip.y = e1.curr.y;
        ip.x = e1.top_x(ip.y);
        return ip;
    }
    if e1.dx == 0.0 {
        ip.x = e1.bot.x;
        ip.y = match e2.is_horizontal() {
            true => e2.bot.y,
            false => {
                let b2 = e2.bot.y as f64 - e2.bot.x as f64 / e2.dx;
                round(ip.x as f64 / e2.dx + b2)
            }
        };
    } else if e2.dx == 0.0 {
        ip.x = e2.bot.x;
        ip.y = match e1.is_horizontal() {
            true => e1.bot.y,
            false => {
                let b1 = e1.bot.y as f64 - e1.bot.x as f64 / e1.dx;
                round(ip.x as f64 / e1.dx + b1)
            }
        };
    } else {
        let b1 = e1.bot.x as f64 - e1.bot.y as f64 * e1.dx;
        let b2 = e2.bot.x as f64 - e2.bot.y as f64 * e2.dx;
        let q = (b2 - b1) / (e1.dx - e2.dx);
        ip.y = round(q);
        ip.x = match e1.dx.abs() < e2.dx.abs() {
            true => round(e1.dx * q + b1),
            false => round(e2.dx * q + b2),
        };
    }

    if ip.y < e1.top.y || ip.y < e2.top.y {
        ip.y = e1.top.y.max(e2.top.y);
        ip.x = match e1.dx.abs() < e2.dx.abs() {
            true => e1.top_x(ip.y),
            false => e2.top_x(ip.y),
        };
    }
    // never below the bottom of the scanbeam
    if ip.y > e1.curr.y {
        ip.y = e1.curr.y;
        ip.x = match e1.dx.abs() > e2.dx.abs() {
            true => e2.top_x(ip.y),
            false => e1.top_x(ip.y),
        };
    }
    ip
}

impl Clipper {
    pub(crate) fn process_intersections(&mut self, top_y: i64) -> bool {
        if self.active_edges.is_none() {
            return true;
        }
        self.build_intersect_list(top_y);
        let ok = match self.intersections.len() {
            0 => return true,
            1 => true,
            _ => self.fixup_intersection_order(),
        };
        if ok {
            let nodes = std::mem::take(&mut self.intersections);
            for node in nodes {
                self.intersect_edges(node.edge1, node.edge2, node.pt);
                self.swap_positions_in_ael(node.edge1, node.edge2);
            }
        }
        self.intersections.clear();
        self.sorted_edges = None;
        ok
    }

    fn build_intersect_list(&mut self, top_y: i64) {
        let mut e = self.active_edges;
        self.sorted_edges = e;
        while let Some(ei) = e {
            let ed = &mut self.edges[ei];
            ed.prev_in_sel = ed.prev_in_ael;
            ed.next_in_sel = ed.next_in_ael;
            ed.curr.x = ed.top_x(top_y);
            e = ed.next_in_ael;
        }

        // bubble sort the SEL by x at the top of the scanbeam, recording every swap
        loop {
            let mut modified = false;
            let Some(mut e) = self.sorted_edges else { break };
            while let Some(next) = self.edges[e].next_in_sel {
                if self.edges[e].curr.x > self.edges[next].curr.x {
                    let mut pt = intersect_point(&self.edges[e], &self.edges[next]);
                    if pt.y < top_y {
                        pt = IntPoint::new(self.edges[e].top_x(top_y), top_y);
                    }
                    self.intersections.push(IntersectNode { edge1: e, edge2: next, pt });
                    self.swap_positions_in_sel(e, next);
                    modified = true;
                } else {
                    e = next;
                }
            }
            match self.edges[e].prev_in_sel {
                Some(p) => self.edges[p].next_in_sel = None,
                None => break,
            }
            if !modified {
                break;
            }
        }
        self.sorted_edges = None;
    }

    /// Reorders intersections so that each one is between edges adjacent at that moment.
    fn fixup_intersection_order(&mut self) -> bool {
        self.copy_ael_to_sel();
        self.intersections.sort_by(|a, b| b.pt.y.cmp(&a.pt.y));
        let cnt = self.intersections.len();
        for i in 0..cnt {
            if !self.edges_adjacent(&self.intersections[i]) {
                let mut j = i + 1;
                while j < cnt && !self.edges_adjacent(&self.intersections[j]) {
                    j += 1;
                }
                if j == cnt {
                    return false;
                }
                self.intersections.swap(i, j);
            }
            let node = self.intersections[i];
            self.swap_positions_in_sel(node.edge1, node.edge2);
        }
        true
    }

    fn edges_adjacent(&self, node: &IntersectNode) -> bool {
        let e1 = &self.edges[node.edge1];
        e1.next_in_sel == Some(node.edge2) || e1.prev_in_sel == Some(node.edge2)
    }

    fn winding_value(&self, fill: PolyFillType, wind: i32) -> i32 {
        match fill {
            PolyFillType::Positive => wind,
            PolyFillType::Negative => -wind,
            _ => wind.abs(),
        }
    }

    /// Updates winding counts and output for two edges crossing at `pt`.
    /// Expects `e1` to lie right of `e2` above the intersection.
    pub(crate) fn intersect_edges(&mut self, e1: usize, e2: usize, pt: IntPoint) {
        let e1_contributing = self.edges[e1].out_idx.is_some();
        let e2_contributing = self.edges[e2].out_idx.is_some();
        let (a, b) = (self.edges[e1], self.edges[e2]);

        if a.poly_type == b.poly_type {
            if self.fill_of(a.poly_type) == PolyFillType::EvenOdd {
                self.edges[e1].wind_cnt = b.wind_cnt;
                self.edges[e2].wind_cnt = a.wind_cnt;
            } else {
                let ea = &mut self.edges[e1];
                ea.wind_cnt = match a.wind_cnt + b.wind_delta {
                    0 => -a.wind_cnt,
                    v => v,
                };
                let eb = &mut self.edges[e2];
                eb.wind_cnt = match b.wind_cnt - a.wind_delta {
                    0 => -b.wind_cnt,
                    v => v,
                };
            }
        } else {
            let fill_a_eo = self.fill_of(a.poly_type) == PolyFillType::EvenOdd;
            let fill_b_eo = self.fill_of(b.poly_type) == PolyFillType::EvenOdd;
            let ea = &mut self.edges[e1];
            match fill_b_eo {
                false => ea.wind_cnt2 += b.wind_delta,
                true => ea.wind_cnt2 = if ea.wind_cnt2 == 0 { 1 } else { 0 },
            }
            let eb = &mut self.edges[e2];
            match fill_a_eo {
                false => eb.wind_cnt2 -= a.wind_delta,
                true => eb.wind_cnt2 = if eb.wind_cnt2 == 0 { 1 } else { 0 },
            }
        }

        let (a, b) = (self.edges[e1], self.edges[e2]);
        let (fill1, fill2) = (self.fill_of(a.poly_type), self.fill_of(b.poly_type));
        let e1_wc = self.winding_value(fill1, a.wind_cnt);
        let e2_wc = self.winding_value(fill2, b.wind_cnt);

        if e1_contributing && e2_contributing {
            if (e1_wc != 0 && e1_wc != 1)
                || (e2_wc != 0 && e2_wc != 1)
                || (a.poly_type != b.poly_type && self.clip_type != ClipType::Xor)
            {
                self.add_local_max_poly(e1, e2, pt);
            } else {
                self.add_out_pt(e1, pt);
                self.add_out_pt(e2, pt);
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if e1_contributing {
            if e2_wc == 0 || e2_wc == 1 {
                self.add_out_pt(e1, pt);
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if e2_contributing {
            if e1_wc == 0 || e1_wc == 1 {
                self.add_out_pt(e2, pt);
                self.swap_sides_and_indexes(e1, e2);
            }
        } else if (e1_wc == 0 || e1_wc == 1) && (e2_wc == 0 || e2_wc == 1) {
            // neither edge is contributing yet
            let e1_wc2 = self.winding_value(self.fill_of(other(a.poly_type)), a.wind_cnt2);
            let e2_wc2 = self.winding_value(self.fill_of(other(b.poly_type)), b.wind_cnt2);
            if a.poly_type != b.poly_type {
                self.add_local_min_poly(e1, e2, pt);
            } else if e1_wc == 1 && e2_wc == 1 {
                let open = match self.clip_type {
                    ClipType::Intersection => e1_wc2 > 0 && e2_wc2 > 0,
                    ClipType::Union => e1_wc2 <= 0 && e2_wc2 <= 0,
                    ClipType::Difference => {
                        (a.poly_type == PolyType::Clip && e1_wc2 > 0 && e2_wc2 > 0)
                            || (a.poly_type == PolyType::Subject && e1_wc2 <= 0 && e2_wc2 <= 0)
                    }
                    ClipType::Xor => true,
                };
                if open {
                    self.add_local_min_poly(e1, e2, pt);
                }
            } else {
                let side = self.edges[e1].side;
                self.edges[e1].side = self.edges[e2].side;
                self.edges[e2].side = side;
            }
        }
    }

    fn swap_sides_and_indexes(&mut self, e1: usize, e2: usize) {
        let (s1, o1) = (self.edges[e1].side, self.edges[e1].out_idx);
        self.edges[e1].side = self.edges[e2].side;
        self.edges[e1].out_idx = self.edges[e2].out_idx;
        self.edges[e2].side = s1;
        self.edges[e2].out_idx = o1;
    }
}

fn other(pt: PolyType) -> PolyType {
    match pt {
        PolyType::Subject => PolyType::Clip,
        PolyType::Clip => PolyType::Subject,
    }
}
