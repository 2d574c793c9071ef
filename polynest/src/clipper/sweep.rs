use crate::clipper::edge::slopes_equal_edges;
use crate::clipper::engine::{ClipType, Clipper, Direction, PolyFillType, PolyType};
use crate::clipper::int_point::{IntPoint, slopes_equal4};

pub(crate) fn horz_segments_overlap(mut a1: i64, mut a2: i64, mut b1: i64, mut b2: i64) -> bool {
    if a1 > a2 {
        std::mem::swap(&mut a1, &mut a2);
    }
    if b1 > b2 {
        std::mem::swap(&mut b1, &mut b2);
    }
    a1 < b2 && b1 < a2
}

impl Clipper {
    pub(crate) fn fill_of(&self, poly_type: PolyType) -> PolyFillType {
        match poly_type {
            PolyType::Subject => self.subj_fill,
            PolyType::Clip => self.clip_fill,
        }
    }

    fn alt_fill_of(&self, poly_type: PolyType) -> PolyFillType {
        match poly_type {
            PolyType::Subject => self.clip_fill,
            PolyType::Clip => self.subj_fill,
        }
    }

    pub(crate) fn insert_local_minima_into_ael(&mut self, bot_y: i64) {
        while let Some(lm) = self.pop_local_minima(bot_y) {
            let (lb, rb) = (lm.left_bound, lm.right_bound);
            self.insert_edge_into_ael(lb, None);
            self.insert_edge_into_ael(rb, Some(lb));
            self.set_winding_count(lb);
            self.edges[rb].wind_cnt = self.edges[lb].wind_cnt;
            self.edges[rb].wind_cnt2 = self.edges[lb].wind_cnt2;

            let op1 = match self.is_contributing(lb) {
                true => Some(self.add_local_min_poly(lb, rb, self.edges[lb].bot)),
                false => None,
            };
            self.insert_scanbeam(self.edges[lb].top.y);

            if self.edges[rb].is_horizontal() {
                self.add_edge_to_sel(rb);
                if let Some(n) = self.edges[rb].next_in_lml {
                    self.insert_scanbeam(self.edges[n].top.y);
                }
            } else {
                self.insert_scanbeam(self.edges[rb].top.y);
            }

            let Some(op1) = op1 else { continue };

            // a ghost horizontal overlapping rb becomes a real join
            let rbe = self.edges[rb];
            if rbe.is_horizontal() && rbe.wind_delta != 0 {
                for gj in self.ghost_joins.clone() {
                    if horz_segments_overlap(self.out_pts[gj.out_pt].pt.x, gj.off_pt.x, rbe.bot.x, rbe.top.x) {
                        self.add_join(gj.out_pt, op1, gj.off_pt);
                    }
                }
            }

            let lbe = self.edges[lb];
            if let Some(prev) = lbe.prev_in_ael {
                let pe = self.edges[prev];
                if pe.curr.x == lbe.bot.x
                    && pe.out_idx.is_some()
                    && slopes_equal4(pe.bot, pe.top, lbe.curr, lbe.top)
                    && lbe.wind_delta != 0
                    && pe.wind_delta != 0
                {
                    let op2 = self.add_out_pt(prev, lbe.bot);
                    self.add_join(op1, op2, lbe.top);
                }
            }

            if self.edges[lb].next_in_ael != Some(rb) {
                let rbe = self.edges[rb];
                if let Some(prev) = rbe.prev_in_ael {
                    let pe = self.edges[prev];
                    if rbe.out_idx.is_some()
                        && pe.out_idx.is_some()
                        && slopes_equal4(pe.curr, pe.top, rbe.curr, rbe.top)
                        && rbe.wind_delta != 0
                        && pe.wind_delta != 0
                    {
                        let op2 = self.add_out_pt(prev, rbe.bot);
                        self.add_join(op1, op2, rbe.top);
                    }
                }
                let mut e = self.edges[lb].next_in_ael;
                let lb_curr = self.edges[lb].curr;
                while let Some(ei) = e {
                    if ei == rb {
                        break;
                    }
                    // rb is to the right of e above the intersection
                    self.intersect_edges(rb, ei, lb_curr);
                    e = self.edges[ei].next_in_ael;
                }
            }
        }
    }

    fn e2_inserts_before_e1(&self, e1: usize, e2: usize) -> bool {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if b.curr.x == a.curr.x {
            if b.top.y > a.top.y {
                b.top.x < a.top_x(b.top.y)
            } else {
                a.top.x > b.top_x(a.top.y)
            }
        } else {
            b.curr.x < a.curr.x
        }
    }

    fn insert_edge_into_ael(&mut self, edge: usize, start: Option<usize>) {
        match self.active_edges {
            None => {
                self.edges[edge].prev_in_ael = None;
                self.edges[edge].next_in_ael = None;
                self.active_edges = Some(edge);
            }
            Some(ae) if start.is_none() && self.e2_inserts_before_e1(ae, edge) => {
                self.edges[edge].prev_in_ael = None;
                self.edges[edge].next_in_ael = Some(ae);
                self.edges[ae].prev_in_ael = Some(edge);
                self.active_edges = Some(edge);
            }
            Some(ae) => {
                let mut s = start.unwrap_or(ae);
                while let Some(n) = self.edges[s].next_in_ael {
                    if self.e2_inserts_before_e1(n, edge) {
                        break;
                    }
                    s = n;
                }
                let after = self.edges[s].next_in_ael;
                self.edges[edge].next_in_ael = after;
                if let Some(n) = after {
                    self.edges[n].prev_in_ael = Some(edge);
                }
                self.edges[edge].prev_in_ael = Some(s);
                self.edges[s].next_in_ael = Some(edge);
            }
        }
    }

    fn set_winding_count(&mut self, edge: usize) {
        let ed = self.edges[edge];
        let mut e = ed.prev_in_ael;
        // nearest preceding edge of the same poly type
        while let Some(ei) = e {
            if self.edges[ei].poly_type == ed.poly_type && self.edges[ei].wind_delta != 0 {
                break;
            }
            e = self.edges[ei].prev_in_ael;
        }

        let mut cursor;
        match e {
            None => {
                let wc = match ed.wind_delta {
                    0 => match self.fill_of(ed.poly_type) {
                        PolyFillType::Negative => -1,
                        _ => 1,
                    },
                    wd => wd,
                };
                self.edges[edge].wind_cnt = wc;
                self.edges[edge].wind_cnt2 = 0;
                cursor = self.active_edges;
            }
            Some(ei) if ed.wind_delta == 0 && self.clip_type != ClipType::Union => {
                self.edges[edge].wind_cnt = 1;
                self.edges[edge].wind_cnt2 = self.edges[ei].wind_cnt2;
                cursor = self.edges[ei].next_in_ael;
            }
            Some(ei) if self.fill_of(ed.poly_type) == PolyFillType::EvenOdd => {
                let wc = match ed.wind_delta {
                    0 => {
                        let mut inside = true;
                        let mut e2 = self.edges[ei].prev_in_ael;
                        while let Some(i2) = e2 {
                            if self.edges[i2].poly_type == self.edges[ei].poly_type && self.edges[i2].wind_delta != 0 {
                                inside = !inside;
                            }
                            e2 = self.edges[i2].prev_in_ael;
                        }
                        if inside { 0 } else { 1 }
                    }
                    wd => wd,
                };
                self.edges[edge].wind_cnt = wc;
                self.edges[edge].wind_cnt2 = self.edges[ei].wind_cnt2;
                cursor = self.edges[ei].next_in_ael;
            }
            Some(ei) => {
                let pe = self.edges[ei];
                let wc = if pe.wind_cnt * pe.wind_delta < 0 {
                    // previous edge decreases the count toward zero: we are outside it
                    if pe.wind_cnt.abs() > 1 {
                        if pe.wind_delta * ed.wind_delta < 0 {
                            pe.wind_cnt
                        } else {
                            pe.wind_cnt + ed.wind_delta
                        }
                    } else if ed.wind_delta == 0 {
                        1
                    } else {
                        ed.wind_delta
                    }
                } else if ed.wind_delta == 0 {
                    if pe.wind_cnt < 0 { pe.wind_cnt - 1 } else { pe.wind_cnt + 1 }
                } else if pe.wind_delta * ed.wind_delta < 0 {
                    pe.wind_cnt
                } else {
                    pe.wind_cnt + ed.wind_delta
                };
                self.edges[edge].wind_cnt = wc;
                self.edges[edge].wind_cnt2 = pe.wind_cnt2;
                cursor = pe.next_in_ael;
            }
        }

        let alt_even_odd = self.alt_fill_of(ed.poly_type) == PolyFillType::EvenOdd;
        while let Some(ci) = cursor {
            if ci == edge {
                break;
            }
            let wd = self.edges[ci].wind_delta;
            let wc2 = &mut self.edges[edge].wind_cnt2;
            if alt_even_odd {
                if wd != 0 {
                    *wc2 = if *wc2 == 0 { 1 } else { 0 };
                }
            } else {
                *wc2 += wd;
            }
            cursor = self.edges[ci].next_in_ael;
        }
    }

    fn is_contributing(&self, edge: usize) -> bool {
        let e = &self.edges[edge];
        let pft = self.fill_of(e.poly_type);
        let pft2 = self.alt_fill_of(e.poly_type);
        let own_ok = match pft {
            PolyFillType::EvenOdd => !(e.wind_delta == 0 && e.wind_cnt != 1),
            PolyFillType::NonZero => e.wind_cnt.abs() == 1,
            PolyFillType::Positive => e.wind_cnt == 1,
            PolyFillType::Negative => e.wind_cnt == -1,
        };
        if !own_ok {
            return false;
        }
        let wc2 = e.wind_cnt2;
        let outside_other = || match pft2 {
            PolyFillType::EvenOdd | PolyFillType::NonZero => wc2 == 0,
            PolyFillType::Positive => wc2 <= 0,
            PolyFillType::Negative => wc2 >= 0,
        };
        let inside_other = || match pft2 {
            PolyFillType::EvenOdd | PolyFillType::NonZero => wc2 != 0,
            PolyFillType::Positive => wc2 > 0,
            PolyFillType::Negative => wc2 < 0,
        };
        match self.clip_type {
            ClipType::Intersection => inside_other(),
            ClipType::Union => outside_other(),
            ClipType::Difference => match e.poly_type {
                PolyType::Subject => outside_other(),
                PolyType::Clip => inside_other(),
            },
            ClipType::Xor => e.wind_delta != 0 || outside_other(),
        }
    }

    pub(crate) fn add_edge_to_sel(&mut self, edge: usize) {
        self.edges[edge].prev_in_sel = None;
        self.edges[edge].next_in_sel = self.sorted_edges;
        if let Some(s) = self.sorted_edges {
            self.edges[s].prev_in_sel = Some(edge);
        }
        self.sorted_edges = Some(edge);
    }

    fn pop_edge_from_sel(&mut self) -> Option<usize> {
        let e = self.sorted_edges?;
        self.delete_from_sel(e);
        Some(e)
    }

    pub(crate) fn copy_ael_to_sel(&mut self) {
        let mut e = self.active_edges;
        self.sorted_edges = e;
        while let Some(ei) = e {
            self.edges[ei].prev_in_sel = self.edges[ei].prev_in_ael;
            self.edges[ei].next_in_sel = self.edges[ei].next_in_ael;
            e = self.edges[ei].next_in_ael;
        }
    }

    pub(crate) fn delete_from_ael(&mut self, e: usize) {
        let (prev, next) = (self.edges[e].prev_in_ael, self.edges[e].next_in_ael);
        if prev.is_none() && next.is_none() && self.active_edges != Some(e) {
            return;
        }
        match prev {
            Some(p) => self.edges[p].next_in_ael = next,
            None => self.active_edges = next,
        }
        if let Some(n) = next {
            self.edges[n].prev_in_ael = prev;
        }
        self.edges[e].next_in_ael = None;
        self.edges[e].prev_in_ael = None;
    }

    fn delete_from_sel(&mut self, e: usize) {
        let (prev, next) = (self.edges[e].prev_in_sel, self.edges[e].next_in_sel);
        if prev.is_none() && next.is_none() && self.sorted_edges != Some(e) {
            return;
        }
        match prev {
            Some(p) => self.edges[p].next_in_sel = next,
            None => self.sorted_edges = next,
        }
        if let Some(n) = next {
            self.edges[n].prev_in_sel = prev;
        }
        self.edges[e].next_in_sel = None;
        self.edges[e].prev_in_sel = None;
    }

    pub(crate) fn swap_positions_in_ael(&mut self, e1: usize, e2: usize) {
        // either edge may already have left the AEL
        if self.edges[e1].next_in_ael == self.edges[e1].prev_in_ael
            || self.edges[e2].next_in_ael == self.edges[e2].prev_in_ael
        {
            return;
        }
        if self.edges[e1].next_in_ael == Some(e2) {
            let next = self.edges[e2].next_in_ael;
            if let Some(n) = next {
                self.edges[n].prev_in_ael = Some(e1);
            }
            let prev = self.edges[e1].prev_in_ael;
            if let Some(p) = prev {
                self.edges[p].next_in_ael = Some(e2);
            }
            self.edges[e2].prev_in_ael = prev;
            self.edges[e2].next_in_ael = Some(e1);
            self.edges[e1].prev_in_ael = Some(e2);
            self.edges[e1].next_in_ael = next;
        } else if self.edges[e2].next_in_ael == Some(e1) {
            let next = self.edges[e1].next_in_ael;
            if let Some(n) = next {
                self.edges[n].prev_in_ael = Some(e2);
            }
            let prev = self.edges[e2].prev_in_ael;
            if let Some(p) = prev {
                self.edges[p].next_in_ael = Some(e1);
            }
            self.edges[e1].prev_in_ael = prev;
            self.edges[e1].next_in_ael = Some(e2);
            self.edges[e2].prev_in_ael = Some(e1);
            self.edges[e2].next_in_ael = next;
        } else {
            let (next, prev) = (self.edges[e1].next_in_ael, self.edges[e1].prev_in_ael);
            self.edges[e1].next_in_ael = self.edges[e2].next_in_ael;
            if let Some(n) = self.edges[e1].next_in_ael {
                self.edges[n].prev_in_ael = Some(e1);
            }
            self.edges[e1].prev_in_ael = self.edges[e2].prev_in_ael;
            if let Some(p) = self.edges[e1].prev_in_ael {
                self.edges[p].next_in_ael = Some(e1);
            }
            self.edges[e2].next_in_ael = next;
            if let Some(n) = next {
                self.edges[n].prev_in_ael = Some(e2);
            }
            self.edges[e2].prev_in_ael = prev;
            if let Some(p) = prev {
                self.edges[p].next_in_ael = Some(e2);
            }
        }
        if self.edges[e1].prev_in_ael.is_none() {
            self.active_edges = Some(e1);
        } else if self.edges[e2].prev_in_ael.is_none() {
            self.active_edges = Some(e2);
        }
    }

    pub(crate) fn swap_positions_in_sel(&mut self, e1: usize, e2: usize) {
        if self.edges[e1].next_in_sel.is_none() && self.edges[e1].prev_in_sel.is_none() {
            return;
        }
        if self.edges[e2].next_in_sel.is_none() && self.edges[e2].prev_in_sel.is_none() {
            return;
        }
        if self.edges[e1].next_in_sel == Some(e2) {
            let next = self.edges[e2].next_in_sel;
            if let Some(n) = next {
                self.edges[n].prev_in_sel = Some(e1);
            }
            let prev = self.edges[e1].prev_in_sel;
            if let Some(p) = prev {
                self.edges[p].next_in_sel = Some(e2);
            }
            self.edges[e2].prev_in_sel = prev;
            self.edges[e2].next_in_sel = Some(e1);
            self.edges[e1].prev_in_sel = Some(e2);
            self.edges[e1].next_in_sel = next;
        } else if self.edges[e2].next_in_sel == Some(e1) {
            let next = self.edges[e1].next_in_sel;
            if let Some(n) = next {
                self.edges[n].prev_in_sel = Some(e2);
            }
            let prev = self.edges[e2].prev_in_sel;
            if let Some(p) = prev {
                self.edges[p].next_in_sel = Some(e1);
            }
            self.edges[e1].prev_in_sel = prev;
            self.edges[e1].next_in_sel = Some(e2);
            self.edges[e2].prev_in_sel = Some(e1);
            self.edges[e2].next_in_sel = next;
        } else {
            let (next, prev) = (self.edges[e1].next_in_sel, self.edges[e1].prev_in_sel);
            self.edges[e1].next_in_sel = self.edges[e2].next_in_sel;
            if let Some(n) = self.edges[e1].next_in_sel {
                self.edges[n].prev_in_sel = Some(e1);
            }
            self.edges[e1].prev_in_sel = self.edges[e2].prev_in_sel;
            if let Some(p) = self.edges[e1].prev_in_sel {
                self.edges[p].next_in_sel = Some(e1);
            }
            self.edges[e2].next_in_sel = next;
            if let Some(n) = next {
                self.edges[n].prev_in_sel = Some(e2);
            }
            self.edges[e2].prev_in_sel = prev;
            if let Some(p) = prev {
                self.edges[p].next_in_sel = Some(e2);
            }
        }
        if self.edges[e1].prev_in_sel.is_none() {
            self.sorted_edges = Some(e1);
        } else if self.edges[e2].prev_in_sel.is_none() {
            self.sorted_edges = Some(e2);
        }
    }

    /// Replaces `e` in the AEL with the next edge of its bound and returns that edge.
    pub(crate) fn update_edge_into_ael(&mut self, e: usize) -> usize {
        let Some(n) = self.edges[e].next_in_lml else {
            return e;
        };
        let old = self.edges[e];
        if let Some(p) = old.prev_in_ael {
            self.edges[p].next_in_ael = Some(n);
        } else {
            self.active_edges = Some(n);
        }
        if let Some(nx) = old.next_in_ael {
            self.edges[nx].prev_in_ael = Some(n);
        }
        let ne = &mut self.edges[n];
        ne.out_idx = old.out_idx;
        ne.side = old.side;
        ne.wind_delta = old.wind_delta;
        ne.wind_cnt = old.wind_cnt;
        ne.wind_cnt2 = old.wind_cnt2;
        ne.curr = ne.bot;
        ne.prev_in_ael = old.prev_in_ael;
        ne.next_in_ael = old.next_in_ael;
        if !ne.is_horizontal() {
            let y = ne.top.y;
            self.insert_scanbeam(y);
        }
        n
    }

    fn get_maxima_pair(&self, e: usize) -> Option<usize> {
        let ed = &self.edges[e];
        let (next, prev) = (&self.edges[ed.next], &self.edges[ed.prev]);
        if next.top == ed.top && next.next_in_lml.is_none() {
            Some(ed.next)
        } else if prev.top == ed.top && prev.next_in_lml.is_none() {
            Some(ed.prev)
        } else {
            None
        }
    }

    fn get_maxima_pair_ex(&self, e: usize) -> Option<usize> {
        let r = self.get_maxima_pair(e)?;
        let re = &self.edges[r];
        match re.next_in_ael == re.prev_in_ael && !re.is_horizontal() {
            true => None,
            false => Some(r),
        }
    }

    pub(crate) fn process_edges_at_top_of_scanbeam(&mut self, top_y: i64) {
        let mut e = self.active_edges;
        while let Some(ei) = e {
            // maxima are treated as bent horizontals, excluding those with a horizontal pair
            let ed = self.edges[ei];
            let mut is_maxima = ed.top.y == top_y && ed.next_in_lml.is_none();
            if is_maxima {
                is_maxima = match self.get_maxima_pair_ex(ei) {
                    None => true,
                    Some(mp) => !self.edges[mp].is_horizontal(),
                };
            }
            if is_maxima {
                if self.strictly_simple {
                    self.maxima.push(ed.top.x);
                }
                let prev = ed.prev_in_ael;
                self.do_maxima(ei);
                e = match prev {
                    None => self.active_edges,
                    Some(p) => self.edges[p].next_in_ael,
                };
                continue;
            }

            let mut cur = ei;
            let is_intermediate = ed.top.y == top_y && ed.next_in_lml.is_some();
            if is_intermediate && ed.next_in_lml.is_some_and(|n| self.edges[n].is_horizontal()) {
                cur = self.update_edge_into_ael(ei);
                if self.edges[cur].out_idx.is_some() {
                    self.add_out_pt(cur, self.edges[cur].bot);
                }
                self.add_edge_to_sel(cur);
            } else {
                let x = self.edges[cur].top_x(top_y);
                self.edges[cur].curr = IntPoint::new(x, top_y);
            }

            // touching edges both get a vertex here when output must be strictly simple
            if self.strictly_simple {
                let ce = self.edges[cur];
                if let Some(p) = ce.prev_in_ael {
                    let pe = self.edges[p];
                    if ce.out_idx.is_some()
                        && ce.wind_delta != 0
                        && pe.out_idx.is_some()
                        && pe.curr.x == ce.curr.x
                        && pe.wind_delta != 0
                    {
                        let pt = ce.curr;
                        let op = self.add_out_pt(p, pt);
                        let op2 = self.add_out_pt(cur, pt);
                        self.add_join(op, op2, pt);
                    }
                }
            }
            e = self.edges[cur].next_in_ael;
        }

        self.maxima.sort_unstable();
        self.process_horizontals();
        self.maxima.clear();

        // promote intermediate vertices
        let mut e = self.active_edges;
        while let Some(mut ei) = e {
            let ed = self.edges[ei];
            if ed.top.y == top_y && ed.next_in_lml.is_some() {
                let op = match ed.out_idx {
                    Some(_) => Some(self.add_out_pt(ei, ed.top)),
                    None => None,
                };
                ei = self.update_edge_into_ael(ei);
                let ce = self.edges[ei];
                if let Some(op) = op {
                    let joinable = |o: Option<usize>, me: &Self| -> Option<usize> {
                        let oi = o?;
                        let oe = me.edges[oi];
                        (oe.curr == ce.bot
                            && oe.out_idx.is_some()
                            && oe.curr.y > oe.top.y
                            && slopes_equal4(ce.curr, ce.top, oe.curr, oe.top)
                            && ce.wind_delta != 0
                            && oe.wind_delta != 0)
                            .then_some(oi)
                    };
                    if let Some(p) = joinable(ce.prev_in_ael, self) {
                        let op2 = self.add_out_pt(p, ce.bot);
                        self.add_join(op, op2, ce.top);
                    } else if let Some(n) = joinable(ce.next_in_ael, self) {
                        let op2 = self.add_out_pt(n, ce.bot);
                        self.add_join(op, op2, ce.top);
                    }
                }
            }
            e = self.edges[ei].next_in_ael;
        }
    }

    fn do_maxima(&mut self, e: usize) {
        let Some(max_pair) = self.get_maxima_pair_ex(e) else {
            if self.edges[e].out_idx.is_some() {
                self.add_out_pt(e, self.edges[e].top);
            }
            self.delete_from_ael(e);
            return;
        };
        let mut next = self.edges[e].next_in_ael;
        while let Some(n) = next {
            if n == max_pair {
                break;
            }
            let top = self.edges[e].top;
            self.intersect_edges(e, n, top);
            self.swap_positions_in_ael(e, n);
            next = self.edges[e].next_in_ael;
        }
        match (self.edges[e].out_idx, self.edges[max_pair].out_idx) {
            (Some(_), Some(_)) => {
                let top = self.edges[e].top;
                self.add_local_max_poly(e, max_pair, top);
            }
            (None, None) => {}
            _ => log::trace!("[CLIP] unbalanced maxima pair at {:?}", self.edges[e].top),
        }
        self.delete_from_ael(e);
        self.delete_from_ael(max_pair);
    }

    pub(crate) fn process_horizontals(&mut self) {
        while let Some(horz) = self.pop_edge_from_sel() {
            self.process_horizontal(horz);
        }
    }

    fn horz_direction(&self, e: usize) -> (Direction, i64, i64) {
        let ed = &self.edges[e];
        match ed.bot.x < ed.top.x {
            true => (Direction::LeftToRight, ed.bot.x, ed.top.x),
            false => (Direction::RightToLeft, ed.top.x, ed.bot.x),
        }
    }

    fn next_in_ael_dir(&self, e: usize, dir: Direction) -> Option<usize> {
        match dir {
            Direction::LeftToRight => self.edges[e].next_in_ael,
            Direction::RightToLeft => self.edges[e].prev_in_ael,
        }
    }

    fn join_overlapping_horizontals(&mut self, horz: usize, op1: usize) {
        let he = self.edges[horz];
        let mut next_horz = self.sorted_edges;
        while let Some(nh) = next_horz {
            let nhe = self.edges[nh];
            if nhe.out_idx.is_some() && horz_segments_overlap(he.bot.x, he.top.x, nhe.bot.x, nhe.top.x) {
                let op2 = self.get_last_out_pt(nh);
                self.add_join(op2, op1, nhe.top);
            }
            next_horz = nhe.next_in_sel;
        }
    }

    fn process_horizontal(&mut self, mut horz: usize) {
        let (mut dir, mut horz_left, mut horz_right) = self.horz_direction(horz);

        let mut last_horz = horz;
        while let Some(n) = self.edges[last_horz].next_in_lml {
            if !self.edges[n].is_horizontal() {
                break;
            }
            last_horz = n;
        }
        let max_pair = match self.edges[last_horz].next_in_lml {
            None => self.get_maxima_pair(last_horz),
            Some(_) => None,
        };

        // cursor into the sorted maxima: forward index or count consumed from the back
        let mut max_fwd = 0usize;
        let mut max_rev = 0usize;
        let n_max = self.maxima.len();
        if n_max > 0 {
            let bot_x = self.edges[horz].bot.x;
            let last_top_x = self.edges[last_horz].top.x;
            match dir {
                Direction::LeftToRight => {
                    while max_fwd < n_max && self.maxima[max_fwd] <= bot_x {
                        max_fwd += 1;
                    }
                    if max_fwd < n_max && self.maxima[max_fwd] >= last_top_x {
                        max_fwd = n_max;
                    }
                }
                Direction::RightToLeft => {
                    while max_rev < n_max && self.maxima[n_max - 1 - max_rev] > bot_x {
                        max_rev += 1;
                    }
                    if max_rev < n_max && self.maxima[n_max - 1 - max_rev] <= last_top_x {
                        max_rev = n_max;
                    }
                }
            }
        }

        let mut op1: Option<usize> = None;
        loop {
            let is_last_horz = horz == last_horz;
            let mut e = self.next_in_ael_dir(horz, dir);
            while let Some(ei) = e {
                // extra vertices where maxima touch the horizontal
                if n_max > 0 {
                    let ex = self.edges[ei].curr.x;
                    let y = self.edges[horz].bot.y;
                    match dir {
                        Direction::LeftToRight => {
                            while max_fwd < n_max && self.maxima[max_fwd] < ex {
                                if self.edges[horz].out_idx.is_some() {
                                    self.add_out_pt(horz, IntPoint::new(self.maxima[max_fwd], y));
                                }
                                max_fwd += 1;
                            }
                        }
                        Direction::RightToLeft => {
                            while max_rev < n_max && self.maxima[n_max - 1 - max_rev] > ex {
                                if self.edges[horz].out_idx.is_some() {
                                    self.add_out_pt(horz, IntPoint::new(self.maxima[n_max - 1 - max_rev], y));
                                }
                                max_rev += 1;
                            }
                        }
                    }
                }

                let ee = self.edges[ei];
                if (dir == Direction::LeftToRight && ee.curr.x > horz_right)
                    || (dir == Direction::RightToLeft && ee.curr.x < horz_left)
                {
                    break;
                }
                // end of an intermediate horizontal: smaller dx lies to the right above it
                let he = self.edges[horz];
                if ee.curr.x == he.top.x {
                    if let Some(n) = he.next_in_lml {
                        if ee.dx < self.edges[n].dx {
                            break;
                        }
                    }
                }

                if he.out_idx.is_some() {
                    let op = self.add_out_pt(horz, ee.curr);
                    op1 = Some(op);
                    self.join_overlapping_horizontals(horz, op);
                    self.ghost_joins.push(crate::clipper::out_rec::GhostJoin {
                        out_pt: op,
                        off_pt: self.edges[horz].bot,
                    });
                }

                if Some(ei) == max_pair && is_last_horz {
                    if self.edges[horz].out_idx.is_some() {
                        let top = self.edges[horz].top;
                        self.add_local_max_poly(horz, ei, top);
                    }
                    self.delete_from_ael(horz);
                    self.delete_from_ael(ei);
                    return;
                }

                let pt = IntPoint::new(ee.curr.x, self.edges[horz].curr.y);
                match dir {
                    Direction::LeftToRight => self.intersect_edges(horz, ei, pt),
                    Direction::RightToLeft => self.intersect_edges(ei, horz, pt),
                }
                let e_next = self.next_in_ael_dir(ei, dir);
                self.swap_positions_in_ael(horz, ei);
                e = e_next;
            }

            match self.edges[horz].next_in_lml {
                Some(n) if self.edges[n].is_horizontal() => {}
                _ => break,
            }
            horz = self.update_edge_into_ael(horz);
            if self.edges[horz].out_idx.is_some() {
                self.add_out_pt(horz, self.edges[horz].bot);
            }
            (dir, horz_left, horz_right) = self.horz_direction(horz);
        }

        if self.edges[horz].out_idx.is_some() && op1.is_none() {
            let op = self.get_last_out_pt(horz);
            self.join_overlapping_horizontals(horz, op);
            self.ghost_joins.push(crate::clipper::out_rec::GhostJoin {
                out_pt: op,
                off_pt: self.edges[horz].top,
            });
        }

        if self.edges[horz].next_in_lml.is_some() {
            if self.edges[horz].out_idx.is_some() {
                let op1 = self.add_out_pt(horz, self.edges[horz].top);
                horz = self.update_edge_into_ael(horz);
                let he = self.edges[horz];
                if he.wind_delta == 0 {
                    return;
                }
                // horz is no longer horizontal here
                let joinable = |o: Option<usize>, me: &Self| -> Option<usize> {
                    let oi = o?;
                    let oe = me.edges[oi];
                    (oe.curr == he.bot
                        && oe.wind_delta != 0
                        && oe.out_idx.is_some()
                        && oe.curr.y > oe.top.y
                        && slopes_equal_edges(&he, &oe))
                        .then_some(oi)
                };
                if let Some(p) = joinable(he.prev_in_ael, self) {
                    let op2 = self.add_out_pt(p, he.bot);
                    self.add_join(op1, op2, he.top);
                } else if let Some(n) = joinable(he.next_in_ael, self) {
                    let op2 = self.add_out_pt(n, he.bot);
                    self.add_join(op1, op2, he.top);
                }
            } else {
                self.update_edge_into_ael(horz);
            }
        } else {
            if self.edges[horz].out_idx.is_some() {
                self.add_out_pt(horz, self.edges[horz].top);
            }
            self.delete_from_ael(horz);
        }
    }
}
