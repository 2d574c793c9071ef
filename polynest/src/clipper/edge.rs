use crate::clipper::engine::{Clipper, EdgeSide, PolyType};
use crate::clipper::int_point::{IntPoint, round, slopes_equal3};

pub(crate) const HORIZONTAL: f64 = -1.0e40;

/// One edge of an input path. `bot` always has the larger y; the sweep runs from large y to small y.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TEdge {
    pub bot: IntPoint,
    pub curr: IntPoint,
    pub top: IntPoint,
    pub dx: f64,
    pub poly_type: PolyType,
    pub side: EdgeSide,
    pub wind_delta: i32,
    pub wind_cnt: i32,
    pub wind_cnt2: i32,
    pub out_idx: Option<usize>,
    /// ring links within the source path
    pub next: usize,
    pub prev: usize,
    pub next_in_lml: Option<usize>,
    pub next_in_ael: Option<usize>,
    pub prev_in_ael: Option<usize>,
    pub next_in_sel: Option<usize>,
    pub prev_in_sel: Option<usize>,
}

impl TEdge {
    fn new(curr: IntPoint, next: usize, prev: usize) -> Self {
        TEdge {
            bot: IntPoint::default(),
            curr,
            top: IntPoint::default(),
            dx: 0.0,
            poly_type: PolyType::Subject,
            side: EdgeSide::Left,
            wind_delta: 0,
            wind_cnt: 0,
            wind_cnt2: 0,
            out_idx: None,
            next,
            prev,
            next_in_lml: None,
            next_in_ael: None,
            prev_in_ael: None,
            next_in_sel: None,
            prev_in_sel: None,
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.dx == HORIZONTAL
    }

    fn set_dx(&mut self) {
        let dy = self.top.y - self.bot.y;
        self.dx = match dy {
            0 => HORIZONTAL,
            _ => (self.top.x - self.bot.x) as f64 / dy as f64,
        };
    }

    /// x coordinate of the edge at scanline `y`.
    #[inline]
    pub fn top_x(&self, y: i64) -> i64 {
        if y == self.top.y {
            self.top.x
        } else {
            self.bot.x + round(self.dx * (y - self.bot.y) as f64)
        }
    }

    fn reverse_horizontal(&mut self) {
        std::mem::swap(&mut self.top.x, &mut self.bot.x);
    }
}

#[inline]
pub(crate) fn slopes_equal_edges(e1: &TEdge, e2: &TEdge) -> bool {
    (e1.top.y - e1.bot.y) as i128 * (e2.top.x - e2.bot.x) as i128
        == (e1.top.x - e1.bot.x) as i128 * (e2.top.y - e2.bot.y) as i128
}

/// A local minimum of an input path, where a left and a right bound start.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalMinimum {
    pub y: i64,
    pub left_bound: usize,
    pub right_bound: usize,
}

impl Clipper {
    pub(crate) fn build_edges(&mut self, path: &[IntPoint], poly_type: PolyType) -> bool {
        let Some(mut high) = path.len().checked_sub(1) else {
            return false;
        };
        while high > 0 && path[high] == path[0] {
            high -= 1;
        }
        while high > 0 && path[high] == path[high - 1] {
            high -= 1;
        }
        if high < 2 {
            return false;
        }

        let base = self.edges.len();
        let n = high + 1;
        let mut local: Vec<TEdge> = (0..n)
            .map(|i| TEdge::new(path[i], base + (i + 1) % n, base + (i + n - 1) % n))
            .collect();
        // work with arena indices from here on
        self.edges.append(&mut local);

        // remove duplicate vertices and collinear edges
        let mut e_start = base;
        let mut e = e_start;
        let mut e_loop_stop = e_start;
        loop {
            let (next, prev) = (self.edges[e].next, self.edges[e].prev);
            if self.edges[e].curr == self.edges[next].curr {
                if e == next {
                    break;
                }
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e_loop_stop = e;
                continue;
            }
            if prev == next {
                break;
            }
            let (pc, c, nc) = (self.edges[prev].curr, self.edges[e].curr, self.edges[next].curr);
            if slopes_equal3(pc, c, nc)
                && (!self.preserve_collinear || !crate::clipper::int_point::pt2_is_between_pt1_and_pt3(pc, c, nc))
            {
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e = self.edges[e].prev;
                e_loop_stop = e;
                continue;
            }
            e = next;
            if e == e_loop_stop {
                break;
            }
        }
        if self.edges[e].prev == self.edges[e].next {
            self.edges.truncate(base);
            return false;
        }

        // second stage of edge initialisation
        let mut is_flat = true;
        e = e_start;
        loop {
            let next_curr = self.edges[self.edges[e].next].curr;
            let edge = &mut self.edges[e];
            if edge.curr.y >= next_curr.y {
                edge.bot = edge.curr;
                edge.top = next_curr;
            } else {
                edge.top = edge.curr;
                edge.bot = next_curr;
            }
            edge.set_dx();
            edge.poly_type = poly_type;
            e = edge.next;
            if is_flat && self.edges[e].curr.y != self.edges[e_start].curr.y {
                is_flat = false;
            }
            if e == e_start {
                break;
            }
        }
        if is_flat {
            self.edges.truncate(base);
            return false;
        }

        // build the local minima list
        let mut e_min: Option<usize> = None;
        let e_prev = self.edges[e].prev;
        if self.edges[e_prev].bot == self.edges[e_prev].top {
            e = self.edges[e].next;
        }
        loop {
            e = self.find_next_loc_min(e);
            match e_min {
                Some(m) if m == e => break,
                None => e_min = Some(e),
                _ => {}
            }
            let prev = self.edges[e].prev;
            let (left, right, left_is_forward) = match self.edges[e].dx < self.edges[prev].dx {
                true => (prev, e, false),
                false => (e, prev, true),
            };
            self.edges[left].side = EdgeSide::Left;
            self.edges[right].side = EdgeSide::Right;
            let wd = match self.edges[left].next == right {
                true => -1,
                false => 1,
            };
            self.edges[left].wind_delta = wd;
            self.edges[right].wind_delta = -wd;
            self.minima.push(LocalMinimum {
                y: self.edges[e].bot.y,
                left_bound: left,
                right_bound: right,
            });

            let e1 = self.process_bound(left, left_is_forward);
            let e2 = self.process_bound(right, !left_is_forward);
            e = match left_is_forward {
                true => e1,
                false => e2,
            };
        }
        true
    }

    fn remove_edge(&mut self, e: usize) -> usize {
        let (next, prev) = (self.edges[e].next, self.edges[e].prev);
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
        next
    }

    fn find_next_loc_min(&self, mut e: usize) -> usize {
        let ed = &self.edges;
        loop {
            while ed[e].bot != ed[ed[e].prev].bot || ed[e].curr == ed[e].top {
                e = ed[e].next;
            }
            if !ed[e].is_horizontal() && !ed[ed[e].prev].is_horizontal() {
                break;
            }
            while ed[ed[e].prev].is_horizontal() {
                e = ed[e].prev;
            }
            let e2 = e;
            while ed[e].is_horizontal() {
                e = ed[e].next;
            }
            if ed[e].top.y == ed[ed[e].prev].bot.y {
                // just an intermediate horizontal
                continue;
            }
            if ed[ed[e2].prev].bot.x < ed[e].bot.x {
                e = e2;
            }
            break;
        }
        e
    }

    /// Links the edges of one bound through `next_in_lml` and returns the edge just past it.
    fn process_bound(&mut self, mut e: usize, next_is_forward: bool) -> usize {
        let mut result = e;
        if self.edges[e].is_horizontal() {
            // consecutive horizontals may start heading left before turning right
            let e_start = match next_is_forward {
                true => self.edges[e].prev,
                false => self.edges[e].next,
            };
            let (s, cur) = (self.edges[e_start], self.edges[e]);
            if s.is_horizontal() {
                if s.bot.x != cur.bot.x && s.top.x != cur.bot.x {
                    self.edges[e].reverse_horizontal();
                }
            } else if s.bot.x != cur.bot.x {
                self.edges[e].reverse_horizontal();
            }
        }
        let e_start = e;

        if next_is_forward {
            while self.edges[result].top.y == self.edges[self.edges[result].next].bot.y {
                result = self.edges[result].next;
            }
            if self.edges[result].is_horizontal() {
                // top horizontals belong to this bound only when they attach to its left vertex
                let mut horz = result;
                while self.edges[self.edges[horz].prev].is_horizontal() {
                    horz = self.edges[horz].prev;
                }
                let horz_prev = self.edges[horz].prev;
                if self.edges[horz_prev].top.x > self.edges[self.edges[result].next].top.x {
                    result = horz_prev;
                }
            }
            while e != result {
                self.edges[e].next_in_lml = Some(self.edges[e].next);
                self.fix_bound_horizontal(e, e_start, self.edges[e].prev);
                e = self.edges[e].next;
            }
            self.fix_bound_horizontal(e, e_start, self.edges[e].prev);
            self.edges[result].next
        } else {
            while self.edges[result].top.y == self.edges[self.edges[result].prev].bot.y {
                result = self.edges[result].prev;
            }
            if self.edges[result].is_horizontal() {
                let mut horz = result;
                while self.edges[self.edges[horz].next].is_horizontal() {
                    horz = self.edges[horz].next;
                }
                let horz_next = self.edges[horz].next;
                if self.edges[horz_next].top.x >= self.edges[self.edges[result].prev].top.x {
                    result = horz_next;
                }
            }
            while e != result {
                self.edges[e].next_in_lml = Some(self.edges[e].prev);
                self.fix_bound_horizontal(e, e_start, self.edges[e].next);
                e = self.edges[e].prev;
            }
            self.fix_bound_horizontal(e, e_start, self.edges[e].next);
            self.edges[result].prev
        }
    }

    fn fix_bound_horizontal(&mut self, e: usize, e_start: usize, behind: usize) {
        if self.edges[e].is_horizontal() && e != e_start && self.edges[e].bot.x != self.edges[behind].top.x {
            self.edges[e].reverse_horizontal();
        }
    }
}
