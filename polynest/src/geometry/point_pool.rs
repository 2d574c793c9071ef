use crate::error::{NestError, Result};
use crate::geometry::Point;

pub const POOL_SIZE: usize = 32;

/// Fixed arena of 32 scratch points drawn from one flat buffer.
///
/// Allocations are bitmasks of slot indices. Every mask handed out by [`PointPool::alloc`]
/// must be returned through [`PointPool::free`]; prefer [`PointPool::lease`], which frees on drop.
#[derive(Debug, Clone)]
pub struct PointPool {
    buffer: [f64; POOL_SIZE * 2],
    used: u32,
}

impl Default for PointPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PointPool {
    pub fn new() -> Self {
        PointPool {
            buffer: [0.0; POOL_SIZE * 2],
            used: 0,
        }
    }

    /// Claims `n` free slots and returns them as a bitmask.
    pub fn alloc(&mut self, n: usize) -> Result<u32> {
        let free = self.free_count();
        if n > free {
            return Err(NestError::PoolExhausted { requested: n, free });
        }
        let mut mask = 0u32;
        let mut claimed = 0;
        for slot in 0..POOL_SIZE {
            if claimed == n {
                break;
            }
            let bit = 1u32 << slot;
            if self.used & bit == 0 {
                mask |= bit;
                claimed += 1;
            }
        }
        self.used |= mask;
        Ok(mask)
    }

    pub fn free(&mut self, mask: u32) {
        debug_assert!(self.used & mask == mask, "freeing slots that were never allocated");
        self.used &= !mask;
    }

    /// Bitmask of the slots currently in use.
    pub fn used_mask(&self) -> u32 {
        self.used
    }

    pub fn free_count(&self) -> usize {
        POOL_SIZE - self.used.count_ones() as usize
    }

    /// Slot index of the `i`-th set bit of `mask`.
    fn slot(mask: u32, i: usize) -> usize {
        let mut m = mask;
        for _ in 0..i {
            m &= m - 1;
        }
        debug_assert!(m != 0, "index out of allocation");
        m.trailing_zeros() as usize
    }

    pub fn get(&self, mask: u32, i: usize) -> Point {
        let s = Self::slot(mask, i) << 1;
        Point(self.buffer[s], self.buffer[s + 1])
    }

    pub fn set(&mut self, mask: u32, i: usize, p: Point) {
        let s = Self::slot(mask, i) << 1;
        self.buffer[s] = p.0;
        self.buffer[s + 1] = p.1;
    }

    /// Scoped allocation that releases its slots on every exit path.
    pub fn lease(&mut self, n: usize) -> Result<PoolLease<'_>> {
        let mask = self.alloc(n)?;
        Ok(PoolLease { pool: self, mask })
    }
}

pub struct PoolLease<'a> {
    pool: &'a mut PointPool,
    mask: u32,
}

impl PoolLease<'_> {
    pub fn get(&self, i: usize) -> Point {
        self.pool.get(self.mask, i)
    }

    pub fn set(&mut self, i: usize, p: Point) {
        self.pool.set(self.mask, i, p)
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }
}

impl Drop for PoolLease<'_> {
    fn drop(&mut self) {
        self.pool.free(self.mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_alloc_free_restores_mask() {
        let mut pool = PointPool::new();
        let initial = pool.used_mask();
        let a = pool.alloc(3).unwrap();
        let b = pool.alloc(5).unwrap();
        assert_eq!((a & b), 0);
        assert_eq!(pool.free_count(), POOL_SIZE - 8);
        pool.free(a);
        let c = pool.alloc(2).unwrap();
        pool.free(b);
        pool.free(c);
        assert_eq!(pool.used_mask(), initial);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut pool = PointPool::new();
        let all = pool.alloc(POOL_SIZE).unwrap();
        assert_eq!(all, u32::MAX);
        assert!(matches!(pool.alloc(1), Err(NestError::PoolExhausted { requested: 1, free: 0 })));
        pool.free(all);
        assert_eq!(pool.used_mask(), 0);
    }

    #[test]
    fn lease_frees_on_early_return() {
        fn use_and_bail(pool: &mut PointPool) -> Result<()> {
            let mut lease = pool.lease(4)?;
            lease.set(2, Point(1.0, 2.0));
            assert_eq!(lease.get(2), Point(1.0, 2.0));
            Err(NestError::InvalidPolygon("bail".into()))
        }
        let mut pool = PointPool::new();
        assert!(use_and_bail(&mut pool).is_err());
        assert_eq!(pool.used_mask(), 0);
    }
}
