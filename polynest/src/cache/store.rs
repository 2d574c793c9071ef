use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::cache::NfpKey;
use crate::entities::{PlacementJob, PolygonNode};
use crate::error::Result;
use crate::geometry::Polygon;
use crate::io::wire;
use crate::nfp::{PairJob, PairResult};
use crate::util::PackedConfig;

/// NFPs needed to place one phenotype, resolved or still pending.
///
/// The store is rebuilt on every [`NfpStore::init`]: entries the new phenotype does not need are evicted,
/// so memory stays bounded by the current key set.
#[derive(Debug, Clone, Default)]
pub struct NfpStore {
    cache: BTreeMap<NfpKey, Vec<Polygon>>,
    pending: Vec<PairJob>,
    pending_keys: BTreeSet<NfpKey>,
    nodes: Vec<PolygonNode>,
    bin: Option<PolygonNode>,
    config: PackedConfig,
}

impl NfpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares the store for the parts in `nodes`, in placement order and each at its own rotation.
    ///
    /// Needs one inner NFP of the bin per part and one outer NFP per pair of sequenced parts.
    /// Returns the number of pair jobs left to compute.
    pub fn init(&mut self, nodes: Vec<PolygonNode>, bin: PolygonNode, config: PackedConfig) -> usize {
        let mut previous = std::mem::take(&mut self.cache);
        self.pending.clear();
        self.pending_keys.clear();
        self.config = config;

        for (i, node) in nodes.iter().enumerate() {
            let key = NfpKey::from_nodes(config.rotations, true, &bin, node);
            self.carry_or_record(&mut previous, key, &bin, node);
            for placed in &nodes[..i] {
                let key = NfpKey::from_nodes(config.rotations, false, placed, node);
                self.carry_or_record(&mut previous, key, placed, node);
            }
        }
        debug!(
            "[NFP] store ready for {} parts: {} cached, {} pending, {} evicted",
            nodes.len(),
            self.cache.len(),
            self.pending.len(),
            previous.len()
        );

        self.nodes = nodes;
        self.bin = Some(bin);
        self.pending.len()
    }

    fn carry_or_record(
        &mut self,
        previous: &mut BTreeMap<NfpKey, Vec<Polygon>>,
        key: NfpKey,
        a: &PolygonNode,
        b: &PolygonNode,
    ) {
        if self.cache.contains_key(&key) {
            return;
        }
        match previous.remove(&key) {
            Some(loops) => {
                self.cache.insert(key, loops);
            }
            None => {
                self.record_missing(key, a, b);
            }
        }
    }

    pub fn lookup(&self, key: NfpKey) -> Option<&[Polygon]> {
        self.cache.get(&key).map(Vec::as_slice)
    }

    /// Queues the computation of `key` unless it is cached or already queued.
    /// Returns the queued job.
    pub fn record_missing(&mut self, key: NfpKey, a: &PolygonNode, b: &PolygonNode) -> Option<&PairJob> {
        if self.cache.contains_key(&key) || !self.pending_keys.insert(key) {
            return None;
        }
        trace!("[NFP] missing {key}");
        self.pending.push(PairJob {
            config: self.config,
            key,
            a: a.clone(),
            b: b.clone(),
        });
        self.pending.last()
    }

    /// Jobs still to compute for the current phenotype.
    pub fn nfp_pairs(&self) -> &[PairJob] {
        &self.pending
    }

    /// Moves the queued jobs out, for dispatching.
    pub fn take_pairs(&mut self) -> Vec<PairJob> {
        self.pending_keys.clear();
        std::mem::take(&mut self.pending)
    }

    /// Resolves every queued job involving `source` with an empty NFP, so its parts never find a place.
    /// Returns the number of jobs resolved.
    pub fn resolve_infeasible(&mut self, source: i32) -> usize {
        let keys = self
            .pending
            .iter()
            .filter(|job| job.a.source == source || job.b.source == source)
            .map(|job| job.key)
            .collect::<Vec<_>>();
        for &key in &keys {
            self.insert(PairResult { key, loops: vec![] });
        }
        keys.len()
    }

    /// Merges one encoded NFP into the cache and returns its key.
    pub fn ingest(&mut self, buffer: &[u8]) -> Result<NfpKey> {
        let result = wire::decode_pair_result(buffer)?;
        let key = result.key;
        self.insert(result);
        Ok(key)
    }

    pub fn insert(&mut self, result: PairResult) {
        if self.pending_keys.remove(&result.key) {
            self.pending.retain(|job| job.key != result.key);
        }
        self.cache.insert(result.key, result.loops);
    }

    pub fn placement_job(&self, bin_area: f64) -> Option<PlacementJob> {
        Some(PlacementJob {
            config: self.config,
            bin_area,
            cache: self.cache.clone(),
            nodes: self.nodes.clone(),
            bin: self.bin.clone()?,
        })
    }

    /// Encoded placement job for the current phenotype, `None` before the first [`NfpStore::init`].
    pub fn snapshot(&self, bin_area: f64) -> Result<Option<Vec<u8>>> {
        self.placement_job(bin_area)
            .map(|job| wire::encode_placement_job(&job))
            .transpose()
    }

    /// Number of parts the next placement job places.
    pub fn placement_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn clean(&mut self) {
        *self = NfpStore::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(source: i32, rotation: f64, size: f64) -> PolygonNode {
        PolygonNode::new(source, rotation, Polygon::rectangle(0.0, 0.0, size, size))
    }

    fn bin() -> PolygonNode {
        square(-1, 0.0, 100.0)
    }

    #[test]
    fn keys_for_a_phenotype() {
        let mut store = NfpStore::new();
        let nodes = vec![square(0, 0.0, 10.0), square(1, 90.0, 20.0), square(2, 0.0, 30.0)];
        assert_eq!(store.init(nodes, bin(), PackedConfig::default()), 6);

        let pairs = store.nfp_pairs();
        assert_eq!(pairs.iter().filter(|p| p.key.inside()).count(), 3);
        assert!(pairs.iter().any(|p| p.key == NfpKey::new(0, 1, false, 0, 1)));
        assert!(pairs.iter().any(|p| p.key == NfpKey::new(-1, 1, true, 0, 1)));
        assert_eq!(store.placement_count(), 3);
    }

    #[test]
    fn duplicate_parts_share_jobs() {
        let mut store = NfpStore::new();
        let nodes = vec![square(0, 0.0, 10.0), square(0, 0.0, 10.0)];
        // one inner key and one outer key
        assert_eq!(store.init(nodes, bin(), PackedConfig::default()), 2);
    }

    #[test]
    fn resolved_keys_carry_over_and_unused_are_evicted() {
        let mut store = NfpStore::new();
        let config = PackedConfig::default();
        store.init(vec![square(0, 0.0, 10.0), square(1, 0.0, 20.0)], bin(), config);
        for job in store.take_pairs() {
            let buf = wire::encode_pair_result(&PairResult {
                key: job.key,
                loops: vec![Polygon::rectangle(0.0, 0.0, 1.0, 1.0)],
            })
            .unwrap();
            assert_eq!(store.ingest(&buf).unwrap(), job.key);
        }
        assert_eq!(store.cached_count(), 3);

        // part 1 first now: only its outer NFP against part 0 is new
        let pending = store.init(vec![square(1, 0.0, 20.0), square(0, 0.0, 10.0)], bin(), config);
        assert_eq!(pending, 1);
        assert_eq!(store.nfp_pairs()[0].key, NfpKey::new(1, 0, false, 0, 0));
        assert_eq!(store.cached_count(), 2);
        assert!(store.lookup(NfpKey::new(0, 1, false, 0, 0)).is_none());
    }

    #[test]
    fn infeasible_source_needs_no_jobs() {
        let mut store = NfpStore::new();
        let config = PackedConfig::default();
        let nodes = vec![square(0, 0.0, 10.0), square(1, 0.0, 20.0), square(2, 0.0, 30.0)];
        assert_eq!(store.init(nodes.clone(), bin(), config), 6);

        // inner key of part 1 and its outer keys against 0 and 2
        assert_eq!(store.resolve_infeasible(1), 3);
        assert_eq!(store.nfp_pairs().len(), 3);
        assert!(store.nfp_pairs().iter().all(|p| p.a.source != 1 && p.b.source != 1));
        assert_eq!(store.lookup(NfpKey::new(-1, 1, true, 0, 0)), Some(&[][..]));

        // the empty NFPs carry over to the next phenotype
        store.take_pairs();
        assert_eq!(store.init(nodes, bin(), config), 3);
        assert_eq!(store.resolve_infeasible(1), 0);
    }

    #[test]
    fn snapshot_holds_the_cache() {
        let mut store = NfpStore::new();
        assert!(store.snapshot(1.0).unwrap().is_none());
        store.init(vec![square(0, 0.0, 10.0)], bin(), PackedConfig::default());
        let key = store.nfp_pairs()[0].key;
        store.insert(PairResult {
            key,
            loops: vec![Polygon::rectangle(0.0, 0.0, 90.0, 90.0)],
        });
        assert!(store.nfp_pairs().is_empty());

        let job = wire::decode_placement_job(&store.snapshot(10000.0).unwrap().unwrap()).unwrap();
        assert_eq!(job.nodes.len(), 1);
        assert_eq!(job.bin.source, -1);
        assert_eq!(job.cache.get(&key).map(Vec::len), Some(1));
    }
}
