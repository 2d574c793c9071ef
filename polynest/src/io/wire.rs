//! Little-endian binary formats exchanged with workers.
//!
//! Every job starts with a `u32` job kind followed by the packed engine config.
//! Coordinates and rotations travel as `f32`.

use std::collections::BTreeMap;

use crate::cache::NfpKey;
use crate::entities::{BinPlacement, Placement, PlacementJob, PlacementResult, PolygonNode};
use crate::error::{NestError, Result};
use crate::geometry::{BoundRect, Polygon};
use crate::nfp::{PairJob, PairResult};
use crate::util::PackedConfig;

/// Index of the first loop descriptor in an encoded NFP, in `f32` words
const NFP_INFO_START: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Pair,
    Placement,
}

impl JobKind {
    fn tag(self) -> u32 {
        match self {
            JobKind::Pair => 0,
            JobKind::Placement => 1,
        }
    }
}

impl TryFrom<u32> for JobKind {
    type Error = NestError;

    fn try_from(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(JobKind::Pair),
            1 => Ok(JobKind::Placement),
            other => Err(NestError::UnknownJobKind(other)),
        }
    }
}

/// Packs two 16 bit values into one word, `low` in the least significant half.
#[inline]
pub fn join_u16(low: u16, high: u16) -> u32 {
    low as u32 | (high as u32) << 16
}

#[inline]
pub fn split_u16(word: u32) -> (u16, u16) {
    (word as u16, (word >> 16) as u16)
}

/// Cursor over an encoded buffer. Every read fails with [`NestError::WireFormat`] past the end.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(NestError::WireFormat(format!(
                "needed {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }
}

#[derive(Debug, Clone, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Kind of the job encoded in `buf`, read from its first word.
pub fn job_kind(buf: &[u8]) -> Result<JobKind> {
    JobKind::try_from(WireReader::new(buf).u32()?)
}

// ---- polygon nodes ----

fn write_node(w: &mut WireWriter, node: &PolygonNode) {
    w.u32((node.source + 1) as u32)
        .f32(node.rotation as f32)
        .u32(node.polygon.len() as u32);
    for &c in node.polygon.coords() {
        w.f32(c as f32);
    }
    w.u32(node.children.len() as u32);
    for child in &node.children {
        write_node(w, child);
    }
}

fn read_node(r: &mut WireReader) -> Result<PolygonNode> {
    let source = r.u32()? as i32 - 1;
    let rotation = r.f32()? as f64;
    let n_points = r.u32()? as usize;
    if n_points * 8 > r.remaining() {
        return Err(NestError::WireFormat(format!("node claims {n_points} points")));
    }
    let coords = (0..n_points * 2).map(|_| r.f32().map(f64::from)).collect::<Result<Vec<_>>>()?;
    let n_children = r.u32()? as usize;
    let mut node = PolygonNode::new(source, rotation, Polygon::new(coords));
    for _ in 0..n_children {
        node.children.push(read_node(r)?);
    }
    Ok(node)
}

pub fn write_nodes(w: &mut WireWriter, nodes: &[PolygonNode]) {
    w.u32(nodes.len() as u32);
    for node in nodes {
        write_node(w, node);
    }
}

pub fn read_nodes(r: &mut WireReader) -> Result<Vec<PolygonNode>> {
    let count = r.u32()? as usize;
    (0..count).map(|_| read_node(r)).collect()
}

pub fn encode_nodes(nodes: &[PolygonNode]) -> Vec<u8> {
    let mut w = WireWriter::new();
    write_nodes(&mut w, nodes);
    w.finish()
}

pub fn decode_nodes(buf: &[u8]) -> Result<Vec<PolygonNode>> {
    read_nodes(&mut WireReader::new(buf))
}

// ---- pair jobs and NFP results ----

pub fn encode_pair_job(job: &PairJob) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.u32(JobKind::Pair.tag()).u32(job.config.pack()).u32(job.key.0);
    write_nodes(&mut w, &[job.a.clone(), job.b.clone()]);
    w.finish()
}

pub fn decode_pair_job(buf: &[u8]) -> Result<PairJob> {
    let mut r = WireReader::new(buf);
    let kind = JobKind::try_from(r.u32()?)?;
    if kind != JobKind::Pair {
        return Err(NestError::WireFormat(format!("expected a pair job, got {kind:?}")));
    }
    let config = PackedConfig::unpack(r.u32()?);
    let key = NfpKey(r.u32()?);
    let mut nodes = read_nodes(&mut r)?;
    if nodes.len() != 2 {
        return Err(NestError::WireFormat(format!("pair job holds {} nodes", nodes.len())));
    }
    let b = nodes.pop().ok_or_else(|| NestError::WireFormat("missing node".into()))?;
    let a = nodes.pop().ok_or_else(|| NestError::WireFormat("missing node".into()))?;
    Ok(PairJob { config, key, a, b })
}

/// `key | loop count | (len, offset) per loop | coordinates`, all as 32 bit words.
/// Lengths and offsets count `f32` words from the start of the record.
///
/// Both are packed into 16 bits: an NFP whose coordinates reach past word 65535 is rejected.
pub fn encode_pair_result(result: &PairResult) -> Result<Vec<u8>> {
    let n = result.loops.len();
    let mut w = WireWriter::new();
    w.u32(result.key.0).u32(n as u32);
    let mut offset = NFP_INFO_START + n;
    for l in &result.loops {
        let len = l.coords().len();
        w.u32(join_u16(to_u16_words(len, result.key)?, to_u16_words(offset, result.key)?));
        offset += len;
    }
    for l in &result.loops {
        for &c in l.coords() {
            w.f32(c as f32);
        }
    }
    Ok(w.finish())
}

fn to_u16_words(words: usize, key: NfpKey) -> Result<u16> {
    u16::try_from(words)
        .map_err(|_| NestError::WireFormat(format!("NFP {key} spans {words} words, at most {} fit", u16::MAX)))
}

pub fn decode_pair_result(buf: &[u8]) -> Result<PairResult> {
    let mut r = WireReader::new(buf);
    let key = NfpKey(r.u32()?);
    let n = r.u32()? as usize;
    let infos = (0..n).map(|_| r.u32().map(split_u16)).collect::<Result<Vec<_>>>()?;
    let mut loops = Vec::with_capacity(n);
    for (len, offset) in infos {
        let mut lr = WireReader::new(buf);
        lr.bytes(offset as usize * 4)?;
        let coords = (0..len).map(|_| lr.f32().map(f64::from)).collect::<Result<Vec<_>>>()?;
        loops.push(Polygon::new(coords));
    }
    Ok(PairResult { key, loops })
}

// ---- NFP cache bulk ----

/// `repeat { key, byte length, encoded NFP }` until the buffer ends.
pub fn encode_cache(cache: &BTreeMap<NfpKey, Vec<Polygon>>) -> Result<Vec<u8>> {
    let mut w = WireWriter::new();
    for (key, loops) in cache {
        let payload = encode_pair_result(&PairResult {
            key: *key,
            loops: loops.clone(),
        })?;
        w.u32(key.0).u32(payload.len() as u32).bytes(&payload);
    }
    Ok(w.finish())
}

pub fn decode_cache(buf: &[u8]) -> Result<BTreeMap<NfpKey, Vec<Polygon>>> {
    let mut r = WireReader::new(buf);
    let mut cache = BTreeMap::new();
    while !r.is_exhausted() {
        let key = NfpKey(r.u32()?);
        let len = r.u32()? as usize;
        let result = decode_pair_result(r.bytes(len)?)?;
        cache.insert(key, result.loops);
    }
    Ok(cache)
}

// ---- placement ----

pub fn encode_placement_job(job: &PlacementJob) -> Result<Vec<u8>> {
    let cache = encode_cache(&job.cache)?;
    let mut w = WireWriter::new();
    w.u32(JobKind::Placement.tag())
        .u32(job.config.pack())
        .f32(job.bin_area as f32)
        .u32(cache.len() as u32)
        .bytes(&cache);
    write_nodes(&mut w, &job.nodes);
    write_nodes(&mut w, std::slice::from_ref(&job.bin));
    Ok(w.finish())
}

pub fn decode_placement_job(buf: &[u8]) -> Result<PlacementJob> {
    let mut r = WireReader::new(buf);
    let kind = JobKind::try_from(r.u32()?)?;
    if kind != JobKind::Placement {
        return Err(NestError::WireFormat(format!("expected a placement job, got {kind:?}")));
    }
    let config = PackedConfig::unpack(r.u32()?);
    let bin_area = r.f32()? as f64;
    let cache_len = r.u32()? as usize;
    let cache = decode_cache(r.bytes(cache_len)?)?;
    let nodes = read_nodes(&mut r)?;
    let bin = read_nodes(&mut r)?
        .pop()
        .ok_or_else(|| NestError::WireFormat("placement job without bin".into()))?;
    Ok(PlacementJob {
        config,
        bin_area,
        cache,
        nodes,
        bin,
    })
}

pub fn encode_placement_result(result: &PlacementResult) -> Vec<u8> {
    let nodes = encode_nodes(&result.nodes);
    let mut data = WireWriter::new();
    for bin in &result.bins {
        data.f32(bin.placements.len() as f32);
        for p in &bin.placements {
            data.f32(f32::from_bits(join_u16(p.node_idx, p.rotation_idx)))
                .f32(p.x as f32)
                .f32(p.y as f32);
        }
    }
    let data = data.finish();
    let bounds = result.bounds.unwrap_or_default();

    let mut w = WireWriter::new();
    w.f32(result.fitness as f32)
        .u16(result.placed_count)
        .u16(result.total_count)
        .u8(result.rotations)
        .u8(result.has_result() as u8)
        .f32(bounds.x as f32)
        .f32(bounds.y as f32)
        .f32(bounds.width as f32)
        .f32(bounds.height as f32)
        .u32(nodes.len() as u32)
        .u32(data.len() as u32)
        .bytes(&nodes)
        .bytes(&data);
    w.finish()
}

pub fn decode_placement_result(buf: &[u8]) -> Result<PlacementResult> {
    let mut r = WireReader::new(buf);
    let fitness = r.f32()? as f64;
    let placed_count = r.u16()?;
    let total_count = r.u16()?;
    let rotations = r.u8()?;
    let has_result = r.u8()? != 0;
    let rect = [r.f32()?, r.f32()?, r.f32()?, r.f32()?].map(f64::from);
    let nodes_len = r.u32()? as usize;
    let data_len = r.u32()? as usize;
    let nodes = decode_nodes(r.bytes(nodes_len)?)?;

    let mut d = WireReader::new(r.bytes(data_len)?);
    let mut bins = vec![];
    while !d.is_exhausted() {
        let count = d.f32()? as usize;
        let placements = (0..count)
            .map(|_| {
                let (node_idx, rotation_idx) = split_u16(d.f32()?.to_bits());
                Ok(Placement {
                    node_idx,
                    rotation_idx,
                    x: d.f32()? as f64,
                    y: d.f32()? as f64,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        bins.push(BinPlacement { placements });
    }

    Ok(PlacementResult {
        fitness,
        placed_count,
        total_count,
        rotations,
        bounds: has_result.then(|| BoundRect::new(rect[0], rect[1], rect[2], rect[3])),
        nodes,
        bins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> PolygonNode {
        let mut node = PolygonNode::new(3, 90.0, Polygon::rectangle(0.0, 0.0, 10.0, 5.0));
        let mut hole = PolygonNode::new(3, 90.0, Polygon::rectangle(1.0, 1.0, 2.0, 2.0));
        hole.children.push(PolygonNode::new(3, 90.0, Polygon::rectangle(1.5, 1.5, 0.5, 0.5)));
        node.children.push(hole);
        node
    }

    #[test]
    fn nested_nodes_keep_structure() {
        let nodes = vec![sample_node(), PolygonNode::new(-1, 0.0, Polygon::rectangle(0.0, 0.0, 1.0, 1.0))];
        let decoded = decode_nodes(&encode_nodes(&nodes)).unwrap();
        assert_eq!(decoded, nodes);
        assert_eq!(decoded[1].source, -1);
        assert_eq!(decoded[0].children[0].children.len(), 1);
    }

    #[test]
    fn pair_job_layout() {
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 3, true, 0, 1),
            a: PolygonNode::new(-1, 0.0, Polygon::rectangle(0.0, 0.0, 1.0, 1.0)),
            b: sample_node(),
        };
        let buf = encode_pair_job(&job);
        assert_eq!(job_kind(&buf).unwrap(), JobKind::Pair);
        assert_eq!(&buf[4..8], &PackedConfig::default().pack().to_le_bytes());
        assert_eq!(&buf[8..12], &job.key.0.to_le_bytes());
        assert_eq!(decode_pair_job(&buf).unwrap(), job);
    }

    #[test]
    fn pair_result_offsets_point_at_coordinates() {
        let result = PairResult {
            key: NfpKey::new(0, 1, false, 0, 0),
            loops: vec![Polygon::rectangle(0.0, 0.0, 2.0, 2.0), Polygon::new(vec![0.5, 0.5, 1.0, 0.5, 1.0, 1.0])],
        };
        let buf = encode_pair_result(&result).unwrap();
        let mut r = WireReader::new(&buf);
        r.bytes(8).unwrap();
        assert_eq!(split_u16(r.u32().unwrap()), (8, 4));
        assert_eq!(split_u16(r.u32().unwrap()), (6, 12));
        assert_eq!(decode_pair_result(&buf).unwrap(), result);
    }

    #[test]
    fn oversized_nfp_is_rejected() {
        let coords = (0..40_000).flat_map(|i| [i as f64, (i % 7) as f64]).collect();
        let result = PairResult {
            key: NfpKey::new(0, 1, false, 0, 0),
            loops: vec![Polygon::new(coords)],
        };
        assert!(matches!(encode_pair_result(&result), Err(NestError::WireFormat(_))));

        let mut cache = BTreeMap::new();
        cache.insert(result.key, result.loops);
        assert!(matches!(encode_cache(&cache), Err(NestError::WireFormat(_))));
    }

    #[test]
    fn largest_encodable_loop_survives() {
        // 2 header words, 1 info word, then the coordinates up to word 65535
        let words = u16::MAX as usize - 3;
        let coords = (0..words).map(|i| (i % 100) as f64).collect::<Vec<_>>();
        let result = PairResult {
            key: NfpKey::new(0, 1, false, 0, 0),
            loops: vec![Polygon::new(coords)],
        };
        let decoded = decode_pair_result(&encode_pair_result(&result).unwrap()).unwrap();
        assert_eq!(decoded.loops[0].coords().len(), words);
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let buf = encode_nodes(&[sample_node()]);
        for cut in [0, 3, buf.len() / 2, buf.len() - 1] {
            assert!(matches!(decode_nodes(&buf[..cut]), Err(NestError::WireFormat(_))));
        }
    }

    #[test]
    fn unknown_job_kind() {
        let buf = 7u32.to_le_bytes();
        assert_eq!(job_kind(&buf), Err(NestError::UnknownJobKind(7)));
    }

    #[test]
    fn placement_job_carries_cache_and_nodes() {
        let mut cache = BTreeMap::new();
        cache.insert(NfpKey::new(-1, 0, true, 0, 0), vec![Polygon::rectangle(0.0, 0.0, 60.0, 60.0)]);
        cache.insert(NfpKey::new(0, 0, false, 0, 0), vec![]);
        let job = PlacementJob {
            config: PackedConfig::default(),
            bin_area: 10000.0,
            cache,
            nodes: vec![sample_node()],
            bin: PolygonNode::new(-1, 0.0, Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
        };
        let buf = encode_placement_job(&job).unwrap();
        assert_eq!(job_kind(&buf).unwrap(), JobKind::Placement);
        assert_eq!(decode_placement_job(&buf).unwrap(), job);
    }

    #[test]
    fn placement_result_bins() {
        let result = PlacementResult {
            fitness: 1.5,
            placed_count: 3,
            total_count: 4,
            rotations: 4,
            bounds: Some(BoundRect::new(0.0, 0.0, 80.0, 40.0)),
            nodes: vec![sample_node()],
            bins: vec![
                BinPlacement {
                    placements: vec![
                        Placement { node_idx: 0, rotation_idx: 1, x: 0.0, y: 0.0 },
                        Placement { node_idx: 2, rotation_idx: 3, x: 40.0, y: 0.0 },
                    ],
                },
                BinPlacement {
                    placements: vec![Placement { node_idx: 1, rotation_idx: 0, x: 5.0, y: 5.0 }],
                },
            ],
        };
        let decoded = decode_placement_result(&encode_placement_result(&result)).unwrap();
        assert_eq!(decoded, result);
    }
}
