use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::entities::PolygonNode;

/// Bit boundaries of the key fields, LSB first:
/// `source_a + 1`, `source_b + 1`, `rot_idx_a`, `rot_idx_b`, `inside`.
const KEY_BITS: [u32; 6] = [0, 10, 19, 23, 27, 32];

/// Largest part source id that still fits in the key
pub const MAX_SOURCE: i32 = (1 << (KEY_BITS[2] - KEY_BITS[1])) - 2;
/// Largest number of rotation buckets that still fits in the key
pub const MAX_ROTATIONS: u32 = 1 << (KEY_BITS[3] - KEY_BITS[2]);

/// Identifies the NFP of one ordered pair of (source, rotation bucket) polygons, inner or outer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NfpKey(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfpKeyParts {
    pub source_a: i32,
    pub source_b: i32,
    pub rot_idx_a: u32,
    pub rot_idx_b: u32,
    pub inside: bool,
}

fn field(i: usize, value: u32) -> u32 {
    let width = KEY_BITS[i + 1] - KEY_BITS[i];
    debug_assert!(width == 32 || value < (1 << width), "key field {i} overflows: {value}");
    (value & ((1u64 << width) - 1) as u32) << KEY_BITS[i]
}

fn extract(key: u32, i: usize) -> u32 {
    let width = KEY_BITS[i + 1] - KEY_BITS[i];
    (key >> KEY_BITS[i]) & ((1u64 << width) - 1) as u32
}

/// Bucket of `degrees` among `rotation_split` evenly spaced rotations.
pub fn to_rotation_index(degrees: f64, rotation_split: u32) -> u32 {
    if rotation_split == 0 {
        return 0;
    }
    let idx = (degrees.rem_euclid(360.0) * rotation_split as f64 / 360.0).round() as u32;
    idx % rotation_split
}

/// Angle in degrees of bucket `index` among `rotation_split` rotations.
pub fn to_rotation_angle(index: u32, rotation_split: u32) -> f64 {
    match rotation_split {
        0 => 0.0,
        n => (index % n) as f64 * 360.0 / n as f64,
    }
}

impl NfpKey {
    /// Sources are offset by one so that the bin (`-1`) encodes as zero.
    pub fn new(source_a: i32, source_b: i32, inside: bool, rot_idx_a: u32, rot_idx_b: u32) -> Self {
        NfpKey(
            field(0, (source_a + 1) as u32)
                | field(1, (source_b + 1) as u32)
                | field(2, rot_idx_a)
                | field(3, rot_idx_b)
                | field(4, inside as u32),
        )
    }

    pub fn from_nodes(rotation_split: u32, inside: bool, a: &PolygonNode, b: &PolygonNode) -> Self {
        NfpKey::new(
            a.source,
            b.source,
            inside,
            to_rotation_index(a.rotation, rotation_split),
            to_rotation_index(b.rotation, rotation_split),
        )
    }

    pub fn decode(&self) -> NfpKeyParts {
        NfpKeyParts {
            source_a: extract(self.0, 0) as i32 - 1,
            source_b: extract(self.0, 1) as i32 - 1,
            rot_idx_a: extract(self.0, 2),
            rot_idx_b: extract(self.0, 3),
            inside: extract(self.0, 4) != 0,
        }
    }

    pub fn inside(&self) -> bool {
        extract(self.0, 4) != 0
    }
}

impl Display for NfpKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let p = self.decode();
        write!(
            f,
            "{}{}@{}->{}@{}",
            if p.inside { "in:" } else { "out:" },
            p.source_a,
            p.rot_idx_a,
            p.source_b,
            p.rot_idx_b
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_flag_and_operand_order_are_distinguished() {
        let k1 = NfpKey::new(3, 7, true, 1, 2);
        let k2 = NfpKey::new(7, 3, false, 2, 1);
        assert_ne!(k1, k2);
        assert_eq!(k1, NfpKey::new(3, 7, true, 1, 2));
        assert_ne!(k1, NfpKey::new(3, 7, false, 1, 2));
        assert_ne!(k1, NfpKey::new(7, 3, true, 2, 1));
    }

    #[test]
    fn decode_inverts_new() {
        let parts = NfpKeyParts {
            source_a: -1,
            source_b: MAX_SOURCE,
            rot_idx_a: 0,
            rot_idx_b: MAX_ROTATIONS - 1,
            inside: true,
        };
        let key = NfpKey::new(parts.source_a, parts.source_b, parts.inside, parts.rot_idx_a, parts.rot_idx_b);
        assert_eq!(key.decode(), parts);
        assert!(key.inside());
    }

    #[test]
    fn rotation_buckets() {
        assert_eq!(to_rotation_index(0.0, 4), 0);
        assert_eq!(to_rotation_index(90.0, 4), 1);
        assert_eq!(to_rotation_index(270.0, 4), 3);
        assert_eq!(to_rotation_index(360.0, 4), 0);
        assert_eq!(to_rotation_index(-90.0, 4), 3);
        assert_eq!(to_rotation_angle(3, 4), 270.0);
    }
}
