use serde::{Deserialize, Serialize};

/// Engine-side options that travel inside every worker job as a single `u32`.
///
/// Bit layout, LSB first:
///
/// | field                  | bits      |
/// |------------------------|-----------|
/// | `curve_tolerance × 10` | `[0, 4)`  |
/// | `spacing`              | `[4, 9)`  |
/// | `rotations`            | `[9, 14)` |
/// | `population_size`      | `[14, 21)`|
/// | `mutation_rate`        | `[21, 28)`|
/// | `use_holes`            | `28`      |
/// | `explore_concave`      | `29`      |
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PackedConfig {
    ///Maximum distance between merged points, also the arc tolerance of offsets
    pub curve_tolerance: f64,
    ///Gap kept between parts and towards the bin edge
    pub spacing: u32,
    ///Number of rotation buckets over 360 degrees
    pub rotations: u32,
    pub population_size: u32,
    ///Per-gene mutation probability in percent
    pub mutation_rate: u32,
    ///Whether parts may be placed inside holes of other parts
    pub use_holes: bool,
    ///Trace every NFP loop by orbiting instead of taking the Minkowski difference for outer NFPs
    pub explore_concave: bool,
}

impl Default for PackedConfig {
    fn default() -> Self {
        Self {
            curve_tolerance: 0.3,
            spacing: 0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
            explore_concave: false,
        }
    }
}

const FIELDS: [(u32, u32); 5] = [(0, 4), (4, 5), (9, 5), (14, 7), (21, 7)];
const USE_HOLES_BIT: u32 = 28;
const EXPLORE_CONCAVE_BIT: u32 = 29;

fn put(value: u32, (offset, width): (u32, u32)) -> u32 {
    let max = (1 << width) - 1;
    value.min(max) << offset
}

fn get(packed: u32, (offset, width): (u32, u32)) -> u32 {
    (packed >> offset) & ((1 << width) - 1)
}

impl PackedConfig {
    /// Values that do not fit their bit range are clamped.
    pub fn pack(&self) -> u32 {
        let tolerance = (self.curve_tolerance * 10.0).round().max(0.0) as u32;
        put(tolerance, FIELDS[0])
            | put(self.spacing, FIELDS[1])
            | put(self.rotations, FIELDS[2])
            | put(self.population_size, FIELDS[3])
            | put(self.mutation_rate, FIELDS[4])
            | ((self.use_holes as u32) << USE_HOLES_BIT)
            | ((self.explore_concave as u32) << EXPLORE_CONCAVE_BIT)
    }

    pub fn unpack(packed: u32) -> Self {
        Self {
            curve_tolerance: get(packed, FIELDS[0]) as f64 / 10.0,
            spacing: get(packed, FIELDS[1]),
            rotations: get(packed, FIELDS[2]),
            population_size: get(packed, FIELDS[3]),
            mutation_rate: get(packed, FIELDS[4]),
            use_holes: (packed >> USE_HOLES_BIT) & 1 == 1,
            explore_concave: (packed >> EXPLORE_CONCAVE_BIT) & 1 == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_packing() {
        let config = PackedConfig::default();
        assert_eq!(PackedConfig::unpack(config.pack()), config);
    }

    #[test]
    fn bit_positions() {
        let config = PackedConfig {
            curve_tolerance: 0.1,
            spacing: 1,
            rotations: 1,
            population_size: 1,
            mutation_rate: 1,
            use_holes: true,
            explore_concave: false,
        };
        let expected = 1 | 1 << 4 | 1 << 9 | 1 << 14 | 1 << 21 | 1 << 28;
        assert_eq!(config.pack(), expected);
    }

    #[test]
    fn oversized_values_are_clamped() {
        let config = PackedConfig {
            spacing: 1000,
            population_size: 500,
            ..PackedConfig::default()
        };
        let unpacked = PackedConfig::unpack(config.pack());
        assert_eq!(unpacked.spacing, 31);
        assert_eq!(unpacked.population_size, 127);
        assert_eq!(unpacked.rotations, 4);
    }
}
