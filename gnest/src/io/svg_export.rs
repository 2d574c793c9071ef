use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Text, Title};

use polynest::entities::{PlacementResult, PolygonNode};
use polynest::geometry::Polygon;
use polynest::geometry::geo_traits::Shape;
use polynest::io::import::Instance;

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgDrawOptions {
    pub bin_fill: Color,
    pub part_fill: Color,
    pub hole_fill: Color,
    pub stroke_width_multiplier: f64,
    /// Write the bin index and its density above the bin
    pub label: bool,
}

impl Default for SvgDrawOptions {
    fn default() -> Self {
        Self {
            bin_fill: Color(0xCC, 0x82, 0x4A),
            part_fill: Color(0xFF, 0xC8, 0x79),
            hole_fill: Color(0x2D, 0x2D, 0x2D),
            stroke_width_multiplier: 2.0,
            label: true,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Color(pub u8, pub u8, pub u8);

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(|| format!("invalid color: {s}"))
        };
        match hex.len() {
            6 => Ok(Color(channel(0)?, channel(2)?, channel(4)?)),
            _ => Err(format!("invalid color: {s}")),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn ring_data(data: Data, polygon: &Polygon) -> Data {
    let mut points = polygon.points();
    let Some(first) = points.next() else {
        return data;
    };
    points
        .fold(data.move_to((first.0 as f32, first.1 as f32)), |d, p| {
            d.line_to((p.0 as f32, p.1 as f32))
        })
        .close()
}

/// Contour and holes of a tree as one even-odd path.
fn tree_data(node: &PolygonNode) -> Data {
    node.children
        .iter()
        .fold(ring_data(Data::new(), &node.polygon), |d, c| ring_data(d, &c.polygon))
}

/// Draws bin `bin_idx` of `result` with the original (non offset) shapes of `instance`.
/// `None` if the result has no such bin.
pub fn bin_to_svg(
    instance: &Instance,
    result: &PlacementResult,
    bin_idx: usize,
    options: SvgDrawOptions,
    title: &str,
) -> Option<Document> {
    let bin_placement = result.bins.get(bin_idx)?;
    let bbox = instance.bin.polygon.bound_rect();
    let (x, y, width, height) = (bbox.x as f32, bbox.y as f32, bbox.width as f32, bbox.height as f32);
    let stroke_width = f32::min(width, height) * 0.001 * options.stroke_width_multiplier as f32;
    let margin = 0.05 * f32::max(width, height);

    let bin_group = Group::new()
        .set("id", format!("bin_{bin_idx}"))
        .add(Title::new(format!("bin {bin_idx}")))
        .add(
            Path::new()
                .set("d", tree_data(&instance.bin))
                .set("fill", options.bin_fill.to_string())
                .set("fill-rule", "evenodd")
                .set("stroke", "black")
                .set("stroke-width", 2.0 * stroke_width),
        );

    let mut parts_group = Group::new().set("id", "parts");
    let mut placed_area = 0.0;
    for p in &bin_placement.placements {
        let Some(node) = result.nodes.get(p.node_idx as usize) else {
            continue;
        };
        let Some(part) = usize::try_from(node.source).ok().and_then(|s| instance.parts.get(s)) else {
            continue;
        };
        let mut shape = part.tree.clone();
        shape.rotation = node.rotation;
        let mut shape = shape.rotated();
        shape.translate(p.x, p.y);
        placed_area += shape.net_area();

        let holes = shape.children.iter().fold(Data::new(), |d, c| ring_data(d, &c.polygon));
        parts_group = parts_group.add(
            Group::new()
                .add(Title::new(format!("part {} @ {:.1}°", part.id, node.rotation)))
                .add(
                    Path::new()
                        .set("d", tree_data(&shape))
                        .set("fill", options.part_fill.to_string())
                        .set("fill-rule", "evenodd")
                        .set("stroke", "black")
                        .set("stroke-width", stroke_width),
                )
                .add(
                    Path::new()
                        .set("d", holes)
                        .set("fill", options.hole_fill.to_string())
                        .set("fill-opacity", "0.3"),
                ),
        );
    }

    let mut document = Document::new()
        .set(
            "viewBox",
            (x - margin, y - 2.0 * margin, width + 2.0 * margin, height + 3.0 * margin),
        )
        .add(bin_group)
        .add(parts_group);

    if options.label {
        let density = placed_area / instance.bin_area();
        let font_size = f32::min(width, height) * 0.025;
        document = document.add(
            Text::new(format!(
                "bin: {bin_idx} | parts: {} | density: {:.3}% | {title}",
                bin_placement.placements.len(),
                density * 100.0
            ))
            .set("x", x)
            .set("y", y - 0.5 * font_size)
            .set("font-size", font_size)
            .set("font-family", "monospace"),
        );
    }
    Some(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_and_print() {
        let c: Color = "#CC824A".parse().unwrap();
        assert_eq!(c, Color(0xCC, 0x82, 0x4A));
        assert_eq!(c.to_string(), "#CC824A");
        assert_eq!("ffc879".parse::<Color>(), Ok(Color(0xFF, 0xC8, 0x79)));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
    }

    #[test]
    fn options_from_partial_json() {
        let options: SvgDrawOptions = serde_json::from_str(r##"{ "part_fill": "#000000", "label": false }"##).unwrap();
        assert_eq!(options.part_fill, Color(0, 0, 0));
        assert!(!options.label);
        assert_eq!(options.bin_fill, SvgDrawOptions::default().bin_fill);
    }
}
