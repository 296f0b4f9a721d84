use std::collections::BTreeMap;

use lazy_static::lazy_static;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Number of series colours the charts cycle through.
pub const PALETTE_SIZE: usize = 15;

lazy_static! {
    static ref SERIES_PALETTE: Vec<String> = generate_palette(PALETTE_SIZE);
}

/// Generates `n` visually distinct colours using evenly spaced hues,
/// as `#rrggbb` strings ready for the chart layer.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hue_to_hex((i as f32 / n as f32) * 360.0))
        .collect()
}

/// Colour of the `index`-th series: `index % PALETTE_SIZE`.
/// Stateless, so a group keeps its colour across re-renders as long as its
/// position in the legend does.
pub fn color_for_index(index: usize) -> String {
    SERIES_PALETTE[index % PALETTE_SIZE].clone()
}

fn hue_to_hex(hue: f32) -> String {
    let hsl: Hsl = Hsl::new(hue, 0.65, 0.5);
    let rgb: Srgb = hsl.into_color();
    let rgb: Srgb<u8> = rgb.into_format();
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: group label → colour
// ---------------------------------------------------------------------------

/// Maps group labels, in the given legend order, to palette colours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    mapping: BTreeMap<String, String>,
}

impl ColorMap {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mapping = groups
            .into_iter()
            .enumerate()
            .map(|(i, g)| (g.into(), color_for_index(i)))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a group.
    pub fn color_for(&self, group: &str) -> Option<&str> {
        self.mapping.get(group).map(String::as_str)
    }

    /// Return the legend entries (group → colour), sorted by group.
    pub fn legend_entries(&self) -> Vec<(String, String)> {
        self.mapping
            .iter()
            .map(|(g, c)| (g.clone(), c.clone()))
            .collect()
    }
}
