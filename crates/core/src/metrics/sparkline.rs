use std::fmt;

/// Maximum number of values a sparkline covers.
pub const WINDOW: usize = 10;

/// Eight-level glyph alphabet, lowest (blank) to highest (full block).
pub const GLYPHS: [char; 8] = [' ', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One quantized sparkline cell, `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Glyph(u8);

impl Glyph {
    pub fn level(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        GLYPHS[usize::from(self.0)]
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Min-max quantize `values` into glyphs, keeping their order.
///
/// Callers pass the window most-recent-first; only the first [`WINDOW`]
/// values are used. When every value is equal the range is taken as 1, so
/// the whole window maps to the lowest glyph.
pub fn sparkline(values: &[f64]) -> Vec<Glyph> {
    let window = &values[..values.len().min(WINDOW)];
    if window.is_empty() {
        return Vec::new();
    }

    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    let top = (GLYPHS.len() - 1) as f64;

    window
        .iter()
        .map(|v| {
            let index = ((v - min) / range * top).floor().clamp(0.0, top);
            Glyph(index as u8)
        })
        .collect()
}

/// Render glyphs as a string.
pub fn render(glyphs: &[Glyph]) -> String {
    glyphs.iter().map(|g| g.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(values: &[f64]) -> Vec<u8> {
        sparkline(values).into_iter().map(Glyph::level).collect()
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(sparkline(&[]).is_empty());
        assert_eq!(render(&sparkline(&[])), "");
    }

    #[test]
    fn quantizes_with_floor() {
        assert_eq!(levels(&[0.0, 50.0, 100.0]), vec![0, 3, 7]);
        assert_eq!(render(&sparkline(&[0.0, 50.0, 100.0])), " ▄█");
    }

    #[test]
    fn flat_window_maps_to_lowest_glyph() {
        assert_eq!(levels(&[5.0, 5.0, 5.0]), vec![0, 0, 0]);
        assert_eq!(levels(&[0.0, 0.0]), vec![0, 0]);
        assert_eq!(levels(&[42.0]), vec![0]);
    }

    #[test]
    fn keeps_input_order() {
        // Most-recent-first input is not reversed.
        assert_eq!(levels(&[100.0, 0.0, 50.0]), vec![7, 0, 3]);
    }

    #[test]
    fn window_is_bounded() {
        let values: Vec<f64> = (0..25).map(f64::from).collect();
        let glyphs = sparkline(&values);
        assert_eq!(glyphs.len(), WINDOW);
        assert_eq!(glyphs.first().map(|g| g.level()), Some(0));
        assert_eq!(glyphs.last().map(|g| g.level()), Some(7));
    }

    #[test]
    fn health_like_values() {
        // A narrow band still spans the full alphabet.
        assert_eq!(levels(&[91.0, 90.75, 90.5, 89.0]), vec![7, 6, 5, 0]);
    }
}
