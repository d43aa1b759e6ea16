// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text layout — width estimation, greedy word-wrap, and centering.
//
// Widths come from a `GlyphMetrics` implementation. The default heuristic
// charges a fixed fraction of the font size per character, which is good
// enough for single-column, ragged-right Helvetica text.

/// Per-character advance width capability.
pub trait GlyphMetrics {
    /// Advance width of `ch` at `font_size`, in points.
    fn width_of(&self, ch: char, font_size: f64) -> f64;
}

/// Constant-per-character width estimate.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicMetrics {
    /// Fraction of the font size charged per character.
    pub factor: f64,
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        // Average Helvetica glyph width is roughly half the font size.
        Self { factor: 0.5 }
    }
}

impl GlyphMetrics for HeuristicMetrics {
    fn width_of(&self, _ch: char, font_size: f64) -> f64 {
        font_size * self.factor
    }
}

/// Measures and wraps text with a given set of glyph metrics.
#[derive(Debug, Clone, Default)]
pub struct TextLayout<M = HeuristicMetrics> {
    metrics: M,
}

impl<M: GlyphMetrics> TextLayout<M> {
    pub fn new(metrics: M) -> Self {
        Self { metrics }
    }

    /// Estimated rendered width of `text` at `font_size`.
    pub fn estimate_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars()
            .map(|ch| self.metrics.width_of(ch, font_size))
            .sum()
    }

    /// Greedy word-wrap into lines no wider than `max_width`.
    ///
    /// Runs of whitespace (including newlines) collapse to single spaces.
    /// Words are never split, so a single word wider than `max_width` gets a
    /// line of its own.
    pub fn wrap(&self, text: &str, font_size: f64, max_width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate_width = self.estimate_width(&current, font_size)
                + self.metrics.width_of(' ', font_size)
                + self.estimate_width(word, font_size);

            if candidate_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// X offset that centers `text` horizontally on a page `page_width` wide.
    pub fn center(&self, text: &str, font_size: f64, page_width: f64) -> f64 {
        (page_width - self.estimate_width(text, font_size)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "El día martes acudí a la oficina de atención al ciudadano \
        para realizar un trámite y tuve que esperar más de tres horas sin que nadie \
        me informara sobre el estado de mi solicitud ni el motivo de la demora.";

    #[test]
    fn width_is_chars_times_half_size() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        assert_eq!(layout.estimate_width("abcd", 10.0), 20.0);
        // Characters, not bytes.
        assert_eq!(layout.estimate_width("ñandú", 12.0), 30.0);
    }

    #[test]
    fn wrapped_lines_fit_max_width() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        for max_width in [60.0, 95.5, 150.0, 300.0, 495.28] {
            let lines = layout.wrap(PARAGRAPH, 12.0, max_width);
            assert!(!lines.is_empty());
            for line in &lines {
                let single_word = !line.contains(' ');
                assert!(
                    layout.estimate_width(line, 12.0) <= max_width || single_word,
                    "line {line:?} exceeds {max_width}"
                );
            }
            // Nothing lost or reordered.
            let rejoined = lines.join(" ");
            let original: Vec<&str> = PARAGRAPH.split_whitespace().collect();
            assert_eq!(rejoined.split(' ').collect::<Vec<_>>(), original);
        }
    }

    #[test]
    fn long_word_is_never_split() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        let lines = layout.wrap("ver https://tusistema.com/feedback/COP-00001 ahora", 12.0, 60.0);
        assert_eq!(
            lines,
            vec!["ver", "https://tusistema.com/feedback/COP-00001", "ahora"]
        );
    }

    #[test]
    fn whitespace_collapses() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        let lines = layout.wrap("  uno\n\n dos\ttres  ", 10.0, 1000.0);
        assert_eq!(lines, vec!["uno dos tres"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        assert!(layout.wrap("   \n ", 12.0, 100.0).is_empty());
    }

    #[test]
    fn exact_fit_stays_on_one_line() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        // "ab cd" is 5 chars * 5pt = 25pt
        assert_eq!(layout.wrap("ab cd", 10.0, 25.0), vec!["ab cd"]);
        assert_eq!(layout.wrap("ab cd", 10.0, 24.9), vec!["ab", "cd"]);
    }

    #[test]
    fn center_splits_remaining_space() {
        let layout = TextLayout::<HeuristicMetrics>::default();
        assert_eq!(layout.center("abcd", 10.0, 100.0), 40.0);
    }

    #[test]
    fn custom_metrics_plug_in() {
        struct Monospace;
        impl GlyphMetrics for Monospace {
            fn width_of(&self, _ch: char, font_size: f64) -> f64 {
                font_size * 0.6
            }
        }
        let layout = TextLayout::new(Monospace);
        assert!((layout.estimate_width("abcde", 10.0) - 30.0).abs() < 1e-9);
    }
}
