//! Font management for PDF generation.
//!
//! Provides base-14 font metrics for text measurement and line wrapping.
//! Widths are the standard AFM advance widths for printable ASCII in units
//! of 1/1000 em; characters outside that range measure 500.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Font family classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Helvetica (sans-serif)
    Helvetica,
    /// Times (serif)
    Times,
    /// Courier (monospace)
    Courier,
}

/// Font weight classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontWeight {
    /// Normal weight
    #[default]
    Normal,
    /// Bold weight
    Bold,
}

/// Base-14 font name for a family/weight/style combination.
pub fn base14_name(family: FontFamily, weight: FontWeight, italic: bool) -> &'static str {
    match (family, weight, italic) {
        (FontFamily::Helvetica, FontWeight::Normal, false) => "Helvetica",
        (FontFamily::Helvetica, FontWeight::Bold, false) => "Helvetica-Bold",
        (FontFamily::Helvetica, FontWeight::Normal, true) => "Helvetica-Oblique",
        (FontFamily::Helvetica, FontWeight::Bold, true) => "Helvetica-BoldOblique",
        (FontFamily::Times, FontWeight::Normal, false) => "Times-Roman",
        (FontFamily::Times, FontWeight::Bold, false) => "Times-Bold",
        (FontFamily::Times, FontWeight::Normal, true) => "Times-Italic",
        (FontFamily::Times, FontWeight::Bold, true) => "Times-BoldItalic",
        (FontFamily::Courier, FontWeight::Normal, false) => "Courier",
        (FontFamily::Courier, FontWeight::Bold, false) => "Courier-Bold",
        (FontFamily::Courier, FontWeight::Normal, true) => "Courier-Oblique",
        (FontFamily::Courier, FontWeight::Bold, true) => "Courier-BoldOblique",
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

/// Font width data.
#[derive(Debug, Clone, Copy)]
enum FontWidths {
    /// Per-character widths for printable ASCII
    Proportional(&'static [u16; 95]),
    /// Fixed advance
    Monospace(u16),
}

impl FontWidths {
    fn width_for_char(&self, ch: char) -> f32 {
        match self {
            FontWidths::Monospace(w) => *w as f32,
            FontWidths::Proportional(table) => {
                let code = ch as u32;
                if (0x20..=0x7E).contains(&code) {
                    table[(code - 0x20) as usize] as f32
                } else {
                    500.0
                }
            },
        }
    }
}

/// Metrics for one base-14 face.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// Font name (e.g., "Helvetica-Bold")
    pub name: &'static str,
    widths: FontWidths,
    /// Ascender height (above baseline)
    pub ascender: f32,
    /// Descender depth (below baseline, negative)
    pub descender: f32,
}

impl FontInfo {
    /// Width of `text` in points at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.widths.width_for_char(c)).sum();
        units * font_size / 1000.0
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascent(&self, font_size: f32) -> f32 {
        self.ascender * font_size / 1000.0
    }

    /// Natural line height (ascender to descender) at `font_size`.
    pub fn line_height(&self, font_size: f32) -> f32 {
        (self.ascender - self.descender) * font_size / 1000.0
    }
}

/// Base-14 font registry used for measuring text.
#[derive(Debug, Clone)]
pub struct FontManager {
    fonts: HashMap<&'static str, FontInfo>,
}

impl FontManager {
    /// Create a manager with every base-14 text face registered.
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        let mut register = |name: &'static str, widths: FontWidths, asc: f32, desc: f32| {
            fonts.insert(
                name,
                FontInfo {
                    name,
                    widths,
                    ascender: asc,
                    descender: desc,
                },
            );
        };

        for name in ["Helvetica", "Helvetica-Oblique"] {
            register(name, FontWidths::Proportional(&HELVETICA), 718.0, -207.0);
        }
        for name in ["Helvetica-Bold", "Helvetica-BoldOblique"] {
            register(name, FontWidths::Proportional(&HELVETICA_BOLD), 718.0, -207.0);
        }
        for name in ["Times-Roman", "Times-Italic"] {
            register(name, FontWidths::Proportional(&TIMES_ROMAN), 683.0, -217.0);
        }
        for name in ["Times-Bold", "Times-BoldItalic"] {
            register(name, FontWidths::Proportional(&TIMES_BOLD), 676.0, -205.0);
        }
        for name in ["Courier", "Courier-Oblique"] {
            register(name, FontWidths::Monospace(600), 629.0, -157.0);
        }
        for name in ["Courier-Bold", "Courier-BoldOblique"] {
            register(name, FontWidths::Monospace(600), 626.0, -142.0);
        }

        Self { fonts }
    }

    /// Font info by base-14 name.
    pub fn get_font(&self, name: &str) -> Option<&FontInfo> {
        self.fonts.get(name)
    }

    /// Font info, falling back to Helvetica metrics for unknown names.
    pub fn get_font_or_default(&self, name: &str) -> &FontInfo {
        self.fonts
            .get(name)
            .or_else(|| self.fonts.get("Helvetica"))
            .unwrap_or(&FALLBACK)
    }

    /// Width of `text` in points.
    pub fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32 {
        self.get_font_or_default(font_name)
            .text_width(text, font_size)
    }

    /// Greedy word wrap of `text` to `max_width` points.
    ///
    /// Explicit newlines always break. A single word wider than the line is
    /// kept whole on its own line. Always returns at least one line.
    pub fn wrap_text(
        &self,
        text: &str,
        font_name: &str,
        font_size: f32,
        max_width: f32,
    ) -> Vec<String> {
        let font = self.get_font_or_default(font_name);
        let space = font.text_width(" ", font_size);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0;

            for word in paragraph.split_whitespace() {
                let word_width = font.text_width(word, font_size);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_width;
                } else if current_width + space + word_width <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space + word_width;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_width;
                }
            }
            lines.push(current);
        }

        // "\n" alone yields two empty lines; a blank paragraph is one line.
        if lines.iter().all(|l| l.is_empty()) {
            lines.truncate(1);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

static FALLBACK: FontInfo = FontInfo {
    name: "Helvetica",
    widths: FontWidths::Proportional(&HELVETICA),
    ascender: 718.0,
    descender: -207.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_faces_registered() {
        let fm = FontManager::new();
        for family in [FontFamily::Helvetica, FontFamily::Times, FontFamily::Courier] {
            for weight in [FontWeight::Normal, FontWeight::Bold] {
                for italic in [false, true] {
                    let name = base14_name(family, weight, italic);
                    assert!(fm.get_font(name).is_some(), "{} missing", name);
                }
            }
        }
    }

    #[test]
    fn test_text_width() {
        let fm = FontManager::new();
        // H(722) + i(222) = 944 units
        let w = fm.text_width("Hi", "Helvetica", 10.0);
        assert!((w - 9.44).abs() < 1e-4);
        // Courier is monospace
        assert_eq!(fm.text_width("iiii", "Courier", 10.0), fm.text_width("MMMM", "Courier", 10.0));
        // Bold is wider than regular
        assert!(fm.text_width("Receipt", "Times-Bold", 12.0) > fm.text_width("Receipt", "Times-Roman", 12.0));
    }

    #[test]
    fn test_unknown_font_uses_helvetica() {
        let fm = FontManager::new();
        assert_eq!(
            fm.text_width("Total", "NoSuchFont", 12.0),
            fm.text_width("Total", "Helvetica", 12.0)
        );
    }

    #[test]
    fn test_wrap_text() {
        let fm = FontManager::new();
        let lines = fm.wrap_text("Aadhaar Enabled Payment System", "Helvetica", 12.0, 100.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(!line.is_empty());
        }
        assert_eq!(lines.join(" "), "Aadhaar Enabled Payment System");
    }

    #[test]
    fn test_wrap_blank_text_is_one_line() {
        let fm = FontManager::new();
        assert_eq!(fm.wrap_text("", "Helvetica", 12.0, 100.0), vec![String::new()]);
        assert_eq!(fm.wrap_text("\n", "Helvetica", 12.0, 100.0), vec![String::new()]);
    }

    #[test]
    fn test_wrap_keeps_long_word() {
        let fm = FontManager::new();
        let lines = fm.wrap_text("Supercalifragilistic", "Helvetica", 12.0, 20.0);
        assert_eq!(lines, vec!["Supercalifragilistic".to_string()]);
    }

    #[test]
    fn test_line_metrics() {
        let fm = FontManager::new();
        let info = fm.get_font("Helvetica").unwrap();
        assert!((info.ascent(10.0) - 7.18).abs() < 1e-4);
        assert!((info.line_height(10.0) - 9.25).abs() < 1e-4);
    }
}
