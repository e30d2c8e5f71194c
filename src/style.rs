//! Colors, alignment, and resolved font descriptors shared by content actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::writer::font_manager::{base14_name, FontFamily, FontWeight};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// White
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Light grey used for even alternating rows
    pub const LIGHT_GREY: Color = Color::rgb(211, 211, 211);
    /// Orange used for title banners and band rules
    pub const ORANGE: Color = Color::rgb(255, 152, 0);
    /// Purple used for band rules
    pub const PURPLE: Color = Color::rgb(103, 58, 183);
    /// Accent blue
    pub const ACCENT: Color = Color::rgb(0, 153, 204);

    /// Create a color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Composite `self` at `alpha` (0-255) over white.
    pub fn over_white(self, alpha: u8) -> Self {
        let blend = |c: u8| -> u8 {
            let a = alpha as u32;
            ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        Self::rgb(blend(self.r), blend(self.g), blend(self.b))
    }

    /// Components scaled to 0.0-1.0 for content stream operators.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// Horizontal alignment of text and images inside their box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

impl Alignment {
    /// X offset of a run `content_width` wide inside a box `box_width` wide.
    pub fn offset(self, box_width: f32, content_width: f32) -> f32 {
        let free = (box_width - content_width).max(0.0);
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => free / 2.0,
            Alignment::Right => free,
        }
    }
}

/// A font resolved to a base-14 face, with size and color.
///
/// The face is resolved once at construction; share the descriptor between
/// actions through [`SharedFont`].
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    family: FontFamily,
    weight: FontWeight,
    italic: bool,
    size: f32,
    color: Color,
    base_font: &'static str,
}

/// Font descriptor shared by reference across actions.
pub type SharedFont = Arc<FontDescriptor>;

impl FontDescriptor {
    /// Regular black font of the given family and size.
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            weight: FontWeight::Normal,
            italic: false,
            size,
            color: Color::BLACK,
            base_font: base14_name(family, FontWeight::Normal, false),
        }
    }

    /// Helvetica at `size`.
    pub fn helvetica(size: f32) -> Self {
        Self::new(FontFamily::Helvetica, size)
    }

    /// Times at `size`.
    pub fn times(size: f32) -> Self {
        Self::new(FontFamily::Times, size)
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self.base_font = base14_name(self.family, weight, self.italic);
        self
    }

    /// Bold shorthand.
    pub fn bold(self) -> Self {
        self.with_weight(FontWeight::Bold)
    }

    /// Italic shorthand.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self.base_font = base14_name(self.family, self.weight, true);
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the size in points.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Wrap in an [`Arc`] for sharing.
    pub fn shared(self) -> SharedFont {
        Arc::new(self)
    }

    /// Font family.
    pub fn family(&self) -> FontFamily {
        self.family
    }

    /// Font weight.
    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    /// Whether the face is italic/oblique.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Size in points.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Text color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Baseline-to-baseline distance, one and a half times the size.
    pub fn leading(&self) -> f32 {
        self.size * 1.5
    }

    /// Resolved base-14 font name, e.g. `Times-Bold`.
    pub fn base_font(&self) -> &'static str {
        self.base_font
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self::helvetica(12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_resolution() {
        assert_eq!(FontDescriptor::helvetica(12.0).base_font(), "Helvetica");
        assert_eq!(FontDescriptor::times(25.0).bold().base_font(), "Times-Bold");
        assert_eq!(
            FontDescriptor::helvetica(10.0).bold().italic().base_font(),
            "Helvetica-BoldOblique"
        );
        assert_eq!(FontDescriptor::times(9.0).italic().base_font(), "Times-Italic");
    }

    #[test]
    fn test_shared_font_is_same_allocation() {
        let font = FontDescriptor::helvetica(18.0).shared();
        let other = Arc::clone(&font);
        assert!(Arc::ptr_eq(&font, &other));
        assert_eq!(other.size(), 18.0);
    }

    #[test]
    fn test_alignment_offset() {
        assert_eq!(Alignment::Left.offset(100.0, 40.0), 0.0);
        assert_eq!(Alignment::Center.offset(100.0, 40.0), 30.0);
        assert_eq!(Alignment::Right.offset(100.0, 40.0), 60.0);
        // Content wider than the box never goes negative.
        assert_eq!(Alignment::Right.offset(10.0, 40.0), 0.0);
    }

    #[test]
    fn test_over_white() {
        assert_eq!(Color::BLACK.over_white(255), Color::BLACK);
        assert_eq!(Color::BLACK.over_white(0), Color::WHITE);
        assert_eq!(Color::BLACK.over_white(68), Color::rgb(187, 187, 187));
    }

    #[test]
    fn test_to_unit() {
        assert_eq!(Color::WHITE.to_unit(), (1.0, 1.0, 1.0));
        assert_eq!(Color::BLACK.to_unit(), (0.0, 0.0, 0.0));
    }
}
