//! Style definitions for stencils.
//!
//! Every stencil carries a [`StencilStyle`]: named variants for the normal,
//! selected, and hit-test renditions of the shape, plus the text defaults
//! labels rely on.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Fully transparent colors draw nothing visible.
    pub fn is_invisible(&self) -> bool {
        self.a == 0
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Line style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Stroke specification applied to a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSpec {
    pub color: SerializableColor,
    pub width: f64,
    pub style: LineStyle,
}

impl Default for StrokeSpec {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 2.0,
            style: LineStyle::Solid,
        }
    }
}

/// One named rendition of a stencil: stroke plus optional fill.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantStyle {
    pub stroke: StrokeSpec,
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
}

/// Text defaults used by text stencils and labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f64,
    /// Minimum text box width, used before a real width is known.
    pub min_width: f64,
    pub color: SerializableColor,
}

impl TextStyle {
    /// Line height derived from the font size.
    pub fn line_height(&self) -> f64 {
        self.size * 1.2
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 20.0,
            min_width: 100.0,
            color: SerializableColor::black(),
        }
    }
}

/// Which named variant a render should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleVariant {
    Norm,
    Selected,
    Hit,
}

/// The full style bundle a stencil carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StencilStyle {
    /// Normal rendition.
    pub norm: VariantStyle,
    /// Rendition while the stencil is the current selection.
    pub selected: VariantStyle,
    /// Invisible, wider rendition used purely for pointer-hit testing.
    pub hit: VariantStyle,
    /// Text defaults.
    pub text: TextStyle,
}

impl StencilStyle {
    pub fn variant(&self, variant: StyleVariant) -> &VariantStyle {
        match variant {
            StyleVariant::Norm => &self.norm,
            StyleVariant::Selected => &self.selected,
            StyleVariant::Hit => &self.hit,
        }
    }
}

impl Default for StencilStyle {
    fn default() -> Self {
        let norm = VariantStyle {
            stroke: StrokeSpec::default(),
            fill: None,
        };
        let selected = VariantStyle {
            stroke: StrokeSpec {
                color: SerializableColor::new(59, 130, 246, 255),
                width: 2.0,
                style: LineStyle::Solid,
            },
            fill: None,
        };
        // The hit region is invisible and wider than the visible stroke so
        // pointer tests have a forgiving target.
        let hit = VariantStyle {
            stroke: StrokeSpec {
                color: SerializableColor::transparent(),
                width: 8.0,
                style: LineStyle::Solid,
            },
            fill: Some(SerializableColor::transparent()),
        };
        Self {
            norm,
            selected,
            hit,
            text: TextStyle::default(),
        }
    }
}
