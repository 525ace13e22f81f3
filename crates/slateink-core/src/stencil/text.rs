//! Text stencil.

use serde::{Deserialize, Serialize};

use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, Slot, StencilContainer, TextAlign};
use crate::style::StencilStyle;

use super::base::{StencilBase, styled_rect};
use super::{RenderOutcome, StencilData, StencilKind, StencilTrait};

/// Structured geometry of a text stencil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub align: TextAlign,
}

impl TextData {
    pub fn new(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: text.into(),
            align: TextAlign::default(),
        }
    }
}

/// A block of text on the surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    base: StencilBase,
    data: TextData,
}

impl Text {
    pub fn new(data: TextData) -> Self {
        Self::with_style(data, StencilStyle::default())
    }

    pub fn with_style(data: TextData, style: StencilStyle) -> Self {
        let mut text = Self {
            base: StencilBase::new(style),
            data,
        };
        text.data_to_points();
        text
    }

    pub fn data(&self) -> &TextData {
        &self.data
    }

    pub fn text(&self) -> &str {
        &self.data.text
    }

    /// Replace the structured geometry and re-derive points. Does not render.
    pub fn set_data(&mut self, data: TextData) {
        self.data = data;
        self.data_to_points();
    }

    /// Replace only the content, keeping the box.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.data.text = text.into();
    }
}

impl StencilTrait for Text {
    fn base(&self) -> &StencilBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StencilBase {
        &mut self.base
    }

    fn kind(&self) -> StencilKind {
        StencilKind::Text
    }

    fn data(&self) -> StencilData {
        StencilData::Text(self.data.clone())
    }

    fn data_to_points(&mut self) -> CornerPoints {
        let points =
            CornerPoints::from_box(self.data.x, self.data.y, self.data.width, self.data.height);
        self.base.points = points;
        points
    }

    fn points_to_data(&mut self) -> StencilData {
        let tl = self.base.points.top_left();
        self.data.x = tl.x;
        self.data.y = tl.y;
        self.data.width = self.base.points.width();
        self.data.height = self.base.points.height();
        StencilData::Text(self.data.clone())
    }

    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError> {
        if self.base.destroyed {
            return Err(GfxError::Destroyed);
        }
        self.on_before_render();

        let rect = self.base.points.to_rect();
        let hit = self.base.style.hit;
        self.base
            .replace_slot(container, Slot::Hit, |c| styled_rect(c, rect, &hit))?;
        let content = self.data.text.clone();
        let align = self.data.align;
        let color = self.base.style.text.color;
        self.base.replace_slot(container, Slot::Shape, |c| {
            let prim = c.create_text(rect, &content, align)?;
            c.set_fill(prim, Some(color));
            Ok(prim)
        })?;
        Ok(RenderOutcome::Drawn)
    }
}
