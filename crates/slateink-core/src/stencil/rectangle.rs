//! Rectangle stencil.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, Slot, StencilContainer};
use crate::style::StencilStyle;

use super::base::{StencilBase, styled_rect};
use super::{RenderOutcome, StencilData, StencilKind, StencilTrait};

/// Structured geometry of a rectangle stencil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectData {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    base: StencilBase,
    data: RectData,
}

impl Rectangle {
    pub fn new(data: RectData) -> Self {
        Self::with_style(data, StencilStyle::default())
    }

    pub fn with_style(data: RectData, style: StencilStyle) -> Self {
        let mut rect = Self {
            base: StencilBase::new(style),
            data,
        };
        rect.data_to_points();
        rect
    }

    pub fn data(&self) -> &RectData {
        &self.data
    }

    /// Replace the structured geometry and re-derive points.
    ///
    /// Does not render; callers render explicitly so batched edits draw
    /// only once.
    pub fn set_data(&mut self, data: RectData) {
        self.data = data;
        self.data_to_points();
    }
}

impl StencilTrait for Rectangle {
    fn base(&self) -> &StencilBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StencilBase {
        &mut self.base
    }

    fn kind(&self) -> StencilKind {
        StencilKind::Rectangle
    }

    fn data(&self) -> StencilData {
        StencilData::Rect(self.data)
    }

    fn data_to_points(&mut self) -> CornerPoints {
        let points =
            CornerPoints::from_box(self.data.x, self.data.y, self.data.width, self.data.height);
        self.base.points = points;
        points
    }

    fn points_to_data(&mut self) -> StencilData {
        let tl = self.base.points.top_left();
        self.data = RectData {
            x: tl.x,
            y: tl.y,
            width: self.base.points.width(),
            height: self.base.points.height(),
        };
        StencilData::Rect(self.data)
    }

    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError> {
        if self.base.destroyed {
            return Err(GfxError::Destroyed);
        }
        self.on_before_render();

        let rect = self.data.to_rect();
        let hit = self.base.style.hit;
        self.base
            .replace_slot(container, Slot::Hit, |c| styled_rect(c, rect, &hit))?;
        let current = *self.base.active_variant();
        self.base
            .replace_slot(container, Slot::Shape, |c| styled_rect(c, rect, &current))?;
        Ok(RenderOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::testutil::{RecordedKind, RecordingContainer};

    #[test]
    fn test_data_points_roundtrip() {
        let mut rect = Rectangle::new(RectData::new(10.0, 20.0, 100.0, 50.0));
        let original = *rect.data();
        rect.data_to_points();
        let StencilData::Rect(recovered) = rect.points_to_data() else {
            panic!("rectangle produced non-rect data");
        };
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_render_creates_hit_then_shape() {
        let mut rect = Rectangle::new(RectData::new(0.0, 0.0, 40.0, 30.0));
        let mut c = RecordingContainer::new();

        let outcome = rect.render(&mut c).unwrap();
        assert_eq!(outcome, RenderOutcome::Drawn);
        assert_eq!(c.prims.len(), 2);
        // Hit is created first so the visible shape draws above it.
        assert_eq!(c.prims[0].id, rect.base().slot(Slot::Hit).unwrap());
        assert_eq!(c.prims[1].id, rect.base().slot(Slot::Shape).unwrap());
        assert!(c.prims.iter().all(|p| p.kind == RecordedKind::Rect));
        assert!(c.prims[0].stroke.unwrap().color.is_invisible());
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut rect = Rectangle::new(RectData::new(0.0, 0.0, 40.0, 30.0));
        let mut c = RecordingContainer::new();

        rect.render(&mut c).unwrap();
        rect.render(&mut c).unwrap();
        // Re-render replaces the primitives instead of leaking them.
        assert_eq!(c.prims.len(), 2);
        assert_eq!(c.removes, 2);
    }

    #[test]
    fn test_set_data_batches_until_render() {
        let mut rect = Rectangle::new(RectData::new(0.0, 0.0, 10.0, 10.0));
        let mut c = RecordingContainer::new();

        rect.set_data(RectData::new(5.0, 5.0, 20.0, 20.0));
        rect.set_data(RectData::new(7.0, 7.0, 30.0, 30.0));
        assert!(c.prims.is_empty());

        rect.render(&mut c).unwrap();
        // Only the final state is drawn, with exactly one build.
        assert_eq!(c.creates, 2);
        assert_eq!(c.prims[1].rect, Rect::new(7.0, 7.0, 37.0, 37.0));
    }

    #[test]
    fn test_render_after_destroy_fails() {
        let mut rect = Rectangle::new(RectData::new(0.0, 0.0, 10.0, 10.0));
        let mut c = RecordingContainer::new();
        rect.render(&mut c).unwrap();
        rect.destroy(&mut c);

        assert!(c.prims.is_empty());
        assert_eq!(rect.render(&mut c), Err(GfxError::Destroyed));
    }

    #[test]
    fn test_selected_variant() {
        let mut rect = Rectangle::new(RectData::new(0.0, 0.0, 10.0, 10.0));
        let mut c = RecordingContainer::new();
        rect.set_selected(true);
        rect.render(&mut c).unwrap();

        let shape = c.find(rect.base().slot(Slot::Shape).unwrap()).unwrap();
        assert_eq!(
            shape.stroke.unwrap(),
            rect.base().style.selected.stroke
        );
    }
}
