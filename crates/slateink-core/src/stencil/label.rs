//! Label annotation: a text stencil bound to a master stencil.
//!
//! A label never repositions itself; its geometry is recomputed from the
//! master's current bounds every time the owning set routes a transform
//! notification, and the label is destroyed when its master is.

use std::fmt;
use std::sync::Arc;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::events::Subscription;
use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, StencilContainer, TextAlign};
use crate::style::StencilStyle;

use super::base::StencilBase;
use super::text::{Text, TextData};
use super::{RenderOutcome, StencilData, StencilId, StencilKind, StencilTrait};

/// Corner of the master's bounds a label anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Corner {
    TL,
    TR,
    #[default]
    BR,
    BL,
}

impl Corner {
    pub fn is_bottom(&self) -> bool {
        matches!(self, Corner::BR | Corner::BL)
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Corner::TR | Corner::BR)
    }
}

/// Box computed by a custom positioner. `None` extents fall back to the
/// text style's min-width / line-height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Custom label placement, delegated the full box computation.
pub trait LabelPositioner: Send + Sync {
    fn position(&self, master_bounds: Rect) -> LabelBox;
}

impl<F> LabelPositioner for F
where
    F: Fn(Rect) -> LabelBox + Send + Sync,
{
    fn position(&self, master_bounds: Rect) -> LabelBox {
        self(master_bounds)
    }
}

/// Options for attaching a label to a master stencil.
#[derive(Default)]
pub struct LabelOptions {
    pub text: String,
    pub anchor: Corner,
    /// When set, corner-anchor placement is bypassed entirely.
    pub positioner: Option<Arc<dyn LabelPositioner>>,
    /// Style override; defaults to the master's style.
    pub style: Option<StencilStyle>,
}

impl LabelOptions {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A text annotation tracking a master stencil.
#[derive(Clone, Serialize, Deserialize)]
pub struct Label {
    text: Text,
    master: StencilId,
    anchor: Corner,
    #[serde(skip)]
    positioner: Option<Arc<dyn LabelPositioner>>,
    /// Width recorded at the last fresh layout; present once positioned.
    label_width: Option<f64>,
    /// Content at the last layout, for the width-cache staleness check.
    last_text: Option<String>,
    transform_sub: Option<Subscription>,
    destroy_sub: Option<Subscription>,
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Label")
            .field("text", &self.text)
            .field("master", &self.master)
            .field("anchor", &self.anchor)
            .field("custom_positioner", &self.positioner.is_some())
            .field("label_width", &self.label_width)
            .field("last_text", &self.last_text)
            .finish()
    }
}

impl Label {
    /// Build a label bound to `master`, positioned from its current bounds.
    pub fn new(master: StencilId, master_bounds: Rect, opts: LabelOptions) -> Self {
        let style = opts.style.unwrap_or_default();
        let text = Text::with_style(TextData::new(0.0, 0.0, 0.0, 0.0, ""), style);
        let mut label = Self {
            text,
            master,
            anchor: opts.anchor,
            positioner: opts.positioner,
            label_width: None,
            last_text: None,
            transform_sub: None,
            destroy_sub: None,
        };
        label.set_label(master_bounds, Some(&opts.text));
        label
    }

    pub fn master(&self) -> StencilId {
        self.master
    }

    pub fn anchor(&self) -> Corner {
        self.anchor
    }

    pub fn text(&self) -> &str {
        self.text.text()
    }

    pub(crate) fn record_subscriptions(&mut self, transform: Subscription, destroy: Subscription) {
        self.transform_sub = Some(transform);
        self.destroy_sub = Some(destroy);
    }

    pub(crate) fn take_subscriptions(&mut self) -> (Option<Subscription>, Option<Subscription>) {
        (self.transform_sub.take(), self.destroy_sub.take())
    }

    /// Recompute geometry from the master's bounds and optionally replace the
    /// content. `None` means "no new text, just reposition" (the transform
    /// notification path). Does not render.
    pub fn set_label(&mut self, master_bounds: Rect, text: Option<&str>) {
        if let Some(positioner) = self.positioner.clone() {
            self.set_label_custom(positioner.as_ref(), master_bounds, text);
            return;
        }

        let ts = self.text.base().style.text;
        let line_height = ts.line_height();

        let y = if self.anchor.is_bottom() {
            master_bounds.y1 - line_height
        } else {
            master_bounds.y0
        };
        let (x, align) = if self.anchor.is_right() {
            (master_bounds.x1, TextAlign::Start)
        } else {
            // Text grows leftward from a left-corner anchor.
            (master_bounds.x0, TextAlign::End)
        };

        // Reuse the box from the previous layout unless this is the first
        // layout or the text actually changed; identical re-renders keep
        // identical dimensions.
        let text_is_new = match text {
            Some(t) => self.last_text.as_deref() != Some(t),
            None => false,
        };
        let (width, height) = if self.label_width.is_none() || text_is_new {
            self.label_width = Some(ts.min_width);
            (ts.min_width, line_height)
        } else {
            (self.text.data().width, self.text.data().height)
        };

        let content = text.unwrap_or_else(|| self.text.text()).to_string();
        self.text.set_data(TextData {
            x,
            y,
            width,
            height,
            text: content,
            align,
        });
        if let Some(t) = text {
            self.last_text = Some(t.to_string());
        }
    }

    fn set_label_custom(
        &mut self,
        positioner: &dyn LabelPositioner,
        master_bounds: Rect,
        text: Option<&str>,
    ) {
        let ts = self.text.base().style.text;
        let b = positioner.position(master_bounds);
        let align = self.text.data().align;
        let content = text.unwrap_or_else(|| self.text.text()).to_string();
        self.text.set_data(TextData {
            x: b.x,
            y: b.y,
            width: b.width.unwrap_or(ts.min_width),
            height: b.height.unwrap_or_else(|| ts.line_height()),
            text: content,
            align,
        });
        if let Some(t) = text {
            self.last_text = Some(t.to_string());
        }
    }
}

impl StencilTrait for Label {
    fn base(&self) -> &StencilBase {
        self.text.base()
    }

    fn base_mut(&mut self) -> &mut StencilBase {
        self.text.base_mut()
    }

    fn kind(&self) -> StencilKind {
        StencilKind::Label
    }

    fn data(&self) -> StencilData {
        StencilData::Text(self.text.data().clone())
    }

    fn data_to_points(&mut self) -> CornerPoints {
        self.text.data_to_points()
    }

    fn points_to_data(&mut self) -> StencilData {
        self.text.points_to_data()
    }

    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError> {
        self.text.render(container)
    }
}
