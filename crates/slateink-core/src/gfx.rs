//! Graphics-primitive capability required from a stencil's container.
//!
//! A container is anything that can create rectangle, image, and text
//! primitives and adjust their stroke/fill. The render crate's display-list
//! groups implement this; tests use a recording stand-in.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::{SerializableColor, StrokeSpec};

/// Opaque handle to a primitive created by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimId(u64);

impl PrimId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The two well-known primitive slots a stencil manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The visible shape primitive.
    Shape,
    /// The invisible, wider pointer-hit primitive.
    Hit,
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    /// Text grows rightward from the anchor.
    #[default]
    Start,
    Middle,
    /// Text grows leftward from the anchor.
    End,
}

/// Errors raised while rendering a stencil into a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GfxError {
    /// The container has no creator for this primitive kind.
    #[error("container does not support {kind} primitives")]
    Unsupported { kind: &'static str },
    /// The stencil was destroyed; its graphic handles are gone.
    #[error("stencil was destroyed")]
    Destroyed,
}

/// Primitive-creation capability of a rendering group.
///
/// Creation order within a group is back-to-front draw order. Replacing a
/// primitive must remove the old one before creating the new one.
pub trait StencilContainer {
    fn create_rect(&mut self, rect: Rect) -> Result<PrimId, GfxError>;

    fn create_image(&mut self, rect: Rect, src: &str) -> Result<PrimId, GfxError>;

    fn create_text(
        &mut self,
        rect: Rect,
        text: &str,
        align: TextAlign,
    ) -> Result<PrimId, GfxError>;

    fn set_stroke(&mut self, prim: PrimId, stroke: &StrokeSpec);

    fn set_fill(&mut self, prim: PrimId, fill: Option<SerializableColor>);

    /// Detach a primitive. Returns false (no-op) if the handle is unknown.
    fn remove(&mut self, prim: PrimId) -> bool;
}
