//! SlateInk Core Library
//!
//! Backend-agnostic stencil data model for the SlateInk annotation canvas:
//! the data/points geometry duality, stencil behaviors, label annotations,
//! and the owning stencil set with typed observer routing.

pub mod events;
pub mod geometry;
pub mod gfx;
pub mod set;
pub mod stencil;
pub mod style;
pub mod word_tip;

pub use events::{EventKind, Subscription, Subscriptions};
pub use geometry::CornerPoints;
pub use gfx::{GfxError, PrimId, Slot, StencilContainer, TextAlign};
pub use set::{SetError, StencilSet};
pub use stencil::{
    Corner, Image, ImageData, ImageSize, Label, LabelBox, LabelOptions, LabelPositioner,
    RectData, Rectangle, RenderOutcome, Stencil, StencilData, StencilId, StencilKind,
    StencilTrait, Text, TextData,
};
pub use style::{
    LineStyle, SerializableColor, StencilStyle, StrokeSpec, StyleVariant, TextStyle, VariantStyle,
};
pub use word_tip::{SuggestionList, TipCategory, TipRequest};
