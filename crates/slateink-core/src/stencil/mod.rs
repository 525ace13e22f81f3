//! Stencil definitions: the shared behavior trait, the common base state,
//! and the closed set of concrete stencil kinds.
//!
//! Behavior composition is resolved at compile time: every concrete stencil
//! embeds a [`StencilBase`] reached through the `base()`/`base_mut()`
//! accessors, inherits the shared behavior from [`StencilTrait`]'s default
//! methods, and overrides the geometry- and render-specific operations. An
//! impl that overrides a default replaces it wholesale.

mod base;
mod image;
mod label;
mod rectangle;
mod text;

pub use base::{StencilBase, styled_rect};
pub use image::{Image, ImageData, ImageSize};
pub use label::{Corner, Label, LabelBox, LabelOptions, LabelPositioner};
pub use rectangle::{RectData, Rectangle};
pub use text::{Text, TextData};

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, StencilContainer};

/// Unique identifier for stencils.
pub type StencilId = Uuid;

/// Closed set of stencil kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StencilKind {
    Rectangle,
    Image,
    Text,
    Label,
}

impl StencilKind {
    /// Discriminator name, stable across serialization boundaries.
    pub fn name(&self) -> &'static str {
        match self {
            StencilKind::Rectangle => "rectangle",
            StencilKind::Image => "image",
            StencilKind::Text => "text",
            StencilKind::Label => "label",
        }
    }
}

/// What a render call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Primitives were (re)built.
    Drawn,
    /// The stencil is waiting on an external resource (image dimensions)
    /// and created no primitives. Not an error.
    Pending,
}

/// Structured geometry snapshot, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StencilData {
    Rect(RectData),
    Image(ImageData),
    Text(TextData),
}

/// Common behavior every stencil shares.
///
/// Required methods are the per-kind customization points; provided methods
/// are the shared base behavior.
pub trait StencilTrait {
    /// Common base state.
    fn base(&self) -> &StencilBase;

    fn base_mut(&mut self) -> &mut StencilBase;

    fn kind(&self) -> StencilKind;

    /// Snapshot of the structured geometry.
    fn data(&self) -> StencilData;

    /// Re-derive the vertex list from the structured data and store it.
    fn data_to_points(&mut self) -> CornerPoints;

    /// Recover the structured data from the vertex list (canonical diagonal:
    /// corners 0 and 2) and store it.
    fn points_to_data(&mut self) -> StencilData;

    /// Rebuild the underlying primitives from current data and style.
    ///
    /// Idempotent: stale primitives are removed before new ones are created.
    /// Fails once the stencil is destroyed.
    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError>;

    fn id(&self) -> StencilId {
        self.base().id
    }

    fn points(&self) -> CornerPoints {
        self.base().points
    }

    /// Replace the vertex list; callers follow with `points_to_data` and an
    /// explicit render.
    fn set_points(&mut self, points: CornerPoints) {
        self.base_mut().points = points;
    }

    /// Bounding box in surface coordinates.
    fn bounds(&self) -> Rect {
        self.base().points.to_rect()
    }

    fn is_destroyed(&self) -> bool {
        self.base().destroyed
    }

    /// Toggle the selected style variant. Takes effect on the next render.
    fn set_selected(&mut self, selected: bool) {
        self.base_mut().selected = selected;
    }

    /// Hook invoked at the start of every render.
    fn on_before_render(&mut self) {}

    /// Release all graphic handles and mark the stencil dead. Further
    /// renders fail with [`GfxError::Destroyed`].
    fn destroy(&mut self, container: &mut dyn StencilContainer) {
        self.base_mut().release_slots(container);
        self.base_mut().destroyed = true;
    }
}

/// Enum wrapper over the closed stencil set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stencil {
    Rectangle(Rectangle),
    Image(Image),
    Text(Text),
    Label(Label),
}

impl Stencil {
    /// Build a stencil from tagged data with the default style.
    ///
    /// Labels are not built this way: they need a master and go through
    /// [`StencilSet::attach_label`](crate::set::StencilSet::attach_label).
    pub fn from_data(data: StencilData) -> Self {
        match data {
            StencilData::Rect(d) => Stencil::Rectangle(Rectangle::new(d)),
            StencilData::Image(d) => Stencil::Image(Image::new(d)),
            StencilData::Text(d) => Stencil::Text(Text::new(d)),
        }
    }

    /// Rendered text content, for stencils that carry any.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            Stencil::Text(t) => Some(t.text()),
            Stencil::Label(l) => Some(l.text()),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Stencil::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Stencil::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Stencil::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_label_mut(&mut self) -> Option<&mut Label> {
        match self {
            Stencil::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl StencilTrait for Stencil {
    fn base(&self) -> &StencilBase {
        match self {
            Stencil::Rectangle(s) => s.base(),
            Stencil::Image(s) => s.base(),
            Stencil::Text(s) => s.base(),
            Stencil::Label(s) => s.base(),
        }
    }

    fn base_mut(&mut self) -> &mut StencilBase {
        match self {
            Stencil::Rectangle(s) => s.base_mut(),
            Stencil::Image(s) => s.base_mut(),
            Stencil::Text(s) => s.base_mut(),
            Stencil::Label(s) => s.base_mut(),
        }
    }

    fn kind(&self) -> StencilKind {
        match self {
            Stencil::Rectangle(s) => s.kind(),
            Stencil::Image(s) => s.kind(),
            Stencil::Text(s) => s.kind(),
            Stencil::Label(s) => s.kind(),
        }
    }

    fn data(&self) -> StencilData {
        match self {
            Stencil::Rectangle(s) => StencilTrait::data(s),
            Stencil::Image(s) => StencilTrait::data(s),
            Stencil::Text(s) => StencilTrait::data(s),
            Stencil::Label(s) => StencilTrait::data(s),
        }
    }

    fn data_to_points(&mut self) -> CornerPoints {
        match self {
            Stencil::Rectangle(s) => s.data_to_points(),
            Stencil::Image(s) => s.data_to_points(),
            Stencil::Text(s) => s.data_to_points(),
            Stencil::Label(s) => s.data_to_points(),
        }
    }

    fn points_to_data(&mut self) -> StencilData {
        match self {
            Stencil::Rectangle(s) => s.points_to_data(),
            Stencil::Image(s) => s.points_to_data(),
            Stencil::Text(s) => s.points_to_data(),
            Stencil::Label(s) => s.points_to_data(),
        }
    }

    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError> {
        match self {
            Stencil::Rectangle(s) => s.render(container),
            Stencil::Image(s) => s.render(container),
            Stencil::Text(s) => s.render(container),
            Stencil::Label(s) => s.render(container),
        }
    }
}


#[cfg(test)]
pub(crate) mod testutil {
    //! Recording container used by stencil tests.

    use kurbo::Rect;

    use crate::gfx::{GfxError, PrimId, StencilContainer, TextAlign};
    use crate::style::{SerializableColor, StrokeSpec};

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedKind {
        Rect,
        Image(String),
        Text { text: String, align: TextAlign },
    }

    #[derive(Debug, Clone)]
    pub struct RecordedPrim {
        pub id: PrimId,
        pub kind: RecordedKind,
        pub rect: Rect,
        pub stroke: Option<StrokeSpec>,
        pub fill: Option<Option<SerializableColor>>,
    }

    #[derive(Debug, Default)]
    pub struct RecordingContainer {
        next: u64,
        pub prims: Vec<RecordedPrim>,
        pub creates: usize,
        pub removes: usize,
        pub images_unsupported: bool,
    }

    impl RecordingContainer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn without_image_support() -> Self {
            Self {
                images_unsupported: true,
                ..Self::default()
            }
        }

        pub fn find(&self, id: PrimId) -> Option<&RecordedPrim> {
            self.prims.iter().find(|p| p.id == id)
        }

        fn push(&mut self, kind: RecordedKind, rect: Rect) -> PrimId {
            self.next += 1;
            self.creates += 1;
            let id = PrimId::from_raw(self.next);
            self.prims.push(RecordedPrim {
                id,
                kind,
                rect,
                stroke: None,
                fill: None,
            });
            id
        }
    }

    impl StencilContainer for RecordingContainer {
        fn create_rect(&mut self, rect: Rect) -> Result<PrimId, GfxError> {
            Ok(self.push(RecordedKind::Rect, rect))
        }

        fn create_image(&mut self, rect: Rect, src: &str) -> Result<PrimId, GfxError> {
            if self.images_unsupported {
                return Err(GfxError::Unsupported { kind: "image" });
            }
            Ok(self.push(RecordedKind::Image(src.to_string()), rect))
        }

        fn create_text(
            &mut self,
            rect: Rect,
            text: &str,
            align: TextAlign,
        ) -> Result<PrimId, GfxError> {
            Ok(self.push(
                RecordedKind::Text {
                    text: text.to_string(),
                    align,
                },
                rect,
            ))
        }

        fn set_stroke(&mut self, prim: PrimId, stroke: &StrokeSpec) {
            if let Some(p) = self.prims.iter_mut().find(|p| p.id == prim) {
                p.stroke = Some(*stroke);
            }
        }

        fn set_fill(&mut self, prim: PrimId, fill: Option<SerializableColor>) {
            if let Some(p) = self.prims.iter_mut().find(|p| p.id == prim) {
                p.fill = Some(fill);
            }
        }

        fn remove(&mut self, prim: PrimId) -> bool {
            let before = self.prims.len();
            self.prims.retain(|p| p.id != prim);
            let removed = self.prims.len() != before;
            if removed {
                self.removes += 1;
            }
            removed
        }
    }
}
