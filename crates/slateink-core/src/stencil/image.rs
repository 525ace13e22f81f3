//! Image stencil.
//!
//! An image may be created with `ImageSize::Auto`, in which case rendering
//! suspends until the natural dimensions arrive from the backend loader and
//! resumes with a second, concrete render.

use serde::{Deserialize, Serialize};

use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, Slot, StencilContainer};
use crate::style::StencilStyle;

use super::base::{StencilBase, styled_rect};
use super::{RenderOutcome, StencilData, StencilKind, StencilTrait};

/// Display extents of an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImageSize {
    /// Use the image's natural dimensions once they are known.
    Auto,
    Fixed { width: f64, height: f64 },
}

/// Structured geometry of an image stencil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub x: f64,
    pub y: f64,
    /// Image source reference (URL or data URI).
    pub src: String,
    pub size: ImageSize,
}

impl ImageData {
    pub fn new(x: f64, y: f64, src: impl Into<String>, size: ImageSize) -> Self {
        Self {
            x,
            y,
            src: src.into(),
            size,
        }
    }
}

/// A raster image placed on the surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    base: StencilBase,
    data: ImageData,
    /// True while a render is suspended on the natural dimensions.
    #[serde(skip)]
    awaiting_size: bool,
}

impl Image {
    pub fn new(data: ImageData) -> Self {
        Self::with_style(data, StencilStyle::default())
    }

    pub fn with_style(data: ImageData, style: StencilStyle) -> Self {
        let mut image = Self {
            base: StencilBase::new(style),
            data,
            awaiting_size: false,
        };
        image.data_to_points();
        image
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    pub fn src(&self) -> &str {
        &self.data.src
    }

    pub fn is_awaiting_size(&self) -> bool {
        self.awaiting_size
    }

    /// Replace the structured geometry and re-derive points. Does not render.
    pub fn set_data(&mut self, data: ImageData) {
        self.data = data;
        self.data_to_points();
    }

    /// Deliver the natural dimensions a suspended render was waiting for.
    ///
    /// Returns true when the caller should re-invoke `render`. A delivery
    /// arriving after the stencil was destroyed is a silent no-op.
    pub fn resolve_natural_size(&mut self, width: f64, height: f64) -> bool {
        if self.base.destroyed {
            log::debug!(
                "natural size for {:?} arrived after destroy; ignoring",
                self.data.src
            );
            return false;
        }
        self.data.size = ImageSize::Fixed { width, height };
        self.awaiting_size = false;
        self.data_to_points();
        true
    }
}

impl StencilTrait for Image {
    fn base(&self) -> &StencilBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StencilBase {
        &mut self.base
    }

    fn kind(&self) -> StencilKind {
        StencilKind::Image
    }

    fn data(&self) -> StencilData {
        StencilData::Image(self.data.clone())
    }

    fn data_to_points(&mut self) -> CornerPoints {
        let points = match self.data.size {
            ImageSize::Fixed { width, height } => {
                CornerPoints::from_box(self.data.x, self.data.y, width, height)
            }
            // Extents unknown until the natural size resolves.
            ImageSize::Auto => CornerPoints::collapsed(self.data.x, self.data.y),
        };
        self.base.points = points;
        points
    }

    fn points_to_data(&mut self) -> StencilData {
        let tl = self.base.points.top_left();
        // Points carry no source reference, so src rides along out-of-band.
        let size = match self.data.size {
            ImageSize::Auto => ImageSize::Auto,
            ImageSize::Fixed { .. } => ImageSize::Fixed {
                width: self.base.points.width(),
                height: self.base.points.height(),
            },
        };
        self.data.x = tl.x;
        self.data.y = tl.y;
        self.data.size = size;
        StencilData::Image(self.data.clone())
    }

    fn render(&mut self, container: &mut dyn StencilContainer) -> Result<RenderOutcome, GfxError> {
        if self.base.destroyed {
            return Err(GfxError::Destroyed);
        }
        let ImageSize::Fixed { .. } = self.data.size else {
            // Suspend until the loader reports the natural dimensions.
            self.awaiting_size = true;
            return Ok(RenderOutcome::Pending);
        };
        self.on_before_render();

        let rect = self.base.points.to_rect();
        let hit = self.base.style.hit;
        self.base
            .replace_slot(container, Slot::Hit, |c| styled_rect(c, rect, &hit))?;
        let src = self.data.src.clone();
        self.base
            .replace_slot(container, Slot::Shape, |c| c.create_image(rect, &src))?;
        Ok(RenderOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::testutil::{RecordedKind, RecordingContainer};

    #[test]
    fn test_auto_size_suspends_render() {
        let mut img = Image::new(ImageData::new(5.0, 5.0, "sketch.png", ImageSize::Auto));
        let mut c = RecordingContainer::new();

        assert_eq!(img.render(&mut c), Ok(RenderOutcome::Pending));
        assert!(img.is_awaiting_size());
        assert!(c.prims.is_empty());
    }

    #[test]
    fn test_resolve_then_render_once() {
        let mut img = Image::new(ImageData::new(5.0, 5.0, "sketch.png", ImageSize::Auto));
        let mut c = RecordingContainer::new();
        img.render(&mut c).unwrap();

        assert!(img.resolve_natural_size(64.0, 32.0));
        assert_eq!(img.render(&mut c), Ok(RenderOutcome::Drawn));

        assert_eq!(c.creates, 2); // hit + image, exactly one build
        let shape = c.find(img.base().slot(Slot::Shape).unwrap()).unwrap();
        assert_eq!(shape.kind, RecordedKind::Image("sketch.png".to_string()));
        assert_eq!(shape.rect, kurbo::Rect::new(5.0, 5.0, 69.0, 37.0));
    }

    #[test]
    fn test_resolve_after_destroy_is_noop() {
        let mut img = Image::new(ImageData::new(0.0, 0.0, "gone.png", ImageSize::Auto));
        let mut c = RecordingContainer::new();
        img.render(&mut c).unwrap();
        img.destroy(&mut c);

        assert!(!img.resolve_natural_size(10.0, 10.0));
        assert_eq!(img.render(&mut c), Err(GfxError::Destroyed));
    }

    #[test]
    fn test_points_to_data_preserves_src() {
        let mut img = Image::new(ImageData::new(
            1.0,
            2.0,
            "kept.png",
            ImageSize::Fixed {
                width: 10.0,
                height: 20.0,
            },
        ));
        img.data_to_points();
        let StencilData::Image(data) = img.points_to_data() else {
            panic!("image produced non-image data");
        };
        assert_eq!(data.src, "kept.png");
        assert_eq!(
            data.size,
            ImageSize::Fixed {
                width: 10.0,
                height: 20.0
            }
        );
    }

    #[test]
    fn test_unsupported_container_fails_fast() {
        let mut img = Image::new(ImageData::new(
            0.0,
            0.0,
            "nope.png",
            ImageSize::Fixed {
                width: 8.0,
                height: 8.0,
            },
        ));
        let mut c = RecordingContainer::without_image_support();
        assert_eq!(
            img.render(&mut c),
            Err(GfxError::Unsupported { kind: "image" })
        );
    }
}
