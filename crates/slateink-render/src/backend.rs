//! Graphics backend abstraction.
//!
//! Implementations own the real drawing surface (GPU scene, SVG DOM, test
//! display list) and expose it through groups whose primitives stencils
//! manage via [`StencilContainer`]. Surface creation and image probing are
//! asynchronous: completion arrives through the event queue drained by
//! [`poll_event`](GfxBackend::poll_event).

use kurbo::Affine;
use slateink_core::gfx::StencilContainer;
use thiserror::Error;

/// Opaque handle to a rendering group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u64);

impl GroupId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Completion notifications delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// The surface requested by `create_surface` is loaded.
    SurfaceLoaded,
    /// A natural-size probe resolved.
    ImageLoaded {
        src: String,
        width: f64,
        height: f64,
    },
    /// A natural-size probe failed.
    ImageFailed { src: String },
}

/// Backend failures. Surface creation failure is fatal to the canvas that
/// requested it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),
}

/// Per-axis viewport scrollbar policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPolicy {
    Scroll,
    Hidden,
}

/// Scroll position of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

/// Capability contract between the render-surface manager and a graphics
/// backend.
pub trait GfxBackend {
    /// Begin asynchronous surface creation. Completion arrives as
    /// [`BackendEvent::SurfaceLoaded`].
    fn create_surface(&mut self, width: f64, height: f64) -> Result<(), BackendError>;

    fn set_surface_dimensions(&mut self, width: f64, height: f64);

    fn surface_dimensions(&self) -> Option<(f64, f64)>;

    /// Create a rendering group. Creation order is back-to-front draw order.
    fn create_group(&mut self) -> GroupId;

    fn set_group_transform(&mut self, group: GroupId, transform: Affine);

    fn group_transform(&self, group: GroupId) -> Affine;

    /// Primitive-creation view of a group.
    fn container(&mut self, group: GroupId) -> Option<&mut dyn StencilContainer>;

    /// Fire-and-forget natural-size probe for an image source. Resolution
    /// arrives as [`BackendEvent::ImageLoaded`] or
    /// [`BackendEvent::ImageFailed`].
    fn request_image_size(&mut self, src: &str);

    /// Measure the scrollbar footprint of the embedding viewport. Expensive
    /// relative to its stability; callers memoize the result.
    fn measure_scrollbar_width(&mut self) -> f64;

    fn set_scroll_position(&mut self, left: f64, top: f64);

    fn scroll_position(&self) -> ScrollOffset;

    fn set_overflow(&mut self, x: ScrollPolicy, y: ScrollPolicy);

    /// Drain one pending completion event, if any.
    fn poll_event(&mut self) -> Option<BackendEvent>;
}
