//! Render-surface manager.
//!
//! Owns the backend surface, the viewport dimensions, scroll and zoom state,
//! and the three ordered rendering groups (underlay, surface, overlay).
//! Surface creation is asynchronous: readiness requires the backend's loaded
//! event plus a settle delay, guarding against backends that report loaded
//! before they are interactive. No stencil can be attached until then.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kurbo::Affine;
use thiserror::Error;
use uuid::Uuid;

use slateink_core::gfx::GfxError;
use slateink_core::set::{SetError, StencilSet};
use slateink_core::stencil::{
    LabelOptions, RenderOutcome, Stencil, StencilId, StencilTrait,
};

use crate::backend::{
    BackendError, BackendEvent, GfxBackend, GroupId, ScrollOffset, ScrollPolicy,
};

/// Default settle delay between the backend's loaded signal and readiness.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Construction options for a [`Canvas`].
#[derive(Debug, Clone)]
pub struct CanvasOptions {
    /// Content-box width of the embedding viewport.
    pub parent_width: f64,
    /// Content-box height of the embedding viewport.
    pub parent_height: f64,
    /// Whether the viewport may show scrollbars at all.
    pub use_scrollbars: bool,
    /// Viewport node id; generated when absent.
    pub id: Option<String>,
    pub settle_delay: Duration,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            parent_width: 800.0,
            parent_height: 600.0,
            use_scrollbars: true,
            id: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Callback fired exactly once when the surface becomes ready, with the
/// viewport node id.
pub type ReadyCallback = Box<dyn FnOnce(&str)>;

/// Canvas failures.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("surface is not ready")]
    SurfaceNotReady,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Set(#[from] SetError),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// The three ordered rendering groups, back to front.
#[derive(Debug, Clone, Copy)]
struct Groups {
    underlay: GroupId,
    surface: GroupId,
    overlay: GroupId,
}

#[derive(Debug, Clone, Copy)]
enum SurfaceState {
    Pending { loaded_at: Option<Instant> },
    Ready(Groups),
}

/// The render-surface manager.
pub struct Canvas<B: GfxBackend> {
    backend: B,
    state: SurfaceState,
    stencils: StencilSet,
    /// Image stencils suspended on a natural-size probe, by source.
    pending_images: HashMap<String, Vec<StencilId>>,
    width: f64,
    height: f64,
    parent_width: f64,
    parent_height: f64,
    zoom: f64,
    use_scrollbars: bool,
    settle_delay: Duration,
    id: String,
    ready_cb: Option<ReadyCallback>,
    scrollbar_width: Option<f64>,
}

impl<B: GfxBackend> Canvas<B> {
    /// Construct the canvas and request asynchronous surface creation.
    ///
    /// Surface creation failure is fatal to this canvas instance.
    pub fn new(backend: B, opts: CanvasOptions) -> Result<Self, CanvasError> {
        Self::with_callback(backend, opts, None)
    }

    pub fn with_callback(
        mut backend: B,
        opts: CanvasOptions,
        callback: Option<ReadyCallback>,
    ) -> Result<Self, CanvasError> {
        let id = opts
            .id
            .unwrap_or_else(|| format!("surface-{}", Uuid::new_v4().as_simple()));
        backend.create_surface(opts.parent_width, opts.parent_height)?;
        Ok(Self {
            backend,
            state: SurfaceState::Pending { loaded_at: None },
            stencils: StencilSet::new(),
            pending_images: HashMap::new(),
            width: opts.parent_width,
            height: opts.parent_height,
            parent_width: opts.parent_width,
            parent_height: opts.parent_height,
            zoom: 1.0,
            use_scrollbars: opts.use_scrollbars,
            settle_delay: opts.settle_delay,
            id,
            ready_cb: callback,
            scrollbar_width: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SurfaceState::Ready(_))
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn parent_width(&self) -> f64 {
        self.parent_width
    }

    pub fn parent_height(&self) -> f64 {
        self.parent_height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stencils(&self) -> &StencilSet {
        &self.stencils
    }

    /// The (underlay, surface, overlay) groups once ready.
    pub fn groups(&self) -> Option<(GroupId, GroupId, GroupId)> {
        match self.state {
            SurfaceState::Ready(g) => Some((g.underlay, g.surface, g.overlay)),
            SurfaceState::Pending { .. } => None,
        }
    }

    /// Drain backend events and advance the readiness state machine.
    pub fn pump(&mut self) {
        while let Some(event) = self.backend.poll_event() {
            match event {
                BackendEvent::SurfaceLoaded => {
                    if let SurfaceState::Pending { loaded_at } = &mut self.state {
                        *loaded_at = Some(Instant::now());
                    }
                }
                BackendEvent::ImageLoaded { src, width, height } => {
                    self.deliver_image_size(&src, width, height);
                }
                BackendEvent::ImageFailed { src } => {
                    self.pending_images.remove(&src);
                    log::warn!("image {src:?} failed to load");
                }
            }
        }
        self.try_promote();
    }

    fn try_promote(&mut self) {
        let SurfaceState::Pending {
            loaded_at: Some(at),
        } = self.state
        else {
            return;
        };
        if at.elapsed() < self.settle_delay {
            return;
        }
        let underlay = self.backend.create_group();
        let surface = self.backend.create_group();
        let overlay = self.backend.create_group();
        self.backend.set_group_transform(surface, Affine::IDENTITY);
        self.state = SurfaceState::Ready(Groups {
            underlay,
            surface,
            overlay,
        });
        log::debug!("surface {} ready", self.id);
        if let Some(cb) = self.ready_cb.take() {
            cb(&self.id);
        }
    }

    fn deliver_image_size(&mut self, src: &str, width: f64, height: f64) {
        let ids = self.pending_images.remove(src).unwrap_or_default();
        let SurfaceState::Ready(groups) = self.state else {
            return;
        };
        for id in ids {
            match self.stencils.get_mut(id) {
                Some(Stencil::Image(img)) if !img.is_destroyed() => {
                    if img.resolve_natural_size(width, height) {
                        if let Some(c) = self.backend.container(groups.surface) {
                            if let Err(e) = img.render(c) {
                                log::error!("image {id} failed to render: {e}");
                            }
                        }
                    }
                }
                _ => {
                    // Continuation fired after its owner went away.
                    log::debug!("natural size for {src:?} has no live owner; ignoring");
                }
            }
        }
    }

    fn ready_groups(&self) -> Result<Groups, CanvasError> {
        match self.state {
            SurfaceState::Ready(groups) => Ok(groups),
            SurfaceState::Pending { .. } => Err(CanvasError::SurfaceNotReady),
        }
    }

    /// Add a stencil to the surface group and render it.
    ///
    /// Rejected while the surface is pending: no stencil exists before the
    /// surface is ready.
    pub fn attach(&mut self, stencil: Stencil) -> Result<StencilId, CanvasError> {
        let groups = self.ready_groups()?;
        let id = self.stencils.insert(stencil);
        let Some(container) = self.backend.container(groups.surface) else {
            return Err(CanvasError::SurfaceNotReady);
        };
        let outcome = self.stencils.render_stencil(id, container)?;
        if outcome == RenderOutcome::Pending {
            if let Some(src) = self
                .stencils
                .get(id)
                .and_then(|s| s.as_image())
                .map(|img| img.src().to_string())
            {
                self.pending_images.entry(src.clone()).or_default().push(id);
                self.backend.request_image_size(&src);
            }
        }
        Ok(id)
    }

    /// Attach a label to a master stencil and render it.
    pub fn attach_label(
        &mut self,
        master: StencilId,
        opts: LabelOptions,
    ) -> Result<StencilId, CanvasError> {
        let groups = self.ready_groups()?;
        let label_id = self.stencils.attach_label(master, opts)?;
        let Some(container) = self.backend.container(groups.surface) else {
            return Err(CanvasError::SurfaceNotReady);
        };
        self.stencils.render_stencil(label_id, container)?;
        Ok(label_id)
    }

    /// Transform a stencil; its labels follow synchronously.
    pub fn transform_stencil(&mut self, id: StencilId, affine: Affine) -> Result<(), CanvasError> {
        let groups = self.ready_groups()?;
        let Some(container) = self.backend.container(groups.surface) else {
            return Err(CanvasError::SurfaceNotReady);
        };
        self.stencils.transform(id, affine, container)?;
        Ok(())
    }

    /// Replace a label's text and re-render it.
    pub fn set_label_text(&mut self, label_id: StencilId, text: &str) -> Result<(), CanvasError> {
        let groups = self.ready_groups()?;
        let Some(container) = self.backend.container(groups.surface) else {
            return Err(CanvasError::SurfaceNotReady);
        };
        self.stencils.set_label_text(label_id, text, container)?;
        Ok(())
    }

    /// Destroy a stencil (cascading to its labels). Returns the removed,
    /// dead stencils.
    pub fn destroy_stencil(&mut self, id: StencilId) -> Result<Vec<Stencil>, CanvasError> {
        let groups = self.ready_groups()?;
        let Some(container) = self.backend.container(groups.surface) else {
            return Err(CanvasError::SurfaceNotReady);
        };
        Ok(self.stencils.destroy(id, container)?)
    }

    /// Change the viewport size. The surface follows, never shrinking below
    /// the visible viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.parent_width = width;
        self.parent_height = height;
        self.set_dimensions(width, height, None);
    }

    /// Change the surface size to fit content, optionally setting scroll.
    ///
    /// Surface dimensions are the max of the request and the viewport; when
    /// one axis overflows, the other loses the scrollbar footprint so the
    /// scrollbar itself does not force a second scrollbar.
    pub fn set_dimensions(&mut self, width: f64, height: f64, scroll: Option<(f64, f64)>) {
        let sw = self.get_scroll_width();
        self.width = width.max(self.parent_width);
        self.height = height.max(self.parent_height);
        if self.height > self.parent_height {
            self.width = (self.width - sw).max(self.parent_width);
        }
        if self.width > self.parent_width {
            self.height = (self.height - sw).max(self.parent_height);
        }

        self.backend.set_surface_dimensions(self.width, self.height);

        let (scroll_x, scroll_y) = scroll.unwrap_or((0.0, 0.0));
        self.backend.set_scroll_position(scroll_x, scroll_y);

        let (overflow_x, overflow_y) = if self.use_scrollbars {
            (
                if self.width > self.parent_width {
                    ScrollPolicy::Scroll
                } else {
                    ScrollPolicy::Hidden
                },
                if self.height > self.parent_height {
                    ScrollPolicy::Scroll
                } else {
                    ScrollPolicy::Hidden
                },
            )
        } else {
            (ScrollPolicy::Hidden, ScrollPolicy::Hidden)
        };
        self.backend.set_overflow(overflow_x, overflow_y);
    }

    /// Apply a uniform scale to the surface group only; underlay and overlay
    /// stay unscaled so they can host fixed-scale chrome.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), CanvasError> {
        let groups = self.ready_groups()?;
        self.zoom = zoom;
        self.backend
            .set_group_transform(groups.surface, Affine::scale(zoom));
        Ok(())
    }

    pub fn get_scroll_offset(&self) -> ScrollOffset {
        self.backend.scroll_position()
    }

    /// Scrollbar footprint of the embedding viewport, measured lazily once
    /// and memoized for the lifetime of this canvas.
    pub fn get_scroll_width(&mut self) -> f64 {
        if let Some(width) = self.scrollbar_width {
            return width;
        }
        let width = self.backend.measure_scrollbar_width();
        self.scrollbar_width = Some(width);
        width
    }
}
