//! Reference retained display-list backend.
//!
//! Keeps every group and primitive as plain data, which makes it the
//! test/headless backend and the template for real backends: the same event
//! queue, group, and primitive semantics a GPU or DOM backend must provide.
//! Natural image sizes come from a source registry, decoded bytes, or a
//! base64 data URI.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kurbo::{Affine, Rect};

use slateink_core::gfx::{GfxError, PrimId, StencilContainer, TextAlign};
use slateink_core::style::{SerializableColor, StrokeSpec};

use crate::backend::{
    BackendError, BackendEvent, GfxBackend, GroupId, ScrollOffset, ScrollPolicy,
};

/// Primitive ids are unique across all groups of the process.
static NEXT_PRIM: AtomicU64 = AtomicU64::new(1);

/// The primitive kinds the display list retains.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimKind {
    Rect,
    Image { src: String },
    Text { text: String, align: TextAlign },
}

/// One retained primitive.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub id: PrimId,
    pub kind: PrimKind,
    pub rect: Rect,
    pub stroke: Option<StrokeSpec>,
    pub fill: Option<SerializableColor>,
}

/// One retained rendering group. Primitive order is draw order.
#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    transform: Affine,
    prims: Vec<Primitive>,
}

impl Group {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            transform: Affine::IDENTITY,
            prims: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.prims
    }

    pub fn find(&self, id: PrimId) -> Option<&Primitive> {
        self.prims.iter().find(|p| p.id == id)
    }

    fn push(&mut self, kind: PrimKind, rect: Rect) -> PrimId {
        let id = PrimId::from_raw(NEXT_PRIM.fetch_add(1, Ordering::Relaxed));
        self.prims.push(Primitive {
            id,
            kind,
            rect,
            stroke: None,
            fill: None,
        });
        id
    }
}

impl StencilContainer for Group {
    fn create_rect(&mut self, rect: Rect) -> Result<PrimId, GfxError> {
        Ok(self.push(PrimKind::Rect, rect))
    }

    fn create_image(&mut self, rect: Rect, src: &str) -> Result<PrimId, GfxError> {
        Ok(self.push(
            PrimKind::Image {
                src: src.to_string(),
            },
            rect,
        ))
    }

    fn create_text(
        &mut self,
        rect: Rect,
        text: &str,
        align: TextAlign,
    ) -> Result<PrimId, GfxError> {
        Ok(self.push(
            PrimKind::Text {
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
            p.fill = fill;
        }
    }

    fn remove(&mut self, prim: PrimId) -> bool {
        let before = self.prims.len();
        self.prims.retain(|p| p.id != prim);
        self.prims.len() != before
    }
}

/// Retained display-list backend.
#[derive(Debug, Default)]
pub struct DisplayListBackend {
    surface: Option<(f64, f64)>,
    groups: Vec<Group>,
    next_group: u64,
    events: VecDeque<BackendEvent>,
    /// Known natural sizes by source.
    image_dims: HashMap<String, (f64, f64)>,
    /// Probes waiting on bytes that have not arrived yet.
    pending_probes: Vec<String>,
    scroll: ScrollOffset,
    overflow: Option<(ScrollPolicy, ScrollPolicy)>,
    scrollbar_width: f64,
    /// Number of scrollbar probes performed; callers are expected to memoize.
    pub probe_count: u32,
    fail_surface: bool,
}

impl DisplayListBackend {
    pub fn new() -> Self {
        Self {
            scrollbar_width: 15.0,
            ..Self::default()
        }
    }

    /// Override the simulated scrollbar footprint.
    pub fn with_scrollbar_width(mut self, width: f64) -> Self {
        self.scrollbar_width = width;
        self
    }

    /// Backend whose surface creation always fails.
    pub fn failing_surface() -> Self {
        Self {
            fail_surface: true,
            ..Self::new()
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn overflow(&self) -> Option<(ScrollPolicy, ScrollPolicy)> {
        self.overflow
    }

    /// Register a source's natural size, resolving any waiting probe.
    pub fn insert_image_dimensions(&mut self, src: impl Into<String>, width: f64, height: f64) {
        let src = src.into();
        self.image_dims.insert(src.clone(), (width, height));
        if let Some(pos) = self.pending_probes.iter().position(|p| *p == src) {
            self.pending_probes.remove(pos);
            self.events.push_back(BackendEvent::ImageLoaded {
                src,
                width,
                height,
            });
        }
    }

    /// Decode raw image bytes to learn a source's natural size.
    pub fn load_image_bytes(&mut self, src: impl Into<String>, bytes: &[u8]) {
        let src = src.into();
        match image::load_from_memory(bytes) {
            Ok(img) => {
                self.insert_image_dimensions(src, f64::from(img.width()), f64::from(img.height()));
            }
            Err(e) => {
                log::warn!("failed to decode image bytes for {src:?}: {e}");
                self.fail_probe(&src);
            }
        }
    }

    fn fail_probe(&mut self, src: &str) {
        self.pending_probes.retain(|p| p != src);
        self.events.push_back(BackendEvent::ImageFailed {
            src: src.to_string(),
        });
    }

    fn probe_data_uri(&mut self, src: &str) {
        let Some(bytes) = decode_data_uri(src) else {
            log::warn!("malformed data URI image source");
            self.fail_probe(src);
            return;
        };
        match image::load_from_memory(&bytes) {
            Ok(img) => self.events.push_back(BackendEvent::ImageLoaded {
                src: src.to_string(),
                width: f64::from(img.width()),
                height: f64::from(img.height()),
            }),
            Err(e) => {
                log::warn!("failed to decode data URI image: {e}");
                self.fail_probe(src);
            }
        }
    }
}

impl GfxBackend for DisplayListBackend {
    fn create_surface(&mut self, width: f64, height: f64) -> Result<(), BackendError> {
        if self.fail_surface {
            return Err(BackendError::SurfaceCreation(
                "display list surface unavailable".to_string(),
            ));
        }
        self.surface = Some((width, height));
        self.events.push_back(BackendEvent::SurfaceLoaded);
        Ok(())
    }

    fn set_surface_dimensions(&mut self, width: f64, height: f64) {
        self.surface = Some((width, height));
    }

    fn surface_dimensions(&self) -> Option<(f64, f64)> {
        self.surface
    }

    fn create_group(&mut self) -> GroupId {
        self.next_group += 1;
        let id = GroupId::from_raw(self.next_group);
        self.groups.push(Group::new(id));
        id
    }

    fn set_group_transform(&mut self, group: GroupId, transform: Affine) {
        if let Some(g) = self.groups.iter_mut().find(|g| g.id == group) {
            g.transform = transform;
        }
    }

    fn group_transform(&self, group: GroupId) -> Affine {
        self.group(group)
            .map(|g| g.transform)
            .unwrap_or(Affine::IDENTITY)
    }

    fn container(&mut self, group: GroupId) -> Option<&mut dyn StencilContainer> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group)
            .map(|g| g as &mut dyn StencilContainer)
    }

    fn request_image_size(&mut self, src: &str) {
        if let Some(&(width, height)) = self.image_dims.get(src) {
            self.events.push_back(BackendEvent::ImageLoaded {
                src: src.to_string(),
                width,
                height,
            });
        } else if src.starts_with("data:") {
            self.probe_data_uri(src);
        } else {
            self.pending_probes.push(src.to_string());
        }
    }

    fn measure_scrollbar_width(&mut self) -> f64 {
        // Stands in for rendering a hidden probe element and diffing its
        // content box with and without forced scrolling.
        self.probe_count += 1;
        self.scrollbar_width
    }

    fn set_scroll_position(&mut self, left: f64, top: f64) {
        self.scroll = ScrollOffset { top, left };
    }

    fn scroll_position(&self) -> ScrollOffset {
        self.scroll
    }

    fn set_overflow(&mut self, x: ScrollPolicy, y: ScrollPolicy) {
        self.overflow = Some((x, y));
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        self.events.pop_front()
    }
}

/// Extract the payload bytes of a `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(src: &str) -> Option<Vec<u8>> {
    let rest = src.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    STANDARD.decode(payload.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 transparent PNG.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_surface_load_event() {
        let mut backend = DisplayListBackend::new();
        backend.create_surface(300.0, 200.0).unwrap();
        assert_eq!(backend.poll_event(), Some(BackendEvent::SurfaceLoaded));
        assert_eq!(backend.poll_event(), None);
        assert_eq!(backend.surface_dimensions(), Some((300.0, 200.0)));
    }

    #[test]
    fn test_failing_surface() {
        let mut backend = DisplayListBackend::failing_surface();
        assert!(backend.create_surface(10.0, 10.0).is_err());
    }

    #[test]
    fn test_group_primitives() {
        let mut backend = DisplayListBackend::new();
        let group = backend.create_group();
        let c = backend.container(group).unwrap();
        let rect = Rect::new(0.0, 0.0, 5.0, 5.0);
        let id = c.create_rect(rect).unwrap();
        c.set_stroke(id, &StrokeSpec::default());

        let g = backend.group(group).unwrap();
        assert_eq!(g.primitives().len(), 1);
        assert!(g.find(id).unwrap().stroke.is_some());

        let c = backend.container(group).unwrap();
        assert!(c.remove(id));
        assert!(!c.remove(id));
    }

    #[test]
    fn test_registry_probe_resolves_immediately() {
        let mut backend = DisplayListBackend::new();
        backend.insert_image_dimensions("board.png", 640.0, 480.0);
        backend.request_image_size("board.png");
        assert_eq!(
            backend.poll_event(),
            Some(BackendEvent::ImageLoaded {
                src: "board.png".to_string(),
                width: 640.0,
                height: 480.0,
            })
        );
    }

    #[test]
    fn test_pending_probe_resolves_on_bytes() {
        let mut backend = DisplayListBackend::new();
        backend.request_image_size("late.png");
        assert_eq!(backend.poll_event(), None);

        let bytes = STANDARD.decode(PNG_1X1).unwrap();
        backend.load_image_bytes("late.png", &bytes);
        assert_eq!(
            backend.poll_event(),
            Some(BackendEvent::ImageLoaded {
                src: "late.png".to_string(),
                width: 1.0,
                height: 1.0,
            })
        );
    }

    #[test]
    fn test_data_uri_probe() {
        let mut backend = DisplayListBackend::new();
        let src = format!("data:image/png;base64,{PNG_1X1}");
        backend.request_image_size(&src);
        assert_eq!(
            backend.poll_event(),
            Some(BackendEvent::ImageLoaded {
                src: src.clone(),
                width: 1.0,
                height: 1.0,
            })
        );
    }

    #[test]
    fn test_malformed_data_uri_fails() {
        let mut backend = DisplayListBackend::new();
        backend.request_image_size("data:image/png;base64,@@not-base64@@");
        assert!(matches!(
            backend.poll_event(),
            Some(BackendEvent::ImageFailed { .. })
        ));
    }

    #[test]
    fn test_undecodable_bytes_fail_probe() {
        let mut backend = DisplayListBackend::new();
        backend.request_image_size("bogus.bin");
        backend.load_image_bytes("bogus.bin", &[0u8; 4]);
        assert!(matches!(
            backend.poll_event(),
            Some(BackendEvent::ImageFailed { .. })
        ));
    }
}
