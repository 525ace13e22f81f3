//! Owning stencil container and observer routing.
//!
//! The set stores stencils in insertion order and is the single place
//! transform/destroy notifications are routed from a master stencil to its
//! attached labels — synchronously, within the mutation that triggered them.

use std::collections::HashMap;

use kurbo::Affine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gfx::{GfxError, StencilContainer};
use crate::stencil::{Label, LabelOptions, RenderOutcome, Stencil, StencilId, StencilTrait};

/// Errors from set-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    #[error("unknown stencil {0}")]
    Unknown(StencilId),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// Insertion-ordered stencil storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StencilSet {
    stencils: HashMap<StencilId, Stencil>,
    order: Vec<StencilId>,
}

impl StencilSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stencil. Returns its id.
    pub fn insert(&mut self, stencil: Stencil) -> StencilId {
        let id = stencil.id();
        self.order.push(id);
        self.stencils.insert(id, stencil);
        id
    }

    pub fn get(&self, id: StencilId) -> Option<&Stencil> {
        self.stencils.get(&id)
    }

    pub fn get_mut(&mut self, id: StencilId) -> Option<&mut Stencil> {
        self.stencils.get_mut(&id)
    }

    pub fn contains(&self, id: StencilId) -> bool {
        self.stencils.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    /// Stencils in insertion order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Stencil> {
        self.order.iter().filter_map(|id| self.stencils.get(id))
    }

    /// Attach a label to a master stencil.
    ///
    /// The label is positioned from the master's current bounds and
    /// registered for its transform and destroy notifications. Rendering is
    /// left to the caller.
    pub fn attach_label(
        &mut self,
        master: StencilId,
        opts: LabelOptions,
    ) -> Result<StencilId, SetError> {
        let master_stencil = self
            .stencils
            .get_mut(&master)
            .ok_or(SetError::Unknown(master))?;
        let bounds = master_stencil.bounds();
        let mut label = Label::new(master, bounds, opts);
        let label_id = label.id();
        let transform = master_stencil.base_mut().subs.on_transform(label_id);
        let destroy = master_stencil.base_mut().subs.on_destroy(label_id);
        label.record_subscriptions(transform, destroy);
        self.order.push(label_id);
        self.stencils.insert(label_id, Stencil::Label(label));
        Ok(label_id)
    }

    /// Unregister a label from its master without destroying either.
    pub fn detach_label(&mut self, label_id: StencilId) -> Result<(), SetError> {
        let (master, transform, destroy) = match self.stencils.get_mut(&label_id) {
            Some(Stencil::Label(label)) => {
                let (t, d) = label.take_subscriptions();
                (label.master(), t, d)
            }
            _ => return Err(SetError::Unknown(label_id)),
        };
        if let Some(master_stencil) = self.stencils.get_mut(&master) {
            if let Some(t) = transform {
                master_stencil.base_mut().subs.unsubscribe(t);
            }
            if let Some(d) = destroy {
                master_stencil.base_mut().subs.unsubscribe(d);
            }
        }
        Ok(())
    }

    /// Replace a label's text, reposition it against its master, and render.
    pub fn set_label_text(
        &mut self,
        label_id: StencilId,
        text: &str,
        container: &mut dyn StencilContainer,
    ) -> Result<(), SetError> {
        let master = match self.stencils.get(&label_id) {
            Some(Stencil::Label(label)) => label.master(),
            _ => return Err(SetError::Unknown(label_id)),
        };
        let bounds = self
            .stencils
            .get(&master)
            .ok_or(SetError::Unknown(master))?
            .bounds();
        let Some(Stencil::Label(label)) = self.stencils.get_mut(&label_id) else {
            return Err(SetError::Unknown(label_id));
        };
        label.set_label(bounds, Some(text));
        label.render(container)?;
        Ok(())
    }

    /// Render one stencil into the container.
    pub fn render_stencil(
        &mut self,
        id: StencilId,
        container: &mut dyn StencilContainer,
    ) -> Result<RenderOutcome, SetError> {
        let stencil = self.stencils.get_mut(&id).ok_or(SetError::Unknown(id))?;
        Ok(stencil.render(container)?)
    }

    /// Render every stencil in insertion order. Individual failures are
    /// local: they are logged and do not stop the pass.
    pub fn render_all(&mut self, container: &mut dyn StencilContainer) {
        for id in self.order.clone() {
            if let Some(stencil) = self.stencils.get_mut(&id) {
                if let Err(e) = stencil.render(container) {
                    log::error!("stencil {id} failed to render: {e}");
                }
            }
        }
    }

    /// Apply an affine map to a stencil's points, recover its data, re-render
    /// it, and notify its transform observers.
    pub fn transform(
        &mut self,
        id: StencilId,
        affine: Affine,
        container: &mut dyn StencilContainer,
    ) -> Result<RenderOutcome, SetError> {
        {
            let stencil = self.stencils.get_mut(&id).ok_or(SetError::Unknown(id))?;
            let points = stencil.points().transformed(affine);
            stencil.set_points(points);
            stencil.points_to_data();
        }
        let outcome = self.render_stencil(id, container)?;
        self.notify_transform(id, container);
        Ok(outcome)
    }

    fn notify_transform(&mut self, id: StencilId, container: &mut dyn StencilContainer) {
        let Some(stencil) = self.stencils.get(&id) else {
            return;
        };
        let bounds = stencil.bounds();
        let observers: Vec<StencilId> = stencil.base().subs.transform_observers().collect();
        for observer in observers {
            match self.stencils.get_mut(&observer) {
                Some(Stencil::Label(label)) => {
                    label.set_label(bounds, None);
                    if let Err(e) = label.render(container) {
                        log::error!("label {observer} failed to render: {e}");
                    }
                }
                Some(_) => log::warn!("transform observer {observer} is not a label"),
                None => log::debug!("transform observer {observer} no longer exists"),
            }
        }
    }

    /// Destroy a stencil: release its graphic handles, cascade to its destroy
    /// observers, and remove everything destroyed from the set.
    ///
    /// Returns the removed stencils (the target first), each marked dead so
    /// later renders fail.
    pub fn destroy(
        &mut self,
        id: StencilId,
        container: &mut dyn StencilContainer,
    ) -> Result<Vec<Stencil>, SetError> {
        if !self.stencils.contains_key(&id) {
            return Err(SetError::Unknown(id));
        }
        let mut removed = Vec::new();
        self.destroy_inner(id, container, &mut removed);
        Ok(removed)
    }

    fn destroy_inner(
        &mut self,
        id: StencilId,
        container: &mut dyn StencilContainer,
        removed: &mut Vec<Stencil>,
    ) {
        let Some(mut stencil) = self.stencils.remove(&id) else {
            return;
        };
        self.order.retain(|&other| other != id);

        if let Stencil::Label(label) = &mut stencil {
            let master = label.master();
            let (transform, destroy) = label.take_subscriptions();
            if let Some(master_stencil) = self.stencils.get_mut(&master) {
                if let Some(t) = transform {
                    master_stencil.base_mut().subs.unsubscribe(t);
                }
                if let Some(d) = destroy {
                    master_stencil.base_mut().subs.unsubscribe(d);
                }
            }
        }

        let observers: Vec<StencilId> = stencil.base().subs.destroy_observers().collect();
        stencil.destroy(container);
        removed.push(stencil);
        for observer in observers {
            self.destroy_inner(observer, container, removed);
        }
    }

    /// Serialize the set to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a set from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::Slot;
    use crate::stencil::testutil::RecordingContainer;
    use crate::stencil::{RectData, Rectangle, StencilData};
    use kurbo::Vec2;

    fn rect_set() -> (StencilSet, StencilId) {
        let mut set = StencilSet::new();
        let id = set.insert(Stencil::Rectangle(Rectangle::new(RectData::new(
            0.0, 0.0, 100.0, 50.0,
        ))));
        (set, id)
    }

    #[test]
    fn test_transform_updates_data_and_renders() {
        let (mut set, id) = rect_set();
        let mut c = RecordingContainer::new();
        set.render_stencil(id, &mut c).unwrap();

        set.transform(id, Affine::translate(Vec2::new(10.0, 5.0)), &mut c)
            .unwrap();

        let StencilData::Rect(data) = set.get(id).unwrap().data() else {
            panic!("expected rect data");
        };
        assert!((data.x - 10.0).abs() < f64::EPSILON);
        assert!((data.y - 5.0).abs() < f64::EPSILON);
        assert!((data.width - 100.0).abs() < f64::EPSILON);
        // Still exactly one hit + one shape primitive.
        assert_eq!(c.prims.len(), 2);
    }

    #[test]
    fn test_label_follows_master_transform() {
        let (mut set, master) = rect_set();
        let mut c = RecordingContainer::new();
        let label_id = set
            .attach_label(master, LabelOptions::with_text("block A"))
            .unwrap();
        set.render_all(&mut c);

        set.transform(master, Affine::translate(Vec2::new(20.0, 0.0)), &mut c)
            .unwrap();

        let StencilData::Text(data) = set.get(label_id).unwrap().data() else {
            panic!("expected text data");
        };
        // BR anchor tracks the master's new bottom-right corner.
        assert!((data.x - 120.0).abs() < f64::EPSILON);
        assert_eq!(data.text, "block A");
    }

    #[test]
    fn test_destroy_master_cascades_to_label() {
        let (mut set, master) = rect_set();
        let mut c = RecordingContainer::new();
        let label_id = set
            .attach_label(master, LabelOptions::with_text("doomed"))
            .unwrap();
        set.render_all(&mut c);
        assert_eq!(c.prims.len(), 4);

        let removed = set.destroy(master, &mut c).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(set.is_empty());
        assert!(c.prims.is_empty());

        // No further render of the destroyed label succeeds.
        let mut label = removed
            .into_iter()
            .find(|s| s.id() == label_id)
            .expect("label was cascaded");
        assert_eq!(label.render(&mut c), Err(GfxError::Destroyed));
    }

    #[test]
    fn test_destroyed_label_observer_is_skipped() {
        let (mut set, master) = rect_set();
        let mut c = RecordingContainer::new();
        let label_id = set
            .attach_label(master, LabelOptions::with_text("gone"))
            .unwrap();
        set.destroy(label_id, &mut c).unwrap();

        // Master no longer has observers; transform must not fail.
        set.transform(master, Affine::translate(Vec2::new(1.0, 1.0)), &mut c)
            .unwrap();
        assert!(set.get(master).unwrap().base().subs.is_empty());
    }

    #[test]
    fn test_set_label_text_repositions_and_renders() {
        let (mut set, master) = rect_set();
        let mut c = RecordingContainer::new();
        let label_id = set
            .attach_label(master, LabelOptions::with_text("old"))
            .unwrap();
        set.set_label_text(label_id, "new", &mut c).unwrap();

        assert_eq!(set.get(label_id).unwrap().text_content(), Some("new"));
        let label = set.get(label_id).unwrap();
        assert!(label.base().slot(Slot::Shape).is_some());
    }

    #[test]
    fn test_json_roundtrip() {
        let (mut set, master) = rect_set();
        set.attach_label(master, LabelOptions::with_text("kept"))
            .unwrap();

        let json = set.to_json().unwrap();
        let restored = StencilSet::from_json(&json).unwrap();
        assert_eq!(restored.len(), 2);
        let StencilData::Rect(data) = restored.get(master).unwrap().data() else {
            panic!("expected rect data");
        };
        assert!((data.width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_stencil_errors() {
        let mut set = StencilSet::new();
        let mut c = RecordingContainer::new();
        let bogus = uuid::Uuid::new_v4();
        assert!(matches!(
            set.render_stencil(bogus, &mut c),
            Err(SetError::Unknown(_))
        ));
        assert!(matches!(
            set.attach_label(bogus, LabelOptions::default()),
            Err(SetError::Unknown(_))
        ));
    }
}
