//! Common per-stencil state and slot management.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::Subscriptions;
use crate::geometry::CornerPoints;
use crate::gfx::{GfxError, PrimId, Slot, StencilContainer};
use crate::style::{StencilStyle, VariantStyle};

use super::StencilId;

/// The graphic handles a stencil manages, one per well-known slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slots {
    shape: Option<PrimId>,
    hit: Option<PrimId>,
}

impl Slots {
    fn get(&self, slot: Slot) -> Option<PrimId> {
        match slot {
            Slot::Shape => self.shape,
            Slot::Hit => self.hit,
        }
    }

    fn set(&mut self, slot: Slot, prim: Option<PrimId>) {
        match slot {
            Slot::Shape => self.shape = prim,
            Slot::Hit => self.hit = prim,
        }
    }
}

/// State shared by every stencil kind.
///
/// Concrete stencils embed one of these and expose it through the
/// `base()`/`base_mut()` accessors of
/// [`StencilTrait`](super::StencilTrait).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StencilBase {
    pub id: StencilId,
    pub style: StencilStyle,
    pub points: CornerPoints,
    /// Observers of this stencil's transform/destroy events.
    pub subs: Subscriptions,
    #[serde(skip)]
    pub selected: bool,
    #[serde(skip)]
    pub destroyed: bool,
    #[serde(skip)]
    pub slots: Slots,
}

impl StencilBase {
    pub fn new(style: StencilStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            style,
            points: CornerPoints::collapsed(0.0, 0.0),
            subs: Subscriptions::default(),
            selected: false,
            destroyed: false,
            slots: Slots::default(),
        }
    }

    /// The variant the visible shape primitive should use right now.
    pub fn active_variant(&self) -> &VariantStyle {
        if self.selected {
            &self.style.selected
        } else {
            &self.style.norm
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<PrimId> {
        self.slots.get(slot)
    }

    /// Replace the primitive occupying a slot.
    ///
    /// The old primitive is removed before the new one is created, never the
    /// reverse. On creation failure the slot is left empty.
    pub fn replace_slot(
        &mut self,
        container: &mut dyn StencilContainer,
        slot: Slot,
        create: impl FnOnce(&mut dyn StencilContainer) -> Result<PrimId, GfxError>,
    ) -> Result<PrimId, GfxError> {
        if let Some(old) = self.slots.get(slot) {
            container.remove(old);
            self.slots.set(slot, None);
        }
        let prim = create(container)?;
        self.slots.set(slot, Some(prim));
        Ok(prim)
    }

    /// Detach every primitive this stencil owns.
    pub fn release_slots(&mut self, container: &mut dyn StencilContainer) {
        for slot in [Slot::Shape, Slot::Hit] {
            if let Some(prim) = self.slots.get(slot) {
                container.remove(prim);
                self.slots.set(slot, None);
            }
        }
    }
}

/// Create a rect primitive and apply a variant's stroke and fill.
pub fn styled_rect(
    container: &mut dyn StencilContainer,
    rect: Rect,
    style: &VariantStyle,
) -> Result<PrimId, GfxError> {
    let prim = container.create_rect(rect)?;
    container.set_stroke(prim, &style.stroke);
    container.set_fill(prim, style.fill);
    Ok(prim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::testutil::RecordingContainer;
    use crate::style::StencilStyle;

    #[test]
    fn test_replace_slot_removes_before_create() {
        let mut base = StencilBase::new(StencilStyle::default());
        let mut c = RecordingContainer::new();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        let first = base
            .replace_slot(&mut c, Slot::Shape, |c| c.create_rect(rect))
            .unwrap();
        let second = base
            .replace_slot(&mut c, Slot::Shape, |c| c.create_rect(rect))
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(base.slot(Slot::Shape), Some(second));
        // The stale primitive is gone from the container.
        assert!(c.find(first).is_none());
        assert_eq!(c.prims.len(), 1);
    }

    #[test]
    fn test_release_slots_is_idempotent() {
        let mut base = StencilBase::new(StencilStyle::default());
        let mut c = RecordingContainer::new();
        base.replace_slot(&mut c, Slot::Hit, |c| {
            c.create_rect(Rect::new(0.0, 0.0, 1.0, 1.0))
        })
        .unwrap();

        base.release_slots(&mut c);
        assert!(c.prims.is_empty());
        assert_eq!(base.slot(Slot::Hit), None);

        // Second release finds nothing to remove.
        base.release_slots(&mut c);
        assert_eq!(c.removes, 1);
    }
}
