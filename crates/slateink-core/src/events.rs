//! Typed observer registration for stencil transform/destroy events.
//!
//! A master stencil records which stencils observe it; the owning
//! [`StencilSet`](crate::set::StencilSet) routes notifications synchronously
//! within the mutation that triggered them. Registration returns a
//! [`Subscription`] handle that can be used to unsubscribe.

use serde::{Deserialize, Serialize};

use crate::stencil::StencilId;

/// The two observable stencil events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The stencil's geometry changed.
    Transform,
    /// The stencil was destroyed.
    Destroy,
}

/// Unsubscribe handle returned by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub event: EventKind,
    id: u64,
}

/// Per-stencil observer lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscriptions {
    next_id: u64,
    transform: Vec<(u64, StencilId)>,
    destroy: Vec<(u64, StencilId)>,
}

impl Subscriptions {
    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Register an observer for transform notifications.
    pub fn on_transform(&mut self, observer: StencilId) -> Subscription {
        let id = self.mint();
        self.transform.push((id, observer));
        Subscription {
            event: EventKind::Transform,
            id,
        }
    }

    /// Register an observer for destroy notifications.
    pub fn on_destroy(&mut self, observer: StencilId) -> Subscription {
        let id = self.mint();
        self.destroy.push((id, observer));
        Subscription {
            event: EventKind::Destroy,
            id,
        }
    }

    /// Remove a registration. No-op if the handle is stale.
    pub fn unsubscribe(&mut self, sub: Subscription) {
        let list = match sub.event {
            EventKind::Transform => &mut self.transform,
            EventKind::Destroy => &mut self.destroy,
        };
        list.retain(|(id, _)| *id != sub.id);
    }

    /// Observers to notify on transform, in registration order.
    pub fn transform_observers(&self) -> impl Iterator<Item = StencilId> + '_ {
        self.transform.iter().map(|(_, observer)| *observer)
    }

    /// Observers to notify on destroy, in registration order.
    pub fn destroy_observers(&self) -> impl Iterator<Item = StencilId> + '_ {
        self.destroy.iter().map(|(_, observer)| *observer)
    }

    pub fn is_empty(&self) -> bool {
        self.transform.is_empty() && self.destroy.is_empty()
    }
}
