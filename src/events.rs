//! Change notifications emitted by a composition.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::foundation::core::ImageId;

/// Something observable happened to a composition.
#[derive(Clone, Debug, PartialEq)]
pub enum MorphEvent {
    /// An image's raster resolved.
    Load { image: ImageId },
    /// An image's raster failed to resolve; it renders as if its weight were 0.
    LoadError { image: ImageId, message: String },
    ImageAdd { image: ImageId, index: usize },
    ImageRemove { image: ImageId, index: usize },
    /// An image's placement offset changed.
    ImageMove { image: ImageId },
    PointAdd { index: usize },
    PointRemove { index: usize, triangles_removed: usize },
    /// One image's point moved; other meshes are untouched.
    PointMove { image: ImageId, index: usize },
    TriangleAdd { index: usize },
    TriangleRemove { index: usize },
    EdgeSplit { a: usize, b: usize, point: usize },
    /// Weights changed.
    Change,
    /// A frame was composited and presented.
    Draw,
    /// A tween started.
    Start,
    /// A tween advanced; `t` is the linear elapsed fraction.
    Progress { t: f64 },
    /// A tween reached its target.
    Complete,
    /// A running tween was replaced or stopped before completing.
    Cancel,
    Dispose,
}

impl MorphEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::LoadError { .. } => "load:error",
            Self::ImageAdd { .. } => "image:add",
            Self::ImageRemove { .. } => "image:remove",
            Self::ImageMove { .. } => "image:move",
            Self::PointAdd { .. } => "point:add",
            Self::PointRemove { .. } => "point:remove",
            Self::PointMove { .. } => "point:move",
            Self::TriangleAdd { .. } => "triangle:add",
            Self::TriangleRemove { .. } => "triangle:remove",
            Self::EdgeSplit { .. } => "edge:split",
            Self::Change => "change",
            Self::Draw => "draw",
            Self::Start => "start",
            Self::Progress { .. } => "progress",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Dispose => "dispose",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&MorphEvent)>;

/// Ordered listener registry. Delivery follows registration order; a panicking listener is
/// logged and does not stop delivery to the ones after it.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&MorphEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn emit(&mut self, event: &MorphEvent) {
        for (id, listener) in &mut self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(listener = id.0, event = event.name(), "event listener panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/events/bus.rs"]
mod tests;
