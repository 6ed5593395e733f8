use serde::{Deserialize, Serialize};

use crate::geometry::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortingLayerId(pub u32);

/// Capability interface of an event-routing module: one UI detection pass,
/// optionally tied to a camera, with its own priorities for cross-module
/// overlaps.
pub trait RoutingModule {
    fn module_id(&self) -> ModuleId;
    /// `None` when the module has no associated viewing camera.
    fn camera_depth(&self) -> Option<f32>;
    fn sort_order_priority(&self) -> i32;
    fn render_order_priority(&self) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleProfile {
    pub id: ModuleId,
    pub camera: Option<CameraId>,
    pub camera_depth: Option<f32>,
    pub sort_order_priority: i32,
    pub render_order_priority: i32,
}

impl ModuleProfile {
    pub fn screen_space(id: ModuleId) -> Self {
        Self {
            id,
            camera: None,
            camera_depth: None,
            sort_order_priority: 0,
            render_order_priority: 0,
        }
    }
}

impl RoutingModule for ModuleProfile {
    fn module_id(&self) -> ModuleId {
        self.id
    }

    fn camera_depth(&self) -> Option<f32> {
        self.camera.and(self.camera_depth)
    }

    fn sort_order_priority(&self) -> i32 {
        self.sort_order_priority
    }

    fn render_order_priority(&self) -> i32 {
        self.render_order_priority
    }
}

/// One hit-test result for a screen query, before ordering is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<M> {
    pub entity: EntityId,
    pub module: M,
    pub sorting_layer: SortingLayerId,
    pub sorting_order: i32,
    pub depth: i32,
    pub distance: f32,
    pub index: usize,
}

/// The host UI system as seen by the resolver.
pub trait HitTestHost {
    type Module: RoutingModule;

    /// Every candidate whose interactive bounds contain `point`, in no
    /// particular order. `index` must reflect the discovery order.
    fn raycast_all(&self, point: ScreenPoint) -> Vec<Candidate<Self::Module>>;

    /// False once the entity has been destroyed, even if a stale candidate
    /// still references it.
    fn is_alive(&self, entity: EntityId) -> bool;

    /// Configured ordinal of a sorting layer.
    fn sorting_layer_value(&self, layer: SortingLayerId) -> i32;
}
