use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::events::{FakeInputEvent, HandlerSet, PointerEventKind};
use crate::geometry::{Bounds3, ScreenPoint, ScreenRect, ViewCamera, Viewport};
use crate::handlers::{execute_hierarchy, HandlerTree};
use crate::hit::{
    resolve_topmost, CameraId, Candidate, EntityId, HitTestHost, ModuleId, ModuleProfile,
    SortingLayerId,
};
use crate::lookup::{SceneQuery, ScreenInfo};
use crate::task::{Tick, TickHost};

pub const DEFAULT_SCENE_NAME: &str = "Main";
pub const DEFAULT_SORTING_LAYER_NAME: &str = "Default";
const MAX_HIERARCHY_DEPTH: usize = 1024;

/// Where an element can be hit and how it stacks against other hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRegion {
    pub rect: ScreenRect,
    pub module: ModuleId,
    pub sorting_layer: SortingLayerId,
    pub sorting_order: i32,
    pub depth: i32,
    pub distance: f32,
}

impl HitRegion {
    pub fn new(rect: ScreenRect, module: ModuleId) -> Self {
        Self {
            rect,
            module,
            sorting_layer: SortingLayerId::default(),
            sorting_order: 0,
            depth: 0,
            distance: 0.0,
        }
    }

    pub fn with_sorting(mut self, layer: SortingLayerId, order: i32) -> Self {
        self.sorting_layer = layer;
        self.sorting_order = order;
        self
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDesc {
    pub camera: Option<CameraId>,
    pub sort_order_priority: i32,
    pub render_order_priority: i32,
}

/// Everything needed to spawn one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDesc {
    pub name: String,
    pub scene: String,
    pub parent: Option<EntityId>,
    pub active: bool,
    pub kinds: Vec<String>,
    pub hit: Option<HitRegion>,
    pub bounds: Option<Bounds3>,
    pub handlers: HandlerSet,
}

impl ElementDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scene: DEFAULT_SCENE_NAME.to_string(),
            parent: None,
            active: true,
            kinds: Vec::new(),
            hit: None,
            bounds: None,
            handlers: HandlerSet::empty(),
        }
    }

    pub fn in_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = scene.into();
        self
    }

    pub fn child_of(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.push(kind.into());
        self
    }

    pub fn with_hit(mut self, hit: HitRegion) -> Self {
        self.hit = Some(hit);
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds3) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerSet) -> Self {
        self.handlers = handlers;
        self
    }
}

#[derive(Debug, Clone)]
pub struct UiElement {
    pub id: EntityId,
    pub name: String,
    pub scene: String,
    pub parent: Option<EntityId>,
    pub active: bool,
    pub kinds: Vec<String>,
    pub hit: Option<HitRegion>,
    pub bounds: Option<Bounds3>,
    pub handlers: HandlerSet,
    applied_spawn_order: u64,
}

/// One handler invocation, stamped with the tick it ran on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub entity: EntityId,
    pub kind: PointerEventKind,
    pub tick: u64,
    pub position: ScreenPoint,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// In-memory UI host: elements, cameras, routing modules and sorting layers.
///
/// Spawns and despawns are deferred until [`UiScene::apply_pending`], which
/// also runs at the start of every tick. A despawned entity is dead right
/// away but its hit region keeps answering raycasts until then.
#[derive(Debug)]
pub struct UiScene {
    allocator: EntityIdAllocator,
    elements: Vec<UiElement>,
    pending_spawns: Vec<UiElement>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    cameras: Vec<ViewCamera>,
    main_camera: Option<CameraId>,
    modules: Vec<ModuleDesc>,
    sorting_layers: Vec<(String, i32)>,
    viewport: Viewport,
    testing_mode: bool,
    max_handler_depth: usize,
    current_tick: u64,
    dispatch_log: Vec<DispatchRecord>,
}

impl UiScene {
    pub fn new(viewport: Viewport, config: &ProbeConfig) -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            elements: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            next_applied_spawn_order: 0,
            cameras: Vec::new(),
            main_camera: None,
            modules: Vec::new(),
            sorting_layers: vec![(DEFAULT_SORTING_LAYER_NAME.to_string(), 0)],
            viewport,
            testing_mode: config.testing_mode,
            max_handler_depth: config.max_handler_depth,
            current_tick: 0,
            dispatch_log: Vec::new(),
        }
    }

    pub fn add_camera(&mut self, camera: ViewCamera) -> CameraId {
        let id = CameraId(self.cameras.len() as u32);
        self.cameras.push(camera);
        if self.main_camera.is_none() {
            self.main_camera = Some(id);
        }
        id
    }

    pub fn set_main_camera(&mut self, camera: CameraId) {
        self.main_camera = Some(camera);
    }

    pub fn camera(&self, id: CameraId) -> Option<&ViewCamera> {
        self.cameras.get(id.0 as usize)
    }

    pub fn add_module(&mut self, desc: ModuleDesc) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(desc);
        id
    }

    pub fn module_profile(&self, id: ModuleId) -> Option<ModuleProfile> {
        let desc = self.modules.get(id.0 as usize)?;
        let camera_depth = desc
            .camera
            .and_then(|camera| self.camera(camera))
            .map(|camera| camera.depth);
        Some(ModuleProfile {
            id,
            camera: desc.camera.filter(|_| camera_depth.is_some()),
            camera_depth,
            sort_order_priority: desc.sort_order_priority,
            render_order_priority: desc.render_order_priority,
        })
    }

    /// Registers a sorting layer, or updates the ordinal of an existing one.
    pub fn add_sorting_layer(&mut self, name: &str, ordinal: i32) -> SortingLayerId {
        if let Some(existing) = self.sorting_layer_by_name(name) {
            self.sorting_layers[existing.0 as usize].1 = ordinal;
            return existing;
        }
        let id = SortingLayerId(self.sorting_layers.len() as u32);
        self.sorting_layers.push((name.to_string(), ordinal));
        id
    }

    pub fn sorting_layer_by_name(&self, name: &str) -> Option<SortingLayerId> {
        self.sorting_layers
            .iter()
            .position(|(layer_name, _)| layer_name == name)
            .map(|index| SortingLayerId(index as u32))
    }

    pub fn spawn(&mut self, desc: ElementDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(UiElement {
            id,
            name: desc.name,
            scene: desc.scene,
            parent: desc.parent,
            active: desc.active,
            kinds: desc.kinds,
            hit: desc.hit,
            bounds: desc.bounds,
            handlers: desc.handlers,
            applied_spawn_order: 0,
        });
        id
    }

    /// Marks `id` destroyed. Its descendants go with it.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.elements.iter().any(|element| element.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|element| element.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        let despawned = self.pending_despawns.len();
        let spawned = self.pending_spawns.len();

        if !self.pending_spawns.is_empty() {
            for mut element in self.pending_spawns.drain(..) {
                element.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.elements.push(element);
            }
        }

        if !self.pending_despawns.is_empty() {
            let doomed = self
                .elements
                .iter()
                .filter(|element| self.is_despawn_pending(element.id))
                .map(|element| element.id)
                .collect::<Vec<_>>();
            self.elements.retain(|element| !doomed.contains(&element.id));
            self.pending_despawns.clear();
        }

        if spawned > 0 || despawned > 0 {
            debug!(
                spawned,
                despawned,
                element_count = self.elements.len(),
                "scene_pending_applied"
            );
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.dispatch_log.clear();
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[UiElement] {
        &self.elements
    }

    pub fn find_element(&self, id: EntityId) -> Option<&UiElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn find_element_mut(&mut self, id: EntityId) -> Option<&mut UiElement> {
        self.elements.iter_mut().find(|element| element.id == id)
    }

    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        match self.find_element_mut(id) {
            Some(element) => {
                element.active = active;
                true
            }
            None => false,
        }
    }

    pub fn set_handlers(&mut self, id: EntityId, handlers: HandlerSet) -> bool {
        match self.find_element_mut(id) {
            Some(element) => {
                element.handlers = handlers;
                true
            }
            None => false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn dispatch_log(&self) -> &[DispatchRecord] {
        &self.dispatch_log
    }

    pub fn take_dispatch_log(&mut self) -> Vec<DispatchRecord> {
        std::mem::take(&mut self.dispatch_log)
    }

    /// Pointer input from a real device. Ignored while testing mode is on so
    /// it cannot interleave with synthetic clicks.
    pub fn device_pointer(
        &mut self,
        kind: PointerEventKind,
        position: ScreenPoint,
    ) -> Option<EntityId> {
        if self.testing_mode {
            debug!(?kind, x = position.x, y = position.y, "device_pointer_ignored");
            return None;
        }
        let receiver = resolve_topmost(&*self, position)?;
        let event = FakeInputEvent::primary_at(position);
        let max_depth = self.max_handler_depth;
        execute_hierarchy(self, receiver, kind, &event, max_depth)
    }

    fn is_live_and_active(&self, id: EntityId) -> bool {
        self.is_alive(id) && self.is_active_in_hierarchy(id)
    }

    fn is_despawn_pending(&self, id: EntityId) -> bool {
        self.ancestors_and_self(id)
            .any(|entity| self.pending_despawns.contains(&entity))
    }

    fn is_active_in_hierarchy(&self, id: EntityId) -> bool {
        let mut current = Some(id);
        let mut visited = 0usize;
        while let Some(entity) = current {
            if visited >= MAX_HIERARCHY_DEPTH {
                return false;
            }
            match self.find_element(entity) {
                Some(element) if element.active => current = element.parent,
                _ => return false,
            }
            visited += 1;
        }
        true
    }

    fn ancestors_and_self(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(Some(id), move |entity| {
            self.find_element(*entity).and_then(|element| element.parent)
        })
        .take(MAX_HIERARCHY_DEPTH)
    }
}

impl HitTestHost for UiScene {
    type Module = ModuleProfile;

    fn raycast_all(&self, point: ScreenPoint) -> Vec<Candidate<ModuleProfile>> {
        let mut candidates = Vec::new();
        for element in &self.elements {
            let Some(hit) = element.hit else {
                continue;
            };
            if !hit.rect.contains(point) || !self.is_active_in_hierarchy(element.id) {
                continue;
            }
            let Some(module) = self.module_profile(hit.module) else {
                continue;
            };
            candidates.push(Candidate {
                entity: element.id,
                module,
                sorting_layer: hit.sorting_layer,
                sorting_order: hit.sorting_order,
                depth: hit.depth,
                distance: hit.distance,
                index: candidates.len(),
            });
        }
        candidates
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.find_element(entity).is_some() && !self.is_despawn_pending(entity)
    }

    fn sorting_layer_value(&self, layer: SortingLayerId) -> i32 {
        self.sorting_layers
            .get(layer.0 as usize)
            .map(|(_, ordinal)| *ordinal)
            .unwrap_or(0)
    }
}

impl HandlerTree for UiScene {
    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.find_element(entity).and_then(|element| element.parent)
    }

    fn supports(&self, entity: EntityId, kind: PointerEventKind) -> bool {
        self.is_alive(entity)
            && self
                .find_element(entity)
                .is_some_and(|element| element.handlers.supports(kind))
    }

    fn invoke(&mut self, entity: EntityId, kind: PointerEventKind, event: &FakeInputEvent) {
        self.dispatch_log.push(DispatchRecord {
            entity,
            kind,
            tick: self.current_tick,
            position: event.position,
        });
    }
}

impl TickHost for UiScene {
    fn begin_tick(&mut self, tick: Tick) {
        self.current_tick = tick.index;
        self.apply_pending();
    }
}

impl SceneQuery for UiScene {
    fn entities_of_kind(&self, kind: &str, scene: Option<&str>) -> Vec<EntityId> {
        self.elements
            .iter()
            .filter(|element| scene.map_or(true, |scene| element.scene == scene))
            .filter(|element| element.kinds.iter().any(|tag| tag == kind))
            .filter(|element| self.is_live_and_active(element.id))
            .map(|element| element.id)
            .collect()
    }

    fn entities_named(&self, name: &str, scene: Option<&str>) -> Vec<EntityId> {
        self.elements
            .iter()
            .filter(|element| scene.map_or(true, |scene| element.scene == scene))
            .filter(|element| element.name == name)
            .filter(|element| self.is_live_and_active(element.id))
            .map(|element| element.id)
            .collect()
    }

    fn entity_name(&self, entity: EntityId) -> Option<&str> {
        self.find_element(entity).map(|element| element.name.as_str())
    }

    fn children_of(&self, entity: EntityId) -> Vec<EntityId> {
        let mut children = self
            .elements
            .iter()
            .filter(|element| element.parent == Some(entity) && self.is_alive(element.id))
            .collect::<Vec<_>>();
        children.sort_by_key(|element| element.applied_spawn_order);
        children.into_iter().map(|element| element.id).collect()
    }

    fn has_kind(&self, entity: EntityId, kind: &str) -> bool {
        self.find_element(entity)
            .is_some_and(|element| element.kinds.iter().any(|tag| tag == kind))
    }

    fn screen_rect(&self, entity: EntityId) -> Option<ScreenRect> {
        self.find_element(entity)
            .and_then(|element| element.hit)
            .map(|hit| hit.rect)
    }

    fn world_bounds(&self, entity: EntityId) -> Option<Bounds3> {
        self.find_element(entity).and_then(|element| element.bounds)
    }
}

impl ScreenInfo for UiScene {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn main_camera(&self) -> Option<ViewCamera> {
        self.main_camera.and_then(|id| self.camera(id)).copied()
    }
}

/// Logs a one-line summary of the scene contents.
pub fn log_scene_summary(scene: &UiScene) {
    let mut per_scene: HashMap<&str, usize> = HashMap::new();
    for element in scene.elements() {
        *per_scene.entry(element.scene.as_str()).or_default() += 1;
    }
    info!(
        element_count = scene.element_count(),
        scenes = ?per_scene,
        cameras = scene.cameras.len(),
        modules = scene.modules.len(),
        sorting_layers = scene.sorting_layers.len(),
        "ui_scene_loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::ranked_candidates;

    fn scene() -> UiScene {
        UiScene::new(Viewport::new(800, 600), &ProbeConfig::default())
    }

    fn full_rect() -> ScreenRect {
        ScreenRect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn spawns_are_deferred_until_applied() {
        let mut scene = scene();
        let id = scene.spawn(ElementDesc::new("button"));
        assert!(!scene.is_alive(id));
        scene.apply_pending();
        assert!(scene.is_alive(id));
        assert_eq!(scene.element_count(), 1);
    }

    #[test]
    fn despawned_entity_is_dead_but_still_raycast_until_applied() {
        let mut scene = scene();
        let module = scene.add_module(ModuleDesc::default());
        let id =
            scene.spawn(ElementDesc::new("panel").with_hit(HitRegion::new(full_rect(), module)));
        scene.apply_pending();

        assert!(scene.despawn(id));
        assert!(!scene.is_alive(id));
        assert_eq!(scene.raycast_all(ScreenPoint::new(10.0, 10.0)).len(), 1);
        assert_eq!(resolve_topmost(&scene, ScreenPoint::new(10.0, 10.0)), None);

        scene.apply_pending();
        assert!(scene.raycast_all(ScreenPoint::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn despawn_takes_descendants_along() {
        let mut scene = scene();
        let root = scene.spawn(ElementDesc::new("root"));
        scene.apply_pending();
        let child = scene.spawn(ElementDesc::new("child").child_of(root));
        scene.apply_pending();

        scene.despawn(root);
        assert!(!scene.is_alive(child));
        scene.apply_pending();
        assert_eq!(scene.element_count(), 0);
    }

    #[test]
    fn despawn_of_unknown_entity_is_rejected() {
        let mut scene = scene();
        assert!(!scene.despawn(EntityId(42)));
    }

    #[test]
    fn raycast_skips_inactive_hierarchies_and_missing_points() {
        let mut scene = scene();
        let module = scene.add_module(ModuleDesc::default());
        let root = scene.spawn(ElementDesc::new("root").inactive());
        scene.apply_pending();
        scene.spawn(
            ElementDesc::new("hidden")
                .child_of(root)
                .with_hit(HitRegion::new(full_rect(), module)),
        );
        let visible = scene.spawn(
            ElementDesc::new("visible")
                .with_hit(HitRegion::new(ScreenRect::new(0.0, 0.0, 100.0, 100.0), module)),
        );
        scene.apply_pending();

        let hits = scene.raycast_all(ScreenPoint::new(50.0, 50.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, visible);
        assert_eq!(hits[0].index, 0);
        assert!(scene.raycast_all(ScreenPoint::new(500.0, 500.0)).is_empty());
    }

    #[test]
    fn module_profile_reads_camera_depth() {
        let mut scene = scene();
        let camera = scene.add_camera(ViewCamera {
            depth: 3.0,
            ..ViewCamera::default()
        });
        let with_camera = scene.add_module(ModuleDesc {
            camera: Some(camera),
            ..ModuleDesc::default()
        });
        let dangling = scene.add_module(ModuleDesc {
            camera: Some(CameraId(99)),
            ..ModuleDesc::default()
        });

        let profile = scene.module_profile(with_camera).expect("module");
        assert_eq!(profile.camera, Some(camera));
        assert_eq!(profile.camera_depth, Some(3.0));

        let profile = scene.module_profile(dangling).expect("module");
        assert_eq!(profile.camera, None);
        assert_eq!(profile.camera_depth, None);
    }

    #[test]
    fn sorting_layers_resolve_to_ordinals() {
        let mut scene = scene();
        let overlay = scene.add_sorting_layer("Overlay", 10);
        let background = scene.add_sorting_layer("Background", -5);
        assert_eq!(scene.sorting_layer_value(overlay), 10);
        assert_eq!(scene.sorting_layer_value(background), -5);
        assert_eq!(scene.sorting_layer_value(SortingLayerId::default()), 0);
        assert_eq!(scene.add_sorting_layer("Overlay", 20), overlay);
        assert_eq!(scene.sorting_layer_value(overlay), 20);
    }

    #[test]
    fn ranked_candidates_follow_layer_ordinals() {
        let mut scene = scene();
        let module = scene.add_module(ModuleDesc::default());
        let overlay = scene.add_sorting_layer("Overlay", 10);
        let low = scene.spawn(
            ElementDesc::new("low")
                .with_hit(HitRegion::new(full_rect(), module).with_sorting(overlay, -100)),
        );
        let high = scene.spawn(
            ElementDesc::new("high").with_hit(HitRegion::new(full_rect(), module).with_sorting(
                SortingLayerId::default(),
                100,
            )),
        );
        scene.apply_pending();

        let ranked = ranked_candidates(&scene, ScreenPoint::new(1.0, 1.0))
            .into_iter()
            .map(|candidate| candidate.entity)
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![low, high]);
    }

    #[test]
    fn testing_mode_ignores_device_pointer() {
        let mut scene = scene();
        let module = scene.add_module(ModuleDesc::default());
        scene.spawn(
            ElementDesc::new("button")
                .with_hit(HitRegion::new(full_rect(), module))
                .with_handlers(HandlerSet::all()),
        );
        scene.apply_pending();

        assert_eq!(
            scene.device_pointer(PointerEventKind::Down, ScreenPoint::new(5.0, 5.0)),
            None
        );
        assert!(scene.dispatch_log().is_empty());
    }

    #[test]
    fn live_device_pointer_dispatches_outside_testing_mode() {
        let config = ProbeConfig {
            testing_mode: false,
            ..ProbeConfig::default()
        };
        let mut scene = UiScene::new(Viewport::new(800, 600), &config);
        let module = scene.add_module(ModuleDesc::default());
        let button = scene.spawn(
            ElementDesc::new("button")
                .with_hit(HitRegion::new(full_rect(), module))
                .with_handlers(HandlerSet::all()),
        );
        scene.apply_pending();

        assert_eq!(
            scene.device_pointer(PointerEventKind::Down, ScreenPoint::new(5.0, 5.0)),
            Some(button)
        );
        assert_eq!(scene.dispatch_log().len(), 1);
    }

    #[test]
    fn main_camera_defaults_to_first_added() {
        let mut scene = scene();
        assert_eq!(scene.main_camera(), None);
        let first = scene.add_camera(ViewCamera {
            depth: 1.0,
            ..ViewCamera::default()
        });
        let second = scene.add_camera(ViewCamera {
            depth: 2.0,
            ..ViewCamera::default()
        });
        assert_eq!(scene.main_camera().map(|camera| camera.depth), Some(1.0));
        scene.set_main_camera(second);
        assert_eq!(scene.main_camera().map(|camera| camera.depth), Some(2.0));
        assert_ne!(first, second);
    }
}
