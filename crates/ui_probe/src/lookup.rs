use std::collections::VecDeque;

use crate::geometry::{Bounds3, ScreenRect, ViewCamera, Viewport};
use crate::hit::EntityId;
use crate::ProbeError;

/// Read-only scene graph queries supplied by the host.
pub trait SceneQuery {
    /// Active entities tagged with `kind`, optionally restricted to one scene.
    fn entities_of_kind(&self, kind: &str, scene: Option<&str>) -> Vec<EntityId>;
    /// Active entities called `name`, optionally restricted to one scene.
    fn entities_named(&self, name: &str, scene: Option<&str>) -> Vec<EntityId>;
    fn entity_name(&self, entity: EntityId) -> Option<&str>;
    fn children_of(&self, entity: EntityId) -> Vec<EntityId>;
    fn has_kind(&self, entity: EntityId, kind: &str) -> bool;
    fn screen_rect(&self, entity: EntityId) -> Option<ScreenRect>;
    fn world_bounds(&self, entity: EntityId) -> Option<Bounds3>;
}

/// Screen-level facts needed by the half-screen and bounds clicks.
pub trait ScreenInfo {
    fn viewport(&self) -> Viewport;
    /// `None` when the host has no camera registered.
    fn main_camera(&self) -> Option<ViewCamera>;
}

fn scene_label(scene: Option<&str>) -> String {
    match scene {
        Some(scene) => format!("scene '{scene}'"),
        None => "any loaded scene".to_string(),
    }
}

fn entity_label<Q: SceneQuery + ?Sized>(query: &Q, entity: EntityId) -> String {
    match query.entity_name(entity) {
        Some(name) => format!("'{name}' ({})", entity.0),
        None => format!("entity {}", entity.0),
    }
}

pub fn find_by_name<Q: SceneQuery + ?Sized>(
    query: &Q,
    name: &str,
    scene: Option<&str>,
) -> Result<EntityId, ProbeError> {
    query
        .entities_named(name, scene)
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NotFound {
            what: format!("object named '{name}'"),
            location: scene_label(scene),
        })
}

pub fn find_one_of_kind<Q: SceneQuery + ?Sized>(
    query: &Q,
    kind: &str,
    scene: Option<&str>,
) -> Result<EntityId, ProbeError> {
    query
        .entities_of_kind(kind, scene)
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NotFound {
            what: format!("object of kind '{kind}'"),
            location: scene_label(scene),
        })
}

/// Direct child of `parent` called `name`.
pub fn find_child<Q: SceneQuery + ?Sized>(
    query: &Q,
    parent: EntityId,
    name: &str,
) -> Result<EntityId, ProbeError> {
    query
        .children_of(parent)
        .into_iter()
        .find(|child| query.entity_name(*child) == Some(name))
        .ok_or_else(|| ProbeError::NotFound {
            what: format!("child '{name}'"),
            location: entity_label(query, parent),
        })
}

/// Breadth-first search below `root` (excluding it) for `name`.
pub fn find_descendant<Q: SceneQuery + ?Sized>(
    query: &Q,
    root: EntityId,
    name: &str,
) -> Result<EntityId, ProbeError> {
    let mut queue = query.children_of(root).into_iter().collect::<VecDeque<_>>();
    let mut visited = 0usize;
    while let Some(entity) = queue.pop_front() {
        if query.entity_name(entity) == Some(name) {
            return Ok(entity);
        }
        visited += 1;
        if visited > MAX_DESCENDANT_VISITS {
            break;
        }
        queue.extend(query.children_of(entity));
    }
    Err(ProbeError::NotFound {
        what: format!("descendant '{name}'"),
        location: entity_label(query, root),
    })
}

const MAX_DESCENDANT_VISITS: usize = 100_000;

pub fn require_component<Q: SceneQuery + ?Sized>(
    query: &Q,
    entity: EntityId,
    kind: &str,
) -> Result<(), ProbeError> {
    if query.has_kind(entity, kind) {
        return Ok(());
    }
    Err(ProbeError::NotFound {
        what: format!("component '{kind}'"),
        location: entity_label(query, entity),
    })
}

pub fn screen_rect_of<Q: SceneQuery + ?Sized>(
    query: &Q,
    entity: EntityId,
) -> Result<ScreenRect, ProbeError> {
    query
        .screen_rect(entity)
        .ok_or_else(|| ProbeError::NotFound {
            what: "screen rectangle".to_string(),
            location: entity_label(query, entity),
        })
}

pub fn bounds_of<Q: SceneQuery + ?Sized>(query: &Q, entity: EntityId) -> Result<Bounds3, ProbeError> {
    query
        .world_bounds(entity)
        .ok_or_else(|| ProbeError::NotFound {
            what: "bounding volume".to_string(),
            location: entity_label(query, entity),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::scene::{ElementDesc, UiScene};

    fn menu_scene() -> (UiScene, EntityId, EntityId) {
        let mut scene = UiScene::new(Viewport::new(640, 480), &ProbeConfig::default());
        let dialog = scene.spawn(ElementDesc::new("Dialog").with_kind("Window"));
        scene.apply_pending();
        let body = scene.spawn(ElementDesc::new("Body").child_of(dialog));
        scene.apply_pending();
        let ok = scene.spawn(
            ElementDesc::new("OkButton")
                .child_of(body)
                .with_kind("Button"),
        );
        scene.spawn(
            ElementDesc::new("OkButton")
                .in_scene("Hud")
                .with_kind("Button")
                .inactive(),
        );
        scene.apply_pending();
        (scene, dialog, ok)
    }

    #[test]
    fn finds_by_name_and_kind_in_loaded_scenes() {
        let (scene, dialog, ok) = menu_scene();
        assert_eq!(find_by_name(&scene, "Dialog", None).expect("dialog"), dialog);
        assert_eq!(find_one_of_kind(&scene, "Button", Some("Main")).expect("button"), ok);
        assert_eq!(find_one_of_kind(&scene, "Button", None).expect("button"), ok);
    }

    #[test]
    fn scene_filter_excludes_other_scenes() {
        let (scene, _, _) = menu_scene();
        let error = find_one_of_kind(&scene, "Button", Some("Hud")).expect_err("inactive");
        assert_eq!(
            error.to_string(),
            "object of kind 'Button' not found in scene 'Hud'"
        );
        let error = find_by_name(&scene, "Missing", None).expect_err("missing");
        assert_eq!(
            error.to_string(),
            "object named 'Missing' not found in any loaded scene"
        );
    }

    #[test]
    fn child_lookup_is_direct_only() {
        let (scene, dialog, ok) = menu_scene();
        let error = find_child(&scene, dialog, "OkButton").expect_err("grandchild");
        assert_eq!(
            error.to_string(),
            format!("child 'OkButton' not found in 'Dialog' ({})", dialog.0)
        );
        assert_eq!(find_descendant(&scene, dialog, "OkButton").expect("descendant"), ok);
        let body = find_child(&scene, dialog, "Body").expect("body");
        assert_eq!(find_child(&scene, body, "OkButton").expect("child"), ok);
    }

    #[test]
    fn descendant_search_excludes_root() {
        let (scene, dialog, _) = menu_scene();
        assert!(find_descendant(&scene, dialog, "Dialog").is_err());
    }

    #[test]
    fn component_requirement_names_missing_kind() {
        let (scene, dialog, ok) = menu_scene();
        require_component(&scene, ok, "Button").expect("button kind");
        let error = require_component(&scene, dialog, "Button").expect_err("window only");
        assert_eq!(
            error.to_string(),
            format!("component 'Button' not found in 'Dialog' ({})", dialog.0)
        );
    }

    #[test]
    fn missing_geometry_is_not_found() {
        let (scene, dialog, _) = menu_scene();
        assert!(screen_rect_of(&scene, dialog).is_err());
        let error = bounds_of(&scene, EntityId(999)).expect_err("unknown entity");
        assert_eq!(error.to_string(), "bounding volume not found in entity 999");
    }
}
