use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use ui_probe::{
    log_scene_summary, Bounds3, CameraId, ElementDesc, EntityId, HandlerSet, HitRegion, ModuleDesc,
    ModuleId, PointerEventKind, ProbeConfig, ScreenRect, UiScene, ViewCamera, Viewport, WorldPoint,
    DEFAULT_PIXELS_PER_UNIT, DEFAULT_SCENE_NAME, DEFAULT_SORTING_LAYER_NAME,
};

use super::error::DemoError;

pub(crate) const LAYOUT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutFile {
    pub(crate) layout_version: u32,
    pub(crate) viewport: Viewport,
    #[serde(default)]
    pub(crate) cameras: Vec<LayoutCamera>,
    #[serde(default)]
    pub(crate) modules: Vec<LayoutModule>,
    #[serde(default)]
    pub(crate) sorting_layers: Vec<LayoutSortingLayer>,
    pub(crate) elements: Vec<LayoutElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutCamera {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) position: WorldPoint,
    #[serde(default = "default_pixels_per_unit")]
    pub(crate) pixels_per_unit: f32,
    #[serde(default)]
    pub(crate) depth: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LayoutModule {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) camera: Option<String>,
    #[serde(default)]
    pub(crate) sort_order_priority: i32,
    #[serde(default)]
    pub(crate) render_order_priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LayoutSortingLayer {
    pub(crate) name: String,
    pub(crate) ordinal: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutHit {
    pub(crate) rect: ScreenRect,
    pub(crate) module: String,
    #[serde(default)]
    pub(crate) sorting_layer: Option<String>,
    #[serde(default)]
    pub(crate) sorting_order: i32,
    #[serde(default)]
    pub(crate) depth: i32,
    #[serde(default)]
    pub(crate) distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutElement {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) scene: Option<String>,
    #[serde(default)]
    pub(crate) parent: Option<String>,
    #[serde(default = "default_active")]
    pub(crate) active: bool,
    #[serde(default)]
    pub(crate) kinds: Vec<String>,
    #[serde(default)]
    pub(crate) hit: Option<LayoutHit>,
    #[serde(default)]
    pub(crate) bounds: Option<Bounds3>,
    #[serde(default)]
    pub(crate) handlers: Vec<PointerEventKind>,
    /// Element despawned when this one handles a click.
    #[serde(default)]
    pub(crate) closes: Option<String>,
}

fn default_pixels_per_unit() -> f32 {
    DEFAULT_PIXELS_PER_UNIT
}

fn default_active() -> bool {
    true
}

/// A built scene plus the click handler -> closed element links.
#[derive(Debug)]
pub(crate) struct LoadedLayout {
    pub(crate) scene: UiScene,
    pub(crate) closes_on_click: HashMap<EntityId, EntityId>,
}

pub(crate) fn load_layout_file(path: &Path) -> Result<LayoutFile, DemoError> {
    let raw = fs::read_to_string(path).map_err(|source| DemoError::Read {
        what: "layout",
        path: path.display().to_string(),
        source,
    })?;
    let layout = parse_layout_json(&raw)?;
    validate_layout(&layout)?;
    Ok(layout)
}

pub(crate) fn parse_layout_json(raw: &str) -> Result<LayoutFile, DemoError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LayoutFile>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        DemoError::Parse {
            what: "layout",
            path: (!path.is_empty() && path != ".").then_some(path),
            message: source.to_string(),
        }
    })
}

fn validation_err(path: &str, message: impl Into<String>) -> DemoError {
    DemoError::Validation {
        path: path.to_string(),
        message: message.into(),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> DemoError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn check_unique<'a>(
    collection: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), DemoError> {
    let mut seen = HashMap::new();
    for (index, name) in names.enumerate() {
        if let Some(first_index) = seen.insert(name, index) {
            return Err(validation_err(
                &format!("{collection}[{index}].name"),
                format!("duplicate name '{name}' (first seen at {collection}[{first_index}].name)"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_layout(layout: &LayoutFile) -> Result<(), DemoError> {
    if layout.layout_version != LAYOUT_VERSION {
        return Err(expected_actual(
            "layout_version",
            LAYOUT_VERSION,
            layout.layout_version,
        ));
    }
    if layout.viewport.width == 0 || layout.viewport.height == 0 {
        return Err(expected_actual(
            "viewport",
            "non-zero size",
            format!("{}x{}", layout.viewport.width, layout.viewport.height),
        ));
    }

    check_unique("cameras", layout.cameras.iter().map(|camera| camera.name.as_str()))?;
    check_unique("modules", layout.modules.iter().map(|module| module.name.as_str()))?;
    check_unique(
        "sorting_layers",
        layout.sorting_layers.iter().map(|layer| layer.name.as_str()),
    )?;

    for (index, camera) in layout.cameras.iter().enumerate() {
        if !camera.pixels_per_unit.is_finite() || camera.pixels_per_unit <= 0.0 {
            return Err(expected_actual(
                &format!("cameras[{index}].pixels_per_unit"),
                "positive finite number",
                camera.pixels_per_unit,
            ));
        }
        if !camera.depth.is_finite() {
            return Err(expected_actual(
                &format!("cameras[{index}].depth"),
                "finite number",
                camera.depth,
            ));
        }
    }

    for (index, module) in layout.modules.iter().enumerate() {
        if let Some(camera) = &module.camera {
            if !layout.cameras.iter().any(|known| &known.name == camera) {
                return Err(validation_err(
                    &format!("modules[{index}].camera"),
                    format!("unknown camera '{camera}'"),
                ));
            }
        }
    }

    let mut earlier_elements = HashSet::new();
    for (index, element) in layout.elements.iter().enumerate() {
        if let Some(parent) = &element.parent {
            if !earlier_elements.contains(parent.as_str()) {
                return Err(validation_err(
                    &format!("elements[{index}].parent"),
                    format!("parent '{parent}' must be declared before its children"),
                ));
            }
        }
        if let Some(hit) = &element.hit {
            validate_hit(layout, index, hit)?;
        }
        if let Some(target) = &element.closes {
            if !layout.elements.iter().any(|known| &known.name == target) {
                return Err(validation_err(
                    &format!("elements[{index}].closes"),
                    format!("unknown element '{target}'"),
                ));
            }
        }
        earlier_elements.insert(element.name.as_str());
    }

    Ok(())
}

fn validate_hit(layout: &LayoutFile, index: usize, hit: &LayoutHit) -> Result<(), DemoError> {
    if !layout.modules.iter().any(|module| module.name == hit.module) {
        return Err(validation_err(
            &format!("elements[{index}].hit.module"),
            format!("unknown module '{}'", hit.module),
        ));
    }
    if let Some(layer) = &hit.sorting_layer {
        let known = layer == DEFAULT_SORTING_LAYER_NAME
            || layout.sorting_layers.iter().any(|known| &known.name == layer);
        if !known {
            return Err(validation_err(
                &format!("elements[{index}].hit.sorting_layer"),
                format!("unknown sorting layer '{layer}'"),
            ));
        }
    }
    let rect = hit.rect;
    let finite = [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|value| value.is_finite());
    if !finite || rect.width < 0.0 || rect.height < 0.0 {
        return Err(expected_actual(
            &format!("elements[{index}].hit.rect"),
            "finite rectangle with non-negative size",
            format!("{rect:?}"),
        ));
    }
    Ok(())
}

/// Spawns every element of a validated layout into a fresh scene.
pub(crate) fn build_scene(layout: &LayoutFile, config: &ProbeConfig) -> LoadedLayout {
    let mut scene = UiScene::new(layout.viewport, config);

    let mut cameras = HashMap::<&str, CameraId>::new();
    for camera in &layout.cameras {
        let id = scene.add_camera(ViewCamera {
            position: camera.position,
            pixels_per_unit: camera.pixels_per_unit,
            depth: camera.depth,
        });
        cameras.insert(camera.name.as_str(), id);
    }

    let mut modules = HashMap::<&str, ModuleId>::new();
    for module in &layout.modules {
        let id = scene.add_module(ModuleDesc {
            camera: module
                .camera
                .as_deref()
                .and_then(|name| cameras.get(name).copied()),
            sort_order_priority: module.sort_order_priority,
            render_order_priority: module.render_order_priority,
        });
        modules.insert(module.name.as_str(), id);
    }

    for layer in &layout.sorting_layers {
        scene.add_sorting_layer(&layer.name, layer.ordinal);
    }

    let mut spawned = HashMap::<&str, EntityId>::new();
    for element in &layout.elements {
        let mut desc = ElementDesc::new(element.name.as_str())
            .in_scene(element.scene.as_deref().unwrap_or(DEFAULT_SCENE_NAME))
            .with_handlers(element.handlers.iter().copied().collect::<HandlerSet>());
        if let Some(parent) = element
            .parent
            .as_deref()
            .and_then(|name| spawned.get(name))
        {
            desc = desc.child_of(*parent);
        }
        if !element.active {
            desc = desc.inactive();
        }
        for kind in &element.kinds {
            desc = desc.with_kind(kind.as_str());
        }
        if let Some(hit) = &element.hit {
            if let Some(module) = modules.get(hit.module.as_str()) {
                let layer = hit
                    .sorting_layer
                    .as_deref()
                    .and_then(|name| scene.sorting_layer_by_name(name))
                    .unwrap_or_default();
                desc = desc.with_hit(
                    HitRegion::new(hit.rect, *module)
                        .with_sorting(layer, hit.sorting_order)
                        .with_depth(hit.depth)
                        .with_distance(hit.distance),
                );
            }
        }
        if let Some(bounds) = element.bounds {
            desc = desc.with_bounds(bounds);
        }

        let id = scene.spawn(desc);
        spawned.insert(element.name.as_str(), id);
    }

    let mut closes_on_click = HashMap::new();
    for element in &layout.elements {
        let Some(target) = element.closes.as_deref() else {
            continue;
        };
        if let (Some(handler), Some(target)) =
            (spawned.get(element.name.as_str()), spawned.get(target))
        {
            closes_on_click.insert(*handler, *target);
        }
    }

    scene.apply_pending();
    log_scene_summary(&scene);
    info!(close_links = closes_on_click.len(), "layout_scene_built");

    LoadedLayout {
        scene,
        closes_on_click,
    }
}
