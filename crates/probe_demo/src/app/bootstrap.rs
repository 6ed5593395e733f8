use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;
use ui_probe::ProbeConfig;

use super::error::DemoError;
use super::layout::{build_scene, load_layout_file};
use super::runner::DemoSession;

pub(crate) const DEFAULT_LAYOUT_FILE: &str = "overlay_menu.json";
pub(crate) const DEFAULT_SCRIPT_FILE: &str = "overlay_menu.script";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DemoOptions {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) layout_path: Option<PathBuf>,
}

pub(crate) fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Config file when given, environment otherwise.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ProbeConfig, DemoError> {
    let Some(path) = path else {
        return Ok(ProbeConfig::from_env());
    };
    let raw = fs::read_to_string(path).map_err(|source| DemoError::Read {
        what: "config",
        path: path.display().to_string(),
        source,
    })?;
    parse_config_json(&raw)
}

pub(crate) fn parse_config_json(raw: &str) -> Result<ProbeConfig, DemoError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ProbeConfig>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        DemoError::Parse {
            what: "config",
            path: (!path.is_empty() && path != ".").then_some(path),
            message: source.to_string(),
        }
    })
}

pub(crate) fn build_session(options: &DemoOptions) -> Result<DemoSession, DemoError> {
    info!("=== UI Probe Demo ===");
    let config = load_config(options.config_path.as_deref())?;
    let layout_path = options
        .layout_path
        .clone()
        .unwrap_or_else(|| fixtures_dir().join(DEFAULT_LAYOUT_FILE));
    let layout = load_layout_file(&layout_path)?;
    info!(
        layout = %layout_path.display(),
        elements = layout.elements.len(),
        testing_mode = config.testing_mode,
        "layout_loaded"
    );
    let loaded = build_scene(&layout, &config);
    Ok(DemoSession::new(loaded, config))
}
