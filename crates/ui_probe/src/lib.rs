use thiserror::Error;

mod config;
mod driver;
mod events;
mod geometry;
mod handlers;
mod hit;
mod lookup;
mod scene;
mod stats;
mod task;

pub use config::{
    ProbeConfig, DEFAULT_TARGET_TPS, DEFAULT_TIMEOUT_SECONDS, TESTING_MODE_ENV_VAR,
    TIMEOUT_ENV_VAR, TPS_ENV_VAR,
};
pub use driver::ProbeDriver;
pub use events::{FakeInputEvent, HandlerSet, PointerButton, PointerEventKind};
pub use geometry::{
    Bounds3, ScreenPoint, ScreenRect, ViewCamera, Viewport, WorldPoint, DEFAULT_PIXELS_PER_UNIT,
};
pub use handlers::{execute_hierarchy, find_handler, HandlerTree, DEFAULT_MAX_HANDLER_DEPTH};
pub use hit::{
    compare_candidates, ranked_candidates, resolve_topmost, sort_candidates, CameraId, Candidate,
    EntityId, HitTestHost, ModuleId, ModuleProfile, RoutingModule, SortingLayerId,
};
pub use lookup::{
    bounds_of, find_by_name, find_child, find_descendant, find_one_of_kind, require_component,
    screen_rect_of, SceneQuery, ScreenInfo,
};
pub use scene::{
    log_scene_summary, DispatchRecord, ElementDesc, EntityIdAllocator, HitRegion, ModuleDesc,
    UiElement, UiScene, DEFAULT_SCENE_NAME, DEFAULT_SORTING_LAYER_NAME,
};
pub use stats::ProbeStats;
pub use task::{
    ClickOutcome, ClickSimulation, ProbeTask, TaskPoll, Tick, TickHost, TickScheduler,
    WaitForever, WaitTicks, WaitUntil, DEFAULT_MAX_RUN_TICKS,
};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{what} not found in {location}")]
    NotFound { what: String, location: String },
    #[error("wait timed out after {timeout_seconds}s")]
    Timeout { timeout_seconds: f32 },
    #[error("task did not finish within {ticks} ticks")]
    TickBudgetExhausted { ticks: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_target_and_location() {
        let error = ProbeError::NotFound {
            what: "child 'OkButton'".to_string(),
            location: "'Dialog' (4)".to_string(),
        };
        assert_eq!(error.to_string(), "child 'OkButton' not found in 'Dialog' (4)");
    }

    #[test]
    fn timeout_message_names_configured_timeout() {
        let error = ProbeError::Timeout {
            timeout_seconds: 2.5,
        };
        assert_eq!(error.to_string(), "wait timed out after 2.5s");
    }
}
