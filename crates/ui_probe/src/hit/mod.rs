mod candidate;
mod resolver;

pub use candidate::{
    CameraId, Candidate, EntityId, HitTestHost, ModuleId, ModuleProfile, RoutingModule,
    SortingLayerId,
};
pub use resolver::{compare_candidates, ranked_candidates, resolve_topmost, sort_candidates};
