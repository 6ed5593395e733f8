use serde::Serialize;
use tracing::{debug, info};

use super::{ProbeTask, TaskPoll, Tick};
use crate::events::{FakeInputEvent, PointerEventKind};
use crate::geometry::{Bounds3, ScreenPoint, ScreenRect, ViewCamera, Viewport};
use crate::handlers::{execute_hierarchy, HandlerTree, DEFAULT_MAX_HANDLER_DEPTH};
use crate::hit::{resolve_topmost, EntityId, HitTestHost};
use crate::ProbeError;

/// What a finished click did. Handler fields name the ancestor that accepted
/// each event, `None` when it was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClickOutcome {
    pub position: ScreenPoint,
    pub receiver: Option<EntityId>,
    pub down_handler: Option<EntityId>,
    pub up_handler: Option<EntityId>,
    pub click_handler: Option<EntityId>,
    pub down_tick: Option<u64>,
    pub release_tick: Option<u64>,
}

impl ClickOutcome {
    fn empty(position: ScreenPoint) -> Self {
        Self {
            position,
            receiver: None,
            down_handler: None,
            up_handler: None,
            click_handler: None,
            down_tick: None,
            release_tick: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClickState {
    Start,
    AwaitingRelease { receiver: EntityId },
    Done,
}

/// Pointer-down on the first tick, pointer-up and click on the next one.
/// Real devices never deliver press and release within a single frame.
#[derive(Debug, Clone)]
pub struct ClickSimulation {
    event: FakeInputEvent,
    max_handler_depth: usize,
    state: ClickState,
    outcome: ClickOutcome,
}

impl ClickSimulation {
    pub fn at(point: ScreenPoint) -> Self {
        Self {
            event: FakeInputEvent::primary_at(point),
            max_handler_depth: DEFAULT_MAX_HANDLER_DEPTH,
            state: ClickState::Start,
            outcome: ClickOutcome::empty(point),
        }
    }

    pub fn at_rect_center(rect: ScreenRect) -> Self {
        Self::at(rect.center())
    }

    pub fn at_rect_relative(rect: ScreenRect, rel_x: f32, rel_y: f32) -> Self {
        Self::at(rect.point_at_relative(rel_x, rel_y))
    }

    pub fn at_bounds_center(bounds: Bounds3, camera: &ViewCamera, viewport: Viewport) -> Self {
        Self::at(camera.world_to_screen(bounds.center(), viewport))
    }

    pub fn lower_half(viewport: Viewport) -> Self {
        Self::at(viewport.lower_half_midpoint())
    }

    pub fn upper_half(viewport: Viewport) -> Self {
        Self::at(viewport.upper_half_midpoint())
    }

    pub fn with_max_handler_depth(mut self, max_handler_depth: usize) -> Self {
        self.max_handler_depth = max_handler_depth;
        self
    }

    pub fn event(&self) -> &FakeInputEvent {
        &self.event
    }

    pub fn is_done(&self) -> bool {
        self.state == ClickState::Done
    }

    pub fn outcome(&self) -> ClickOutcome {
        self.outcome
    }
}

impl<H> ProbeTask<H> for ClickSimulation
where
    H: HitTestHost + HandlerTree,
{
    fn poll(&mut self, host: &mut H, tick: Tick) -> Result<TaskPoll, ProbeError> {
        match self.state {
            ClickState::Start => {
                let Some(receiver) = resolve_topmost(&*host, self.event.position) else {
                    debug!(
                        x = self.event.position.x,
                        y = self.event.position.y,
                        "click_no_receiver"
                    );
                    self.state = ClickState::Done;
                    return Ok(TaskPoll::Ready);
                };
                self.outcome.receiver = Some(receiver);
                self.outcome.down_tick = Some(tick.index);
                self.outcome.down_handler = execute_hierarchy(
                    &mut *host,
                    receiver,
                    PointerEventKind::Down,
                    &self.event,
                    self.max_handler_depth,
                );
                self.state = ClickState::AwaitingRelease { receiver };
                Ok(TaskPoll::Pending)
            }
            ClickState::AwaitingRelease { receiver } => {
                self.outcome.release_tick = Some(tick.index);
                self.outcome.up_handler = execute_hierarchy(
                    &mut *host,
                    receiver,
                    PointerEventKind::Up,
                    &self.event,
                    self.max_handler_depth,
                );
                self.outcome.click_handler = execute_hierarchy(
                    &mut *host,
                    receiver,
                    PointerEventKind::Click,
                    &self.event,
                    self.max_handler_depth,
                );
                self.state = ClickState::Done;
                info!(
                    x = self.event.position.x,
                    y = self.event.position.y,
                    receiver = ?receiver,
                    down = ?self.outcome.down_handler,
                    up = ?self.outcome.up_handler,
                    click = ?self.outcome.click_handler,
                    "click_delivered"
                );
                Ok(TaskPoll::Ready)
            }
            ClickState::Done => Ok(TaskPoll::Ready),
        }
    }
}
