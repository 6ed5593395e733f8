use tracing::{info, warn};

use crate::config::ProbeConfig;
use crate::geometry::{Bounds3, ScreenPoint, ScreenRect};
use crate::handlers::HandlerTree;
use crate::hit::{ranked_candidates, resolve_topmost, Candidate, EntityId, HitTestHost};
use crate::lookup::{bounds_of, screen_rect_of, SceneQuery, ScreenInfo};
use crate::stats::ProbeStats;
use crate::task::{
    ClickOutcome, ClickSimulation, ProbeTask, TickHost, TickScheduler, WaitForever, WaitTicks,
    WaitUntil,
};
use crate::ProbeError;

/// Surface handed to an external test driver. Owns the host and the tick
/// source; every operation runs to completion before returning.
#[derive(Debug)]
pub struct ProbeDriver<H> {
    host: H,
    scheduler: TickScheduler,
    config: ProbeConfig,
    stats: ProbeStats,
}

impl<H> ProbeDriver<H> {
    pub fn new(host: H, config: ProbeConfig) -> Self {
        let scheduler = TickScheduler::new(config.tick_seconds());
        info!(
            testing_mode = config.testing_mode,
            target_tps = config.target_tps,
            default_timeout_seconds = config.default_timeout_seconds,
            max_handler_depth = config.max_handler_depth,
            "probe_driver_ready"
        );
        Self {
            host,
            scheduler,
            config,
            stats: ProbeStats::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: TickScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn stats(&self) -> ProbeStats {
        ProbeStats {
            ticks: self.scheduler.ticks_elapsed(),
            ..self.stats
        }
    }

    pub fn ticks_elapsed(&self) -> u64 {
        self.scheduler.ticks_elapsed()
    }
}

impl<H: HitTestHost> ProbeDriver<H> {
    pub fn topmost_at(&self, point: ScreenPoint) -> Option<EntityId> {
        resolve_topmost(&self.host, point)
    }

    pub fn ranked_at(&self, point: ScreenPoint) -> Vec<Candidate<H::Module>> {
        ranked_candidates(&self.host, point)
    }
}

impl<H: TickHost> ProbeDriver<H> {
    pub fn run<T: ProbeTask<H>>(&mut self, task: &mut T) -> Result<(), ProbeError> {
        self.scheduler.run_to_completion(task, &mut self.host)
    }

    pub fn wait_until<P>(&mut self, predicate: P, timeout_seconds: f32) -> Result<(), ProbeError>
    where
        P: FnMut(&H) -> bool,
    {
        let mut wait = WaitUntil::new(predicate, timeout_seconds);
        let result = self.run(&mut wait);
        self.stats.record_wait(&result);
        result
    }

    pub fn wait_until_default<P>(&mut self, predicate: P) -> Result<(), ProbeError>
    where
        P: FnMut(&H) -> bool,
    {
        let timeout_seconds = self.config.default_timeout_seconds;
        self.wait_until(predicate, timeout_seconds)
    }

    pub fn wait_ticks(&mut self, ticks: u32) -> Result<(), ProbeError> {
        self.run(&mut WaitTicks::new(ticks))
    }

    /// Parks the caller for `ticks` ticks. The unbounded wait never finishes
    /// on its own, so the tick count is the only exit.
    pub fn wait_forever_for(&mut self, ticks: u64) -> Result<(), ProbeError> {
        let finished = self
            .scheduler
            .run_for_ticks(&mut WaitForever, &mut self.host, ticks)?;
        if finished {
            warn!(ticks, "wait_forever_finished_unexpectedly");
        }
        Ok(())
    }
}

impl<H> ProbeDriver<H>
where
    H: HitTestHost + HandlerTree + TickHost,
{
    pub fn click(&mut self, click: ClickSimulation) -> Result<ClickOutcome, ProbeError> {
        let mut click = click.with_max_handler_depth(self.config.max_handler_depth);
        self.run(&mut click)?;
        let outcome = click.outcome();
        self.stats.record_click(&outcome);
        Ok(outcome)
    }

    pub fn click_at(&mut self, point: ScreenPoint) -> Result<ClickOutcome, ProbeError> {
        self.click(ClickSimulation::at(point))
    }

    pub fn click_rect_center(&mut self, rect: ScreenRect) -> Result<ClickOutcome, ProbeError> {
        self.click(ClickSimulation::at_rect_center(rect))
    }

    pub fn click_rect_relative(
        &mut self,
        rect: ScreenRect,
        rel_x: f32,
        rel_y: f32,
    ) -> Result<ClickOutcome, ProbeError> {
        self.click(ClickSimulation::at_rect_relative(rect, rel_x, rel_y))
    }
}

impl<H> ProbeDriver<H>
where
    H: HitTestHost + HandlerTree + TickHost + ScreenInfo,
{
    pub fn click_bounds_center(&mut self, bounds: Bounds3) -> Result<ClickOutcome, ProbeError> {
        let camera = self
            .host
            .main_camera()
            .ok_or_else(|| ProbeError::NotFound {
                what: "main camera".to_string(),
                location: "the scene".to_string(),
            })?;
        let viewport = self.host.viewport();
        self.click(ClickSimulation::at_bounds_center(bounds, &camera, viewport))
    }

    pub fn click_lower_half(&mut self) -> Result<ClickOutcome, ProbeError> {
        let viewport = self.host.viewport();
        self.click(ClickSimulation::lower_half(viewport))
    }

    pub fn click_upper_half(&mut self) -> Result<ClickOutcome, ProbeError> {
        let viewport = self.host.viewport();
        self.click(ClickSimulation::upper_half(viewport))
    }
}

impl<H> ProbeDriver<H>
where
    H: HitTestHost + HandlerTree + TickHost + ScreenInfo + SceneQuery,
{
    /// Clicks the center of the entity's screen rectangle.
    pub fn click_entity(&mut self, entity: EntityId) -> Result<ClickOutcome, ProbeError> {
        let rect = screen_rect_of(&self.host, entity)?;
        self.click_rect_center(rect)
    }

    pub fn click_entity_relative(
        &mut self,
        entity: EntityId,
        rel_x: f32,
        rel_y: f32,
    ) -> Result<ClickOutcome, ProbeError> {
        let rect = screen_rect_of(&self.host, entity)?;
        self.click_rect_relative(rect, rel_x, rel_y)
    }

    /// Clicks where the center of the entity's bounding volume projects.
    pub fn click_entity_bounds(&mut self, entity: EntityId) -> Result<ClickOutcome, ProbeError> {
        let bounds = bounds_of(&self.host, entity)?;
        self.click_bounds_center(bounds)
    }
}
