use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};
use ui_probe::{
    find_by_name, screen_rect_of, ClickOutcome, EntityId, HitTestHost, ProbeConfig, ProbeDriver,
    ProbeStats, SceneQuery, ScreenPoint, UiScene,
};

use super::commands::DemoCommand;
use super::error::DemoError;
use super::layout::LoadedLayout;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportedEntity {
    pub(crate) id: u64,
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportedCandidate {
    pub(crate) entity: ReportedEntity,
    pub(crate) module: u32,
    pub(crate) camera_depth: Option<f32>,
    pub(crate) sorting_layer: u32,
    pub(crate) sorting_order: i32,
    pub(crate) depth: i32,
    pub(crate) distance: f32,
    pub(crate) index: usize,
    pub(crate) alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub(crate) enum CommandReport {
    Probe {
        point: ScreenPoint,
        topmost: Option<ReportedEntity>,
        candidates: Vec<ReportedCandidate>,
    },
    Click {
        target: Option<String>,
        outcome: ClickOutcome,
        receiver: Option<ReportedEntity>,
        closed: Option<ReportedEntity>,
    },
    Despawn {
        entity: ReportedEntity,
    },
    WaitGone {
        name: String,
        ticks: u64,
    },
    WaitTicks {
        ticks: u64,
    },
    Stats {
        stats: ProbeStats,
    },
}

/// A loaded layout behind a driver, executing commands one at a time.
#[derive(Debug)]
pub(crate) struct DemoSession {
    driver: ProbeDriver<UiScene>,
    closes_on_click: HashMap<EntityId, EntityId>,
}

impl DemoSession {
    pub(crate) fn new(loaded: LoadedLayout, config: ProbeConfig) -> Self {
        Self {
            driver: ProbeDriver::new(loaded.scene, config),
            closes_on_click: loaded.closes_on_click,
        }
    }

    pub(crate) fn driver(&self) -> &ProbeDriver<UiScene> {
        &self.driver
    }

    pub(crate) fn execute(&mut self, command: &DemoCommand) -> Result<CommandReport, DemoError> {
        match command {
            DemoCommand::Probe { x, y } => Ok(self.probe(ScreenPoint::new(*x, *y))),
            DemoCommand::Click { x, y } => {
                let outcome = self.driver.click_at(ScreenPoint::new(*x, *y))?;
                Ok(self.finish_click(None, outcome))
            }
            DemoCommand::ClickNamed { name, relative } => {
                let entity = find_by_name(self.driver.host(), name, None)?;
                let outcome = match relative {
                    Some((rel_x, rel_y)) => {
                        let rect = screen_rect_of(self.driver.host(), entity)?;
                        self.driver.click_rect_relative(rect, *rel_x, *rel_y)?
                    }
                    None => self.driver.click_entity(entity)?,
                };
                Ok(self.finish_click(Some(name.clone()), outcome))
            }
            DemoCommand::ClickBounds { name } => {
                let entity = find_by_name(self.driver.host(), name, None)?;
                let outcome = self.driver.click_entity_bounds(entity)?;
                Ok(self.finish_click(Some(name.clone()), outcome))
            }
            DemoCommand::ClickLowerHalf => {
                let outcome = self.driver.click_lower_half()?;
                Ok(self.finish_click(None, outcome))
            }
            DemoCommand::ClickUpperHalf => {
                let outcome = self.driver.click_upper_half()?;
                Ok(self.finish_click(None, outcome))
            }
            DemoCommand::Despawn { name } => {
                let entity = find_by_name(self.driver.host(), name, None)?;
                let reported = self.report_entity(entity);
                self.driver.host_mut().despawn(entity);
                Ok(CommandReport::Despawn { entity: reported })
            }
            DemoCommand::WaitGone {
                name,
                timeout_seconds,
            } => {
                let start = self.driver.ticks_elapsed();
                let gone = |scene: &UiScene| scene.entities_named(name, None).is_empty();
                match timeout_seconds {
                    Some(timeout_seconds) => self.driver.wait_until(gone, *timeout_seconds)?,
                    None => self.driver.wait_until_default(gone)?,
                }
                Ok(CommandReport::WaitGone {
                    name: name.clone(),
                    ticks: self.driver.ticks_elapsed() - start,
                })
            }
            DemoCommand::WaitTicks { ticks } => {
                let start = self.driver.ticks_elapsed();
                self.driver.wait_ticks(*ticks)?;
                Ok(CommandReport::WaitTicks {
                    ticks: self.driver.ticks_elapsed() - start,
                })
            }
            DemoCommand::Stats => Ok(CommandReport::Stats {
                stats: self.driver.stats(),
            }),
        }
    }

    fn probe(&self, point: ScreenPoint) -> CommandReport {
        let scene = self.driver.host();
        let candidates = self
            .driver
            .ranked_at(point)
            .into_iter()
            .map(|candidate| ReportedCandidate {
                entity: self.report_entity(candidate.entity),
                module: candidate.module.id.0,
                camera_depth: candidate.module.camera_depth,
                sorting_layer: candidate.sorting_layer.0,
                sorting_order: candidate.sorting_order,
                depth: candidate.depth,
                distance: candidate.distance,
                index: candidate.index,
                alive: scene.is_alive(candidate.entity),
            })
            .collect();
        CommandReport::Probe {
            point,
            topmost: self
                .driver
                .topmost_at(point)
                .map(|entity| self.report_entity(entity)),
            candidates,
        }
    }

    fn finish_click(&mut self, target: Option<String>, outcome: ClickOutcome) -> CommandReport {
        let target_closed = outcome
            .click_handler
            .and_then(|handler| self.closes_on_click.get(&handler).copied());
        let mut closed = None;
        if let Some(target) = target_closed {
            closed = Some(self.report_entity(target));
            if self.driver.host_mut().despawn(target) {
                info!(entity = ?target, "element_closed");
            } else {
                warn!(entity = ?target, "close_target_missing");
            }
        }
        CommandReport::Click {
            target,
            receiver: outcome.receiver.map(|entity| self.report_entity(entity)),
            outcome,
            closed,
        }
    }

    fn report_entity(&self, entity: EntityId) -> ReportedEntity {
        ReportedEntity {
            id: entity.0,
            name: self
                .driver
                .host()
                .entity_name(entity)
                .map(ToString::to_string),
        }
    }
}

/// Runs `commands` in order and writes one JSON report per line. Stops at the
/// first failing command.
pub(crate) fn run_commands<W: Write>(
    session: &mut DemoSession,
    commands: &[DemoCommand],
    out: &mut W,
) -> Result<(), DemoError> {
    for command in commands {
        let report = session.execute(command)?;
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
    }
    info!(
        commands = commands.len(),
        ticks = session.driver().ticks_elapsed(),
        "demo_commands_finished"
    );
    Ok(())
}
