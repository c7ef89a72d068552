//! Session command surface
//!
//! A `Session` owns one simulation on behalf of one remote client. The
//! transport hands it [`Command`]s one at a time and forwards the returned
//! [`Response`]s; nothing here blocks or performs I/O.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{LevelError, PolicyError};
use crate::level::{LevelCatalog, LevelDescriptor, LevelSummary};
use crate::policy::{NavigationHeuristic, PolicyHandle};
use crate::settings::Settings;
use crate::sim::{RenderSnapshot, SimState, TickOutcome, tick};

/// Who supplies the per-tick decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Jumps come from `jump` commands
    #[default]
    Manual,
    /// Jumps come from the shared policy
    Autopilot,
}

/// Inbound command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    LoadLevel { level_id: String },
    SetMode { mode: Mode },
    /// Queue a jump for the next tick (manual mode only)
    Jump,
    Tick,
    Reset,
    ListLevels,
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    LevelLoaded {
        level_id: String,
        state: RenderSnapshot,
    },
    ModeChanged {
        mode: Mode,
    },
    Jump {
        accepted: bool,
    },
    StateUpdate {
        state: RenderSnapshot,
        #[serde(rename = "shouldJump")]
        should_jump: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy_fault: Option<String>,
    },
    Reset {
        state: RenderSnapshot,
    },
    Levels {
        levels: Vec<LevelSummary>,
    },
    Error {
        message: String,
    },
}

/// Result of one session tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub state: RenderSnapshot,
    /// Decision applied this tick
    pub decision: bool,
    pub outcome: TickOutcome,
    /// Policy failure that was downgraded to "no jump"
    pub fault: Option<PolicyError>,
}

#[derive(Debug)]
pub struct Session {
    settings: Settings,
    catalog: Arc<LevelCatalog>,
    policy: PolicyHandle,
    state: SimState,
    level_id: String,
    descriptor: LevelDescriptor,
    mode: Mode,
    pending_jump: bool,
    /// Source of per-run seeds
    seeds: Pcg32,
}

impl Session {
    /// Create a session running the catalog's default level
    pub fn new(
        settings: Settings,
        catalog: Arc<LevelCatalog>,
        policy: PolicyHandle,
        seed: u64,
    ) -> Result<Self, LevelError> {
        let mut seeds = Pcg32::seed_from_u64(seed);
        let level_id = catalog.default_id().to_string();
        let (_, descriptor) = catalog.resolve(&level_id);
        let descriptor = descriptor.clone();
        let state = SimState::load(&descriptor, &settings, seeds.random())?;

        Ok(Self {
            settings,
            catalog,
            policy,
            state,
            level_id,
            descriptor,
            mode: Mode::default(),
            pending_jump: false,
            seeds,
        })
    }

    /// Session with default settings, built-in levels and the heuristic
    pub fn with_defaults(seed: u64) -> Result<Self, LevelError> {
        let settings = Settings::default();
        let policy = PolicyHandle::new(NavigationHeuristic::for_settings(&settings));
        Self::new(settings, Arc::new(LevelCatalog::builtin()), policy, seed)
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Dispatch one wire command
    pub fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::LoadLevel { level_id } => match self.load_level(&level_id) {
                Ok(resolved) => Response::LevelLoaded {
                    level_id: resolved,
                    state: self.state.render_snapshot(),
                },
                Err(err) => Response::Error {
                    message: err.to_string(),
                },
            },
            Command::SetMode { mode } => {
                self.set_mode(mode);
                Response::ModeChanged { mode }
            }
            Command::Jump => Response::Jump {
                accepted: self.jump(),
            },
            Command::Tick => {
                let report = self.tick();
                Response::StateUpdate {
                    state: report.state,
                    should_jump: report.decision,
                    policy_fault: report.fault.map(|e| e.to_string()),
                }
            }
            Command::Reset => match self.reset() {
                Ok(()) => Response::Reset {
                    state: self.state.render_snapshot(),
                },
                Err(err) => Response::Error {
                    message: err.to_string(),
                },
            },
            Command::ListLevels => Response::Levels {
                levels: self.catalog.summaries(),
            },
        }
    }

    /// Load a catalog level by id. Unknown ids load the default level.
    /// Returns the id actually loaded.
    pub fn load_level(&mut self, id: &str) -> Result<String, LevelError> {
        let catalog = Arc::clone(&self.catalog);
        let (resolved, descriptor) = catalog.resolve(id);
        self.load_descriptor(resolved, descriptor.clone())?;
        Ok(resolved.to_string())
    }

    /// Load an arbitrary descriptor. On error the running state is kept.
    pub fn load_descriptor(
        &mut self,
        id: impl Into<String>,
        descriptor: LevelDescriptor,
    ) -> Result<(), LevelError> {
        let id = id.into();
        // A rejected descriptor must not consume a seed
        descriptor.validate().inspect_err(|err| {
            log::warn!("Rejected level '{}': {}", id, err);
        })?;
        let seed = self.seeds.random();
        let state = SimState::load(&descriptor, &self.settings, seed).inspect_err(|err| {
            log::warn!("Rejected level '{}': {}", id, err);
        })?;

        log::info!(
            "Loaded level '{}' ({}), floor {:.1}",
            id,
            descriptor.name,
            state.floor()
        );
        self.state = state;
        self.level_id = id;
        self.descriptor = descriptor;
        self.pending_jump = false;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::info!("Mode changed to {:?}", mode);
        }
        self.mode = mode;
        self.pending_jump = false;
    }

    /// Queue a manual jump for the next tick. Ignored in autopilot and once
    /// the run is over.
    pub fn jump(&mut self) -> bool {
        let accepted = self.mode == Mode::Manual && !self.state.is_terminal();
        if accepted {
            self.pending_jump = true;
        }
        accepted
    }

    /// Advance one frame using the current mode's decision source
    pub fn tick(&mut self) -> TickReport {
        let mut fault = None;
        let decision = if self.state.is_terminal() {
            self.pending_jump = false;
            false
        } else {
            match self.mode {
                Mode::Manual => std::mem::take(&mut self.pending_jump),
                Mode::Autopilot => match self.policy.decide(&self.state.decision_snapshot()) {
                    Ok(jump) => jump,
                    Err(err) => {
                        log::warn!(
                            "Frame {}: policy fault, not jumping: {}",
                            self.state.frame() + 1,
                            err
                        );
                        fault = Some(err);
                        false
                    }
                },
            }
        };

        let outcome = tick(&mut self.state, decision);
        if let TickOutcome::Advanced {
            collision: Some(hit),
            ..
        } = outcome
        {
            log::info!(
                "Run on '{}' ended at frame {} with score {} ({:?})",
                self.level_id,
                self.state.frame(),
                self.state.score(),
                hit
            );
        }

        TickReport {
            state: self.state.render_snapshot(),
            decision,
            outcome,
            fault,
        }
    }

    /// Restart the current level with the same floor and gaps
    pub fn reset(&mut self) -> Result<(), LevelError> {
        let state = SimState::load(&self.descriptor, &self.settings, self.state.seed())?;
        log::info!("Reset level '{}'", self.level_id);
        self.state = state;
        self.pending_jump = false;
        Ok(())
    }
}
