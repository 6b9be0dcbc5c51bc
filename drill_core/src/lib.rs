//! Core engine for the timed incident-response drill.
//!
//! A session starts in BRIEFING, runs a fixed countdown of ticks during
//! which faults spawn from the active track's catalog and drain system
//! health, and ends in exactly one of FAILED or SUCCEEDED. Every transition
//! is a pure step over [`SessionState`]; [`DrillSession`] is the mutable
//! slot hosts drive from their timer and input handlers.

pub mod catalog;
pub mod config;
pub mod debug;
pub mod decay;
pub mod fault;
pub mod host;
pub mod log;
pub mod machine;
pub mod outcome;
pub mod pipeline;
pub mod resolution;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod spawner;

pub use catalog::{
    templates_for_track, FaultKind, FaultTemplate, Severity, Track, TrackId, UnknownTrack,
};
pub use config::{
    load_drill_config_from_env, load_drill_config_or_builtin, DrillConfig, DrillConfigError,
    DrillConfigHandle, BUILTIN_DRILL_CONFIG, DRILL_CONFIG_ENV,
};
pub use debug::{DebugEntry, DebugOverlay};
pub use fault::{ActiveFault, FaultId};
pub use host::DrillSession;
pub use log::{LogEntry, LogLevel, SessionLog, BOOT_MESSAGE, DEFAULT_LOG_CAPACITY};
pub use machine::{begin, step_action, step_select, step_tick, TickReport};
pub use outcome::{Completion, Exit, SessionProof};
pub use pipeline::{build_tick_schedule, build_tick_world, run_tick};
pub use resolution::{
    resolution, ActionCategory, ActionId, ResolutionEntry, UnknownAction, Verdict,
};
pub use resolver::{ActionInput, ActionOutcome, NO_TARGET_MESSAGE};
pub use session::{InvariantViolation, Phase, SessionError, SessionState, MAX_HEALTH};
pub use snapshot::SessionSnapshot;
