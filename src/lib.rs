//! Storyteller session engine for Blood on the Clocktower.
//!
//! A [`Session`] holds the one live game. Setup checks ([`setup`]) and the
//! night order ([`night`]) are recomputed from it on demand against a
//! [`Script`] from the [`ScriptCatalog`]; [`dawn`] resolves each night.

pub mod config;
pub mod dawn;
pub mod names;
pub mod night;
pub mod script;
pub mod session;
pub mod setup;
pub mod snapshot;

pub use dawn::{resolve_night, DawnReport, KillOutcome};
pub use names::SavedPlayerNames;
pub use night::NightType;
pub use script::{
    NightStep, RoleDistribution, Script, ScriptCatalog, ScriptError, SetupModifier, Team,
};
pub use session::{resize_roster, Phase, Player, Reminders, Session};
pub use setup::{recommend_fill, validate_setup, SetupReport};
pub use snapshot::{SnapshotStore, StoreError};
