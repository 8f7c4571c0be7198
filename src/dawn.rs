// End of night: apply the recorded kill and protection, then report at dawn.

use crate::session::{Phase, Player, Reminders, Session};

pub const NO_ACTIVE_ROLES_SUMMARY: &str = "No active roles this night. Move to day phase.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// No kill was recorded, or it named an empty seat.
    None,
    Protected,
    AlreadyDead,
    Killed { name: String },
}

impl KillOutcome {
    pub fn summary(&self) -> String {
        match self {
            KillOutcome::Killed { name } => {
                format!("These players died: {}. Wake the town.", name)
            }
            KillOutcome::Protected => {
                "These players died: nobody (target was protected). Wake the town.".to_string()
            }
            KillOutcome::AlreadyDead => {
                "These players died: nobody (target was already dead). Wake the town.".to_string()
            }
            KillOutcome::None => "These players died: nobody. Wake the town.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DawnReport {
    pub outcome: KillOutcome,
    pub summary: String,
}

/// Apply the night's kill to the roster.
///
/// Protection wins over everything, even for a target that is already dead.
/// Killing a dead player changes nothing.
pub fn resolve_night(players: &mut [Player], reminders: &Reminders) -> DawnReport {
    let outcome = match reminders.kill_target {
        None => KillOutcome::None,
        Some(target) if reminders.protect_target == Some(target) => KillOutcome::Protected,
        Some(target) => match players.iter_mut().find(|player| player.id == target) {
            None => KillOutcome::None,
            Some(player) if !player.is_alive => KillOutcome::AlreadyDead,
            Some(player) => {
                player.is_alive = false;
                KillOutcome::Killed {
                    name: player.name.clone(),
                }
            }
        },
    };

    DawnReport {
        summary: outcome.summary(),
        outcome,
    }
}

impl Session {
    /// Finish the running night: resolve the kill, clear the night's
    /// reminders and count the night as completed. Outside a running night
    /// this does nothing.
    pub fn end_night(&mut self) -> Option<DawnReport> {
        if self.phase != Phase::Running {
            return None;
        }

        let report = resolve_night(&mut self.players, &self.reminders);
        self.dawn_summary = report.summary.clone();
        self.reminders = Reminders::default();
        self.active_step = None;
        self.phase = Phase::Between;
        self.nights_completed = self.nights_completed.saturating_add(1);

        tracing::info!(
            target: "botc_night::dawn",
            nights_completed = self.nights_completed,
            outcome = ?report.outcome,
            "night.ended"
        );
        Some(report)
    }
}
