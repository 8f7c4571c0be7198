// Night progression: which step of the night order is next, and who wakes.
//
// The filtered sequence is never stored. Every query rescans the (short)
// night order against the current session.

use std::borrow::Cow;

use crate::dawn::NO_ACTIVE_ROLES_SUMMARY;
use crate::script::{NightStep, Script, ScriptCatalog};
use crate::session::{Phase, Player, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightType {
    First,
    Other,
}

impl NightType {
    pub fn order(self, script: &Script) -> &[NightStep] {
        match self {
            NightType::First => script.first_night_order(),
            NightType::Other => script.other_night_order(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            NightType::First => "First Night",
            NightType::Other => "Other Night",
        }
    }
}

impl Session {
    /// The first night uses its own order; every later night the other one.
    pub fn night_type(&self) -> NightType {
        if self.nights_completed == 0 {
            NightType::First
        } else {
            NightType::Other
        }
    }

    fn bag_has_minion_and_demon(&self, script: &Script) -> bool {
        let has_minion = self.role_bag.iter().any(|role| script.is_minion(role));
        let has_demon = self.role_bag.iter().any(|role| script.is_demon(role));
        has_minion && has_demon
    }

    /// Seats woken for a role: its holders, plus the Drunk when the role is
    /// the Drunk's pretend identity.
    fn players_for_role<'s>(&'s self, script: &Script, role: &str) -> Vec<&'s Player> {
        let is_drunk_extra = self.live_drunk_extra(script) == Some(role);
        let drunk = script.drunk_role();
        self.players
            .iter()
            .filter(|player| {
                player.has_role(role)
                    || (is_drunk_extra && drunk.is_some_and(|drunk| player.has_role(drunk)))
            })
            .collect()
    }

    /// Whether a step should be performed tonight.
    ///
    /// Reveal steps need both a minion and a demon in the bag. A role step
    /// needs the role in play (directly, or as the Drunk's pretend role).
    /// With nobody holding it the step still wakes so the Storyteller sees
    /// the prompt; otherwise a living holder or a dead-ability role is needed.
    pub fn is_step_active(&self, script: &Script, step: &NightStep) -> bool {
        let role = match step {
            NightStep::MinionInfo | NightStep::DemonInfo => {
                return self.bag_has_minion_and_demon(script)
            }
            NightStep::Role(role) => role.as_str(),
        };

        let is_drunk_extra = self.live_drunk_extra(script) == Some(role);
        if !self.bag_contains(role) && !is_drunk_extra {
            return false;
        }

        let holders = self.players_for_role(script, role);
        if holders.is_empty() {
            return true;
        }

        script.has_dead_ability(role) || holders.iter().any(|player| player.is_alive)
    }

    fn next_active_index(&self, script: &Script, from: usize) -> Option<usize> {
        let order = self.night_type().order(script);
        (from..order.len()).find(|&index| self.is_step_active(script, &order[index]))
    }

    /// Every step that would be performed for the upcoming (or running)
    /// night, in order.
    pub fn planned_steps(&self, catalog: &ScriptCatalog) -> Vec<NightStep> {
        let Some(script) = self.script(catalog) else {
            return Vec::new();
        };
        self.night_type()
            .order(script)
            .iter()
            .filter(|step| self.is_step_active(script, step))
            .cloned()
            .collect()
    }

    /// Begin the next night. With no script selected, or a night already
    /// running, nothing happens. A night with nothing to do goes straight
    /// to day.
    pub fn start_night(&mut self, catalog: &ScriptCatalog) {
        if self.phase == Phase::Running {
            return;
        }
        let Some(script) = self.script(catalog) else {
            return;
        };

        let night_type = self.night_type();
        self.dawn_summary.clear();

        match self.next_active_index(script, 0) {
            Some(index) => {
                self.active_step = Some(index);
                self.phase = Phase::Running;
                tracing::info!(
                    target: "botc_night::night",
                    night = ?night_type,
                    step = %night_type.order(script)[index],
                    "night.started"
                );
            }
            None => {
                self.active_step = None;
                self.phase = Phase::Between;
                self.dawn_summary = NO_ACTIVE_ROLES_SUMMARY.to_string();
                tracing::info!(
                    target: "botc_night::night",
                    night = ?night_type,
                    "night.no_active_roles"
                );
            }
        }
    }

    /// Move to the next active step, or end the night when none is left.
    pub fn advance_step(&mut self, catalog: &ScriptCatalog) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(script) = self.script(catalog) else {
            return;
        };

        let from = self.active_step.map_or(0, |index| index + 1);
        match self.next_active_index(script, from) {
            Some(index) => {
                self.active_step = Some(index);
                tracing::debug!(
                    target: "botc_night::night",
                    index,
                    step = %self.night_type().order(script)[index],
                    "night.step"
                );
            }
            None => {
                self.end_night();
            }
        }
    }

    pub fn current_step(&self, catalog: &ScriptCatalog) -> Option<NightStep> {
        if self.phase != Phase::Running {
            return None;
        }
        let script = self.script(catalog)?;
        let index = self.active_step?;
        self.night_type().order(script).get(index).cloned()
    }

    pub fn current_prompt<'a>(&self, catalog: &'a ScriptCatalog) -> Option<Cow<'a, str>> {
        let script = self.script(catalog)?;
        let step = self.current_step(catalog)?;
        Some(script.prompt_for(&step))
    }

    /// Seats woken for the active step. Empty for the reveal steps.
    pub fn current_players(&self, catalog: &ScriptCatalog) -> Vec<&Player> {
        let Some(script) = self.script(catalog) else {
            return Vec::new();
        };
        match self.current_step(catalog) {
            Some(NightStep::Role(role)) => self.players_for_role(script, &role),
            _ => Vec::new(),
        }
    }

    /// True when the Storyteller may hand out false information for the
    /// active step: a woken seat is drunk or poisoned, or the step is the
    /// Drunk's pretend role. Purely advisory.
    pub fn current_role_is_compromised(&self, catalog: &ScriptCatalog) -> bool {
        let Some(script) = self.script(catalog) else {
            return false;
        };
        let Some(NightStep::Role(role)) = self.current_step(catalog) else {
            return false;
        };
        let is_drunk_extra = self.live_drunk_extra(script) == Some(role.as_str());
        let players = self.players_for_role(script, &role);
        is_drunk_extra
            || players
                .iter()
                .any(|player| player.is_drunk || player.is_poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_session(bag: &[&str]) -> (ScriptCatalog, Session) {
        let catalog = ScriptCatalog::builtin();
        let mut session = Session::new();
        session.select_script(&catalog, "trouble-brewing");
        session.apply_player_count(bag.len().max(5) as i64);
        session.set_role_bag(&catalog, bag);
        (catalog, session)
    }

    fn step_names(steps: &[NightStep]) -> Vec<&str> {
        steps.iter().map(NightStep::name).collect()
    }

    #[test]
    fn test_night_type_follows_nights_completed() {
        let mut session = Session::new();
        assert_eq!(session.night_type(), NightType::First);
        session.nights_completed = 2;
        assert_eq!(session.night_type(), NightType::Other);
    }

    #[test]
    fn test_first_night_plan_for_unassigned_bag() {
        let (catalog, session) = running_session(&[
            "Washerwoman",
            "Chef",
            "Monk",
            "Soldier",
            "Butler",
            "Poisoner",
            "Imp",
        ]);
        assert_eq!(
            step_names(&session.planned_steps(&catalog)),
            ["Minion Info", "Demon Info", "Poisoner", "Washerwoman", "Chef", "Butler"]
        );
    }

    #[test]
    fn test_reveal_steps_need_minion_and_demon() {
        let (catalog, session) = running_session(&["Chef", "Empath", "Monk", "Soldier", "Imp"]);
        let plan = session.planned_steps(&catalog);
        assert!(!plan.contains(&NightStep::MinionInfo));
        assert!(!plan.contains(&NightStep::DemonInfo));
        assert_eq!(step_names(&plan), ["Chef", "Empath"]);
    }

    #[test]
    fn test_no_active_roles_goes_to_day() {
        let (catalog, mut session) =
            running_session(&["Virgin", "Slayer", "Soldier", "Mayor", "Monk"]);
        session.start_night(&catalog);
        assert_eq!(session.phase(), Phase::Between);
        assert_eq!(session.active_step_index(), None);
        assert_eq!(session.dawn_summary(), NO_ACTIVE_ROLES_SUMMARY);
        assert_eq!(session.nights_completed(), 0);
    }

    #[test]
    fn test_start_night_without_script_is_noop() {
        let catalog = ScriptCatalog::builtin();
        let mut session = Session::new();
        session.start_night(&catalog);
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_advance_outside_running_is_noop() {
        let (catalog, mut session) = running_session(&["Chef", "Poisoner", "Imp"]);
        let before = session.clone();
        session.advance_step(&catalog);
        session.end_night();
        assert_eq!(session, before);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let (catalog, mut session) = running_session(&["Chef", "Empath", "Poisoner", "Imp"]);
        session.start_night(&catalog);
        session.advance_step(&catalog);
        let before = session.clone();
        session.start_night(&catalog);
        assert_eq!(session, before);
    }

    #[test]
    fn test_advance_walks_plan_then_ends_night() {
        let (catalog, mut session) = running_session(&["Chef", "Empath", "Poisoner", "Imp"]);
        let plan = session.planned_steps(&catalog);
        let order_len = script_order_len(&catalog, &session);

        session.start_night(&catalog);
        let mut visited = Vec::new();
        let mut calls = 0;
        while session.phase() == Phase::Running {
            visited.push(session.current_step(&catalog).unwrap());
            session.advance_step(&catalog);
            calls += 1;
            assert!(calls <= order_len);
        }
        assert_eq!(visited, plan);
        assert_eq!(session.phase(), Phase::Between);
        assert_eq!(session.nights_completed(), 1);
        assert_eq!(session.night_type(), NightType::Other);
    }

    fn script_order_len(catalog: &ScriptCatalog, session: &Session) -> usize {
        let script = session.script(catalog).unwrap();
        session.night_type().order(script).len()
    }

    #[test]
    fn test_dead_holder_skipped_unless_dead_ability() {
        let (catalog, mut session) =
            running_session(&["Monk", "Ravenkeeper", "Empath", "Poisoner", "Imp"]);
        session.nights_completed = 1;
        for (id, role) in [(1, "Monk"), (2, "Ravenkeeper"), (3, "Empath")] {
            session.assign_character(id, Some(role));
        }
        session.toggle_alive(1);
        session.toggle_alive(2);

        let plan = session.planned_steps(&catalog);
        assert_eq!(
            step_names(&plan),
            ["Poisoner", "Imp", "Ravenkeeper", "Empath"]
        );
    }

    #[test]
    fn test_drunk_wakes_as_extra_role() {
        let (catalog, mut session) =
            running_session(&["Chef", "Monk", "Drunk", "Poisoner", "Imp"]);
        session.set_drunk_extra_role(&catalog, Some("Empath"));
        session.assign_character(3, Some("Drunk"));

        let plan = session.planned_steps(&catalog);
        assert!(plan.contains(&NightStep::Role("Empath".to_string())));

        session.start_night(&catalog);
        while session.current_step(&catalog) != Some(NightStep::Role("Empath".to_string())) {
            session.advance_step(&catalog);
        }
        let woken: Vec<u8> = session.current_players(&catalog).iter().map(|p| p.id).collect();
        assert_eq!(woken, [3]);
        assert!(session.current_role_is_compromised(&catalog));
    }

    #[test]
    fn test_dead_drunk_skips_extra_role() {
        let (catalog, mut session) =
            running_session(&["Chef", "Monk", "Drunk", "Poisoner", "Imp"]);
        session.set_drunk_extra_role(&catalog, Some("Empath"));
        session.assign_character(3, Some("Drunk"));
        session.toggle_alive(3);
        let plan = session.planned_steps(&catalog);
        assert!(!plan.contains(&NightStep::Role("Empath".to_string())));
    }

    #[test]
    fn test_poisoned_holder_is_compromised() {
        let (catalog, mut session) = running_session(&["Chef", "Empath", "Poisoner", "Imp"]);
        session.assign_character(1, Some("Chef"));
        session.toggle_poisoned(1);
        session.start_night(&catalog);
        while session.current_step(&catalog) != Some(NightStep::Role("Chef".to_string())) {
            assert!(!session.current_role_is_compromised(&catalog));
            session.advance_step(&catalog);
        }
        assert!(session.current_role_is_compromised(&catalog));
        assert_eq!(
            session.current_prompt(&catalog).as_deref(),
            Some("Chef: Give number of adjacent evil pairs.")
        );
    }

    #[test]
    fn test_reveal_step_wakes_nobody() {
        let (catalog, mut session) = running_session(&["Chef", "Empath", "Poisoner", "Imp"]);
        session.assign_character(3, Some("Poisoner"));
        session.start_night(&catalog);
        assert_eq!(session.current_step(&catalog), Some(NightStep::MinionInfo));
        assert!(session.current_players(&catalog).is_empty());
        assert!(!session.current_role_is_compromised(&catalog));
    }
}
