// Session state: the single mutable aggregate a running game owns.
//
// Setup validation and night progression are recomputed from this value on
// every read; nothing derived is cached here.

use serde::Serialize;

use crate::names::SavedPlayerNames;
use crate::script::{Script, ScriptCatalog, Team};
use crate::setup;

pub const MIN_PLAYERS: u8 = 5;
pub const MAX_PLAYERS: u8 = 15;
pub const DEFAULT_PLAYER_COUNT: u8 = 8;
pub const MAX_BAG_SIZE: usize = MAX_PLAYERS as usize;

pub fn clamp_player_count(count: i64) -> u8 {
    count.clamp(MIN_PLAYERS as i64, MAX_PLAYERS as i64) as u8
}

pub fn default_player_name(id: u8) -> String {
    format!("Player {}", id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: u8,
    pub name: String,
    /// Assigned role, `None` while unassigned.
    pub character: Option<String>,
    pub is_alive: bool,
    pub is_drunk: bool,
    pub is_poisoned: bool,
}

impl Player {
    pub fn new(id: u8) -> Self {
        Player::with_name(id, default_player_name(id))
    }

    pub fn with_name(id: u8, name: impl Into<String>) -> Self {
        Player {
            id,
            name: name.into(),
            character: None,
            is_alive: true,
            is_drunk: false,
            is_poisoned: false,
        }
    }

    /// A seat for games where roles are not dealt to named people: the
    /// player is simply called by their role.
    pub fn named_after_role(id: u8, role: &str) -> Self {
        Player {
            character: Some(role.to_string()),
            ..Player::with_name(id, role)
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.character.as_deref() == Some(role)
    }
}

/// Resize a roster to `target_count` seats (clamped to the legal range).
///
/// Seats are renumbered 1..=n. Players at indices present in both rosters
/// keep every other field; overflow is discarded and new seats get
/// default players.
pub fn resize_roster(players: &[Player], target_count: u8) -> Vec<Player> {
    let target = clamp_player_count(target_count as i64);
    (1..=target)
        .map(|id| match players.get(id as usize - 1) {
            Some(existing) => Player {
                id,
                ..existing.clone()
            },
            None => Player::new(id),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No night has been started yet.
    #[default]
    Idle,
    /// A night's action sequence is in progress.
    Running,
    /// Day, between two nights.
    Between,
}

impl Phase {
    pub fn from_tag(tag: &str) -> Option<Phase> {
        match tag {
            "idle" => Some(Phase::Idle),
            "running" => Some(Phase::Running),
            "between" => Some(Phase::Between),
            _ => None,
        }
    }
}

/// Per-night scratch notes, cleared at every dawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reminders {
    pub kill_target: Option<u8>,
    pub protect_target: Option<u8>,
    pub notes: String,
}

impl Reminders {
    pub fn is_empty(&self) -> bool {
        self.kill_target.is_none() && self.protect_target.is_none() && self.notes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub(crate) script_id: Option<String>,
    pub(crate) skip_assignments: bool,
    pub(crate) player_count: u8,
    pub(crate) players: Vec<Player>,
    pub(crate) role_bag: Vec<String>,
    pub(crate) drunk_extra_role: Option<String>,
    pub(crate) phase: Phase,
    pub(crate) nights_completed: u32,
    pub(crate) active_step: Option<usize>,
    pub(crate) reminders: Reminders,
    pub(crate) dawn_summary: String,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            script_id: None,
            skip_assignments: true,
            player_count: DEFAULT_PLAYER_COUNT,
            players: (1..=DEFAULT_PLAYER_COUNT).map(Player::new).collect(),
            role_bag: Vec::new(),
            drunk_extra_role: None,
            phase: Phase::Idle,
            nights_completed: 0,
            active_step: None,
            reminders: Reminders::default(),
            dawn_summary: String::new(),
        }
    }

    /// Hard reset: throw the whole game away.
    pub fn reset(&mut self) {
        *self = Session::new();
        tracing::info!(target: "botc_night::session", "session.reset");
    }

    pub fn script_id(&self) -> Option<&str> {
        self.script_id.as_deref()
    }

    pub fn script<'a>(&self, catalog: &'a ScriptCatalog) -> Option<&'a Script> {
        self.script_id.as_deref().and_then(|id| catalog.get(id))
    }

    pub fn skip_assignments(&self) -> bool {
        self.skip_assignments
    }

    pub fn player_count(&self) -> u8 {
        self.player_count
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: u8) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn role_bag(&self) -> &[String] {
        &self.role_bag
    }

    pub fn drunk_extra_role(&self) -> Option<&str> {
        self.drunk_extra_role.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn nights_completed(&self) -> u32 {
        self.nights_completed
    }

    pub fn active_step_index(&self) -> Option<usize> {
        self.active_step
    }

    pub fn reminders(&self) -> &Reminders {
        &self.reminders
    }

    pub fn dawn_summary(&self) -> &str {
        &self.dawn_summary
    }

    pub fn bag_contains(&self, role: &str) -> bool {
        self.role_bag.iter().any(|r| r == role)
    }

    /// Select a script by id. Switching scripts empties the bag, since roles
    /// of one script mean nothing on another. Ignored while a night runs.
    pub fn select_script(&mut self, catalog: &ScriptCatalog, id: &str) {
        if self.phase == Phase::Running {
            return;
        }
        let next = catalog.get(id).map(|script| script.id().to_string());
        if next != self.script_id {
            self.role_bag.clear();
            self.drunk_extra_role = None;
        }
        tracing::debug!(target: "botc_night::session", script = ?next, "session.script_selected");
        self.script_id = next;
    }

    pub fn set_skip_assignments(&mut self, skip: bool) {
        self.skip_assignments = skip;
    }

    // ===== ROSTER =====

    pub fn apply_player_count(&mut self, count: i64) {
        let normalized = clamp_player_count(count);
        self.player_count = normalized;
        self.players = resize_roster(&self.players, normalized);
    }

    pub fn add_player(&mut self) {
        if self.players.len() >= MAX_PLAYERS as usize {
            return;
        }
        self.apply_player_count(self.players.len() as i64 + 1);
    }

    /// Rename a seat. Names other than the seat's default are remembered.
    pub fn set_player_name(&mut self, id: u8, name: &str, saved: &mut SavedPlayerNames) {
        let trimmed = name.trim();
        if !trimmed.is_empty() && trimmed != default_player_name(id) {
            saved.add(trimmed);
        }
        if let Some(player) = self.players.iter_mut().find(|player| player.id == id) {
            player.name = name.to_string();
        }
    }

    /// Deal a role to a seat. Only roles in the bag that no other seat holds
    /// are accepted; `None` clears the seat.
    pub fn assign_character(&mut self, id: u8, role: Option<&str>) {
        if let Some(role) = role {
            if !setup::assignable_roles(&self.role_bag, &self.players, id)
                .iter()
                .any(|option| option == role)
            {
                return;
            }
        }
        if let Some(player) = self.players.iter_mut().find(|player| player.id == id) {
            player.character = role.map(str::to_string);
        }
    }

    pub fn toggle_alive(&mut self, id: u8) {
        self.update_player(id, |player| player.is_alive = !player.is_alive);
    }

    pub fn toggle_drunk(&mut self, id: u8) {
        self.update_player(id, |player| player.is_drunk = !player.is_drunk);
    }

    pub fn toggle_poisoned(&mut self, id: u8) {
        self.update_player(id, |player| player.is_poisoned = !player.is_poisoned);
    }

    fn update_player(&mut self, id: u8, update: impl FnOnce(&mut Player)) {
        if let Some(player) = self.players.iter_mut().find(|player| player.id == id) {
            update(player);
        }
    }

    /// Seat remembered names in order, one per seat, deduplicated. Seats
    /// beyond the supplied names fall back to their default name.
    pub fn seed_names<S: AsRef<str>>(&mut self, names: &[S]) {
        let mut chosen: Vec<&str> = Vec::new();
        for name in names.iter().map(|name| name.as_ref().trim()) {
            if !name.is_empty() && !chosen.contains(&name) {
                chosen.push(name);
            }
        }
        chosen.truncate(self.player_count as usize);

        let mut players = resize_roster(&self.players, self.player_count);
        for (index, player) in players.iter_mut().enumerate() {
            player.name = match chosen.get(index) {
                Some(name) => name.to_string(),
                None => default_player_name(player.id),
            };
        }
        self.players = players;
    }

    pub fn fill_with_default_names(&mut self) {
        self.seed_names::<&str>(&[]);
    }

    /// Without a deal, each bag role becomes its own seat named after the role.
    /// Once the first night has started the roster is left alone.
    pub fn apply_skip_assignments(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        let roles: Vec<&String> = self
            .role_bag
            .iter()
            .take(self.player_count as usize)
            .collect();
        if roles.is_empty() {
            return;
        }
        self.players = roles
            .into_iter()
            .enumerate()
            .map(|(index, role)| Player::named_after_role(index as u8 + 1, role))
            .collect();
        // A short bag would otherwise leave the roster smaller than the count.
        if self.players.len() != self.player_count as usize {
            self.players = resize_roster(&self.players, self.player_count);
        }
    }

    /// Seat the bag before the first night when roles are not being dealt.
    pub fn seat_roles_for_night(&mut self) {
        if self.skip_assignments {
            self.apply_skip_assignments();
        }
    }

    // ===== ROLE BAG =====

    /// Add or remove a role. Unknown roles and a full bag are ignored;
    /// dropping the Drunk forgets the Drunk's extra role.
    pub fn toggle_role(&mut self, catalog: &ScriptCatalog, role: &str) {
        let Some(script) = self.script(catalog) else {
            return;
        };
        if !script.has_role(role) {
            return;
        }
        if self.bag_contains(role) {
            self.role_bag.retain(|r| r != role);
        } else if self.role_bag.len() < MAX_BAG_SIZE {
            self.role_bag.push(role.to_string());
        }
        self.forget_drunk_extra_if_absent(script);
    }

    /// Replace the bag wholesale, keeping only unique script roles.
    pub fn set_role_bag<S: AsRef<str>>(&mut self, catalog: &ScriptCatalog, roles: &[S]) {
        let Some(script) = self.script(catalog) else {
            return;
        };
        let mut bag: Vec<String> = Vec::new();
        for role in roles.iter().map(AsRef::as_ref) {
            if script.has_role(role) && !bag.iter().any(|r| r == role) && bag.len() < MAX_BAG_SIZE
            {
                bag.push(role.to_string());
            }
        }
        self.role_bag = bag;
        self.forget_drunk_extra_if_absent(script);
    }

    pub fn apply_recommended_fill(&mut self, catalog: &ScriptCatalog) {
        let Some(script) = self.script(catalog) else {
            return;
        };
        let recommended = setup::recommend_fill(script, self.player_count, &self.role_bag);
        self.set_role_bag(catalog, &recommended);
    }

    /// Choose the Townsfolk the Drunk believes they are. Ignored unless the
    /// Drunk is in the bag and the role is a Townsfolk on the current script.
    pub fn set_drunk_extra_role(&mut self, catalog: &ScriptCatalog, role: Option<&str>) {
        let Some(script) = self.script(catalog) else {
            return;
        };
        match role {
            None => self.drunk_extra_role = None,
            Some(role) => {
                if self.drunk_in_bag(script) && script.team_of(role) == Some(Team::Townsfolk) {
                    self.drunk_extra_role = Some(role.to_string());
                }
            }
        }
    }

    fn drunk_in_bag(&self, script: &Script) -> bool {
        script.drunk_role().is_some_and(|drunk| self.bag_contains(drunk))
    }

    fn forget_drunk_extra_if_absent(&mut self, script: &Script) {
        if !self.drunk_in_bag(script) {
            self.drunk_extra_role = None;
        }
    }

    /// Drop whatever a loaded session holds that its script cannot back:
    /// roles the script does not know, and a Drunk extra role without the
    /// Drunk in the bag or that is not a Townsfolk.
    pub fn reconcile(&mut self, catalog: &ScriptCatalog) {
        let Some(script) = self.script(catalog) else {
            self.drunk_extra_role = None;
            return;
        };
        self.role_bag.retain(|role| script.has_role(role));
        self.forget_drunk_extra_if_absent(script);
        let extra_is_townsfolk = self
            .drunk_extra_role
            .as_deref()
            .map_or(true, |extra| script.team_of(extra) == Some(Team::Townsfolk));
        if !extra_is_townsfolk {
            self.drunk_extra_role = None;
        }
    }

    /// The Drunk's pretend role, only while the Drunk is actually in play.
    pub(crate) fn live_drunk_extra(&self, script: &Script) -> Option<&str> {
        let drunk = script.drunk_role()?;
        if self.bag_contains(drunk) {
            self.drunk_extra_role.as_deref()
        } else {
            None
        }
    }

    // ===== REMINDERS =====

    pub fn set_kill_target(&mut self, id: Option<u8>) {
        self.reminders.kill_target = id;
    }

    pub fn set_protect_target(&mut self, id: Option<u8>) {
        self.reminders.protect_target = id;
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.reminders.notes = notes.to_string();
    }
}
