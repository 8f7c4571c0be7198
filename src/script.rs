// Script catalog: the immutable rule data for each playable script
//
// A script is loaded from JSON and validated once. Everything downstream
// (setup validation, night order) only ever reads it.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_SCRIPTS: &str = include_str!("data/scripts.json");

/// Catalog spelling of the reveal pseudo-roles.
pub const MINION_INFO: &str = "Minion Info";
pub const DEMON_INFO: &str = "Demon Info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Team {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
}

impl Team {
    /// Category order used by every catalog-ordered scan.
    pub const ALL: [Team; 4] = [Team::Townsfolk, Team::Outsider, Team::Minion, Team::Demon];

    pub fn from_str_or_shorthand(s: &str) -> Option<Team> {
        match s.to_lowercase().as_str() {
            "townsfolk" | "tf" => Some(Team::Townsfolk),
            "outsider" | "os" => Some(Team::Outsider),
            "minion" | "mn" => Some(Team::Minion),
            "demon" | "imp" | "dm" => Some(Team::Demon),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Team::Townsfolk => "Townsfolk",
            Team::Outsider => "Outsider",
            Team::Minion => "Minion",
            Team::Demon => "Demon",
        }
    }

    const fn index(&self) -> usize {
        match self {
            Team::Townsfolk => 0,
            Team::Outsider => 1,
            Team::Minion => 2,
            Team::Demon => 3,
        }
    }
}

/// Per-team role counts. Used both for quota records and for the counts
/// actually present in a bag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDistribution {
    pub townsfolk: u8,
    pub outsider: u8,
    pub minion: u8,
    #[serde(rename = "imp", alias = "demon")]
    pub demon: u8,
}

impl RoleDistribution {
    pub fn total(&self) -> u8 {
        self.townsfolk
            .saturating_add(self.outsider)
            .saturating_add(self.minion)
            .saturating_add(self.demon)
    }

    pub fn get(&self, team: Team) -> u8 {
        match team {
            Team::Townsfolk => self.townsfolk,
            Team::Outsider => self.outsider,
            Team::Minion => self.minion,
            Team::Demon => self.demon,
        }
    }

    pub(crate) fn increment(&mut self, team: Team) {
        match team {
            Team::Townsfolk => self.townsfolk += 1,
            Team::Outsider => self.outsider += 1,
            Team::Minion => self.minion += 1,
            Team::Demon => self.demon += 1,
        }
    }
}

impl fmt::Display for RoleDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T/{}O/{}M/{}D",
            self.townsfolk, self.outsider, self.minion, self.demon
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupModifier {
    /// Baron: removes 2 townsfolk, adds 2 outsiders
    AdjustCounts {
        remove_townsfolk: u8,
        add_outsiders: u8,
    },
}

impl SetupModifier {
    pub fn apply(&self, distribution: &mut RoleDistribution) {
        match *self {
            SetupModifier::AdjustCounts {
                remove_townsfolk,
                add_outsiders,
            } => {
                distribution.townsfolk = distribution.townsfolk.saturating_sub(remove_townsfolk);
                distribution.outsider = distribution.outsider.saturating_add(add_outsiders);
            }
        }
    }

    pub fn describe(&self, role: &str) -> String {
        match self {
            SetupModifier::AdjustCounts {
                remove_townsfolk,
                add_outsiders,
            } => format!(
                "{} adds {} Outsiders and removes {} Townsfolk",
                role, add_outsiders, remove_townsfolk
            ),
        }
    }
}

/// One entry of a night order: either a real role or one of the two
/// reveal pseudo-roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NightStep {
    MinionInfo,
    DemonInfo,
    Role(String),
}

impl NightStep {
    pub fn from_name(name: &str) -> NightStep {
        match name {
            MINION_INFO => NightStep::MinionInfo,
            DEMON_INFO => NightStep::DemonInfo,
            role => NightStep::Role(role.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NightStep::MinionInfo => MINION_INFO,
            NightStep::DemonInfo => DEMON_INFO,
            NightStep::Role(role) => role,
        }
    }

    pub fn is_reveal(&self) -> bool {
        matches!(self, NightStep::MinionInfo | NightStep::DemonInfo)
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            NightStep::Role(role) => Some(role),
            _ => None,
        }
    }
}

impl fmt::Display for NightStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to parse script catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read script catalog from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("script catalog is empty")]
    Empty,
    #[error("duplicate script id `{0}`")]
    DuplicateId(String),
    #[error("script `{script}` lists role `{role}` more than once")]
    DuplicateRole { script: String, role: String },
    #[error("script `{script}` references unknown role `{role}` in {context}")]
    UnknownRole {
        script: String,
        role: String,
        context: &'static str,
    },
    #[error("script `{script}` quota for {player_count} players sums to {total}")]
    QuotaMismatch {
        script: String,
        player_count: u8,
        total: u8,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    scripts: Vec<ScriptEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptEntry {
    id: String,
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    categories: CategoryEntry,
    #[serde(default)]
    quotas: BTreeMap<u8, RoleDistribution>,
    #[serde(default)]
    first_night_order: Vec<String>,
    #[serde(default)]
    other_night_order: Vec<String>,
    #[serde(default)]
    prompts: HashMap<String, String>,
    #[serde(default)]
    minion_roles: Vec<String>,
    #[serde(default)]
    demon_roles: Vec<String>,
    #[serde(default)]
    dead_ability_roles: Vec<String>,
    #[serde(default)]
    drunk_role: Option<String>,
    #[serde(default)]
    setup_modifiers: HashMap<String, SetupModifier>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CategoryEntry {
    townsfolk: Vec<String>,
    outsider: Vec<String>,
    minion: Vec<String>,
    #[serde(alias = "demon")]
    imp: Vec<String>,
}

// Script: a named collection of roles plus the rules for running them
#[derive(Debug, Clone)]
pub struct Script {
    id: String,
    title: String,
    aliases: Vec<String>,
    categories: [Vec<String>; 4],
    teams: HashMap<String, Team>,
    quotas: BTreeMap<u8, RoleDistribution>,
    first_night_order: Vec<NightStep>,
    other_night_order: Vec<NightStep>,
    prompts: HashMap<String, String>,
    minion_roles: HashSet<String>,
    demon_roles: HashSet<String>,
    dead_ability_roles: HashSet<String>,
    drunk_role: Option<String>,
    setup_modifiers: HashMap<String, SetupModifier>,
}

impl Script {
    /// Trouble Brewing from the builtin catalog.
    pub fn trouble_brewing() -> Option<Self> {
        ScriptCatalog::builtin().get("trouble-brewing").cloned()
    }

    fn from_entry(entry: ScriptEntry) -> Result<Self, ScriptError> {
        let script_id = entry.id.clone();
        let unknown = |role: &str, context: &'static str| ScriptError::UnknownRole {
            script: script_id.clone(),
            role: role.to_string(),
            context,
        };

        let categories = [
            entry.categories.townsfolk,
            entry.categories.outsider,
            entry.categories.minion,
            entry.categories.imp,
        ];

        let mut teams = HashMap::new();
        for team in Team::ALL {
            for role in &categories[team.index()] {
                if teams.insert(role.clone(), team).is_some() {
                    return Err(ScriptError::DuplicateRole {
                        script: entry.id.clone(),
                        role: role.clone(),
                    });
                }
            }
        }

        for (&player_count, quota) in &entry.quotas {
            if quota.total() != player_count {
                return Err(ScriptError::QuotaMismatch {
                    script: entry.id.clone(),
                    player_count,
                    total: quota.total(),
                });
            }
        }

        let parse_order = |names: Vec<String>, context: &'static str| {
            names
                .into_iter()
                .map(|name| {
                    let step = NightStep::from_name(&name);
                    if let Some(role) = step.role() {
                        if !teams.contains_key(role) {
                            return Err(unknown(role, context));
                        }
                    }
                    Ok(step)
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let first_night_order = parse_order(entry.first_night_order, "first night order")?;
        let other_night_order = parse_order(entry.other_night_order, "other night order")?;

        for name in entry.prompts.keys() {
            if !NightStep::from_name(name).is_reveal() && !teams.contains_key(name) {
                return Err(unknown(name, "prompts"));
            }
        }

        let tag_set = |roles: Vec<String>, context: &'static str| {
            roles
                .into_iter()
                .map(|role| {
                    if teams.contains_key(&role) {
                        Ok(role)
                    } else {
                        Err(unknown(&role, context))
                    }
                })
                .collect::<Result<HashSet<_>, _>>()
        };
        let minion_roles = tag_set(entry.minion_roles, "minion roles")?;
        let demon_roles = tag_set(entry.demon_roles, "demon roles")?;
        let dead_ability_roles = tag_set(entry.dead_ability_roles, "dead ability roles")?;

        if let Some(drunk) = &entry.drunk_role {
            if !teams.contains_key(drunk) {
                return Err(unknown(drunk, "drunk role"));
            }
        }
        for role in entry.setup_modifiers.keys() {
            if !teams.contains_key(role) {
                return Err(unknown(role, "setup modifiers"));
            }
        }

        Ok(Script {
            id: entry.id,
            title: entry.name,
            aliases: entry.aliases,
            categories,
            teams,
            quotas: entry.quotas,
            first_night_order,
            other_night_order,
            prompts: entry.prompts,
            minion_roles,
            demon_roles,
            dead_ability_roles,
            drunk_role: entry.drunk_role,
            setup_modifiers: entry.setup_modifiers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self, team: Team) -> &[String] {
        &self.categories[team.index()]
    }

    /// Every role on the script: townsfolk, outsiders, minions, then demons,
    /// each in catalog order.
    pub fn all_roles(&self) -> impl Iterator<Item = &str> + '_ {
        Team::ALL
            .into_iter()
            .flat_map(move |team| self.category(team).iter().map(String::as_str))
    }

    /// Table quota for a player count, before any setup modifiers.
    /// `None` means the script defines no quota for that count.
    pub fn expected_setup(&self, player_count: u8) -> Option<RoleDistribution> {
        self.quotas.get(&player_count).copied()
    }

    pub fn team_of(&self, role: &str) -> Option<Team> {
        self.teams.get(role).copied()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.teams.contains_key(role)
    }

    pub fn first_night_order(&self) -> &[NightStep] {
        &self.first_night_order
    }

    pub fn other_night_order(&self) -> &[NightStep] {
        &self.other_night_order
    }

    pub fn is_minion(&self, role: &str) -> bool {
        self.minion_roles.contains(role)
    }

    pub fn is_demon(&self, role: &str) -> bool {
        self.demon_roles.contains(role)
    }

    pub fn has_dead_ability(&self, role: &str) -> bool {
        self.dead_ability_roles.contains(role)
    }

    pub fn drunk_role(&self) -> Option<&str> {
        self.drunk_role.as_deref()
    }

    pub fn setup_modifier(&self, role: &str) -> Option<SetupModifier> {
        self.setup_modifiers.get(role).copied()
    }

    /// Storyteller instruction for a step, falling back to a generic prompt.
    pub fn prompt_for(&self, step: &NightStep) -> Cow<'_, str> {
        match self.prompts.get(step.name()) {
            Some(prompt) => Cow::Borrowed(prompt.as_str()),
            None => Cow::Owned(format!("{}: Resolve this role now.", step.name())),
        }
    }

    fn matches_name(&self, normalized: &str) -> bool {
        normalize_script_name(&self.id) == normalized
            || normalize_script_name(&self.title) == normalized
            || self
                .aliases
                .iter()
                .any(|alias| normalize_script_name(alias) == normalized)
    }
}

fn normalize_script_name(name: &str) -> String {
    name.to_lowercase().replace(&[' ', '-', '_'][..], "")
}

/// The ordered list of scripts available to the Storyteller.
#[derive(Debug, Clone)]
pub struct ScriptCatalog {
    scripts: Vec<Script>,
    index: HashMap<String, usize>,
}

impl ScriptCatalog {
    pub fn builtin() -> Self {
        ScriptCatalog::from_json_str(BUILTIN_SCRIPTS).expect("builtin script catalog should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScriptError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        if file.scripts.is_empty() {
            return Err(ScriptError::Empty);
        }

        let mut scripts = Vec::with_capacity(file.scripts.len());
        let mut index = HashMap::new();
        for entry in file.scripts {
            let script = Script::from_entry(entry)?;
            if index.insert(script.id.clone(), scripts.len()).is_some() {
                return Err(ScriptError::DuplicateId(script.id));
            }
            scripts.push(script);
        }

        Ok(Self { scripts, index })
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(|source| ScriptError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        ScriptCatalog::from_json_str(&contents)
    }

    /// Load an override catalog if one is configured, otherwise the builtin.
    /// A broken override is logged and skipped.
    pub fn load(override_path: Option<&Path>) -> Self {
        if let Some(path) = override_path {
            match ScriptCatalog::from_file(path) {
                Ok(catalog) => {
                    tracing::info!(
                        target: "botc_night::script",
                        path = %path.display(),
                        scripts = catalog.len(),
                        "script_catalog.loaded=file"
                    );
                    return catalog;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "botc_night::script",
                        path = %path.display(),
                        error = %err,
                        "script_catalog.load_failed"
                    );
                }
            }
        }
        ScriptCatalog::builtin()
    }

    pub fn get(&self, id: &str) -> Option<&Script> {
        self.index.get(id).and_then(|idx| self.scripts.get(*idx))
    }

    /// Lenient lookup by id, title or alias ("Trouble Brewing", "trouble_brewing", "tb").
    pub fn from_name(&self, name: &str) -> Option<&Script> {
        let normalized = normalize_script_name(name);
        self.scripts
            .iter()
            .find(|script| script.matches_name(&normalized))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.iter()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

fn normalize_role_name(name: &str) -> String {
    name.trim().to_lowercase().replace(&[' ', '-'][..], "_")
}

/// Resolve user-typed role text ("fortune_teller", "Fortune Teller") to the
/// script's canonical role name.
pub fn match_role_name(name: &str, script: &Script) -> Result<String, String> {
    let normalized_input = normalize_role_name(name);

    // Try exact match first (case-insensitive, with underscores)
    if let Some(role) = script
        .all_roles()
        .find(|role| normalize_role_name(role) == normalized_input)
    {
        return Ok(role.to_string());
    }

    // No exact match - find close suggestions using Jaro-Winkler similarity
    let mut suggestions: Vec<_> = script
        .all_roles()
        .map(|role| {
            let similarity = strsim::jaro_winkler(&normalized_input, &normalize_role_name(role));
            (role, similarity)
        })
        .filter(|(_, sim)| *sim >= 0.7)
        .collect();

    suggestions.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    match suggestions.first() {
        Some((closest_role, similarity)) if *similarity >= 0.85 => Err(format!(
            "Unknown role name: '{}'\n  Did you mean: {}?",
            name,
            normalize_role_name(closest_role)
        )),
        Some(_) => {
            let suggestion_names: Vec<_> = suggestions
                .iter()
                .take(3)
                .map(|(role, _)| normalize_role_name(role))
                .collect();
            Err(format!(
                "Unknown role name: '{}'\n  Did you mean one of: {}?",
                name,
                suggestion_names.join(", ")
            ))
        }
        None => Err(format!("Unknown role name: '{}'", name)),
    }
}

// Bag parsing: parse textual representation "{role1 role2 ...}"
pub fn parse_bag(input: &str, script: &Script) -> Result<Vec<String>, String> {
    let trimmed = input.trim();

    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return Err(format!("Bag must be enclosed in curly braces: {}", input));
    }

    let content = trimmed[1..trimmed.len() - 1].trim();
    if content.is_empty() {
        return Ok(Vec::new());
    }

    // Split by whitespace and commas (Clojure-style)
    let mut roles: Vec<String> = Vec::new();
    for token in content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
    {
        let role = match_role_name(token, script)?;
        if roles.contains(&role) {
            return Err(format!("'{}' appears more than once in the bag", role));
        }
        roles.push(role);
    }

    Ok(roles)
}

pub fn format_bag<S: AsRef<str>>(roles: &[S]) -> String {
    let role_names: Vec<String> = roles
        .iter()
        .map(|role| normalize_role_name(role.as_ref()))
        .collect();

    format!("{{{}}}", role_names.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(script_json: &str) -> Result<ScriptCatalog, ScriptError> {
        ScriptCatalog::from_json_str(&format!(r#"{{ "scripts": [{}] }}"#, script_json))
    }

    #[test]
    fn test_trouble_brewing_script() {
        let script = Script::trouble_brewing().unwrap();
        assert_eq!(script.title(), "Trouble Brewing");
        assert_eq!(script.all_roles().count(), 22);
        assert_eq!(script.category(Team::Townsfolk).len(), 13);
        assert_eq!(script.category(Team::Outsider).len(), 4);
        assert_eq!(script.category(Team::Minion).len(), 4);
        assert_eq!(script.category(Team::Demon), ["Imp".to_string()]);
        assert_eq!(script.drunk_role(), Some("Drunk"));
        assert!(script.has_dead_ability("Ravenkeeper"));
    }

    #[test]
    fn test_all_roles_follow_category_order() {
        let script = Script::trouble_brewing().unwrap();
        let roles: Vec<&str> = script.all_roles().collect();
        assert_eq!(roles.first(), Some(&"Washerwoman"));
        assert_eq!(roles[13], "Butler");
        assert_eq!(roles[17], "Poisoner");
        assert_eq!(roles.last(), Some(&"Imp"));
    }

    #[test]
    fn test_builtin_quotas_sum_to_player_count() {
        let script = Script::trouble_brewing().unwrap();
        for count in 5..=15 {
            let quota = script.expected_setup(count).unwrap();
            assert_eq!(quota.total(), count, "quota for {} players", count);
        }
        assert_eq!(script.expected_setup(4), None);
        assert_eq!(script.expected_setup(16), None);
    }

    #[test]
    fn test_baron_modifier_keeps_total() {
        let script = Script::trouble_brewing().unwrap();
        let modifier = script.setup_modifier("Baron").unwrap();
        for count in 5..=15 {
            let mut quota = script.expected_setup(count).unwrap();
            modifier.apply(&mut quota);
            assert_eq!(quota.total(), count);
        }
    }

    #[test]
    fn test_adjust_counts_saturates_townsfolk() {
        let mut quota = RoleDistribution {
            townsfolk: 1,
            outsider: 0,
            minion: 1,
            demon: 1,
        };
        SetupModifier::AdjustCounts {
            remove_townsfolk: 2,
            add_outsiders: 2,
        }
        .apply(&mut quota);
        assert_eq!(quota.townsfolk, 0);
        assert_eq!(quota.outsider, 2);
    }

    #[test]
    fn test_night_orders_parse_reveal_steps() {
        let script = Script::trouble_brewing().unwrap();
        assert_eq!(script.first_night_order()[0], NightStep::MinionInfo);
        assert_eq!(script.first_night_order()[1], NightStep::DemonInfo);
        assert_eq!(
            script.other_night_order()[0],
            NightStep::Role("Poisoner".to_string())
        );
    }

    #[test]
    fn test_prompt_falls_back_to_generic() {
        let script = Script::trouble_brewing().unwrap();
        assert_eq!(
            script.prompt_for(&NightStep::Role("Imp".to_string())),
            "Imp: Choose a player to kill."
        );
        assert_eq!(
            script.prompt_for(&NightStep::Role("Saint".to_string())),
            "Saint: Resolve this role now."
        );
    }

    #[test]
    fn test_catalog_lookup_by_name() {
        let catalog = ScriptCatalog::builtin();
        assert_eq!(catalog.len(), 1);
        for name in ["trouble-brewing", "Trouble Brewing", "trouble_brewing", "TB"] {
            assert_eq!(catalog.from_name(name).map(Script::id), Some("trouble-brewing"));
        }
        assert!(catalog.from_name("bad moon rising").is_none());
        assert!(catalog.get("Trouble Brewing").is_none());
    }

    #[test]
    fn test_catalog_rejects_duplicate_role() {
        let result = catalog_with(
            r#"{ "id": "x", "name": "X",
                 "categories": { "townsfolk": ["Chef"], "outsider": ["Chef"] } }"#,
        );
        assert!(matches!(result, Err(ScriptError::DuplicateRole { .. })));
    }

    #[test]
    fn test_catalog_rejects_bad_quota_sum() {
        let result = catalog_with(
            r#"{ "id": "x", "name": "X",
                 "categories": { "townsfolk": ["Chef"], "imp": ["Imp"] },
                 "quotas": { "5": { "townsfolk": 3, "outsider": 0, "minion": 1, "imp": 0 } } }"#,
        );
        assert!(matches!(
            result,
            Err(ScriptError::QuotaMismatch {
                player_count: 5,
                total: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_catalog_rejects_unknown_role_in_night_order() {
        let result = catalog_with(
            r#"{ "id": "x", "name": "X",
                 "categories": { "townsfolk": ["Chef"], "imp": ["Imp"] },
                 "first_night_order": ["Minion Info", "Chef", "Pukka"] }"#,
        );
        match result {
            Err(ScriptError::UnknownRole { role, context, .. }) => {
                assert_eq!(role, "Pukka");
                assert_eq!(context, "first night order");
            }
            other => panic!("expected unknown role error, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_rejects_missing_quota_field() {
        let result = catalog_with(
            r#"{ "id": "x", "name": "X",
                 "categories": { "townsfolk": ["Chef"] },
                 "quotas": { "5": { "townsfolk": 5 } } }"#,
        );
        assert!(matches!(result, Err(ScriptError::Parse(_))));
    }

    #[test]
    fn test_catalog_rejects_duplicate_id_and_empty() {
        let entry = r#"{ "id": "x", "name": "X", "categories": {} }"#;
        let duplicated = format!("{}, {}", entry, entry);
        assert!(matches!(
            catalog_with(&duplicated),
            Err(ScriptError::DuplicateId(id)) if id == "x"
        ));
        assert!(matches!(
            ScriptCatalog::from_json_str(r#"{ "scripts": [] }"#),
            Err(ScriptError::Empty)
        ));
    }

    #[test]
    fn test_team_shorthands() {
        assert_eq!(Team::from_str_or_shorthand("TF"), Some(Team::Townsfolk));
        assert_eq!(Team::from_str_or_shorthand("imp"), Some(Team::Demon));
        assert_eq!(Team::from_str_or_shorthand("traveller"), None);
    }

    #[test]
    fn test_parse_bag_basic() {
        let script = Script::trouble_brewing().unwrap();
        let roles = parse_bag("{chef empath fortune_teller monk ravenkeeper poisoner imp}", &script)
            .unwrap();
        assert_eq!(roles.len(), 7);
        assert!(roles.contains(&"Fortune Teller".to_string()));
        assert!(roles.contains(&"Imp".to_string()));
    }

    #[test]
    fn test_parse_bag_empty_and_commas() {
        let script = Script::trouble_brewing().unwrap();
        assert!(parse_bag("{}", &script).unwrap().is_empty());
        let roles = parse_bag("{chef, scarlet_woman,imp}", &script).unwrap();
        assert_eq!(roles, ["Chef", "Scarlet Woman", "Imp"]);
    }

    #[test]
    fn test_parse_bag_rejects_duplicates_and_braces() {
        let script = Script::trouble_brewing().unwrap();
        assert!(parse_bag("{chef chef}", &script).is_err());
        assert!(parse_bag("chef imp", &script).is_err());
    }

    #[test]
    fn test_parse_bag_invalid_role_suggests() {
        let script = Script::trouble_brewing().unwrap();
        let err = parse_bag("{chef empth}", &script).unwrap_err();
        assert!(err.contains("Unknown role name: 'empth'"), "{}", err);
        assert!(err.contains("empath"), "{}", err);
    }

    #[test]
    fn test_format_bag_round_trip() {
        let script = Script::trouble_brewing().unwrap();
        let roles = vec!["Chef".to_string(), "Fortune Teller".to_string(), "Imp".to_string()];
        let formatted = format_bag(&roles);
        assert_eq!(formatted, "{chef fortune_teller imp}");
        assert_eq!(parse_bag(&formatted, &script).unwrap(), roles);
    }
}
