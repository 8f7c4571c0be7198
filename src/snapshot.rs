// Session snapshots: persisting the live session between runs.
//
// Decoding never rejects a snapshot as a whole. Each field falls back to its
// default on its own when it is missing or malformed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::script::ScriptCatalog;
use crate::session::{
    clamp_player_count, default_player_name, resize_roster, Phase, Player, Reminders, Session,
    DEFAULT_PLAYER_COUNT, MAX_BAG_SIZE, MAX_PLAYERS,
};

/// Snapshots older than this are treated as absent.
pub const SNAPSHOT_RETENTION: Duration = Duration::from_secs(60 * 60 * 24 * 14);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {path:?}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| StoreError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
struct SnapshotEnvelope<'a> {
    saved_at: u64,
    session: &'a Session,
}

/// File-backed store for the one live session.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    retention: Duration,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            path: path.into(),
            retention: SNAPSHOT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<Session> {
        self.load_at(SystemTime::now())
    }

    /// Load the stored session as seen at `now`; expired, unreadable or
    /// unparseable snapshots count as absent.
    pub fn load_at(&self, now: SystemTime) -> Option<Session> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    target: "botc_night::store",
                    path = %self.path.display(),
                    error = %err,
                    "snapshot.read_failed"
                );
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    target: "botc_night::store",
                    path = %self.path.display(),
                    error = %err,
                    "snapshot.parse_failed"
                );
                return None;
            }
        };

        if let Some(saved_at) = value.get("saved_at").and_then(Value::as_u64) {
            let saved_at = UNIX_EPOCH + Duration::from_secs(saved_at);
            let age = now.duration_since(saved_at).unwrap_or_default();
            if age > self.retention {
                tracing::info!(
                    target: "botc_night::store",
                    age_secs = age.as_secs(),
                    "snapshot.expired"
                );
                return None;
            }
        }

        let session = value.get("session").map(decode_session)?;
        tracing::debug!(
            target: "botc_night::store",
            path = %self.path.display(),
            "snapshot.loaded"
        );
        Some(session)
    }

    /// The stored session checked against `catalog`, or a fresh one.
    pub fn load_or_default(&self, catalog: &ScriptCatalog) -> Session {
        let mut session = self.load().unwrap_or_default();
        session.reconcile(catalog);
        session
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.save_at(session, SystemTime::now())
    }

    pub fn save_at(&self, session: &Session, now: SystemTime) -> Result<(), StoreError> {
        let saved_at = now
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        write_json(&self.path, &SnapshotEnvelope { saved_at, session })
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::RemoveFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty_string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    string_field(object, key).filter(|value| !value.is_empty())
}

fn seat_id_field(object: &Map<String, Value>, key: &str) -> Option<u8> {
    let id: Option<u8> = match object.get(key)? {
        Value::Number(number) => number.as_u64().and_then(|id| u8::try_from(id).ok()),
        // Seat ids typed into a form arrive as strings.
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

fn decode_player(index: usize, value: &Value) -> Player {
    let id = index as u8 + 1;
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);
    Player {
        id,
        name: string_field(object, "name").unwrap_or_else(|| default_player_name(id)),
        character: non_empty_string_field(object, "character"),
        is_alive: object.get("is_alive") != Some(&Value::Bool(false)),
        is_drunk: object.get("is_drunk").and_then(Value::as_bool).unwrap_or(false),
        is_poisoned: object
            .get("is_poisoned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn decode_reminders(value: Option<&Value>) -> Reminders {
    let Some(object) = value.and_then(Value::as_object) else {
        return Reminders::default();
    };
    Reminders {
        kill_target: seat_id_field(object, "kill_target"),
        protect_target: seat_id_field(object, "protect_target"),
        notes: string_field(object, "notes").unwrap_or_default(),
    }
}

/// Rebuild a session from a snapshot value, defaulting field by field.
pub fn decode_session(value: &Value) -> Session {
    let defaults = Session::new();
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);

    let player_count = object
        .get("player_count")
        .and_then(Value::as_i64)
        .map(clamp_player_count)
        .unwrap_or(DEFAULT_PLAYER_COUNT);

    let mut players: Vec<Player> = match object.get("players").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items
            .iter()
            .take(MAX_PLAYERS as usize)
            .enumerate()
            .map(|(index, item)| decode_player(index, item))
            .collect(),
        _ => Vec::new(),
    };
    if players.len() != player_count as usize {
        players = resize_roster(&players, player_count);
    }

    let mut role_bag: Vec<String> = Vec::new();
    if let Some(items) = object.get("role_bag").and_then(Value::as_array) {
        for role in items.iter().filter_map(Value::as_str) {
            if role_bag.len() < MAX_BAG_SIZE && !role_bag.iter().any(|r| r == role) {
                role_bag.push(role.to_string());
            }
        }
    }

    Session {
        script_id: non_empty_string_field(object, "script_id"),
        skip_assignments: object
            .get("skip_assignments")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.skip_assignments),
        player_count,
        players,
        role_bag,
        drunk_extra_role: non_empty_string_field(object, "drunk_extra_role"),
        phase: object
            .get("phase")
            .and_then(Value::as_str)
            .and_then(Phase::from_tag)
            .unwrap_or_default(),
        nights_completed: object
            .get("nights_completed")
            .and_then(Value::as_u64)
            .and_then(|nights| u32::try_from(nights).ok())
            .unwrap_or(0),
        active_step: object
            .get("active_step")
            .and_then(Value::as_u64)
            .map(|index| index as usize),
        reminders: decode_reminders(object.get("reminders")),
        dawn_summary: string_field(object, "dawn_summary").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "botc-night-{}-{}-{}.json",
            name,
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn test_decode_empty_value_gives_defaults() {
        assert_eq!(decode_session(&json!({})), Session::new());
        assert_eq!(decode_session(&json!("garbage")), Session::new());
    }

    #[test]
    fn test_decode_defaults_bad_fields_individually() {
        let session = decode_session(&json!({
            "script_id": "trouble-brewing",
            "player_count": "seven",
            "phase": "dusk",
            "nights_completed": -3,
            "active_step": -1,
            "role_bag": ["Chef", 7, "Chef", "Imp"],
            "dawn_summary": 12,
            "reminders": { "kill_target": "3", "protect_target": true, "notes": "hi" }
        }));
        assert_eq!(session.script_id(), Some("trouble-brewing"));
        assert_eq!(session.player_count(), DEFAULT_PLAYER_COUNT);
        assert_eq!(session.players().len(), DEFAULT_PLAYER_COUNT as usize);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.nights_completed(), 0);
        assert_eq!(session.active_step_index(), None);
        assert_eq!(session.role_bag(), ["Chef", "Imp"]);
        assert_eq!(session.dawn_summary(), "");
        assert_eq!(session.reminders().kill_target, Some(3));
        assert_eq!(session.reminders().protect_target, None);
        assert_eq!(session.reminders().notes, "hi");
    }

    #[test]
    fn test_decode_players_renumbers_and_defaults() {
        let session = decode_session(&json!({
            "player_count": 2,
            "players": [
                { "id": 40, "name": "Alice", "character": "Chef", "is_alive": false },
                { "name": 5, "is_alive": "no", "is_drunk": true },
                "not a player"
            ]
        }));
        assert_eq!(session.player_count(), 5);
        assert_eq!(session.players().len(), 5);
        let alice = &session.players()[0];
        assert_eq!(alice.id, 1);
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.character.as_deref(), Some("Chef"));
        assert!(!alice.is_alive);
        let second = &session.players()[1];
        assert_eq!(second.name, "Player 2");
        assert!(second.is_alive);
        assert!(second.is_drunk);
        assert_eq!(session.players()[2].name, "Player 3");
    }

    #[test]
    fn test_save_then_load_restores_session() {
        let path = temp_path("roundtrip");
        let store = SnapshotStore::new(&path);
        let catalog = ScriptCatalog::builtin();
        let mut session = Session::new();
        session.select_script(&catalog, "trouble-brewing");
        session.set_role_bag(&catalog, &["Chef", "Drunk", "Imp"]);
        session.set_drunk_extra_role(&catalog, Some("Empath"));
        session.toggle_poisoned(4);
        session.set_kill_target(Some(2));

        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_expired_snapshot_is_absent() {
        let path = temp_path("expired");
        let store = SnapshotStore::new(&path);
        let saved = SystemTime::now();
        store.save_at(&Session::new(), saved).unwrap();

        assert!(store.load_at(saved + Duration::from_secs(60)).is_some());
        assert!(store
            .load_at(saved + SNAPSHOT_RETENTION + Duration::from_secs(2))
            .is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let store = SnapshotStore::new(&path);
        assert_eq!(store.load(), None);
        assert_eq!(store.load_or_default(&ScriptCatalog::builtin()), Session::new());
        store.clear().unwrap();
    }

    #[test]
    fn test_loaded_drunk_extra_without_drunk_is_dropped() {
        let path = temp_path("drunk-extra");
        let snapshot = json!({
            "saved_at": SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            "session": {
                "script_id": "trouble-brewing",
                "role_bag": ["Chef", "Pukka", "Imp"],
                "drunk_extra_role": "Empath"
            }
        });
        fs::write(&path, snapshot.to_string()).unwrap();
        let store = SnapshotStore::new(&path);
        let catalog = ScriptCatalog::builtin();

        assert_eq!(store.load().unwrap().drunk_extra_role(), Some("Empath"));
        let session = store.load_or_default(&catalog);
        assert_eq!(session.drunk_extra_role(), None);
        assert_eq!(session.role_bag(), ["Chef", "Imp"]);
        store.clear().unwrap();
    }
}
