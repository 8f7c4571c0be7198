// Remembered player names, offered back when seating a new roster.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::snapshot::StoreError;

pub const MAX_SAVED_NAMES: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedPlayerNames {
    names: Vec<String>,
}

impl SavedPlayerNames {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn add(&mut self, name: &str) {
        self.add_many(&[name]);
    }

    /// Append names, trimmed and deduplicated, keeping the oldest 15.
    pub fn add_many<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names.iter().map(|name| name.as_ref().trim()) {
            if !name.is_empty() && !self.names.iter().any(|saved| saved == name) {
                self.names.push(name.to_string());
            }
        }
        self.names.truncate(MAX_SAVED_NAMES);
    }

    pub fn remove(&mut self, name: &str) {
        self.remove_many(&[name]);
    }

    pub fn remove_many<S: AsRef<str>>(&mut self, names: &[S]) {
        let targets: Vec<&str> = names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .collect();
        self.names.retain(|saved| !targets.contains(&saved.as_str()));
    }

    /// Decode a stored list. Anything that is not an array yields an empty
    /// list; non-string entries are dropped.
    pub fn from_value(value: &Value) -> Self {
        let mut saved = SavedPlayerNames::default();
        if let Some(items) = value.as_array() {
            let names: Vec<&str> = items
                .iter()
                .take(MAX_SAVED_NAMES)
                .filter_map(Value::as_str)
                .collect();
            saved.add_many(&names);
        }
        saved
    }

    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        target: "botc_night::store",
                        path = %path.display(),
                        error = %err,
                        "player_names.read_failed"
                    );
                }
                return SavedPlayerNames::default();
            }
        };
        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => SavedPlayerNames::from_value(&value),
            Err(err) => {
                tracing::warn!(
                    target: "botc_night::store",
                    path = %path.display(),
                    error = %err,
                    "player_names.parse_failed"
                );
                SavedPlayerNames::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        crate::snapshot::write_json(path, &self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_dedups_and_trims() {
        let mut saved = SavedPlayerNames::default();
        saved.add(" Alice ");
        saved.add_many(&["Bob", "Alice", "", "   "]);
        assert_eq!(saved.names(), ["Alice", "Bob"]);
    }

    #[test]
    fn test_add_caps_at_fifteen() {
        let mut saved = SavedPlayerNames::default();
        let names: Vec<String> = (0..20).map(|i| format!("Name {}", i)).collect();
        saved.add_many(&names);
        assert_eq!(saved.names().len(), MAX_SAVED_NAMES);
        assert_eq!(saved.names()[14], "Name 14");
    }

    #[test]
    fn test_remove_many() {
        let mut saved = SavedPlayerNames::default();
        saved.add_many(&["Alice", "Bob", "Carol"]);
        saved.remove(" Bob ");
        assert_eq!(saved.names(), ["Alice", "Carol"]);
        saved.remove_many(&["Alice", "Carol", "Dave"]);
        assert!(saved.names().is_empty());
    }

    #[test]
    fn test_from_value_is_lenient() {
        assert!(SavedPlayerNames::from_value(&json!({"names": []})).names().is_empty());
        let saved = SavedPlayerNames::from_value(&json!(["Alice", 3, null, "Bob", "Alice"]));
        assert_eq!(saved.names(), ["Alice", "Bob"]);
    }
}
