//! The transition priority table.
//!
//! Priorities are configuration, not code: a table keyed by
//! `(source state, target state)`. Lower numbers win when several
//! transitions are valid in the same tick.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{AiError, BehaviorKind};

/// One row of a priority table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry<K> {
    pub from: K,
    pub to: K,
    pub priority: i32,
}

/// On-disk shape: `{ "entries": [ { "from": .., "to": .., "priority": .. } ] }`.
#[derive(Serialize, Deserialize)]
struct PriorityFile<K> {
    entries: Vec<PriorityEntry<K>>,
}

/// Maps `(from, to)` state pairs to a transition priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTable<K: Eq + Hash> {
    entries: HashMap<(K, K), i32>,
}

impl<K> PriorityTable<K>
where
    K: Clone + Eq + Hash + Display,
{
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builds a table from entries. A repeated pair keeps the last value.
    pub fn from_entries(entries: impl IntoIterator<Item = PriorityEntry<K>>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            if let Some(previous) = table.insert(entry.from.clone(), entry.to.clone(), entry.priority) {
                tracing::warn!(
                    from = %entry.from,
                    to = %entry.to,
                    previous,
                    priority = entry.priority,
                    "duplicate priority entry, keeping the later value"
                );
            }
        }
        table
    }

    /// Sets the priority of `from -> to`, returning the old value if any.
    pub fn insert(&mut self, from: K, to: K, priority: i32) -> Option<i32> {
        self.entries.insert((from, to), priority)
    }

    /// Returns the priority of `from -> to`, if configured.
    pub fn get(&self, from: &K, to: &K) -> Option<i32> {
        self.entries.get(&(from.clone(), to.clone())).copied()
    }

    /// Like [`get`](Self::get), but a missing pair is an error.
    pub fn priority(&self, from: &K, to: &K) -> Result<i32, AiError> {
        self.get(from, to).ok_or_else(|| AiError::MissingPriority {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Checks that every ordered pair over `states` (self-transitions
    /// included) has an entry.
    ///
    /// # Errors
    /// Returns [`AiError::MissingPriority`] for the first missing pair in
    /// `states` order.
    pub fn validate(&self, states: &[K]) -> Result<(), AiError> {
        for from in states {
            for to in states {
                self.priority(from, to)?;
            }
        }
        Ok(())
    }

    /// Number of configured pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no pairs are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> PriorityTable<K>
where
    K: Clone + Eq + Hash + Display + DeserializeOwned,
{
    /// Parses a JSON table and validates it against `states`.
    ///
    /// # Errors
    /// [`AiError::InvalidTable`] if the JSON does not parse,
    /// [`AiError::MissingPriority`] if it is incomplete.
    pub fn from_json(json: &str, states: &[K]) -> Result<Self, AiError> {
        let file: PriorityFile<K> = serde_json::from_str(json)?;
        let table = Self::from_entries(file.entries);
        table.validate(states)?;
        Ok(table)
    }
}

impl<K> PriorityTable<K>
where
    K: Clone + Eq + Hash + Display + Serialize + Ord,
{
    /// Serializes the table, entries sorted by `(from, to)` so the output
    /// is stable.
    pub fn to_json(&self) -> Result<String, AiError> {
        let mut entries: Vec<PriorityEntry<K>> = self
            .entries
            .iter()
            .map(|((from, to), priority)| PriorityEntry {
                from: from.clone(),
                to: to.clone(),
                priority: *priority,
            })
            .collect();
        entries.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        Ok(serde_json::to_string_pretty(&PriorityFile { entries })?)
    }
}

impl<K> Default for PriorityTable<K>
where
    K: Clone + Eq + Hash + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityTable<BehaviorKind> {
    /// The shipped table for the built-in behaviors.
    ///
    /// | from \ to | Idle | Attack | PowerUp |
    /// |-----------|------|--------|---------|
    /// | Idle      | 10   | 1      | 3       |
    /// | Attack    | 10   | 5      | 3       |
    /// | PowerUp   | 1    | 3      | 5       |
    pub fn standard() -> Self {
        use BehaviorKind::{Attack, Idle, PowerUp};

        let rows = [
            (Idle, [10, 1, 3]),
            (Attack, [10, 5, 3]),
            (PowerUp, [1, 3, 5]),
        ];

        let mut table = Self::new();
        for (from, priorities) in rows {
            for (to, priority) in BehaviorKind::ALL.into_iter().zip(priorities) {
                table.insert(from, to, priority);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BehaviorKind::{Attack, Idle, PowerUp};

    #[test]
    fn test_standard_table_matches_shipped_values() {
        let table = PriorityTable::standard();
        assert_eq!(table.get(&Idle, &Attack), Some(1));
        assert_eq!(table.get(&Idle, &Idle), Some(10));
        assert_eq!(table.get(&Attack, &Attack), Some(5));
        assert_eq!(table.get(&PowerUp, &Idle), Some(1));
        assert_eq!(table.get(&PowerUp, &PowerUp), Some(5));
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn test_standard_table_is_complete() {
        PriorityTable::standard()
            .validate(&BehaviorKind::ALL)
            .expect("shipped table must be complete");
    }

    #[test]
    fn test_validate_reports_missing_pair() {
        let mut table = PriorityTable::new();
        table.insert(Idle, Idle, 1);
        table.insert(Idle, Attack, 2);
        table.insert(Attack, Attack, 3);

        let err = table.validate(&[Idle, Attack]).unwrap_err();
        assert!(
            matches!(&err, AiError::MissingPriority { from, to } if from == "Attack" && to == "Idle"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_from_entries_later_duplicate_wins() {
        let table = PriorityTable::from_entries([
            PriorityEntry { from: Idle, to: Attack, priority: 4 },
            PriorityEntry { from: Idle, to: Attack, priority: 2 },
        ]);
        assert_eq!(table.get(&Idle, &Attack), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_json_incomplete_table_is_rejected() {
        let json = r#"{ "entries": [ { "from": "Idle", "to": "Idle", "priority": 1 } ] }"#;
        let result = PriorityTable::from_json(json, &BehaviorKind::ALL);
        assert!(matches!(result, Err(AiError::MissingPriority { .. })));
    }

    #[test]
    fn test_from_json_malformed_is_invalid_table() {
        let result = PriorityTable::<BehaviorKind>::from_json("{ entries: ", &BehaviorKind::ALL);
        assert!(matches!(result, Err(AiError::InvalidTable(_))));
    }

    #[test]
    fn test_to_json_then_from_json_preserves_standard_table() {
        let table = PriorityTable::standard();
        let json = table.to_json().unwrap();
        let loaded = PriorityTable::from_json(&json, &BehaviorKind::ALL).unwrap();
        assert_eq!(loaded, table);
    }
}
