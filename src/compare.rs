// Session-scoped "compare tents" selection, bounded to a few units

use crate::config::CompareConfig;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Comparison list is full ({limit} tents)")]
    Full { limit: usize },

    #[error("Identifier must not be empty")]
    EmptyIdentifier,
}

pub struct CompareSessions {
    sessions: DashMap<String, Vec<String>>,
    config: CompareConfig,
}

impl Default for CompareSessions {
    fn default() -> Self {
        Self::new(CompareConfig::default())
    }
}

impl CompareSessions {
    pub fn new(config: CompareConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Adds `unit_id` to the session's list. Returns `false` if it was already there.
    pub fn add(&self, session_id: &str, unit_id: &str) -> Result<bool, CompareError> {
        let (session_id, unit_id) = (non_empty(session_id)?, non_empty(unit_id)?);

        let mut entry = self.sessions.entry(session_id.to_string()).or_default();
        if entry.iter().any(|id| id == unit_id) {
            return Ok(false);
        }
        if entry.len() >= self.config.max_units {
            return Err(CompareError::Full {
                limit: self.config.max_units,
            });
        }
        entry.push(unit_id.to_string());
        Ok(true)
    }

    // Returns whether anything was removed
    pub fn remove(&self, session_id: &str, unit_id: &str) -> bool {
        let (session_id, unit_id) = (session_id.trim(), unit_id.trim());
        let removed = match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|id| id != unit_id);
                entry.len() != before
            }
            None => false,
        };
        self.sessions.remove_if(session_id, |_, ids| ids.is_empty());
        removed
    }

    /// Unit ids in the order they were added.
    pub fn list(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id.trim())
            .map(|ids| ids.value().clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id.trim());
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn non_empty(value: &str) -> Result<&str, CompareError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CompareError::EmptyIdentifier)
    } else {
        Ok(trimmed)
    }
}
