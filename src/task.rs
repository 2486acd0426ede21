use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<String>, // YYYY-MM-DD
    #[serde(default, deserialize_with = "blank_as_none")]
    pub time: Option<String>, // HH:MM
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

// Browser-written records store "" for fields left empty.
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

impl Task {
    /// Case-insensitive match on the title or description. `needle` must
    /// already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }

    /// Scheduled date and time as entered, e.g. "2026-10-17 09:00".
    pub fn schedule(&self) -> Option<String> {
        match (self.date.as_deref(), self.time.as_deref()) {
            (Some(date), Some(time)) => Some(format!("{date} {time}")),
            (Some(date), None) => Some(date.to_string()),
            (None, Some(time)) => Some(time.to_string()),
            (None, None) => None,
        }
    }
}

/// Form input for a new task. Blank optional fields count as absent.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn scheduled(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self.time = Some(time.into());
        self
    }
}
