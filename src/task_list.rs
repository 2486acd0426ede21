use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::accounts::User;
use crate::error::{Result, TodoError};
use crate::store::{self, KeyValueStore};
use crate::task::{Task, TaskDraft};

/// The task collection of one logged-in user. Every mutation writes the
/// whole collection back to the store before returning.
#[derive(Debug)]
pub struct TaskList<S> {
    store: S,
    owner: String,
    tasks: Vec<Task>,
    last_id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl<S: KeyValueStore> TaskList<S> {
    /// Loads `user`'s tasks, or starts empty when nothing usable is stored.
    pub fn init_session(store: S, user: &User) -> Self {
        let tasks: Vec<Task> = store::load_json(&store, &store::tasks_key(&user.username));
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        tracing::debug!(owner = %user.username, count = tasks.len(), "loaded tasks");
        Self {
            store,
            owner: user.username.clone(),
            tasks,
            last_id,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Task> {
        self.add_task_at(draft, Local::now())
    }

    /// [`add_task`](Self::add_task) with an explicit "now".
    pub fn add_task_at(&mut self, draft: TaskDraft, now: DateTime<Local>) -> Result<Task> {
        if draft.title.trim().is_empty() {
            return Err(TodoError::validation("Task title is required"));
        }

        let description = non_blank(draft.description);
        let date = non_blank(draft.date);
        let time = non_blank(draft.time);

        let parsed_date = date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|_| TodoError::validation("Date must be YYYY-MM-DD"))?;
        let parsed_time = time
            .as_deref()
            .map(|t| NaiveTime::parse_from_str(t, "%H:%M"))
            .transpose()
            .map_err(|_| TodoError::validation("Time must be HH:MM"))?;

        let date_time = match (parsed_date, parsed_time) {
            (Some(d), Some(t)) => {
                let scheduled = Local
                    .from_local_datetime(&d.and_time(t))
                    .earliest()
                    .ok_or_else(|| TodoError::validation("That time does not exist locally"))?;
                if scheduled < now {
                    return Err(TodoError::validation("Cannot schedule tasks in the past"));
                }
                scheduled.with_timezone(&Utc)
            }
            _ => now.with_timezone(&Utc),
        };

        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;

        let task = Task {
            id,
            text: draft.title,
            description,
            date,
            time,
            date_time,
            completed: false,
            created_at: now.with_timezone(&Utc),
        };
        self.tasks.push(task.clone());
        self.save()?;

        tracing::debug!(owner = %self.owner, id, "added task");
        Ok(task)
    }

    /// Flips `completed` on task `id`. Unknown ids are ignored.
    pub fn toggle_complete(&mut self, id: i64) -> Result<()> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(());
        };
        task.completed = !task.completed;
        tracing::debug!(owner = %self.owner, id, completed = task.completed, "toggled task");
        self.save()
    }

    /// Removes task `id`. Unknown ids are ignored.
    pub fn delete_task(&mut self, id: i64) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(());
        }
        tracing::debug!(owner = %self.owner, id, "deleted task");
        self.save()
    }

    /// Tasks whose title or description contains `term`, ignoring case, in
    /// insertion order. An empty term returns everything.
    pub fn search(&self, term: &str) -> Vec<&Task> {
        let needle = term.to_lowercase();
        self.tasks.iter().filter(|t| t.matches(&needle)).collect()
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    /// Closes the session, dropping the in-memory tasks. Stored data is left
    /// alone; the list cannot be written through afterwards.
    pub fn end_session(self) {
        tracing::debug!(owner = %self.owner, "ended task session");
    }

    fn save(&self) -> Result<()> {
        store::save_json(&self.store, &store::tasks_key(&self.owner), &self.tasks)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
