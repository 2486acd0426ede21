//! A personal to-do list with local accounts.
//!
//! [`AccountStore`] keeps registered users and checks logins; [`TaskList`]
//! holds one user's tasks for a session. Both read and write whole JSON
//! documents through a [`KeyValueStore`].

pub mod accounts;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod task;
pub mod task_list;
pub mod ui;

pub use accounts::{AccountStore, User};
pub use app::{App, Session};
pub use config::Config;
pub use error::{Result, TodoError};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use task::{Task, TaskDraft};
pub use task_list::{TaskList, TaskStats};
