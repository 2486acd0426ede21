use crate::accounts::{AccountStore, User};
use crate::error::{Result, TodoError};
use crate::store::KeyValueStore;
use crate::task_list::TaskList;

/// A logged-in user and their loaded tasks.
#[derive(Debug)]
pub struct Session<S> {
    pub user: User,
    pub tasks: TaskList<S>,
}

/// Application state shared by the front end: the account store and the
/// session, if someone is logged in.
#[derive(Debug)]
pub struct App<S> {
    accounts: AccountStore<S>,
    session: Option<Session<S>>,
}

impl<S: KeyValueStore + Clone> App<S> {
    pub fn new(store: S) -> Self {
        Self {
            accounts: AccountStore::new(store),
            session: None,
        }
    }

    pub fn accounts(&self) -> &AccountStore<S> {
        &self.accounts
    }

    pub fn session(&self) -> Option<&Session<S>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<S>> {
        self.session.as_mut()
    }

    /// Reopens the remembered login, if there is one. Returns whether a
    /// session is now open.
    pub fn restore(&mut self) -> bool {
        if let Some(user) = self.accounts.current_user() {
            tracing::info!(username = %user.username, "restored session");
            self.open(user);
        }
        self.session.is_some()
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<&Session<S>> {
        require_filled(&[username, password])?;
        let user = self.accounts.authenticate(username, password)?;
        self.accounts.remember(&user)?;
        tracing::info!(username, "logged in");
        Ok(self.open(user))
    }

    /// Registers a new account and logs straight into it.
    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<&Session<S>> {
        require_filled(&[username, email, password])?;
        check_email(email)?;
        let user = self.accounts.register(username, email, password)?;
        self.accounts.remember(&user)?;
        Ok(self.open(user))
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            tracing::info!(username = %session.user.username, "logged out");
            session.tasks.end_session();
        }
        self.accounts.forget()
    }

    fn open(&mut self, user: User) -> &Session<S> {
        let tasks = TaskList::init_session(self.accounts.store().clone(), &user);
        self.session.insert(Session { user, tasks })
    }
}

/// Form fields are all required.
fn require_filled(fields: &[&str]) -> Result<()> {
    if fields.iter().any(|f| f.is_empty()) {
        return Err(TodoError::validation("Please fill in all fields"));
    }
    Ok(())
}

/// Same shape an email input accepts: `local@domain`, no whitespace.
fn check_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TodoError::validation("Please enter a valid email address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use crate::task::TaskDraft;

    #[test]
    fn test_register_logs_in_with_empty_list() {
        let mut app = App::new(MemoryStore::new());
        let session = app.register("bob", "bob@x.com", "pw123").unwrap();
        assert_eq!(session.user.username, "bob");
        assert!(session.tasks.is_empty());
        assert_eq!(
            app.accounts().current_user().map(|u| u.username),
            Some("bob".to_string())
        );
    }

    #[test]
    fn test_register_requires_all_fields() {
        let mut app = App::new(MemoryStore::new());
        for (name, email, pw) in [("", "a@x.com", "pw"), ("a", "", "pw"), ("a", "a@x.com", "")] {
            assert!(matches!(
                app.register(name, email, pw),
                Err(TodoError::ValidationFailed(_))
            ));
        }
        assert!(app.accounts().users().is_empty());
        assert!(app.session().is_none());
    }

    #[test]
    fn test_register_rejects_malformed_email() {
        let mut app = App::new(MemoryStore::new());
        for email in ["bob", "@x.com", "bob@", "bob@x@y", "bob @x.com"] {
            assert!(matches!(
                app.register("bob", email, "pw123"),
                Err(TodoError::ValidationFailed(_))
            ));
        }
        assert!(app.register("bob", "bob@x.com", "pw123").is_ok());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut app = App::new(MemoryStore::new());
        app.register("bob", "bob@x.com", "pw123").unwrap();
        app.logout().unwrap();
        assert!(matches!(
            app.login("", "pw123"),
            Err(TodoError::ValidationFailed(_))
        ));
        assert!(matches!(
            app.login("bob", ""),
            Err(TodoError::ValidationFailed(_))
        ));
        assert!(app.session().is_none());
    }

    #[test]
    fn test_failed_login_leaves_no_session() {
        let mut app = App::new(MemoryStore::new());
        app.register("bob", "bob@x.com", "pw123").unwrap();
        app.logout().unwrap();

        let err = app.login("bob", "wrong").unwrap_err();
        assert!(matches!(err, TodoError::InvalidCredentials));
        assert!(app.session().is_none());
        assert!(app.accounts().current_user().is_none());
    }

    #[test]
    fn test_logout_then_login_recovers_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(FileStore::new(dir.path()));

        app.register("bob", "bob@x.com", "pw123").unwrap();
        let tasks = &mut app.session_mut().unwrap().tasks;
        tasks.add_task(TaskDraft::new("Walk dog")).unwrap();
        assert_eq!(tasks.len(), 1);
        let original = tasks.tasks()[0].clone();
        assert!(!original.completed);
        assert_eq!(original.text, "Walk dog");

        app.logout().unwrap();
        assert!(app.session().is_none());

        // a fresh process on the same directory
        let mut app = App::new(FileStore::new(dir.path()));
        assert!(!app.restore());
        let session = app.login("bob", "pw123").unwrap();
        assert_eq!(session.tasks.tasks(), &[original]);
    }

    #[test]
    fn test_restore_remembered_login() {
        let store = MemoryStore::new();
        let mut app = App::new(store.clone());
        app.register("bob", "bob@x.com", "pw123").unwrap();
        app.session_mut()
            .unwrap()
            .tasks
            .add_task(TaskDraft::new("Walk dog"))
            .unwrap();

        let mut restarted = App::new(store);
        assert!(restarted.restore());
        let session = restarted.session().unwrap();
        assert_eq!(session.user.username, "bob");
        assert_eq!(session.tasks.len(), 1);
    }

    #[test]
    fn test_users_do_not_see_each_others_tasks() {
        let mut app = App::new(MemoryStore::new());
        app.register("alice", "alice@x.com", "secret").unwrap();
        app.session_mut()
            .unwrap()
            .tasks
            .add_task(TaskDraft::new("alice only"))
            .unwrap();
        app.logout().unwrap();

        let session = app.register("bob", "bob@x.com", "pw123").unwrap();
        assert!(session.tasks.is_empty());
    }
}
