use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};
use crate::store::{self, KeyValueStore, CURRENT_USER_KEY, USERS_KEY};
use crate::task::Task;

/// A registered account. Passwords are stored and compared in plaintext,
/// which keeps existing stored data readable but is not safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registered users plus the remembered login.
#[derive(Debug, Clone)]
pub struct AccountStore<S> {
    store: S,
}

impl<S: KeyValueStore> AccountStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn users(&self) -> Vec<User> {
        store::load_json(&self.store, USERS_KEY)
    }

    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let mut users = self.users();
        if users
            .iter()
            .any(|u| u.username == username || u.email == email)
        {
            tracing::info!(username, "registration rejected: duplicate account");
            return Err(TodoError::DuplicateAccount);
        }

        let user = User {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        users.push(user.clone());
        store::save_json(&self.store, USERS_KEY, &users)?;
        store::save_json(&self.store, &store::tasks_key(username), &Vec::<Task>::new())?;

        tracing::info!(username, "registered new account");
        Ok(user)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        self.users()
            .into_iter()
            .find(|u| u.username == username && u.password == password)
            .ok_or_else(|| {
                tracing::info!(username, "login rejected");
                TodoError::InvalidCredentials
            })
    }

    /// Persists `user` as the logged-in account.
    pub fn remember(&self, user: &User) -> Result<()> {
        store::save_json(&self.store, CURRENT_USER_KEY, user)
    }

    pub fn current_user(&self) -> Option<User> {
        store::load_json(&self.store, CURRENT_USER_KEY)
    }

    pub fn forget(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY)
    }
}
