//! Account store adapter: registration, login and placeholder provisioning.
//!
//! Passwords are stored as argon2 PHC strings. Tokens are opaque URL-safe
//! base64 strings with no server-side meaning beyond equality.

use std::{collections::HashMap, sync::Arc};

use argon2::{
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::{GameError, StoreError};

const TOKEN_BYTES: usize = 32;
const PLACEHOLDER_PASSWORD_BYTES: usize = 10;

#[derive(Clone, Debug)]
pub struct Account {
  pub username: String,
  pub password_hash: String,
  pub auth_token: Option<String>,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
  async fn exists(&self, username: &str) -> Result<bool, StoreError>;

  /// Insert if absent. Returns false when the username is already taken.
  async fn create(&self, username: &str, password_hash: String, token: Option<String>) -> Result<bool, StoreError>;

  async fn find(&self, username: &str) -> Result<Option<Account>, StoreError>;

  async fn set_token(&self, username: &str, token: String) -> Result<(), StoreError>;
}

#[derive(Clone, Default)]
pub struct MemoryAccounts {
  by_name: Arc<RwLock<HashMap<String, Account>>>,
}

impl MemoryAccounts {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
  async fn exists(&self, username: &str) -> Result<bool, StoreError> {
    Ok(self.by_name.read().await.contains_key(username))
  }

  async fn create(&self, username: &str, password_hash: String, token: Option<String>) -> Result<bool, StoreError> {
    let mut by_name = self.by_name.write().await;
    if by_name.contains_key(username) {
      return Ok(false);
    }
    by_name.insert(
      username.to_string(),
      Account { username: username.to_string(), password_hash, auth_token: token },
    );
    Ok(true)
  }

  async fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
    Ok(self.by_name.read().await.get(username).cloned())
  }

  async fn set_token(&self, username: &str, token: String) -> Result<(), StoreError> {
    let mut by_name = self.by_name.write().await;
    let account = by_name.get_mut(username).ok_or_else(|| StoreError::not_found("user", username))?;
    account.auth_token = Some(token);
    Ok(())
  }
}

/// Username plus the freshly issued token.
#[derive(Clone, Debug)]
pub struct Credentials {
  pub username: String,
  pub auth_token: String,
}

pub fn generate_token(len: usize) -> String {
  let mut bytes = vec![0u8; len];
  rand::thread_rng().fill_bytes(&mut bytes);
  URL_SAFE.encode(bytes)
}

fn hash_password(password: &str) -> Result<String, GameError> {
  let salt = SaltString::generate(&mut rand::thread_rng());
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| GameError::Store(StoreError::Unavailable(format!("password hashing failed: {e}"))))
}

fn verify_password(password: &str, stored: &str) -> bool {
  match PasswordHash::new(stored) {
    Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
    Err(e) => {
      warn!(target: "globetrotter", error = %e, "Stored password hash is unreadable");
      false
    }
  }
}

fn require(field: &str, value: &str) -> Result<(), GameError> {
  if value.is_empty() {
    return Err(GameError::validation(format!("{field} is required")));
  }
  Ok(())
}

#[instrument(level = "info", skip(store, password), fields(%username))]
pub async fn register(store: &dyn AccountStore, username: &str, password: &str) -> Result<Credentials, GameError> {
  require("username", username)?;
  require("password", password)?;
  if store.exists(username).await? {
    return Err(GameError::Conflict("Username already exists".into()));
  }
  let hash = hash_password(password)?;
  let token = generate_token(TOKEN_BYTES);
  if !store.create(username, hash, Some(token.clone())).await? {
    return Err(GameError::Conflict("Username already exists".into()));
  }
  info!(target: "globetrotter", %username, "User registered");
  Ok(Credentials { username: username.to_string(), auth_token: token })
}

/// Verify credentials and rotate the token.
#[instrument(level = "info", skip(store, password), fields(%username))]
pub async fn login(store: &dyn AccountStore, username: &str, password: &str) -> Result<Credentials, GameError> {
  require("username", username)?;
  require("password", password)?;
  let invalid = || GameError::Unauthorized("Invalid username or password".into());
  let account = store.find(username).await?.ok_or_else(invalid)?;
  if !verify_password(password, &account.password_hash) {
    return Err(invalid());
  }
  let token = generate_token(TOKEN_BYTES);
  store.set_token(username, token.clone()).await?;
  Ok(Credentials { username: account.username, auth_token: token })
}

/// Make sure `username` exists, provisioning a placeholder with an unusable
/// random password if needed. Returns whether an account was created here.
#[instrument(level = "info", skip(store), fields(%username))]
pub async fn ensure_account_exists(store: &dyn AccountStore, username: &str) -> Result<bool, GameError> {
  if store.exists(username).await? {
    return Ok(false);
  }
  info!(target: "globetrotter", %username, "User not found; provisioning placeholder account");
  let hash = hash_password(&generate_token(PLACEHOLDER_PASSWORD_BYTES))?;
  Ok(store.create(username, hash, None).await?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn register_then_login_rotates_token() {
    let store = MemoryAccounts::new();
    let reg = register(&store, "alice", "hunter2").await.expect("register");
    let first = login(&store, "alice", "hunter2").await.expect("login");
    assert_ne!(reg.auth_token, first.auth_token);
    let stored = store.find("alice").await.expect("find").expect("account");
    assert_eq!(stored.auth_token.as_deref(), Some(first.auth_token.as_str()));
  }

  #[tokio::test]
  async fn duplicate_registration_conflicts() {
    let store = MemoryAccounts::new();
    register(&store, "alice", "pw").await.expect("register");
    assert!(matches!(register(&store, "alice", "other").await, Err(GameError::Conflict(_))));
  }

  #[tokio::test]
  async fn bad_credentials_are_unauthorized() {
    let store = MemoryAccounts::new();
    register(&store, "alice", "pw").await.expect("register");
    assert!(matches!(login(&store, "alice", "nope").await, Err(GameError::Unauthorized(_))));
    assert!(matches!(login(&store, "bob", "pw").await, Err(GameError::Unauthorized(_))));
    assert!(matches!(login(&store, "", "pw").await, Err(GameError::Validation(_))));
  }

  #[tokio::test]
  async fn ensure_provisions_once() {
    let store = MemoryAccounts::new();
    assert!(ensure_account_exists(&store, "carol").await.expect("ensure"));
    assert!(!ensure_account_exists(&store, "carol").await.expect("ensure"));
    let acc = store.find("carol").await.expect("find").expect("account");
    assert!(acc.auth_token.is_none());
    assert!(acc.password_hash.starts_with("$argon2"));
  }

  #[test]
  fn tokens_are_url_safe() {
    let t = generate_token(TOKEN_BYTES);
    assert!(t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='));
    assert_ne!(t, generate_token(TOKEN_BYTES));
  }
}
