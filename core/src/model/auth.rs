// bagworks/src/model/auth.rs
use crate::error::{BagworksError, BagworksResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Customer,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Customer => "customer",
    }
  }

  pub fn parse(raw: &str) -> Option<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "admin" => Some(Role::Admin),
      "customer" | "user" => Some(Role::Customer),
      _ => None,
    }
  }
}

/// The caller of an operation: a trusted user id from the session collaborator
/// plus the roles looked up for it. Built once per request and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
  pub user_id: Uuid,
  pub roles: Vec<Role>,
}

impl AuthContext {
  pub fn new(user_id: Uuid, roles: Vec<Role>) -> Self {
    Self { user_id, roles }
  }

  pub fn customer(user_id: Uuid) -> Self {
    Self::new(user_id, vec![Role::Customer])
  }

  pub fn admin(user_id: Uuid) -> Self {
    Self::new(user_id, vec![Role::Admin])
  }

  pub fn is_admin(&self) -> bool {
    self.roles.contains(&Role::Admin)
  }

  pub fn require_admin(&self) -> BagworksResult<()> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(BagworksError::Authorization)
    }
  }

  /// Admins may act on any user's records; everyone else only on their own.
  pub fn require_owner_or_admin(&self, owner_id: Uuid) -> BagworksResult<()> {
    if self.is_admin() || self.user_id == owner_id {
      Ok(())
    } else {
      Err(BagworksError::Authorization)
    }
  }
}
