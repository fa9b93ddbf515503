//! Caller identity taken from the API Gateway authorizer.
//!
//! Tokens are validated by the Cognito authorizer before a request reaches a Lambda;
//! here we only read the claims it forwards.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Expert,
    SuperAdmin,
}

impl Role {
    /// Superadmins open requests without spending a token.
    pub fn is_debit_exempt(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn can_work_queue(&self) -> bool {
        matches!(self, Role::Expert | Role::SuperAdmin)
    }

    /// Experts answer requests; they never open one.
    pub fn can_open_requests(&self) -> bool {
        matches!(self, Role::User | Role::SuperAdmin)
    }

    pub fn can_rate(&self) -> bool {
        matches!(self, Role::User)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "expert" => Ok(Role::Expert),
            "superadmin" => Ok(Role::SuperAdmin),
            other => Err(Error::Auth(format!("Unknown role '{}'", other))),
        }
    }
}

/// The authenticated principal behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn user(id: Uuid) -> Self {
        Self { id, role: Role::User }
    }

    pub fn expert(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Expert,
        }
    }
}

/// Extract the caller from the authorizer claims object.
///
/// `sub` carries the user or expert id; `custom:role` defaults to `user` when absent.
pub fn extract_caller(claims: &serde_json::Value) -> Result<Caller> {
    let sub = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Auth("Missing sub claim".to_string()))?;

    let id = Uuid::parse_str(sub).map_err(|_| Error::Auth("Invalid subject id".to_string()))?;

    let role = match claims.get("custom:role").and_then(|v| v.as_str()) {
        Some(raw) => raw.parse()?,
        None => Role::User,
    };

    Ok(Caller { id, role })
}
