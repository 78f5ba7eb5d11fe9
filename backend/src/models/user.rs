use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Turkish national identification number: exactly eleven ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tckn(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid TCKN")]
pub struct InvalidTckn;

impl Tckn {
    pub const LEN: usize = 11;

    pub fn parse(raw: &str) -> Result<Self, InvalidTckn> {
        if raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidTckn)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tckn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub tckn: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub public_address: Option<String>,
    pub nonce: i64,
    pub meskens: Vec<String>,
    pub created_at: i64,
}

/// Registration payload after validation; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub tckn: Tckn,
    pub password_hash: Option<String>,
}

impl NewUser {
    pub fn into_user(self, now: i64) -> User {
        User {
            tckn: self.tckn.0,
            password_hash: self.password_hash,
            public_address: None,
            nonce: 0,
            meskens: Vec::new(),
            created_at: now,
        }
    }
}
