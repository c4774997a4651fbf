// src/models/candidate.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A candidate profile joined with the identity it belongs to.
///
/// Names and email live on the external 'users' table; phone and bio are
/// owned by the 'candidates' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,

    /// The identity this profile belongs to (one-to-one).
    pub user_id: i64,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub is_active: bool,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An external identity, as seen by the candidate directory.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
