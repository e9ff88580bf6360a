use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::persist::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    // stored as-is, the board has no credential hashing
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Record for User {
    const KIND: &'static str = "User";
    const PATH: &'static str = "/users";
    const ID_BASE: i64 = 1;
    const SCOPE_FIELD: Option<&'static str> = None;

    fn id(&self) -> i64 {
        self.id
    }

    fn scope(&self) -> Option<i64> {
        None
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.users
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.users
    }
}
