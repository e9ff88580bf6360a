use serde::{Deserialize, Serialize};

use super::Record;
use crate::persist::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub task_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub content: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    pub task_id: i64,
    pub content: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Record for Tag {
    const KIND: &'static str = "Tag";
    const PATH: &'static str = "/tags";
    const ID_BASE: i64 = 401;
    const SCOPE_FIELD: Option<&'static str> = Some("task_id");
    const STAMPED: bool = false;

    fn id(&self) -> i64 {
        self.id
    }

    fn scope(&self) -> Option<i64> {
        Some(self.task_id)
    }

    fn owner(&self) -> Option<i64> {
        self.user_id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.tags
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.tags
    }
}
