use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::persist::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub board_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewList {
    pub board_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Record for List {
    const KIND: &'static str = "List";
    const PATH: &'static str = "/lists";
    const ID_BASE: i64 = 201;
    const SCOPE_FIELD: Option<&'static str> = Some("board_id");

    fn id(&self) -> i64 {
        self.id
    }

    fn scope(&self) -> Option<i64> {
        Some(self.board_id)
    }

    fn owner(&self) -> Option<i64> {
        self.user_id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.lists
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.lists
    }

    fn cascade(doc: &mut Document, removed: &Self) {
        let mut dropped_tasks = Vec::new();
        doc.tasks.retain(|t| {
            if t.list_id == removed.id {
                dropped_tasks.push(t.id);
                false
            } else {
                true
            }
        });
        doc.tags.retain(|tag| !dropped_tasks.contains(&tag.task_id));
    }
}
