use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::persist::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Background image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBoard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
}

/// Partial board update; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

impl Record for Board {
    const KIND: &'static str = "Board";
    const PATH: &'static str = "/boards";
    const ID_BASE: i64 = 101;
    const SCOPE_FIELD: Option<&'static str> = Some("user_id");

    fn id(&self) -> i64 {
        self.id
    }

    fn scope(&self) -> Option<i64> {
        self.user_id
    }

    fn owner(&self) -> Option<i64> {
        self.user_id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.boards
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.boards
    }

    /// Drops the board's lists, then the tasks of those lists.
    ///
    /// List ids are only unique per board, so a task whose `list_id` still
    /// names a surviving list cannot be told apart from that list's own tasks
    /// and is kept.
    fn cascade(doc: &mut Document, removed: &Self) {
        let board_id = removed.id;
        let mut dropped_lists = Vec::new();
        doc.lists.retain(|l| {
            if l.board_id == board_id {
                dropped_lists.push(l.id);
                false
            } else {
                true
            }
        });
        let surviving: Vec<i64> = doc.lists.iter().map(|l| l.id).collect();
        let mut dropped_tasks = Vec::new();
        doc.tasks.retain(|t| {
            let orphaned =
                dropped_lists.contains(&t.list_id) && !surviving.contains(&t.list_id);
            if orphaned {
                dropped_tasks.push(t.id);
            }
            !orphaned
        });
        doc.tags.retain(|tag| !dropped_tasks.contains(&tag.task_id));
    }
}
