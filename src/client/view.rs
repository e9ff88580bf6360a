//! Board screen view model: the lists of one board, each holding its cards.
use serde::Serialize;

use crate::models::{List, Task, TaskStatus};

use super::store::Slice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub id: i64,
    pub title: String,
    pub cards: Vec<CardView>,
}

impl From<&Task> for CardView {
    fn from(task: &Task) -> Self {
        CardView {
            id: task.id,
            title: task.title.clone(),
            status: task.status,
            is_completed: task.status.is_done(),
        }
    }
}

/// Lists of `board_id` in collection order, each with its tasks in
/// collection order. Lists without tasks are kept with no cards; tasks whose
/// list is not among them are dropped.
pub fn reconcile(lists: &[List], tasks: &[Task], board_id: i64) -> Vec<ListView> {
    lists
        .iter()
        .filter(|l| l.board_id == board_id)
        .map(|l| ListView {
            id: l.id,
            title: l.title.clone(),
            cards: tasks
                .iter()
                .filter(|t| t.list_id == l.id)
                .map(CardView::from)
                .collect(),
        })
        .collect()
}

/// Card with `task_id` and the title of the list holding it.
pub fn find_card(view: &[ListView], task_id: i64) -> Option<(&CardView, &str)> {
    view.iter().find_map(|l| {
        l.cards
            .iter()
            .find(|c| c.id == task_id)
            .map(|c| (c, l.title.as_str()))
    })
}

/// Cached reconciliation for one board, rebuilt in full whenever the lists or
/// tasks slice has changed since the last build.
#[derive(Debug, Clone)]
pub struct BoardView {
    board_id: i64,
    seen: Option<(u64, u64)>,
    lists: Vec<ListView>,
}

impl BoardView {
    pub fn new(board_id: i64) -> Self {
        BoardView {
            board_id,
            seen: None,
            lists: Vec::new(),
        }
    }

    pub fn board_id(&self) -> i64 {
        self.board_id
    }

    /// Returns whether the view was rebuilt.
    pub fn refresh(&mut self, lists: &Slice<List>, tasks: &Slice<Task>) -> bool {
        let revisions = (lists.revision(), tasks.revision());
        if self.seen == Some(revisions) {
            return false;
        }
        self.lists = reconcile(&lists.items, &tasks.items, self.board_id);
        self.seen = Some(revisions);
        true
    }

    pub fn lists(&self) -> &[ListView] {
        &self.lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn list(id: i64, board_id: i64, title: &str) -> List {
        List {
            id,
            board_id,
            user_id: Some(1),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    fn task(id: i64, list_id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            list_id,
            user_id: Some(1),
            title: title.into(),
            description: None,
            status,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lists_keep_collection_order_and_own_tasks() {
        let lists = vec![
            list(202, 101, "Doing"),
            list(201, 101, "To do"),
            list(201, 102, "Other board"),
        ];
        let tasks = vec![
            task(301, 201, "a", TaskStatus::Todo),
            task(301, 202, "b", TaskStatus::Done),
            task(302, 201, "c", TaskStatus::InProgress),
        ];
        let view = reconcile(&lists, &tasks, 101);
        let shape: Vec<(i64, Vec<&str>)> = view
            .iter()
            .map(|l| (l.id, l.cards.iter().map(|c| c.title.as_str()).collect()))
            .collect();
        assert_eq!(shape, vec![(202, vec!["b"]), (201, vec!["a", "c"])]);
        assert!(view[0].cards[0].is_completed);
        assert!(!view[1].cards[1].is_completed);
    }

    #[test]
    fn empty_lists_stay_and_orphans_drop() {
        let lists = vec![list(201, 101, "Empty")];
        let tasks = vec![task(301, 299, "orphan", TaskStatus::Todo)];
        let view = reconcile(&lists, &tasks, 101);
        assert_eq!(view.len(), 1);
        assert!(view[0].cards.is_empty());
        assert!(reconcile(&lists, &tasks, 555).is_empty());
    }

    #[test]
    fn find_card_reports_list_title() {
        let lists = vec![list(201, 101, "To buy")];
        let tasks = vec![task(301, 201, "Tent", TaskStatus::Done)];
        let view = reconcile(&lists, &tasks, 101);
        let (card, list_title) = find_card(&view, 301).unwrap();
        assert_eq!((card.title.as_str(), list_title), ("Tent", "To buy"));
        assert!(find_card(&view, 999).is_none());
    }

    #[test]
    fn board_view_rebuilds_only_after_slice_changes() {
        let mut lists: Slice<List> = Slice::default();
        let mut tasks: Slice<Task> = Slice::default();
        let mut view = BoardView::new(101);

        assert!(view.refresh(&lists, &tasks));
        assert!(!view.refresh(&lists, &tasks));

        lists.push(list(201, 101, "To buy"));
        assert!(view.refresh(&lists, &tasks));
        assert_eq!(view.lists().len(), 1);

        tasks.merge_by_list(vec![task(301, 201, "Tent", TaskStatus::Todo)]);
        assert!(view.refresh(&lists, &tasks));
        assert_eq!(view.lists()[0].cards.len(), 1);
        assert!(!view.refresh(&lists, &tasks));
    }
}
