//! Normalized client state.
//!
//! Each collection lives in its own [`Slice`], driven by request lifecycles:
//! `Pending` raises the loading flag and clears the last error, `Fulfilled`
//! applies the result, `Rejected` records the error message. Every change to
//! a slice's items bumps its revision so derived views know to recompute.

use crate::models::{Board, List, Record, Task};

use super::session::SessionUser;

#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle<P> {
    Pending,
    Fulfilled(P),
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct Slice<T> {
    pub items: Vec<T>,
    /// Record opened on its own (board screen, task detail).
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    revision: u64,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Slice {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
            revision: 0,
        }
    }
}

impl<T: Record> Slice<T> {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Runs `fulfil` for a fulfilled request; pending and rejected requests
    /// only touch the loading flag and error.
    pub fn on<P>(&mut self, event: Lifecycle<P>, fulfil: impl FnOnce(&mut Self, P)) {
        match event {
            Lifecycle::Pending => {
                self.loading = true;
                self.error = None;
            }
            Lifecycle::Fulfilled(payload) => {
                self.loading = false;
                fulfil(self, payload);
            }
            Lifecycle::Rejected(message) => {
                self.loading = false;
                self.error = Some(message);
            }
        }
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.touch();
    }

    pub fn set_current(&mut self, record: Option<T>) {
        self.current = record;
    }

    pub fn push(&mut self, record: T) {
        self.items.push(record);
        self.touch();
    }

    /// Swaps in the updated record at the first entry with its id.
    pub fn replace(&mut self, record: T) {
        if let Some(slot) = self.items.iter_mut().find(|r| r.id() == record.id()) {
            *slot = record.clone();
        }
        if self.current.as_ref().is_some_and(|c| c.id() == record.id()) {
            self.current = Some(record);
        }
        self.touch();
    }

    /// Drops the first entry with `id`, the one the server resolves the id to.
    pub fn remove(&mut self, id: i64) {
        if let Some(pos) = self.items.iter().position(|r| r.id() == id) {
            self.items.remove(pos);
        }
        if self.current.as_ref().is_some_and(|c| c.id() == id) {
            self.current = None;
        }
        self.touch();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Slice<Task> {
    /// Merges one list's fetch result.
    ///
    /// Prior tasks whose `list_id` appears among `fetched` are replaced; all
    /// others stay. An empty result therefore leaves the list's old tasks in
    /// place.
    pub fn merge_by_list(&mut self, fetched: Vec<Task>) {
        self.items
            .retain(|t| !fetched.iter().any(|f| f.list_id == t.list_id));
        self.items.extend(fetched);
        self.touch();
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub current: Option<SessionUser>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UserState {
    pub fn on(&mut self, event: Lifecycle<Option<SessionUser>>) {
        match event {
            Lifecycle::Pending => {
                self.loading = true;
                self.error = None;
            }
            Lifecycle::Fulfilled(user) => {
                self.loading = false;
                self.current = user;
            }
            Lifecycle::Rejected(message) => {
                self.loading = false;
                self.error = Some(message);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    pub user: UserState,
    pub boards: Slice<Board>,
    pub lists: Slice<List>,
    pub tasks: Slice<Task>,
}
