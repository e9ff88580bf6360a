/// Record types shared by the server and the client
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::persist::Document;

pub mod board;
pub mod list;
pub mod tag;
pub mod task;
pub mod user;

pub use board::{Board, BoardPatch, NewBoard};
pub use list::{List, ListPatch, NewList};
pub use tag::{NewTag, Tag, TagPatch};
pub use task::{NewTask, Task, TaskPatch, TaskStatus};
pub use user::{RegisterPayload, User};

/// A row in one of the document's collections.
///
/// Ids are only unique inside their scope: a board id is unique per owner, a
/// list id per board, a task id per list and a tag id per task. Users share a
/// single global scope.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Display name used in errors and logs ("Board").
    const KIND: &'static str;
    /// Collection path on the record API ("/boards").
    const PATH: &'static str;
    /// First id handed out in an empty scope.
    const ID_BASE: i64;
    /// Body field naming the scope parent, `None` for the global scope.
    const SCOPE_FIELD: Option<&'static str>;
    /// Whether `created_at` is stamped on create.
    const STAMPED: bool = true;

    fn id(&self) -> i64;

    /// Parent id the record's id is scoped to.
    fn scope(&self) -> Option<i64>;

    /// Owning user, compared against the session id on the client.
    fn owner(&self) -> Option<i64> {
        None
    }

    fn collection(doc: &Document) -> &Vec<Self>;

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self>;

    /// Removes dependents of `removed` from the document.
    fn cascade(_doc: &mut Document, _removed: &Self) {}
}
