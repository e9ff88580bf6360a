//! Typed record access with ownership filtering.
//!
//! The record API returns whole collections; these services narrow them to
//! records owned by the session user. Without a session every read comes
//! back empty and every write fails with [`ClientError::Unauthenticated`].

use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

use super::api::ApiClient;
use super::error::ClientError;
use crate::models::{Board, List, RegisterPayload, Record, Tag, Task, User};

pub type BoardService = RecordService<Board>;
pub type ListService = RecordService<List>;
pub type TaskService = RecordService<Task>;
pub type TagService = RecordService<Tag>;

pub struct RecordService<T> {
    api: ApiClient,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordService<T> {
    fn clone(&self) -> Self {
        RecordService {
            api: self.api.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> RecordService<T> {
    pub fn new(api: ApiClient) -> Self {
        RecordService {
            api,
            _record: PhantomData,
        }
    }

    fn item_path(id: i64) -> String {
        format!("{}/{}", T::PATH, id)
    }

    fn require_session(&self) -> Result<i64, ClientError> {
        self.api
            .session()
            .user_id()
            .ok_or(ClientError::Unauthenticated)
    }

    /// Owned records matching `keep`, in collection order.
    pub async fn owned_where(&self, keep: impl Fn(&T) -> bool) -> Result<Vec<T>, ClientError> {
        let all: Vec<T> = self.api.get(T::PATH).await?;
        let Some(user_id) = self.api.session().user_id() else {
            return Ok(Vec::new());
        };
        Ok(all
            .into_iter()
            .filter(|r| r.owner() == Some(user_id) && keep(r))
            .collect())
    }

    /// The record if the session user owns it. A missing record is an error;
    /// a foreign one (or no session) is `None`.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<T>, ClientError> {
        let record: T = self.api.get(&Self::item_path(id)).await?;
        let Some(user_id) = self.api.session().user_id() else {
            return Ok(None);
        };
        Ok((record.owner() == Some(user_id)).then_some(record))
    }

    /// Creates a record owned by the session user.
    pub async fn create<P: Serialize>(&self, payload: &P) -> Result<T, ClientError> {
        let user_id = self.require_session()?;
        let mut body = match serde_json::to_value(payload) {
            Ok(Value::Object(fields)) => fields,
            _ => serde_json::Map::new(),
        };
        body.insert("user_id".into(), Value::from(user_id));
        self.api.post(T::PATH, &body).await
    }

    pub async fn update<P: Serialize>(&self, id: i64, patch: &P) -> Result<T, ClientError> {
        self.require_session()?;
        self.owned(id).await?;
        self.api.patch(&Self::item_path(id), patch).await
    }

    pub async fn remove(&self, id: i64) -> Result<(), ClientError> {
        self.require_session()?;
        self.owned(id).await?;
        self.api.delete(&Self::item_path(id)).await
    }

    async fn owned(&self, id: i64) -> Result<T, ClientError> {
        self.get_by_id(id)
            .await?
            .ok_or(ClientError::AccessDenied { kind: T::KIND, id })
    }
}

impl RecordService<Board> {
    pub async fn get_all(&self) -> Result<Vec<Board>, ClientError> {
        self.owned_where(|_| true).await
    }
}

impl RecordService<List> {
    pub async fn get_by_board(&self, board_id: i64) -> Result<Vec<List>, ClientError> {
        self.owned_where(|l| l.board_id == board_id).await
    }
}

impl RecordService<Task> {
    pub async fn get_by_list(&self, list_id: i64) -> Result<Vec<Task>, ClientError> {
        self.owned_where(|t| t.list_id == list_id).await
    }
}

impl RecordService<Tag> {
    pub async fn get_by_task(&self, task_id: i64) -> Result<Vec<Tag>, ClientError> {
        self.owned_where(|t| t.task_id == task_id).await
    }
}

/// Registration and the credential lookup used for sign-in.
#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        UserService { api }
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<User, ClientError> {
        self.api.post(User::PATH, payload).await
    }

    /// First user whose email and password both match.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ClientError> {
        let users: Vec<User> = self.api.get(User::PATH).await?;
        Ok(users
            .into_iter()
            .find(|u| u.email == email && u.password == password))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ClientError> {
        let users: Vec<User> = self.api.get(User::PATH).await?;
        Ok(users.iter().any(|u| u.email == email))
    }
}
