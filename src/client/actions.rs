//! High level client: every user action runs its request and records the
//! outcome in the shared [`Store`] as a pending, fulfilled or rejected step.

use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::api::ApiClient;
use super::autosave::{EditSession, TaskSaver};
use super::dashboard::DashboardGroups;
use super::error::ClientError;
use super::services::{BoardService, ListService, TagService, TaskService, UserService};
use super::session::{Session, SessionUser};
use super::store::{Lifecycle, Slice, Store};
use super::validate::{self, ValidationError};
use super::view::{reconcile, BoardView, ListView};
use crate::config::Config;
use crate::models::{
    Board, BoardPatch, List, ListPatch, NewBoard, NewList, NewTag, NewTask, Record,
    RegisterPayload, Tag, TagPatch, Task, TaskPatch,
};

#[derive(Clone)]
pub struct TaskboardClient {
    api: ApiClient,
    users: UserService,
    boards: BoardService,
    lists: ListService,
    tasks: TaskService,
    tags: TagService,
    store: Arc<RwLock<Store>>,
}

fn boards(store: &mut Store) -> &mut Slice<Board> {
    &mut store.boards
}

fn lists(store: &mut Store) -> &mut Slice<List> {
    &mut store.lists
}

fn tasks(store: &mut Store) -> &mut Slice<Task> {
    &mut store.tasks
}

fn first_error(errors: Vec<ValidationError>) -> Result<(), ClientError> {
    match errors.into_iter().next() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

impl TaskboardClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        let api = ApiClient::new(base_url, session);
        let mut store = Store::default();
        store.user.current = api.session().current();
        TaskboardClient {
            users: UserService::new(api.clone()),
            boards: BoardService::new(api.clone()),
            lists: ListService::new(api.clone()),
            tasks: TaskService::new(api.clone()),
            tags: TagService::new(api.clone()),
            api,
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let session = match &config.session_path {
            Some(path) => Session::open(path),
            None => Session::in_memory(),
        };
        Self::new(&config.api_url, session)
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    pub fn store(&self) -> Arc<RwLock<Store>> {
        self.store.clone()
    }

    pub async fn snapshot(&self) -> Store {
        self.store.read().await.clone()
    }

    /// Runs `request` as one lifecycle on the slice picked by `select`.
    async fn run<T, R>(
        &self,
        select: fn(&mut Store) -> &mut Slice<T>,
        request: impl Future<Output = Result<R, ClientError>>,
        apply: impl FnOnce(&mut Slice<T>, R),
    ) -> Result<R, ClientError>
    where
        T: Record,
        R: Clone,
    {
        select(&mut *self.store.write().await).on(Lifecycle::<R>::Pending, |_, _| {});
        let result = request.await;
        let mut store = self.store.write().await;
        match &result {
            Ok(value) => select(&mut store).on(Lifecycle::Fulfilled(value.clone()), apply),
            Err(e) => {
                tracing::debug!(kind = T::KIND, error = %e, "request rejected");
                select(&mut store).on(Lifecycle::<R>::Rejected(e.to_string()), apply)
            }
        }
        result
    }

    async fn run_user(
        &self,
        request: impl Future<Output = Result<SessionUser, ClientError>>,
    ) -> Result<SessionUser, ClientError> {
        self.store.write().await.user.on(Lifecycle::Pending);
        let result = request.await;
        let event = match &result {
            Ok(user) => Lifecycle::Fulfilled(Some(user.clone())),
            Err(e) => Lifecycle::Rejected(e.to_string()),
        };
        self.store.write().await.user.on(event);
        result
    }

    // users

    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, ClientError> {
        self.run_user(async {
            first_error(validate::sign_up_errors(username, email, password))?;
            let email = email.trim();
            if self.users.email_exists(email).await? {
                return Err(ValidationError::EmailTaken(email.to_string()).into());
            }
            let user = self
                .users
                .register(&RegisterPayload {
                    username: username.trim().to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await?;
            let signed_in = SessionUser::from(&user);
            self.session().sign_in(signed_in.clone());
            tracing::info!(user_id = user.id, "registered and signed in");
            Ok::<_, ClientError>(signed_in)
        })
        .await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        self.run_user(async {
            first_error(validate::sign_in_errors(email, password))?;
            let user = self
                .users
                .login(email.trim(), password)
                .await?
                .ok_or(ClientError::InvalidCredentials)?;
            let signed_in = SessionUser::from(&user);
            self.session().sign_in(signed_in.clone());
            tracing::info!(user_id = user.id, "signed in");
            Ok::<_, ClientError>(signed_in)
        })
        .await
    }

    /// Forgets the session and everything loaded under it.
    pub async fn sign_out(&self) {
        self.session().sign_out();
        *self.store.write().await = Store::default();
    }

    // boards

    pub async fn fetch_user_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.run(boards, self.boards.get_all(), Slice::replace_all)
            .await
    }

    pub async fn dashboard(&self) -> DashboardGroups {
        DashboardGroups::from_boards(&self.store.read().await.boards.items)
    }

    /// Opens a board as the current one. A foreign board opens as `None`.
    pub async fn fetch_board(&self, id: i64) -> Result<Option<Board>, ClientError> {
        self.run(boards, self.boards.get_by_id(id), Slice::set_current)
            .await
    }

    pub async fn create_board(&self, board: NewBoard) -> Result<Board, ClientError> {
        self.run(
            boards,
            async {
                validate::require("board title", &board.title)?;
                self.boards.create(&board).await
            },
            Slice::push,
        )
        .await
    }

    pub async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Board, ClientError> {
        self.run(boards, self.boards.update(id, &patch), Slice::replace)
            .await
    }

    pub async fn toggle_star(&self, id: i64) -> Result<Board, ClientError> {
        let board = self
            .boards
            .get_by_id(id)
            .await?
            .ok_or(ClientError::AccessDenied {
                kind: Board::KIND,
                id,
            })?;
        let patch = BoardPatch {
            is_starred: Some(!board.is_starred),
            ..Default::default()
        };
        self.update_board(id, patch).await
    }

    pub async fn close_board(&self, id: i64) -> Result<Board, ClientError> {
        let patch = BoardPatch {
            is_closed: Some(true),
            ..Default::default()
        };
        self.update_board(id, patch).await
    }

    /// Deletes the board and drops its lists and their tasks from the store.
    pub async fn delete_board(&self, id: i64) -> Result<(), ClientError> {
        self.run(boards, self.boards.remove(id), |slice, ()| slice.remove(id))
            .await?;
        let mut store = self.store.write().await;
        let (dropped, kept): (Vec<List>, Vec<List>) = store
            .lists
            .items
            .iter()
            .cloned()
            .partition(|l| l.board_id == id);
        if !dropped.is_empty() {
            let orphaned = |t: &Task| {
                dropped.iter().any(|l| l.id == t.list_id)
                    && !kept.iter().any(|l| l.id == t.list_id)
            };
            let remaining: Vec<Task> = store
                .tasks
                .items
                .iter()
                .filter(|t| !orphaned(t))
                .cloned()
                .collect();
            store.tasks.replace_all(remaining);
            store.lists.replace_all(kept);
        }
        Ok(())
    }

    // lists

    pub async fn fetch_lists_by_board(&self, board_id: i64) -> Result<Vec<List>, ClientError> {
        self.run(lists, self.lists.get_by_board(board_id), Slice::replace_all)
            .await
    }

    pub async fn create_list(&self, board_id: i64, title: &str) -> Result<List, ClientError> {
        let existing = self.board_view(board_id).await;
        self.run(
            lists,
            async {
                let title = validate::list_title(title, &existing, None)?;
                self.lists.create(&NewList { board_id, title }).await
            },
            Slice::push,
        )
        .await
    }

    pub async fn rename_list(&self, id: i64, title: &str) -> Result<List, ClientError> {
        let board_id = {
            let store = self.store.read().await;
            store
                .lists
                .items
                .iter()
                .find(|l| l.id == id)
                .map(|l| l.board_id)
        };
        let existing = match board_id {
            Some(board_id) => self.board_view(board_id).await,
            None => Vec::new(),
        };
        self.run(
            lists,
            async {
                let title = validate::list_title(title, &existing, Some(id))?;
                self.lists.update(id, &ListPatch { title: Some(title) }).await
            },
            Slice::replace,
        )
        .await
    }

    pub async fn delete_list(&self, id: i64) -> Result<(), ClientError> {
        self.run(lists, self.lists.remove(id), |slice, ()| slice.remove(id))
            .await?;
        let mut store = self.store.write().await;
        let remaining: Vec<Task> = store
            .tasks
            .items
            .iter()
            .filter(|t| t.list_id != id)
            .cloned()
            .collect();
        if remaining.len() != store.tasks.items.len() {
            store.tasks.replace_all(remaining);
        }
        Ok(())
    }

    pub async fn clear_lists(&self) {
        self.store.write().await.lists.clear();
    }

    // tasks

    pub async fn fetch_tasks_by_list(&self, list_id: i64) -> Result<Vec<Task>, ClientError> {
        self.run(tasks, self.tasks.get_by_list(list_id), Slice::merge_by_list)
            .await
    }

    /// Fetches every loaded list of the board concurrently and merges each
    /// result. The first failure is reported after all results are applied.
    pub async fn fetch_tasks_for_board(&self, board_id: i64) -> Result<Vec<Task>, ClientError> {
        let list_ids: Vec<i64> = {
            let store = self.store.read().await;
            store
                .lists
                .items
                .iter()
                .filter(|l| l.board_id == board_id)
                .map(|l| l.id)
                .collect()
        };
        tracing::debug!(board_id, lists = list_ids.len(), "fetching board tasks");
        self.store
            .write()
            .await
            .tasks
            .on(Lifecycle::<()>::Pending, |_, _| {});
        let results = join_all(list_ids.iter().map(|&id| self.tasks.get_by_list(id))).await;

        let mut store = self.store.write().await;
        let mut fetched = Vec::new();
        let mut failure = None;
        for result in results {
            match result {
                Ok(batch) => {
                    fetched.extend(batch.iter().cloned());
                    store
                        .tasks
                        .on(Lifecycle::Fulfilled(batch), Slice::merge_by_list);
                }
                Err(e) => {
                    store
                        .tasks
                        .on(Lifecycle::Rejected(e.to_string()), Slice::merge_by_list);
                    failure.get_or_insert(e);
                }
            }
        }
        store.tasks.loading = false;
        match failure {
            Some(e) => Err(e),
            None => Ok(fetched),
        }
    }

    pub async fn fetch_task(&self, id: i64) -> Result<Option<Task>, ClientError> {
        self.run(tasks, self.tasks.get_by_id(id), Slice::set_current)
            .await
    }

    pub async fn create_task(&self, task: NewTask) -> Result<Task, ClientError> {
        self.run(
            tasks,
            async {
                validate::require("card title", &task.title)?;
                self.tasks.create(&task).await
            },
            Slice::push,
        )
        .await
    }

    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task, ClientError> {
        self.run(tasks, self.tasks.update(id, &patch), Slice::replace)
            .await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        self.run(tasks, self.tasks.remove(id), |slice, ()| slice.remove(id))
            .await
    }

    pub async fn clear_tasks(&self) {
        self.store.write().await.tasks.clear();
    }

    /// Task detail editor with debounced title autosave.
    pub fn edit_task(&self, task: &Task) -> EditSession<TaskboardClient> {
        EditSession::new(task, Arc::new(self.clone()))
    }

    // tags

    pub async fn fetch_tags(&self, task_id: i64) -> Result<Vec<Tag>, ClientError> {
        self.tags.get_by_task(task_id).await
    }

    pub async fn create_tag(&self, tag: NewTag) -> Result<Tag, ClientError> {
        validate::require("tag content", &tag.content)?;
        self.tags.create(&tag).await
    }

    pub async fn update_tag(&self, id: i64, patch: TagPatch) -> Result<Tag, ClientError> {
        self.tags.update(id, &patch).await
    }

    pub async fn delete_tag(&self, id: i64) -> Result<(), ClientError> {
        self.tags.remove(id).await
    }

    // views

    /// Lists of the board with their cards, from what the store holds now.
    pub async fn board_view(&self, board_id: i64) -> Vec<ListView> {
        let store = self.store.read().await;
        reconcile(&store.lists.items, &store.tasks.items, board_id)
    }

    /// Rebuilds `view` if the store changed since its last refresh.
    pub async fn refresh_view(&self, view: &mut BoardView) -> bool {
        let store = self.store.read().await;
        view.refresh(&store.lists, &store.tasks)
    }

    pub async fn clear_errors(&self) {
        let mut store = self.store.write().await;
        store.user.error = None;
        store.boards.clear_error();
        store.lists.clear_error();
        store.tasks.clear_error();
    }
}

#[async_trait]
impl TaskSaver for TaskboardClient {
    async fn save_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task, ClientError> {
        self.update_task(task_id, patch).await
    }
}

#[async_trait]
impl TaskSaver for TaskService {
    async fn save_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task, ClientError> {
        self.update(task_id, &patch).await
    }
}
