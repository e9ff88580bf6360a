//! Debounced title autosave for the task detail editor.
//!
//! Each title keystroke restarts a one second timer. When the timer runs out
//! the whole draft (title, description, status) is sent as one update. An
//! explicit save bypasses the timer and hands the result back to the caller.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::error::ClientError;
use crate::models::{Task, TaskPatch, TaskStatus};

pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

/// Whatever persists a task draft.
#[async_trait]
pub trait TaskSaver: Send + Sync + 'static {
    async fn save_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    PendingChange,
    Saving,
}

/// What teardown does with an edit the timer has not saved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    #[default]
    Discard,
    Flush,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
        }
    }
}

impl TaskDraft {
    fn patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            status: Some(self.status),
            due_date: None,
        }
    }
}

#[derive(Debug)]
struct Shared {
    draft: TaskDraft,
    state: AutosaveState,
    /// Bumped on every draft change; a save only settles to Idle if the draft
    /// did not change while it was in flight.
    edits: u64,
}

/// Editing session for one task. Dropping it cancels a pending timer.
pub struct EditSession<S: TaskSaver> {
    task_id: i64,
    saver: Arc<S>,
    shared: Arc<Mutex<Shared>>,
    timer: Option<JoinHandle<()>>,
    policy: FlushPolicy,
    delay: Duration,
}

impl<S: TaskSaver> EditSession<S> {
    pub fn new(task: &Task, saver: Arc<S>) -> Self {
        EditSession {
            task_id: task.id,
            saver,
            shared: Arc::new(Mutex::new(Shared {
                draft: TaskDraft::from(task),
                state: AutosaveState::Idle,
                edits: 0,
            })),
            timer: None,
            policy: FlushPolicy::default(),
            delay: AUTOSAVE_DELAY,
        }
    }

    pub fn with_policy(mut self, policy: FlushPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn state(&self) -> AutosaveState {
        lock(&self.shared).state
    }

    pub fn draft(&self) -> TaskDraft {
        lock(&self.shared).draft.clone()
    }

    /// Title keystroke. Restarts the timer unless the title is blank, in
    /// which case the pending timer is dropped and nothing is scheduled.
    pub fn edit_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.cancel_timer();
        let blank = title.trim().is_empty();
        {
            let mut shared = lock(&self.shared);
            shared.draft.title = title;
            shared.state = AutosaveState::PendingChange;
            shared.edits += 1;
        }
        if blank {
            return;
        }
        self.timer = Some(tokio::spawn(expire(
            self.delay,
            self.task_id,
            self.saver.clone(),
            self.shared.clone(),
        )));
    }

    pub fn set_description(&mut self, description: Option<String>) {
        let mut shared = lock(&self.shared);
        shared.draft.description = description;
        shared.state = AutosaveState::PendingChange;
        shared.edits += 1;
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        let mut shared = lock(&self.shared);
        shared.draft.status = status;
        shared.state = AutosaveState::PendingChange;
        shared.edits += 1;
    }

    /// Saves the draft now, cancelling the timer.
    pub async fn save_now(&mut self) -> Result<Task, ClientError> {
        self.cancel_timer();
        let (patch, edits) = {
            let mut shared = lock(&self.shared);
            shared.state = AutosaveState::Saving;
            (shared.draft.patch(), shared.edits)
        };
        let result = self.saver.save_task(self.task_id, patch).await;
        settle(&self.shared, edits, result.is_ok());
        result
    }

    /// Flips DONE and IN-PROGRESS and sends only the new status. Other
    /// unsaved draft fields stay pending and the timer keeps running.
    pub async fn toggle_complete(&mut self) -> Result<Task, ClientError> {
        let status = {
            let mut shared = lock(&self.shared);
            shared.draft.status = if shared.draft.status.is_done() {
                TaskStatus::InProgress
            } else {
                TaskStatus::Done
            };
            shared.draft.status
        };
        let patch = TaskPatch {
            status: Some(status),
            ..Default::default()
        };
        let result = self.saver.save_task(self.task_id, patch).await;
        if result.is_err() {
            let mut shared = lock(&self.shared);
            shared.state = AutosaveState::PendingChange;
            shared.edits += 1;
        }
        result
    }

    /// Closes the editor. Under [`FlushPolicy::Flush`] an unsaved edit is
    /// saved first; otherwise it is lost.
    pub async fn teardown(mut self) -> Result<(), ClientError> {
        let pending = self.state() == AutosaveState::PendingChange;
        if pending && self.policy == FlushPolicy::Flush {
            self.save_now().await?;
        } else {
            if pending {
                tracing::debug!(task_id = self.task_id, "discarding unsaved task edit");
            }
            self.cancel_timer();
        }
        Ok(())
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<S: TaskSaver> Drop for EditSession<S> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn settle(shared: &Mutex<Shared>, edits: u64, saved: bool) {
    let mut shared = lock(shared);
    if shared.edits != edits {
        return;
    }
    shared.state = if saved {
        AutosaveState::Idle
    } else {
        AutosaveState::PendingChange
    };
}

async fn expire<S: TaskSaver>(
    delay: Duration,
    task_id: i64,
    saver: Arc<S>,
    shared: Arc<Mutex<Shared>>,
) {
    tokio::time::sleep(delay).await;
    let (patch, edits) = {
        let mut guard = lock(&shared);
        guard.state = AutosaveState::Saving;
        (guard.draft.patch(), guard.edits)
    };
    // The request outlives the timer: a keystroke during the save restarts
    // the timer without cancelling the request.
    tokio::spawn(async move {
        let result = saver.save_task(task_id, patch).await;
        if let Err(e) = &result {
            tracing::warn!(task_id, error = %e, "task autosave failed");
        }
        settle(&shared, edits, result.is_ok());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSaver {
        calls: AtomicUsize,
        last: Mutex<Option<TaskPatch>>,
        fail: bool,
        latency: Option<Duration>,
    }

    impl CountingSaver {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskSaver for CountingSaver {
        async fn save_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(patch.clone());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.fail {
                return Err(ClientError::Status {
                    status: 500,
                    message: "down".into(),
                });
            }
            let mut saved = task();
            saved.id = task_id;
            saved.title = patch.title.unwrap_or_default();
            saved.description = patch.description;
            saved.status = patch.status.unwrap_or_default();
            Ok(saved)
        }
    }

    fn task() -> Task {
        Task {
            id: 301,
            list_id: 201,
            user_id: Some(1),
            title: "Tent".into(),
            description: Some("two person".into()),
            status: TaskStatus::Todo,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    async fn idle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn one_save_after_quiet_period() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Tent!");
        assert_eq!(session.state(), AutosaveState::PendingChange);
        idle(999).await;
        assert_eq!(saver.calls(), 0);
        idle(2).await;
        assert_eq!(saver.calls(), 1);
        assert_eq!(session.state(), AutosaveState::Idle);

        let sent = saver.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.title.as_deref(), Some("Tent!"));
        assert_eq!(sent.description.as_deref(), Some("two person"));
        assert_eq!(sent.status, Some(TaskStatus::Todo));
    }

    #[tokio::test(start_paused = true)]
    async fn steady_typing_never_saves() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        for i in 0..50 {
            session.edit_title(format!("Tent {i}"));
            idle(100).await;
        }
        assert_eq!(saver.calls(), 0);

        idle(1000).await;
        assert_eq!(saver.calls(), 1);
        assert_eq!(
            saver.last.lock().unwrap().as_ref().unwrap().title.as_deref(),
            Some("Tent 49")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blank_title_cancels_pending_save() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Ten");
        idle(500).await;
        session.edit_title("   ");
        idle(3000).await;
        assert_eq!(saver.calls(), 0);
        assert_eq!(session.state(), AutosaveState::PendingChange);
    }

    #[tokio::test(start_paused = true)]
    async fn description_edits_do_not_start_the_timer() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.set_description(Some("four person".into()));
        session.set_status(TaskStatus::InProgress);
        idle(3000).await;
        assert_eq!(saver.calls(), 0);
        assert_eq!(session.state(), AutosaveState::PendingChange);
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_bypasses_the_timer() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Big tent");
        let saved = session.save_now().await.unwrap();
        assert_eq!(saved.title, "Big tent");
        assert_eq!(session.state(), AutosaveState::Idle);

        idle(3000).await;
        assert_eq!(saver.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_stays_pending() {
        let saver = Arc::new(CountingSaver {
            fail: true,
            ..Default::default()
        });
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Tarp");
        assert!(session.save_now().await.is_err());
        assert_eq!(session.state(), AutosaveState::PendingChange);

        session.edit_title("Tarp 2");
        idle(1500).await;
        assert_eq!(saver.calls(), 2);
        assert_eq!(session.state(), AutosaveState::PendingChange);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_complete_flips_done_and_in_progress() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        let done = session.toggle_complete().await.unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        let reopened = session.toggle_complete().await.unwrap();
        assert_eq!(reopened.status, TaskStatus::InProgress);
        assert_eq!(saver.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_complete_sends_only_the_status() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("   ");
        session.toggle_complete().await.unwrap();
        let sent = saver.last.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent,
            TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            }
        );
        // the blank title is still unsaved
        assert_eq!(session.state(), AutosaveState::PendingChange);
        assert_eq!(session.draft().status, TaskStatus::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_during_an_inflight_save_stay_pending() {
        let saver = Arc::new(CountingSaver {
            latency: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        let mut session =
            EditSession::new(&task(), saver.clone()).with_policy(FlushPolicy::Flush);

        session.edit_title("Tent!");
        idle(1001).await;
        assert_eq!(session.state(), AutosaveState::Saving);

        session.set_description(Some("edited while saving".into()));
        idle(600).await;
        assert_eq!(saver.calls(), 1);
        assert_eq!(session.state(), AutosaveState::PendingChange);

        session.teardown().await.unwrap();
        assert_eq!(saver.calls(), 2);
        let sent = saver.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.description.as_deref(), Some("edited while saving"));
        assert_eq!(sent.title.as_deref(), Some("Tent!"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_discards_by_default() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Lost edit");
        idle(300).await;
        session.teardown().await.unwrap();
        idle(3000).await;
        assert_eq!(saver.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_flushes_when_asked() {
        let saver = Arc::new(CountingSaver::default());
        let mut session =
            EditSession::new(&task(), saver.clone()).with_policy(FlushPolicy::Flush);

        session.edit_title("Kept edit");
        session.teardown().await.unwrap();
        assert_eq!(saver.calls(), 1);
        idle(3000).await;
        assert_eq!(saver.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_discards() {
        let saver = Arc::new(CountingSaver::default());
        let mut session = EditSession::new(&task(), saver.clone());

        session.edit_title("Dropped");
        drop(session);
        idle(3000).await;
        assert_eq!(saver.calls(), 0);
    }
}
