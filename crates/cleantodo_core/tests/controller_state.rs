use async_trait::async_trait;
use cleantodo_core::{
    DbError, RepoError, RepoResult, SqliteTaskStore, StoreTaskRepository, Task, TaskId,
    TaskListController, TaskRepository, TaskStore,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);
const LONG_GRACE: Duration = Duration::from_secs(30);

type SqliteController = TaskListController<StoreTaskRepository<SqliteTaskStore>>;

#[tokio::test]
async fn state_starts_empty_and_collection_is_lazy() {
    let controller = controller(LONG_GRACE);

    assert!(controller.current().is_empty());
    assert!(!controller.is_collecting());

    let rx = controller.observe();
    assert!(rx.borrow().is_empty());
    assert!(controller.is_collecting());
}

#[tokio::test]
async fn added_task_appears_with_store_assigned_id() {
    let controller = controller(LONG_GRACE);
    let mut rx = controller.observe();

    let id = controller.add("Buy milk", "").await.unwrap().unwrap();

    let tasks = wait_until(&mut rx, |tasks| !tasks.is_empty()).await;
    assert_eq!(
        tasks,
        vec![Task {
            id,
            title: "Buy milk".to_string(),
            description: String::new(),
            is_done: false,
        }]
    );
    assert_eq!(id, 1);
    assert_eq!(controller.current(), tasks);
}

#[tokio::test]
async fn toggling_twice_restores_is_done_once_observed() {
    let controller = controller(LONG_GRACE);
    let mut rx = controller.observe();
    let id = controller.add("Walk the dog", "").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |t| !t.is_done)).await;

    controller.toggle(id).await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |t| t.is_done)).await;

    controller.toggle(id).await.unwrap().unwrap();
    let tasks = wait_until(&mut rx, |tasks| has(tasks, id, |t| !t.is_done)).await;
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn edit_with_only_description_keeps_title() {
    let controller = controller(LONG_GRACE);
    let mut rx = controller.observe();
    let id = controller.add("Call mom", "old desc").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |_| true)).await;

    controller
        .edit(id, None, Some("new desc".to_string()))
        .await
        .unwrap()
        .unwrap();

    let tasks = wait_until(&mut rx, |tasks| has(tasks, id, |t| t.description == "new desc")).await;
    assert_eq!(tasks[0].title, "Call mom");
}

#[tokio::test]
async fn deleted_task_leaves_visible_list() {
    let controller = controller(LONG_GRACE);
    let mut rx = controller.observe();
    let keep = controller.add("keep", "").await.unwrap().unwrap();
    let gone = controller.add("gone", "").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| tasks.len() == 2).await;

    controller.delete(gone).await.unwrap().unwrap();

    let tasks = wait_until(&mut rx, |tasks| tasks.len() == 1).await;
    assert_eq!(tasks[0].id, keep);
    assert!(tasks.iter().all(|task| task.id != gone));
}

#[tokio::test]
async fn intents_for_unknown_ids_are_noops() {
    let controller = controller(LONG_GRACE);
    let _rx = controller.observe();

    controller.toggle(42).await.unwrap().unwrap();
    controller
        .edit(42, Some("ghost".to_string()), None)
        .await
        .unwrap()
        .unwrap();
    controller.delete(42).await.unwrap().unwrap();

    assert!(controller.current().is_empty());
}

#[tokio::test]
async fn toggle_before_any_observer_mutates_persisted_task() {
    let (store, repo) = sqlite_repo();
    let id = repo.add_task(&Task::new("persisted", "")).await.unwrap();
    let controller = TaskListController::new(Arc::clone(&repo), Handle::current(), LONG_GRACE);
    assert!(controller.current().is_empty());

    controller.toggle(id).await.unwrap().unwrap();

    let rows = store.list_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_done);
    assert!(!controller.is_collecting());
}

#[tokio::test]
async fn delete_right_after_observe_reaches_store() {
    let (store, repo) = sqlite_repo();
    let id = repo.add_task(&Task::new("short lived", "")).await.unwrap();
    let controller = TaskListController::new(Arc::clone(&repo), Handle::current(), LONG_GRACE);

    let _rx = controller.observe();
    controller.delete(id).await.unwrap().unwrap();

    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn toggle_after_grace_stop_keeps_newer_edits() {
    let (store, repo) = sqlite_repo();
    let controller =
        TaskListController::new(Arc::clone(&repo), Handle::current(), Duration::from_millis(50));
    let mut rx = controller.observe();
    let id = controller.add("draft", "v1").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |_| true)).await;
    drop(rx);
    sleep(Duration::from_millis(400)).await;
    assert!(!controller.is_collecting());

    // Changed behind the stopped controller; its view still says "v1".
    let renamed = Task {
        id,
        ..Task::new("renamed", "v2")
    };
    repo.update_task(&renamed).await.unwrap();

    controller.toggle(id).await.unwrap().unwrap();

    let rows = store.list_all().unwrap();
    assert_eq!(rows[0].title, "renamed");
    assert_eq!(rows[0].description, "v2");
    assert!(rows[0].is_done);
}

#[tokio::test]
async fn observers_share_one_state() {
    let (_, inner) = sqlite_repo();
    let repo = Arc::new(CountingRepository::new(inner));
    let controller = TaskListController::new(Arc::clone(&repo), Handle::current(), LONG_GRACE);
    let mut observers = vec![
        controller.observe(),
        controller.observe(),
        controller.observe(),
    ];

    let id = controller.add("shared", "").await.unwrap().unwrap();

    let mut seen = Vec::new();
    for rx in observers.iter_mut() {
        seen.push(wait_until(rx, |tasks| has(tasks, id, |_| true)).await);
    }
    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(repo.subscriptions(), 1);
}

#[tokio::test]
async fn collection_stops_after_grace_and_restarts_on_observe() {
    let controller = controller(Duration::from_millis(50));
    let rx = controller.observe();
    assert!(controller.is_collecting());

    drop(rx);
    sleep(Duration::from_millis(400)).await;
    assert!(!controller.is_collecting());

    let mut rx = controller.observe();
    assert!(controller.is_collecting());
    let id = controller.add("after restart", "").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |_| true)).await;
}

#[tokio::test]
async fn reattaching_within_grace_keeps_collection_alive() {
    let controller = controller(LONG_GRACE);
    let rx = controller.observe();
    drop(rx);
    sleep(Duration::from_millis(50)).await;

    let mut rx = controller.observe();
    assert!(controller.is_collecting());
    let id = controller.add("still live", "").await.unwrap().unwrap();
    wait_until(&mut rx, |tasks| has(tasks, id, |_| true)).await;
}

#[tokio::test]
async fn dropping_controller_tears_down_state_stream() {
    let controller = controller(LONG_GRACE);
    let mut rx = controller.observe();

    drop(controller);

    let closed = timeout(WAIT, async {
        while rx.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok(), "state stream should close after drop");
}

#[tokio::test]
async fn dispatched_intent_outlives_controller() {
    let store = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
    let repo = Arc::new(StoreTaskRepository::new(Arc::clone(&store)));
    let controller = TaskListController::new(Arc::clone(&repo), Handle::current(), LONG_GRACE);

    let pending = controller.add("survivor", "");
    drop(controller);

    let id = pending.await.unwrap().unwrap();
    let mut tasks = repo.get_tasks();
    let latest = timeout(WAIT, tasks.next()).await.unwrap().unwrap();
    assert!(has(&latest, id, |t| t.title == "survivor"));
}

#[tokio::test]
async fn failed_mutation_surfaces_only_through_intent_handle() {
    let repo = Arc::new(FailingRepository::default());
    let controller = TaskListController::new(Arc::clone(&repo), Handle::current(), LONG_GRACE);
    let mut rx = controller.observe();
    wait_until(&mut rx, |tasks| tasks.len() == 1).await;

    let err = controller.add("never stored", "").await.unwrap().unwrap_err();
    assert!(matches!(err, RepoError::Store(DbError::LockPoisoned)));

    let toggle_err = controller.toggle(1).await.unwrap().unwrap_err();
    assert!(matches!(toggle_err, RepoError::Store(DbError::LockPoisoned)));
    assert_eq!(controller.current().len(), 1);
}

/// Repository whose mutations always fail; its stream holds one fixed task.
struct FailingRepository {
    tasks: watch::Sender<Vec<Task>>,
}

impl Default for FailingRepository {
    fn default() -> Self {
        let seeded = Task {
            id: 1,
            ..Task::new("seeded", "")
        };
        let (tasks, _) = watch::channel(vec![seeded]);
        Self { tasks }
    }
}

#[async_trait]
impl TaskRepository for FailingRepository {
    fn get_tasks(&self) -> BoxStream<'static, Vec<Task>> {
        tokio_stream::wrappers::WatchStream::new(self.tasks.subscribe()).boxed()
    }

    async fn add_task(&self, _task: &Task) -> RepoResult<TaskId> {
        Err(RepoError::Store(DbError::LockPoisoned))
    }

    async fn update_task(&self, _task: &Task) -> RepoResult<()> {
        Err(RepoError::Store(DbError::LockPoisoned))
    }

    async fn delete_task(&self, _task: &Task) -> RepoResult<()> {
        Err(RepoError::Store(DbError::LockPoisoned))
    }
}

/// Delegating repository that counts `get_tasks` subscriptions.
struct CountingRepository {
    inner: Arc<StoreTaskRepository<SqliteTaskStore>>,
    subscriptions: AtomicUsize,
}

impl CountingRepository {
    fn new(inner: Arc<StoreTaskRepository<SqliteTaskStore>>) -> Self {
        Self {
            inner,
            subscriptions: AtomicUsize::new(0),
        }
    }

    fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskRepository for CountingRepository {
    fn get_tasks(&self) -> BoxStream<'static, Vec<Task>> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.inner.get_tasks()
    }

    async fn add_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.inner.add_task(task).await
    }

    async fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.inner.update_task(task).await
    }

    async fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.inner.delete_task(task).await
    }
}

fn sqlite_repo() -> (
    Arc<SqliteTaskStore>,
    Arc<StoreTaskRepository<SqliteTaskStore>>,
) {
    let store = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
    let repo = Arc::new(StoreTaskRepository::new(Arc::clone(&store)));
    (store, repo)
}

fn controller(grace: Duration) -> SqliteController {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let repo = StoreTaskRepository::new(Arc::new(store));
    TaskListController::new(Arc::new(repo), Handle::current(), grace)
}

async fn wait_until(
    rx: &mut watch::Receiver<Vec<Task>>,
    predicate: impl FnMut(&Vec<Task>) -> bool,
) -> Vec<Task> {
    let tasks = timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("state should update in time")
        .expect("state stream should stay open");
    tasks.to_vec()
}

fn has(tasks: &[Task], id: TaskId, check: impl Fn(&Task) -> bool) -> bool {
    tasks.iter().any(|task| task.id == id && check(task))
}
