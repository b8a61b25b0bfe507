use super::*;
use crate::config::{Credentials, StoreSettings};

#[tokio::test]
async fn ensure_queue_creates_once() {
    let (queue, store, _clock) = test_queue(Order::Fifo);
    assert!(!store.exists().await.unwrap());

    assert_eq!(queue.ensure_queue().await.unwrap(), Provisioned::Created);
    assert_eq!(queue.ensure_queue().await.unwrap(), Provisioned::AlreadyExists);
    assert_eq!(queue.count_queued().await.unwrap(), 0);
}

#[tokio::test]
async fn ensure_queue_tolerates_losing_the_creation_race() {
    let faults = Faults {
        hide_existence: true,
        ..Faults::default()
    };
    let (queue, _store, _inner) = faulty_queue(Order::Fifo, faults).await;

    assert_eq!(queue.ensure_queue().await.unwrap(), Provisioned::AlreadyExists);
}

#[tokio::test]
async fn open_memory_location() {
    let settings = StoreSettings::new("jobs", "memory", Some(Credentials::new("admin", "secret")));
    let queue = WorkQueue::open(&settings, QueueConfig::default().with_order(Order::Lifo)).unwrap();

    assert_eq!(queue.name(), "jobs");
    assert_eq!(queue.config().order, Order::Lifo);
    queue.ensure_queue().await.unwrap();
    queue.enqueue("a").await.unwrap();
    assert_eq!(queue.next().await.unwrap().id, "a");
}

#[tokio::test]
async fn open_rocksdb_location() {
    let dir = tempfile::tempdir().unwrap();
    let location = format!("rocksdb://{}", dir.path().display());
    let settings = StoreSettings::new("jobs", location, Some(Credentials::new("admin", "")));
    let queue = WorkQueue::open(&settings, QueueConfig::default()).unwrap();

    assert_eq!(queue.ensure_queue().await.unwrap(), Provisioned::Created);
    queue.enqueue("a").await.unwrap();
    assert!(queue.check_if_item_exists("a").await.unwrap());
}

#[test]
fn open_rejects_incomplete_settings() {
    let credentials = Some(Credentials::new("admin", "secret"));
    let cases = [
        StoreSettings::new("", "memory", credentials.clone()),
        StoreSettings::new("jobs", "", credentials.clone()),
        StoreSettings::new("jobs", "memory", None),
        StoreSettings::new("jobs", "memory", Some(Credentials::new(" ", "secret"))),
        StoreSettings::new("jobs", "http://couch:5984", credentials),
    ];
    for settings in cases {
        let err = WorkQueue::open(&settings, QueueConfig::default()).unwrap_err();
        assert!(matches!(err, QueueError::Config(_)), "{settings:?}: got {err:?}");
    }
}

#[tokio::test]
async fn unprovisioned_queue_reports_store_errors() {
    let (queue, _store, _clock) = test_queue(Order::Random);

    let err = queue.next().await.unwrap_err();
    assert!(
        matches!(err, QueueError::Store(StoreError::DatabaseNotFound(_))),
        "got {err:?}"
    );
    let err = queue.check_if_item_exists("a").await.unwrap_err();
    assert!(matches!(err, QueueError::Store(_)), "got {err:?}");
}
