use super::*;

#[tokio::test]
async fn exists_and_queued_probes() {
    let (queue, _store, _clock) = provisioned_queue(Order::Fifo).await;
    assert!(!queue.check_if_item_exists("job-1").await.unwrap());

    queue.enqueue("job-1").await.unwrap();
    assert!(queue.check_if_item_exists("job-1").await.unwrap());
    assert_eq!(queue.check_if_item_is_queued("job-1").await.unwrap(), Some(true));

    queue.dequeue("job-1").await.unwrap();
    assert!(queue.check_if_item_exists("job-1").await.unwrap());
    assert_eq!(queue.check_if_item_is_queued("job-1").await.unwrap(), Some(false));
}

#[tokio::test]
async fn queued_probe_on_missing_item_is_not_found() {
    let (queue, _store, _clock) = provisioned_queue(Order::Fifo).await;
    let err = queue.check_if_item_is_queued("ghost").await.unwrap_err();
    assert!(matches!(err, QueueError::ItemNotFound(_)), "got {err:?}");

    let err = queue.message("ghost").await.unwrap_err();
    assert!(matches!(err, QueueError::ItemNotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn queued_probe_without_flag_is_none() {
    let (queue, store, _clock) = provisioned_queue(Order::Fifo).await;
    store
        .save("foreign", crate::document::Body::new())
        .await
        .unwrap();

    assert_eq!(queue.check_if_item_is_queued("foreign").await.unwrap(), None);
    // Documents without the flag never show up as queued.
    assert_eq!(queue.count_queued().await.unwrap(), 0);
    let err = queue.next().await.unwrap_err();
    assert!(matches!(err, QueueError::EmptyQueue(_)), "got {err:?}");
}

#[tokio::test]
async fn listings_follow_queue_state() {
    let (queue, _store, _clock) = provisioned_queue(Order::Fifo).await;
    enqueue_all(&queue, &["a", "b", "c"]).await;
    queue.dequeue("c").await.unwrap();
    queue.dequeue("a").await.unwrap();

    let queued = queue.list_queued(10).await.unwrap();
    assert_eq!(
        queued.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
        vec!["b"]
    );

    let dequeued = queue.list_dequeued(10).await.unwrap();
    assert_eq!(
        dequeued.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
        vec!["c", "a"],
        "ordered by dequeue time"
    );
    assert!(dequeued[0].time < dequeued[1].time);

    assert_eq!(queue.list_dequeued(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_id_is_rejected_by_the_store() {
    let (queue, _store, _clock) = provisioned_queue(Order::Fifo).await;

    let err = queue.check_if_item_exists("").await.unwrap_err();
    assert!(
        matches!(err, QueueError::Store(StoreError::InvalidKey(_))),
        "got {err:?}"
    );
}
