//! Single-worker ingestion of retained publishes.
//!
//! `submit` only enqueues and never waits on the index lock. One worker task
//! drains the channel, so mutations are applied in submission order.

use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::index::RetainedIndex;
use crate::topic::validate_retained;
use crate::{Payload, TopicName};

#[derive(Debug)]
enum Task {
    Publish(TopicName, Payload),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct IngestQueue {
    tx: UnboundedSender<Task>,
    pending: Arc<AtomicIsize>,
}

impl IngestQueue {
    /// Spawns the worker. It exits once every `IngestQueue` clone is dropped.
    /// `backlog_warn` of 0 disables the backlog warning.
    pub fn start(index: Arc<RetainedIndex>, backlog_warn: usize) -> (IngestQueue, JoinHandle<()>) {
        let (tx, rx) = unbounded_channel();
        let pending = Arc::new(AtomicIsize::new(0));
        let worker = tokio::spawn(Self::run(index, rx, pending.clone(), backlog_warn));
        (IngestQueue { tx, pending }, worker)
    }

    async fn run(
        index: Arc<RetainedIndex>,
        mut rx: UnboundedReceiver<Task>,
        pending: Arc<AtomicIsize>,
        backlog_warn: usize,
    ) {
        log::info!("start retained ingest worker.");
        let mut warned = false;
        while let Some(task) = rx.recv().await {
            let backlog = pending.fetch_sub(1, Ordering::SeqCst) - 1;
            if backlog_warn > 0 {
                if backlog as usize > backlog_warn && !warned {
                    log::warn!("retained ingest backlog is {}, above {}", backlog, backlog_warn);
                    warned = true;
                } else if backlog == 0 {
                    warned = false;
                }
            }
            match task {
                Task::Publish(topic, payload) => {
                    log::debug!("apply retained, topic: {}, payload len: {}", topic, payload.len());
                    if let Err(e) = index.set(&topic, payload).await {
                        log::warn!("retained publish dropped, {e}");
                    }
                }
                Task::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        log::info!("retained ingest channel is closed!");
    }

    #[inline]
    fn send(&self, task: Task) -> Result<()> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            log::error!("retained ingest worker is gone");
            return Err(Error::IngestClosed);
        }
        Ok(())
    }

    /// Enqueues one retained publish. An empty payload clears the topic.
    /// Topics that can never be stored are refused here, before queueing.
    #[inline]
    pub fn submit(&self, topic: TopicName, payload: Payload) -> Result<()> {
        if let Err(e) = validate_retained(&topic) {
            log::warn!("retained publish refused, {e}");
            return Err(e);
        }
        self.send(Task::Publish(topic, payload))
    }

    /// Resolves once everything submitted before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Task::Flush(done_tx))?;
        done_rx.await.map_err(|_| Error::IngestClosed)
    }

    #[inline]
    pub fn pending(&self) -> isize {
        self.pending.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "ingest.pending": self.pending() })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::query::Query;

    fn payload(s: &str) -> Payload {
        Payload::copy_from_slice(s.as_bytes())
    }

    #[tokio::test]
    async fn applies_in_submission_order() {
        let index = Arc::new(RetainedIndex::new());
        let (queue, _worker) = IngestQueue::start(index.clone(), 0);
        for i in 0..100 {
            queue.submit(TopicName::from("a/b"), payload(&i.to_string())).unwrap();
        }
        queue.submit(TopicName::from("a/c"), payload("x")).unwrap();
        queue.submit(TopicName::from("a/c"), Payload::new()).unwrap();
        queue.flush().await.unwrap();
        assert_eq!(index.lookup("a/b").await, Some(payload("99")));
        assert!(!index.contains("a/c").await);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn submit_returns_before_apply() {
        let index = Arc::new(RetainedIndex::new());
        let (queue, _worker) = IngestQueue::start(index.clone(), 0);
        queue.submit(TopicName::from("a"), payload("1")).unwrap();
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.to_json(), json!({"ingest.pending": 1}));
        assert!(!index.contains("a").await);
        queue.flush().await.unwrap();
        assert_eq!(index.query(&Query::new("a")).await.to_json(), json!({"topic": "a", "payload": "1"}));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submitters() {
        let index = Arc::new(RetainedIndex::new());
        let (queue, _worker) = IngestQueue::start(index.clone(), 10);
        let submitters = (0..8)
            .map(|n| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for i in 0..50 {
                        queue.submit(TopicName::from(format!("t/{n}/{i}")), payload("v")).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for s in futures::future::join_all(submitters).await {
            s.unwrap();
        }
        queue.flush().await.unwrap();
        let stats = index.stats().await;
        assert_eq!(stats.topics, 400);
        assert_eq!(stats.nodes, 1 + 8 + 400);
    }

    #[tokio::test]
    async fn submit_refuses_unstorable_topics() {
        let index = Arc::new(RetainedIndex::new());
        let (queue, _worker) = IngestQueue::start(index.clone(), 0);
        let res = queue.submit(TopicName::from("a/+/b"), payload("x"));
        assert!(matches!(res, Err(Error::WildcardInTopic(_))));
        let res = queue.submit(TopicName::from("a/#"), Payload::new());
        assert!(matches!(res, Err(Error::WildcardInTopic(_))));
        let deep = vec!["a"; 5000].join("/");
        let res = queue.submit(TopicName::from(deep), payload("x"));
        assert!(matches!(res, Err(Error::TooManyLevels(_))));
        assert_eq!(queue.pending(), 0);

        queue.submit(TopicName::from("a/x/b"), payload("y")).unwrap();
        queue.flush().await.unwrap();
        let stats = index.stats().await;
        assert_eq!((stats.topics, stats.nodes), (1, 3));
    }

    #[tokio::test]
    async fn worker_stops_when_queue_dropped() {
        let index = Arc::new(RetainedIndex::new());
        let (queue, worker) = IngestQueue::start(index, 0);
        drop(queue);
        tokio::time::timeout(Duration::from_secs(5), worker).await.unwrap().unwrap();
    }
}
