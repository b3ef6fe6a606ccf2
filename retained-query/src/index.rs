//! Retained message index guarded by a single fair read/write lock.
//!
//! Writers (the ingest worker, seeding) take the write lock per mutation.
//! A query takes the read lock once and holds it for its whole traversal, so
//! it observes the tree either before or after any concurrent mutation.

use serde_json::json;
use tokio::sync::RwLock;

use retained_query_utils::Counter;

use crate::error::Result;
use crate::query::{Query, Request};
use crate::resolver::QueryResolver;
use crate::result::QueryResult;
use crate::source::RetainedSource;
use crate::topic::{levels, validate_retained, QueryTopic};
use crate::trie::RetainTree;
use crate::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub topics: isize,
    pub topics_max: isize,
    pub nodes: usize,
}

impl IndexStats {
    #[inline]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "topics.count": self.topics,
            "topics.max": self.topics_max,
            "nodes": self.nodes,
        })
    }
}

pub struct RetainedIndex {
    tree: RwLock<RetainTree<Payload>>,
    retaineds: Counter,
}

impl Default for RetainedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedIndex {
    #[inline]
    pub fn new() -> RetainedIndex {
        Self { tree: RwLock::new(RetainTree::default()), retaineds: Counter::new() }
    }

    /// Stores `payload` under `topic`. Topics with wildcard characters or more
    /// than `MAX_LEVELS` levels are refused.
    #[inline]
    pub async fn insert(&self, topic: &str, payload: Payload) -> Result<()> {
        validate_retained(topic)?;
        let mut tree = self.tree.write().await;
        if tree.insert(levels(topic), payload).is_none() {
            self.retaineds.inc();
        }
        Ok(())
    }

    #[inline]
    pub async fn remove(&self, topic: &str) -> Option<Payload> {
        let mut tree = self.tree.write().await;
        let old = tree.remove(levels(topic));
        if old.is_some() {
            self.retaineds.dec();
        }
        old
    }

    /// Applies one retained publish: an empty payload clears the topic.
    #[inline]
    pub async fn set(&self, topic: &str, payload: Payload) -> Result<()> {
        validate_retained(topic)?;
        if payload.is_empty() {
            self.remove(topic).await;
            Ok(())
        } else {
            self.insert(topic, payload).await
        }
    }

    /// Loads every retained message from `source`. Returns how many were inserted.
    pub async fn seed<S: RetainedSource + ?Sized>(&self, source: &S) -> Result<usize> {
        let retaineds = source.retaineds().await?;
        let mut tree = self.tree.write().await;
        let mut inserted = 0;
        for (topic, payload) in retaineds {
            if payload.is_empty() {
                continue;
            }
            if let Err(e) = validate_retained(&topic) {
                log::warn!("seed skipped, {e}");
                continue;
            }
            if tree.insert(levels(&topic), payload).is_none() {
                self.retaineds.inc();
            }
            inserted += 1;
        }
        log::info!("seeded {} retained messages, {} topics in index", inserted, self.retaineds.count());
        Ok(inserted)
    }

    #[inline]
    pub async fn lookup(&self, topic: &str) -> Option<Payload> {
        self.tree.read().await.get(levels(topic)).and_then(|n| n.value().cloned())
    }

    #[inline]
    pub async fn contains(&self, topic: &str) -> bool {
        self.tree.read().await.get(levels(topic)).is_some()
    }

    /// Validates, then resolves under one read lock. Validation errors are never flattened.
    pub async fn query(&self, q: &Query) -> QueryResult {
        let topic = match QueryTopic::parse(&q.topic) {
            Ok(topic) => topic,
            Err(e) => return QueryResult::Error(e),
        };
        let res = {
            let tree = self.tree.read().await;
            QueryResolver::new(&*tree).resolve(&topic, q.depth)
        };
        if q.flatten {
            res.flatten()
        } else {
            res
        }
    }

    /// A batch always yields a list with one entry per query, in request order.
    pub async fn resolve(&self, req: &Request) -> QueryResult {
        match req {
            Request::Single(Ok(q)) => self.query(q).await,
            Request::Single(Err(e)) => QueryResult::Error(e.clone()),
            Request::Batch(qs) => {
                let mut results = Vec::with_capacity(qs.len());
                for q in qs {
                    results.push(match q {
                        Ok(q) => self.query(q).await,
                        Err(e) => QueryResult::Error(e.clone()),
                    });
                }
                QueryResult::List(results)
            }
        }
    }

    /// Parses and resolves a raw JSON request body.
    #[inline]
    pub async fn resolve_body(&self, body: &[u8]) -> QueryResult {
        match Request::parse(body) {
            Ok(req) => self.resolve(&req).await,
            Err(e) => QueryResult::Error(e),
        }
    }

    #[inline]
    pub async fn stats(&self) -> IndexStats {
        let nodes = self.tree.read().await.nodes_size();
        IndexStats { topics: self.retaineds.count(), topics_max: self.retaineds.max(), nodes }
    }
}
