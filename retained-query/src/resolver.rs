//! Resolution of validated query topics against a borrowed trie.
//!
//! The resolver never locks anything itself; callers hand it a tree that
//! stays borrowed, and therefore unchanged, for the whole traversal.

use crate::error::QueryError;
use crate::query::Depth;
use crate::result::{QueryResult, Topic};
use crate::topic::{levels, QueryTopic, LEVEL_SEPARATOR};
use crate::trie::{Node, RetainTree};

pub struct QueryResolver<'a, V> {
    tree: &'a RetainTree<V>,
}

impl<'a, V: AsRef<[u8]>> QueryResolver<'a, V> {
    #[inline]
    pub fn new(tree: &'a RetainTree<V>) -> Self {
        Self { tree }
    }

    #[inline]
    pub fn resolve(&self, topic: &QueryTopic, depth: Depth) -> QueryResult {
        match topic {
            QueryTopic::Exact(t) => self.resolve_exact(t, depth),
            QueryTopic::Wildcard { prefix, suffix } => self.resolve_wildcard(prefix, suffix, depth),
        }
    }

    /// A missing topic is `TopicNotFound`.
    #[inline]
    pub fn resolve_exact(&self, topic: &str, depth: Depth) -> QueryResult {
        match self.tree.get(levels(topic)) {
            Some(node) => QueryResult::Topic(build_result(node, topic.into(), depth)),
            None => QueryResult::Error(QueryError::TopicNotFound(topic.into())),
        }
    }

    /// Matches every child of `prefix` under which `suffix` exists. No match is an empty list.
    pub fn resolve_wildcard(&self, prefix: &[String], suffix: &[String], depth: Depth) -> QueryResult {
        let Some(parent) = self.tree.get(prefix.iter().map(String::as_str)) else {
            return QueryResult::List(Vec::new());
        };
        let matches = parent
            .children()
            .filter_map(|(level, child)| {
                let node = child.get(suffix.iter().map(String::as_str))?;
                let topic = join(prefix, level, suffix);
                Some(QueryResult::Topic(build_result(node, topic, depth)))
            })
            .collect();
        QueryResult::List(matches)
    }
}

/// Materializes `node` under `topic`, expanding children while `depth` allows.
pub fn build_result<V: AsRef<[u8]>>(node: &Node<V>, topic: String, depth: Depth) -> Topic {
    let payload = node.value().map(|v| String::from_utf8_lossy(v.as_ref()).into_owned());
    let children = match depth.descend() {
        Some(next) if node.has_children() => Some(
            node.children()
                .map(|(level, child)| build_result(child, format!("{topic}{LEVEL_SEPARATOR}{level}"), next))
                .collect(),
        ),
        _ => None,
    };
    Topic { topic, payload, children }
}

fn join(prefix: &[String], level: &str, suffix: &[String]) -> String {
    let mut parts = Vec::with_capacity(prefix.len() + 1 + suffix.len());
    parts.extend(prefix.iter().map(String::as_str));
    parts.push(level);
    parts.extend(suffix.iter().map(String::as_str));
    parts.join("/")
}
