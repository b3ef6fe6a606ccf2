use serde::Serialize;

use crate::error::{QueryError, HTTP_OK};

/// One matched topic and, depending on the requested depth, its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Topic>>,
}

impl Topic {
    #[inline]
    pub fn new<T: Into<String>>(topic: T, payload: Option<String>) -> Self {
        Self { topic: topic.into(), payload, children: None }
    }

    #[inline]
    pub fn with_children(mut self, children: Vec<Topic>) -> Self {
        self.children = Some(children);
        self
    }

    /// Pre-order list of this topic and its descendants, each without children.
    #[inline]
    pub fn flatten(self) -> Vec<Topic> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Topic>) {
        let Topic { topic, payload, children } = self;
        out.push(Topic { topic, payload, children: None });
        for child in children.into_iter().flatten() {
            child.flatten_into(out);
        }
    }
}

/// Outcome of a query or of a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Topic(Topic),
    Error(QueryError),
    List(Vec<QueryResult>),
}

impl QueryResult {
    #[inline]
    pub fn status(&self) -> u16 {
        match self {
            QueryResult::Error(e) => e.status(),
            QueryResult::Topic(_) | QueryResult::List(_) => HTTP_OK,
        }
    }

    /// Always yields a `List`. Errors flatten to themselves, lists are flattened element-wise.
    #[inline]
    pub fn flatten(self) -> QueryResult {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        QueryResult::List(out)
    }

    fn flatten_into(self, out: &mut Vec<QueryResult>) {
        match self {
            QueryResult::Topic(t) => out.extend(t.flatten().into_iter().map(QueryResult::Topic)),
            QueryResult::Error(e) => out.push(QueryResult::Error(e)),
            QueryResult::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    #[inline]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl From<Topic> for QueryResult {
    #[inline]
    fn from(t: Topic) -> Self {
        QueryResult::Topic(t)
    }
}

impl From<QueryError> for QueryResult {
    #[inline]
    fn from(e: QueryError) -> Self {
        QueryResult::Error(e)
    }
}
