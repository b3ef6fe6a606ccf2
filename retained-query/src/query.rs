use serde::de::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::QueryError;

/// How many levels below the matched node a result expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    #[default]
    Unbounded,
    Levels(usize),
}

impl Depth {
    /// Depth for the children of the current node, `None` once exhausted.
    #[inline]
    pub fn descend(self) -> Option<Depth> {
        match self {
            Depth::Unbounded => Some(Depth::Unbounded),
            Depth::Levels(0) => None,
            Depth::Levels(n) => Some(Depth::Levels(n - 1)),
        }
    }
}

impl From<i64> for Depth {
    #[inline]
    fn from(d: i64) -> Self {
        if d < 0 {
            Depth::Unbounded
        } else {
            Depth::Levels(d as usize)
        }
    }
}

impl<'de> Deserialize<'de> for Depth {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Depth::from).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Query {
    pub topic: String,
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub flatten: bool,
}

impl Query {
    #[inline]
    pub fn new<T: Into<String>>(topic: T) -> Self {
        Self { topic: topic.into(), depth: Depth::Unbounded, flatten: false }
    }

    #[inline]
    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Only a JSON object with a string `topic` is a query.
    #[inline]
    pub fn from_value(v: Value) -> Result<Query, QueryError> {
        if !v.is_object() {
            return Err(QueryError::MalformedRequest);
        }
        serde_json::from_value(v).map_err(|_| QueryError::MalformedRequest)
    }
}

/// A parsed request body. Malformed batch elements stay in place as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Single(Result<Query, QueryError>),
    Batch(Vec<Result<Query, QueryError>>),
}

impl Request {
    #[inline]
    pub fn parse(body: &[u8]) -> Result<Request, QueryError> {
        let v: Value = serde_json::from_slice(body).map_err(|_| QueryError::MalformedRequest)?;
        Request::from_value(v)
    }

    #[inline]
    pub fn from_value(v: Value) -> Result<Request, QueryError> {
        match v {
            Value::Array(items) => Ok(Request::Batch(items.into_iter().map(Query::from_value).collect())),
            Value::Object(_) => Ok(Request::Single(Query::from_value(v))),
            _ => Err(QueryError::MalformedRequest),
        }
    }
}

impl From<Query> for Request {
    #[inline]
    fn from(q: Query) -> Self {
        Request::Single(Ok(q))
    }
}

impl From<Vec<Query>> for Request {
    #[inline]
    fn from(qs: Vec<Query>) -> Self {
        Request::Batch(qs.into_iter().map(Ok).collect())
    }
}
