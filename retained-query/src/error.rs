use std::io;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Internal failures of the index and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("retained ingest worker is gone")]
    IngestClosed,
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot decoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("retained topic contains a wildcard character: {0}")]
    WildcardInTopic(String),
    #[error("retained topic has more than 128 levels: {0}")]
    TooManyLevels(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub const HTTP_OK: u16 = 200;
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_NOT_FOUND: u16 = 404;

/// Failure of a single query. Carried as a value inside the result list, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("The topic cannot start with a slash.")]
    LeadingSlash(String),
    #[error("The topic cannot end with a slash.")]
    TrailingSlash(String),
    #[error("The topic cannot contain more than one wildcard.")]
    MultipleWildcards(String),
    #[error("The topic cannot have more than 128 levels.")]
    TooManyLevels(String),
    #[error(
        "The request body must be a JSON object with a 'topic' and optional 'depth' property, or a JSON array of such objects."
    )]
    MalformedRequest,
    #[error("Topic not found: {0}")]
    TopicNotFound(String),
}

impl QueryError {
    #[inline]
    pub fn status(&self) -> u16 {
        match self {
            QueryError::LeadingSlash(_)
            | QueryError::TrailingSlash(_)
            | QueryError::MultipleWildcards(_)
            | QueryError::TooManyLevels(_)
            | QueryError::MalformedRequest => HTTP_BAD_REQUEST,
            QueryError::TopicNotFound(_) => HTTP_NOT_FOUND,
        }
    }

    #[inline]
    pub fn topic(&self) -> Option<&str> {
        match self {
            QueryError::LeadingSlash(t)
            | QueryError::TrailingSlash(t)
            | QueryError::MultipleWildcards(t)
            | QueryError::TooManyLevels(t)
            | QueryError::TopicNotFound(t) => Some(t),
            QueryError::MalformedRequest => None,
        }
    }

    #[inline]
    pub fn message(&self) -> Option<String> {
        match self {
            QueryError::TopicNotFound(_) => None,
            _ => Some(self.to_string()),
        }
    }
}

impl Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(topic) = self.topic() {
            map.serialize_entry("topic", topic)?;
        }
        map.serialize_entry("error", &self.status())?;
        if let Some(message) = self.message() {
            map.serialize_entry("message", &message)?;
        }
        map.end()
    }
}
