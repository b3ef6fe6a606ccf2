#![deny(unsafe_code)] // Enforce memory safety across the entire crate

//! # Overall Example
//! ```rust,no_run
//!
//! use std::sync::Arc;
//!
//! use retained_query::{IngestQueue, Payload, Query, RetainedIndex, SnapshotFile, TopicName};
//!
//! #[tokio::main]
//! async fn main() -> retained_query::Result<()> {
//!     let index = Arc::new(RetainedIndex::new());
//!     index.seed(&SnapshotFile::new("retained.json")).await?;
//!
//!     let (ingest, _worker) = IngestQueue::start(index.clone(), 10_000);
//!     ingest.submit(TopicName::from("home/kitchen/temp"), Payload::from_static(b"21.5"))?;
//!     ingest.flush().await?;
//!
//!     let res = index.query(&Query::new("home/+/temp")).await;
//!     println!("{} {}", res.status(), res.to_json());
//!     Ok(())
//! }
//! ```

/// Storage
pub mod index; // Lock-guarded retained index
pub mod ingest; // Serialized mutation queue
pub mod source; // Startup snapshot sources
pub mod trie; // Topic trie structure

/// Querying
pub mod query; // Request parsing
pub mod resolver; // Exact and wildcard resolution
pub mod result; // Result model and flatten
pub mod topic; // Topic levels and validation

pub mod error;

pub use error::{Error, QueryError, Result};
pub use index::{IndexStats, RetainedIndex};
pub use ingest::IngestQueue;
pub use query::{Depth, Query, Request};
pub use resolver::QueryResolver;
pub use result::{QueryResult, Topic};
pub use source::{RetainedSource, SnapshotFile};
pub use topic::{validate, validate_retained, QueryTopic, MAX_LEVELS};
pub use trie::{Node, RetainTree};

pub type TopicName = bytestring::ByteString;
pub type Payload = bytes::Bytes;
