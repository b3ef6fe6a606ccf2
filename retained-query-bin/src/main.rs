#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use structopt::StructOpt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use retained_query::{Error, IngestQueue, RetainedIndex, SnapshotFile};
use retained_query_conf::logger::{config_logger, logger_init};
use retained_query_conf::{Options, Settings};

use self::command::Command;

mod command;

#[tokio::main]
async fn main() -> Result<()> {
    //init config
    let settings = Settings::init(Options::from_args())?;

    //init log
    let logger = config_logger(&settings.log)?;
    logger_init(logger, settings.log.level)?;

    Settings::logs()?;

    let index = Arc::new(RetainedIndex::new());
    if let Some(file) = settings.snapshot.file.as_ref() {
        index.seed(&SnapshotFile::new(file)).await?;
    }

    let (ingest, worker) = IngestQueue::start(index.clone(), settings.ingest.backlog_warn);

    let interval = settings.stats.interval;
    let ticker = (!interval.is_zero()).then(|| {
        let (index, ingest) = (index.clone(), ingest.clone());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                log::info!("stats: {} {}", index.stats().await.to_json(), ingest.to_json());
            }
        })
    });

    serve(&index, &ingest).await?;

    ingest.flush().await?;
    if let Some(ticker) = ticker {
        ticker.abort();
        let _ = ticker.await;
    }
    drop(ingest);
    if let Err(e) = worker.await {
        log::error!("ingest worker failed: {e}");
    }
    Ok(())
}

/// Publishes are silent unless refused. Only a closed queue ends the session.
fn submit_reply(res: retained_query::Result<()>) -> Result<Option<String>> {
    match res {
        Ok(()) => Ok(None),
        Err(e @ Error::IngestClosed) => Err(e.into()),
        Err(e) => Ok(Some(format!("ERR {e}"))),
    }
}

/// Reads commands from stdin until EOF, answering each on stdout.
async fn serve(index: &RetainedIndex, ingest: &IngestQueue) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match Command::parse(&line) {
            Ok(Command::Publish(topic, payload)) => submit_reply(ingest.submit(topic, payload))?,
            Ok(Command::Clear(topic)) => submit_reply(ingest.submit(topic, Default::default()))?,
            Ok(Command::Query(body)) => {
                let res = index.resolve_body(body.as_bytes()).await;
                Some(format!("{} {}", res.status(), res.to_json()))
            }
            Ok(Command::Flush) => {
                ingest.flush().await?;
                Some("OK".to_owned())
            }
            Ok(Command::Stats) => {
                let stats = index.stats().await;
                Some(json!({"index": stats.to_json(), "ingest": ingest.to_json()}).to_string())
            }
            Err(e) => {
                log::warn!("{e}");
                Some(format!("ERR {e}"))
            }
        };
        if let Some(reply) = reply {
            out.write_all(reply.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
        }
    }
    log::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_publish_replies_err() {
        assert_eq!(submit_reply(Ok(())).unwrap(), None);
        let reply = submit_reply(Err(Error::WildcardInTopic("a/+/b".into()))).unwrap();
        assert_eq!(reply.as_deref(), Some("ERR retained topic contains a wildcard character: a/+/b"));
        assert!(submit_reply(Err(Error::TooManyLevels("a".into()))).unwrap().is_some());
        assert!(submit_reply(Err(Error::IngestClosed)).is_err());
    }
}
