#![deny(unsafe_code)]

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use config::{Config, ConfigBuilder, File};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use retained_query_utils::deserialize_duration;

use self::logging::{Level, Log, To};

pub use self::options::Options;

pub mod logger;
pub mod logging;
pub mod options;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

#[derive(Clone)]
pub struct Settings(Arc<Inner>);

#[derive(Debug, Clone, Deserialize)]
pub struct Inner {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub snapshot: Snapshot,
    #[serde(default)]
    pub ingest: Ingest,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default, skip)]
    pub opts: Options,
}

impl Deref for Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

type Builder = ConfigBuilder<config::builder::DefaultState>;

impl Settings {
    fn new(opts: Options) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("/etc/retained-query/retained-query").required(false))
            .add_source(File::with_name("retained-query").required(false))
            .add_source(
                config::Environment::with_prefix("retained_query").separator("__").try_parsing(true),
            );

        if let Some(cfg) = opts.cfg_name.as_ref() {
            builder = builder.add_source(File::with_name(cfg).required(true));
        }

        Self::from_builder(builder, opts)
    }

    fn from_builder(builder: Builder, opts: Options) -> Result<Self> {
        let mut inner: Inner = builder.build()?.try_deserialize()?;

        //Command line configuration overriding file configuration
        if let Some(snapshot) = opts.snapshot.as_ref() {
            inner.snapshot.file = Some(snapshot.clone());
        }
        if let Some(to) = opts.log_to.as_ref() {
            inner.log.to = To::from_str(to).map_err(|e| anyhow!(e))?;
        }
        if let Some(level) = opts.log_level.as_ref() {
            inner.log.level = Level::from_str(level).map_err(|_| anyhow!("invalid log level: {}", level))?;
        }

        inner.opts = opts;
        Ok(Self(Arc::new(inner)))
    }

    #[inline]
    pub fn instance() -> &'static Self {
        match SETTINGS.get() {
            Some(c) => c,
            None => {
                unreachable!("Settings not initialized");
            }
        }
    }

    #[inline]
    pub fn init(opts: Options) -> Result<&'static Self> {
        SETTINGS.set(Settings::new(opts)?).map_err(|_| anyhow!("Settings init failed"))?;
        SETTINGS.get().ok_or_else(|| anyhow!("Settings init failed"))
    }

    #[inline]
    pub fn logs() -> Result<()> {
        let cfg = Self::instance();
        log::debug!("Config info is {:?}", cfg.0);
        log::info!("log to {}, level {}", cfg.log.to.as_str(), cfg.log.level.as_str());
        log::info!("snapshot file is {:?}", cfg.snapshot.file);
        log::info!("ingest.backlog_warn is {}", cfg.ingest.backlog_warn);
        log::info!("stats.interval is {:?}", cfg.stats.interval);
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Settings ...")?;
        Ok(())
    }
}

#[derive(Default, Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ingest {
    //Pending task count above which the ingest worker warns, 0 disables.
    #[serde(default = "Ingest::backlog_warn_default")]
    pub backlog_warn: usize,
}

impl Default for Ingest {
    #[inline]
    fn default() -> Self {
        Self { backlog_warn: Self::backlog_warn_default() }
    }
}

impl Ingest {
    fn backlog_warn_default() -> usize {
        10_000
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    //Index statistics logging interval, 0s disables.
    #[serde(default = "Stats::interval_default", deserialize_with = "deserialize_duration")]
    pub interval: Duration,
}

impl Default for Stats {
    #[inline]
    fn default() -> Self {
        Self { interval: Self::interval_default() }
    }
}

impl Stats {
    fn interval_default() -> Duration {
        Duration::from_secs(60)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn settings(toml: &str, opts: Options) -> Result<Settings> {
        Settings::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)), opts)
    }

    #[test]
    fn defaults() {
        let s = settings("", Options::default()).unwrap();
        assert_eq!(s.log.to, To::Console);
        assert_eq!(s.log.level.inner(), slog::Level::Info);
        assert_eq!(s.snapshot.file, None);
        assert_eq!(s.ingest.backlog_warn, 10_000);
        assert_eq!(s.stats.interval, Duration::from_secs(60));
    }

    #[test]
    fn from_toml() {
        let s = settings(
            r#"
            [log]
            to = "both"
            level = "debug"
            dir = "/tmp/rq"

            [snapshot]
            file = "retained.json"

            [ingest]
            backlog_warn = 0

            [stats]
            interval = "1m30s"
            "#,
            Options::default(),
        )
        .unwrap();
        assert_eq!(s.log.to, To::Both);
        assert_eq!(s.log.level.inner(), slog::Level::Debug);
        assert_eq!(s.log.filename(), "/tmp/rq/retained-query.log");
        assert_eq!(s.snapshot.file.as_deref(), Some("retained.json"));
        assert_eq!(s.ingest.backlog_warn, 0);
        assert_eq!(s.stats.interval, Duration::from_secs(90));
    }

    #[test]
    fn options_override_file() {
        let opts = Options {
            snapshot: Some("other.json".into()),
            log_level: Some("trace".into()),
            log_to: Some("off".into()),
            ..Default::default()
        };
        let s = settings("[snapshot]\nfile = \"retained.json\"\n[log]\nlevel = \"info\"\n", opts).unwrap();
        assert_eq!(s.snapshot.file.as_deref(), Some("other.json"));
        assert_eq!(s.log.level.inner(), slog::Level::Trace);
        assert_eq!(s.log.to, To::Off);
    }

    #[test]
    fn invalid_log_target() {
        let err = settings("[log]\nto = \"consle\"\n", Options::default()).unwrap_err().to_string();
        assert!(err.contains("invalid log target: consle"), "{err}");
        let opts = Options { log_to: Some("stdout".into()), ..Default::default() };
        assert!(settings("", opts).is_err());
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let missing = std::env::temp_dir().join(format!("retained-query-missing-{}.toml", std::process::id()));
        let opts = Options { cfg_name: Some(missing.to_string_lossy().into_owned()), ..Default::default() };
        assert!(Settings::new(opts).is_err());

        let present = std::env::temp_dir().join(format!("retained-query-present-{}.toml", std::process::id()));
        std::fs::write(&present, "[ingest]\nbacklog_warn = 7\n").unwrap();
        let opts = Options { cfg_name: Some(present.to_string_lossy().into_owned()), ..Default::default() };
        let s = Settings::new(opts);
        std::fs::remove_file(&present).unwrap();
        assert_eq!(s.unwrap().ingest.backlog_warn, 7);
    }

    #[test]
    fn invalid_level() {
        assert!(settings("[log]\nlevel = \"loud\"\n", Options::default()).is_err());
        let opts = Options { log_level: Some("loud".into()), ..Default::default() };
        assert!(settings("", opts).is_err());
    }
}
