use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone, Default)]
#[structopt(name = "retained-query", about = "Query service for MQTT retained messages")]
pub struct Options {
    /// Config filename
    #[structopt(name = "config", short = "f", long)]
    pub cfg_name: Option<String>,

    /// Snapshot file used to seed the index, a JSON array of {"topic", "payload"}
    #[structopt(name = "snapshot", long)]
    pub snapshot: Option<String>,

    /// Log target: off, file, console or both. Overrides log.to
    #[structopt(name = "log-to", long)]
    pub log_to: Option<String>,

    /// Log level, overrides log.level
    #[structopt(name = "log-level", long)]
    pub log_level: Option<String>,
}
