use std::time::Duration;

use clap::Parser;

use crate::i18n::Locale;

#[derive(Parser, Debug)]
#[command(version, about = "Live latency monitor for XRAY config links", long_about = None)]
pub(crate) struct Cli {
    /// Config link to probe (vless://, vmess://, ...)
    #[arg(long)]
    pub(crate) link: Option<String>,
    /// Take the link (and history) from a server registered in the backend
    #[arg(long)]
    pub(crate) server_id: Option<i64>,
    /// Sampling interval in seconds, minimum 0.2
    #[arg(long)]
    pub(crate) interval: Option<String>,
    /// Print the server's check history for this window first, e.g. `90m`
    #[arg(long, requires = "server_id", value_parser = humantime::parse_duration)]
    pub(crate) history: Option<Duration>,
    #[arg(long, requires = "history")]
    pub(crate) history_only: bool,
    #[arg(long, value_enum)]
    pub(crate) lang: Option<Locale>,
}

impl Cli {
    /// The backend is only asked for the server record when it supplies
    /// something we do not already have: the link or its history.
    pub(crate) fn needs_server_record(&self) -> bool {
        self.server_id.is_some() && (self.link.is_none() || self.history.is_some())
    }
}
