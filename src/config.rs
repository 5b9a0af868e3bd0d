use std::time::Duration;

use anyhow::Result;
use config::{Config, File};
use serde::Deserialize;
use url::Url;

use crate::client::DEFAULT_INTERVAL_SECONDS;
use crate::error::MonitorError;
use crate::i18n::Locale;

#[derive(Debug, Deserialize)]
pub(crate) struct Settings {
    pub(crate) base_url: String,
    pub(crate) monitor_path: String,
    pub(crate) default_interval_seconds: f64,
    pub(crate) buffer_capacity: usize,
    pub(crate) locale: Locale,
    #[serde(with = "humantime_serde")]
    pub(crate) request_timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) sparkline_width: usize,
}

impl Settings {
    pub(crate) fn api_base(&self) -> Result<Url, MonitorError> {
        Url::parse(&self.base_url).map_err(|e| MonitorError::InvalidEndpoint(e.to_string()))
    }

    /// Streaming endpoint derived from `base_url`: `http` becomes `ws`, `https` becomes `wss`.
    pub(crate) fn monitor_endpoint(&self) -> Result<Url, MonitorError> {
        let mut url = self.api_base()?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(MonitorError::InvalidEndpoint(format!(
                    "unsupported scheme `{}` in base_url",
                    other
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| MonitorError::InvalidEndpoint(format!("cannot switch to {}", scheme)))?;
        url.set_path(&self.monitor_path);
        url.set_query(None);
        Ok(url)
    }
}

pub(crate) fn load_settings() -> Result<Settings> {
    let settings = Config::builder()
        .set_default("base_url", "http://127.0.0.1:8000")?
        .set_default("monitor_path", "/api/monitor/ws")?
        .set_default("default_interval_seconds", DEFAULT_INTERVAL_SECONDS)?
        .set_default("buffer_capacity", 1000_i64)?
        .set_default("locale", "en")?
        .set_default("request_timeout", "10s")?
        .set_default("user_agent", concat!("livewatch/", env!("CARGO_PKG_VERSION")))?
        .set_default("sparkline_width", 60_i64)?
        .add_source(File::with_name("config/default.toml").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    Ok(settings.try_deserialize()?)
}
