mod buffer;
mod cli;
mod client;
mod config;
mod error;
mod history;
mod i18n;
mod models;
mod render;
mod session;
mod stats;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::client::{LiveMonitorClient, parse_interval};
use crate::config::load_settings;
use crate::session::SessionState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    let locale = cli.lang.unwrap_or(settings.locale);

    let http = Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(settings.request_timeout)
        .build()?;
    let api_base = settings.api_base()?;

    let mut link = cli.link.clone();
    if let Some(server_id) = cli.server_id.filter(|_| cli.needs_server_record()) {
        let server = history::fetch_server(&http, &api_base, server_id)
            .await
            .with_context(|| format!("Error getting server link for #{}", server_id))?;

        if let Some(window) = cli.history {
            let minutes = history::history_minutes(window);
            let checks = history::fetch_checks(&http, &api_base, server_id, minutes)
                .await
                .context("Error getting server history")?;
            history::print_summary(&server, minutes, &history::summarize(&checks), locale);
        }
        if link.is_none() {
            link = Some(server.raw_link);
        }
    }

    if cli.history_only {
        return Ok(());
    }
    let link = link.context("either --link or --server-id is required")?;
    let interval = cli.interval.as_deref().and_then(parse_interval);

    let mut client = LiveMonitorClient::new(
        settings.monitor_endpoint()?,
        settings.buffer_capacity,
        settings.default_interval_seconds,
    );
    client.start(&link, interval)?;
    render::render(client.session(), locale, settings.sparkline_width);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, closing live monitor");
                break;
            }
            changed = client.process_next() => {
                if changed {
                    render::render(client.session(), locale, settings.sparkline_width);
                }
                if client.state() == SessionState::Closed {
                    break;
                }
            }
        }
    }

    client.shutdown().await;
    render::render(client.session(), locale, settings.sparkline_width);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
