use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use colored::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use statistical::mean;
use url::Url;

use crate::error::MonitorError;
use crate::i18n::{self, Key, Locale};
use crate::models::{CheckRecord, CheckStatus, ServerRecord};

/// Range the checks endpoint accepts, one minute up to seven days.
const MAX_HISTORY_MINUTES: u64 = 7 * 24 * 60;

const UPTIME_WARN_PERCENT: f64 = 99.0;
const UPTIME_CRITICAL_PERCENT: f64 = 95.0;
const LATENCY_WARN_MS: f64 = 500.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LatencyStats {
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) mean: f64,
    pub(crate) median: f64,
    pub(crate) p95: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistorySummary {
    pub(crate) total: usize,
    pub(crate) up: usize,
    pub(crate) down: usize,
    pub(crate) uptime: f64,
    pub(crate) latency: Option<LatencyStats>,
    pub(crate) last_error: Option<String>,
    pub(crate) first: Option<DateTime<Utc>>,
    pub(crate) last: Option<DateTime<Utc>>,
}

pub(crate) fn history_minutes(window: Duration) -> u64 {
    window.as_secs().div_ceil(60).clamp(1, MAX_HISTORY_MINUTES)
}

pub(crate) async fn fetch_server(
    client: &Client,
    base: &Url,
    server_id: i64,
) -> Result<ServerRecord, MonitorError> {
    let url = join(base, &format!("/api/servers/{}", server_id))?;
    get_json(client, url).await
}

pub(crate) async fn fetch_checks(
    client: &Client,
    base: &Url,
    server_id: i64,
    minutes: u64,
) -> Result<Vec<CheckRecord>, MonitorError> {
    let mut url = join(base, &format!("/api/checks/{}", server_id))?;
    url.query_pairs_mut()
        .append_pair("minutes", &minutes.clamp(1, MAX_HISTORY_MINUTES).to_string());
    get_json(client, url).await
}

fn join(base: &Url, path: &str) -> Result<Url, MonitorError> {
    base.join(path)
        .map_err(|e| MonitorError::InvalidEndpoint(e.to_string()))
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> Result<T, MonitorError> {
    tracing::debug!(%url, "GET");
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_else(|_| "No body".to_string());
        return Err(MonitorError::Api { status, body });
    }
    Ok(resp.json().await?)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let p = p.clamp(0.0, 1.0);
    let rank = p * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = rank - lo as f64;
        sorted[lo] * (1.0 - w) + sorted[hi] * w
    }
}

pub(crate) fn summarize(checks: &[CheckRecord]) -> HistorySummary {
    let total = checks.len();
    let up = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Up)
        .count();
    let uptime = if total > 0 {
        (up as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let mut latencies: Vec<f64> = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Up)
        .filter_map(|c| c.latency_ms)
        .filter(|ms| ms.is_finite())
        .collect();
    latencies.sort_by(f64::total_cmp);

    let latency = (!latencies.is_empty()).then(|| LatencyStats {
        min: latencies[0],
        max: latencies[latencies.len() - 1],
        mean: mean(&latencies),
        median: percentile(&latencies, 0.5),
        p95: percentile(&latencies, 0.95),
    });

    HistorySummary {
        total,
        up,
        down: total - up,
        uptime,
        latency,
        last_error: checks
            .iter()
            .rev()
            .filter(|c| c.status == CheckStatus::Down)
            .find_map(|c| c.error.clone().filter(|e| !e.is_empty())),
        first: checks.iter().map(|c| c.checked_at).min(),
        last: checks.iter().map(|c| c.checked_at).max(),
    }
}

pub(crate) fn print_summary(server: &ServerRecord, minutes: u64, summary: &HistorySummary, locale: Locale) {
    println!(
        "{} - {} (#{}), {} min",
        i18n::text(locale, Key::HistoryTitle).bold(),
        server.name,
        server.id,
        minutes
    );
    if summary.total == 0 {
        println!("  {}", i18n::text(locale, Key::HistoryEmpty));
        return;
    }
    if let (Some(first), Some(last)) = (summary.first, summary.last) {
        println!(
            "  {} ～ {}",
            first.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            last.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }

    let uptime_str = format!("{:.3}%", summary.uptime);
    let uptime_colored = if summary.uptime < UPTIME_CRITICAL_PERCENT {
        uptime_str.red()
    } else if summary.uptime < UPTIME_WARN_PERCENT {
        uptime_str.yellow()
    } else {
        uptime_str.green()
    };
    println!(
        "  UP: {}  DOWN: {}  / {}  ({})",
        summary.up, summary.down, summary.total, uptime_colored
    );

    match &summary.latency {
        Some(l) => {
            let avg = format!("{:.2}ms", l.mean);
            let avg_colored = if l.mean > LATENCY_WARN_MS {
                avg.red()
            } else {
                avg.green()
            };
            println!(
                "  Latency - Min: {:.0}ms, Max: {:.0}ms, Avg: {}, Median: {:.2}ms, P95: {:.2}ms",
                l.min, l.max, avg_colored, l.median, l.p95
            );
        }
        None => println!("  Latency - N/A"),
    }
    if let Some(error) = &summary.last_error {
        println!("  {}{}", i18n::text(locale, Key::MetricLastError), error.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(minute: i64, status: CheckStatus, latency: Option<f64>) -> CheckRecord {
        CheckRecord {
            checked_at: DateTime::from_timestamp(1_714_557_600 + minute * 60, 0).unwrap(),
            status,
            latency_ms: latency,
            error: None,
        }
    }

    #[test]
    fn summary_counts_and_latency() {
        let checks = vec![
            check(0, CheckStatus::Up, Some(100.0)),
            check(1, CheckStatus::Down, None),
            check(2, CheckStatus::Up, Some(300.0)),
            check(3, CheckStatus::Up, Some(200.0)),
        ];
        let summary = summarize(&checks);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.up, 3);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.uptime, 75.0);
        let latency = summary.latency.unwrap();
        assert_eq!(latency.min, 100.0);
        assert_eq!(latency.max, 300.0);
        assert_eq!(latency.mean, 200.0);
        assert_eq!(latency.median, 200.0);
        assert!((latency.p95 - 290.0).abs() < 1e-9);
        assert_eq!(summary.first, Some(checks[0].checked_at));
        assert_eq!(summary.last, Some(checks[3].checked_at));
    }

    #[test]
    fn all_down_has_no_latency() {
        let mut checks = vec![check(0, CheckStatus::Down, None), check(1, CheckStatus::Down, None)];
        checks[0].error = Some("dial tcp: timeout".to_string());
        let summary = summarize(&checks);
        assert_eq!(summary.last_error.as_deref(), Some("dial tcp: timeout"));
        assert_eq!(summary.uptime, 0.0);
        assert!(summary.latency.is_none());
    }

    #[test]
    fn empty_history() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.first, None);
    }

    #[test]
    fn window_is_rounded_up_and_clamped() {
        assert_eq!(history_minutes(Duration::from_secs(0)), 1);
        assert_eq!(history_minutes(Duration::from_secs(61)), 2);
        assert_eq!(history_minutes(Duration::from_secs(3600)), 60);
        assert_eq!(history_minutes(Duration::from_secs(30 * 24 * 3600)), 10080);
    }

    #[test]
    fn endpoints_join_onto_base() {
        let base = Url::parse("http://127.0.0.1:8000/ui/").unwrap();
        assert_eq!(
            join(&base, "/api/servers/7").unwrap().as_str(),
            "http://127.0.0.1:8000/api/servers/7"
        );
    }
}
