use colored::*;

use crate::buffer::RollingBuffer;
use crate::i18n::{self, Key, Locale};
use crate::session::Session;
use crate::stats::LiveStats;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const GAP: char = '×';

/// Latest `width` points scaled between the window's min and max latency.
pub(crate) fn sparkline(buffer: &RollingBuffer, width: usize) -> String {
    let points: Vec<Option<f64>> = buffer.tail(width).map(|p| p.latency_ms).collect();
    let (lo, hi) = points
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;

    points
        .iter()
        .map(|p| match p {
            None => GAP,
            Some(_) if !(span > 0.0) => BARS[BARS.len() / 2],
            Some(v) => {
                let idx = (((v - lo) / span) * (BARS.len() - 1) as f64).round() as usize;
                BARS[idx.min(BARS.len() - 1)]
            }
        })
        .collect()
}

pub(crate) fn metric_lines(stats: &LiveStats, locale: Locale) -> Vec<String> {
    let t = |key| i18n::text(locale, key);
    let avg = match stats.average_latency() {
        Some(ms) if ms.round() > 0.0 => format!("{} ms", ms.round()),
        _ => "0 ms".to_string(),
    };
    let last = stats
        .last_latency
        .map(|ms| format!("{} ms", ms.round()))
        .unwrap_or_else(|| "-".to_string());
    vec![
        format!("{}{}", t(Key::MetricTotal), stats.total),
        format!("{}{}", t(Key::MetricSuccess), stats.success_count),
        format!("{}{}", t(Key::MetricDown), stats.down_count),
        format!("{}{}%", t(Key::MetricSuccessRate), stats.success_rate()),
        format!("{}{}", t(Key::MetricAvgLatency), avg),
        format!("{}{}", t(Key::MetricLastLatency), last),
        format!("{}{}", t(Key::MetricConsecutiveDown), stats.consecutive_down),
        format!(
            "{}{}",
            t(Key::MetricLastError),
            stats.last_error.as_deref().unwrap_or("-")
        ),
    ]
}

pub(crate) fn render(session: &Session, locale: Locale, width: usize) {
    let status = session.status();
    let text = status.text(locale);
    let status_line = if status.is_ok() {
        text.green()
    } else {
        text.red()
    };
    println!("[{:?}] {}", session.state(), status_line);
    println!("  {}", metric_lines(session.stats(), locale).join(" | "));
    let buffer = session.buffer();
    if let Some(latest) = buffer.iter().last() {
        println!(
            "  {} {} ({} pts / {}s)",
            sparkline(buffer, width),
            latest.label,
            buffer.len(),
            buffer.span().num_seconds()
        );
    }
}
