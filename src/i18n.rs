use clap::ValueEnum;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Locale {
    #[default]
    En,
    Fa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Key {
    StatusIdle,
    StatusConnecting,
    StatusMonitoring,
    StatusStopped,
    StatusStartFailed,
    StatusConnectionFailed,
    SampleFailedFallback,
    MonitorErrorFallback,
    MetricTotal,
    MetricSuccess,
    MetricDown,
    MetricSuccessRate,
    MetricAvgLatency,
    MetricLastLatency,
    MetricConsecutiveDown,
    MetricLastError,
    HistoryTitle,
    HistoryEmpty,
}

pub(crate) fn text(locale: Locale, key: Key) -> &'static str {
    match locale {
        Locale::En => en(key),
        Locale::Fa => fa(key),
    }
}

fn en(key: Key) -> &'static str {
    match key {
        Key::StatusIdle => "Not started",
        Key::StatusConnecting => "Connecting...",
        Key::StatusMonitoring => "Monitoring via XRAY...",
        Key::StatusStopped => "Monitor stopped",
        Key::StatusStartFailed => "Error starting live monitor",
        Key::StatusConnectionFailed => "WebSocket connection error",
        Key::SampleFailedFallback => "Connection via XRAY failed",
        Key::MonitorErrorFallback => "Monitor error",
        Key::MetricTotal => "Total samples: ",
        Key::MetricSuccess => "Success: ",
        Key::MetricDown => "Down: ",
        Key::MetricSuccessRate => "Success rate: ",
        Key::MetricAvgLatency => "Average latency: ",
        Key::MetricLastLatency => "Last latency: ",
        Key::MetricConsecutiveDown => "Consecutive down: ",
        Key::MetricLastError => "Last error: ",
        Key::HistoryTitle => "Check history",
        Key::HistoryEmpty => "No data in this range",
    }
}

fn fa(key: Key) -> &'static str {
    match key {
        Key::StatusIdle => "شروع نشده",
        Key::StatusConnecting => "در حال اتصال...",
        Key::StatusMonitoring => "در حال رصد از طریق XRAY...",
        Key::StatusStopped => "مانیتور متوقف شد",
        Key::StatusStartFailed => "خطا در شروع رصد",
        Key::StatusConnectionFailed => "خطا در ارتباط WebSocket",
        Key::SampleFailedFallback => "خطا در اتصال از طریق XRAY",
        Key::MonitorErrorFallback => "خطای مانیتور",
        Key::MetricTotal => "کل نمونه‌ها: ",
        Key::MetricSuccess => "موفق: ",
        Key::MetricDown => "Down: ",
        Key::MetricSuccessRate => "درصد موفقیت: ",
        Key::MetricAvgLatency => "میانگین پینگ: ",
        Key::MetricLastLatency => "آخرین پینگ: ",
        Key::MetricConsecutiveDown => "Down پیاپی: ",
        Key::MetricLastError => "آخرین خطا: ",
        Key::HistoryTitle => "تاریخچه چک‌ها",
        Key::HistoryEmpty => "در این بازه هیچ دیتایی وجود ندارد",
    }
}
