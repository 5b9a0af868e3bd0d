use crate::models::Sample;

/// Session-wide counters. Unlike the chart buffer these are never windowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LiveStats {
    pub(crate) total: u64,
    pub(crate) success_count: u64,
    pub(crate) down_count: u64,
    pub(crate) sum_latency: f64,
    pub(crate) last_latency: Option<f64>,
    pub(crate) consecutive_down: u64,
    pub(crate) last_error: Option<String>,
}

impl LiveStats {
    pub(crate) fn record(&mut self, sample: &Sample) {
        self.total += 1;
        if sample.ok {
            self.success_count += 1;
            self.last_latency = sample.latency_ms;
            self.sum_latency += sample.latency_ms.unwrap_or(0.0);
            self.consecutive_down = 0;
        } else {
            self.down_count += 1;
            self.consecutive_down += 1;
            // sticky: successes never clear it
            if let Some(error) = sample.error.as_ref().filter(|e| !e.is_empty()) {
                self.last_error = Some(error.clone());
            }
        }
    }

    /// Whole percent, 0 before the first sample.
    pub(crate) fn success_rate(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        ((self.success_count as f64 / self.total as f64) * 100.0).round() as u64
    }

    pub(crate) fn average_latency(&self) -> Option<f64> {
        (self.success_count > 0).then(|| self.sum_latency / self.success_count as f64)
    }
}
