use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};

use crate::models::Sample;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartPoint {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) label: String,
    pub(crate) latency_ms: Option<f64>,
}

/// Fixed-capacity chart series. Oldest points are evicted first.
#[derive(Debug, Clone)]
pub(crate) struct RollingBuffer {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl RollingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, sample: &Sample) {
        self.points.push_back(ChartPoint {
            timestamp: sample.timestamp,
            label: sample
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
            latency_ms: sample.latency_ms,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Time covered between the oldest and newest point.
    pub(crate) fn span(&self) -> chrono::Duration {
        match (self.points.front(), self.points.back()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => chrono::Duration::zero(),
        }
    }

    /// The most recent `n` points, oldest first.
    pub(crate) fn tail(&self, n: usize) -> impl Iterator<Item = &ChartPoint> {
        self.iter().skip(self.points.len().saturating_sub(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(i: i64) -> Sample {
        Sample {
            timestamp: DateTime::from_timestamp(1_700_000_000 + i, 0).unwrap(),
            ok: i % 7 != 0,
            latency_ms: if i % 7 != 0 { Some(i as f64) } else { None },
            error: None,
        }
    }

    #[test]
    fn keeps_only_most_recent_points_in_arrival_order() {
        let mut buffer = RollingBuffer::new(1000);
        for i in 0..1500 {
            buffer.push(&sample(i));
        }
        assert_eq!(buffer.len(), 1000);
        let first = buffer.iter().next().unwrap();
        let last = buffer.iter().last().unwrap();
        assert_eq!(first.timestamp, sample(500).timestamp);
        assert_eq!(last.timestamp, sample(1499).timestamp);
        assert!(
            buffer
                .iter()
                .zip(buffer.iter().skip(1))
                .all(|(a, b)| b.timestamp - a.timestamp == Duration::seconds(1))
        );
    }

    #[test]
    fn failures_are_stored_as_gaps() {
        let mut buffer = RollingBuffer::new(10);
        buffer.push(&sample(7));
        assert_eq!(buffer.iter().next().unwrap().latency_ms, None);
    }

    #[test]
    fn tail_returns_latest_points() {
        let mut buffer = RollingBuffer::new(10);
        for i in 1..=5 {
            buffer.push(&sample(i));
        }
        let tail: Vec<_> = buffer.tail(2).map(|p| p.latency_ms).collect();
        assert_eq!(tail, vec![Some(4.0), Some(5.0)]);
        assert_eq!(buffer.tail(50).count(), 5);
    }

    #[test]
    fn span_covers_retained_points() {
        let mut buffer = RollingBuffer::new(3);
        assert_eq!(buffer.span(), Duration::zero());
        for i in 0..5 {
            buffer.push(&sample(i));
        }
        assert_eq!(buffer.span(), Duration::seconds(2));
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buffer = RollingBuffer::new(3);
        buffer.push(&sample(1));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
