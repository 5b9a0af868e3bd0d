use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::buffer::RollingBuffer;
use crate::i18n::{self, Key, Locale};
use crate::models::{Sample, ServerMessage};
use crate::stats::LiveStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Connecting,
    Active,
    Closed,
}

/// User-visible indicator. `None` payloads render the localized generic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Status {
    Idle,
    Connecting,
    Monitoring,
    SampleFailed(Option<String>),
    ServerError(Option<String>),
    StartFailed,
    ConnectionFailed,
    Stopped,
}

impl Status {
    pub(crate) fn is_ok(&self) -> bool {
        matches!(self, Status::Idle | Status::Connecting | Status::Monitoring)
    }

    pub(crate) fn text(&self, locale: Locale) -> Cow<'_, str> {
        match self {
            Status::Idle => i18n::text(locale, Key::StatusIdle).into(),
            Status::Connecting => i18n::text(locale, Key::StatusConnecting).into(),
            Status::Monitoring => i18n::text(locale, Key::StatusMonitoring).into(),
            Status::SampleFailed(Some(e)) => Cow::Borrowed(e.as_str()),
            Status::SampleFailed(None) => i18n::text(locale, Key::SampleFailedFallback).into(),
            Status::ServerError(Some(m)) => Cow::Borrowed(m.as_str()),
            Status::ServerError(None) => i18n::text(locale, Key::MonitorErrorFallback).into(),
            Status::StartFailed => i18n::text(locale, Key::StatusStartFailed).into(),
            Status::ConnectionFailed => i18n::text(locale, Key::StatusConnectionFailed).into(),
            Status::Stopped => i18n::text(locale, Key::StatusStopped).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Controls {
    pub(crate) start_enabled: bool,
    pub(crate) stop_enabled: bool,
}

/// Everything one live session owns. Transitions here never touch the network
/// or the terminal; the client feeds events in and the renderer reads state out.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    state: SessionState,
    status: Status,
    buffer: RollingBuffer,
    stats: LiveStats,
}

impl Session {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: SessionState::Idle,
            status: Status::Idle,
            buffer: RollingBuffer::new(capacity),
            stats: LiveStats::default(),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn status(&self) -> &Status {
        &self.status
    }

    pub(crate) fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub(crate) fn stats(&self) -> &LiveStats {
        &self.stats
    }

    pub(crate) fn controls(&self) -> Controls {
        let running = matches!(self.state, SessionState::Connecting | SessionState::Active);
        Controls {
            start_enabled: !running,
            stop_enabled: running,
        }
    }

    /// Discards the previous session's samples and counters.
    pub(crate) fn begin(&mut self) {
        self.buffer.clear();
        self.stats = LiveStats::default();
        self.state = SessionState::Connecting;
        self.status = Status::Connecting;
    }

    pub(crate) fn opened(&mut self) {
        self.state = SessionState::Active;
        self.status = Status::Monitoring;
    }

    /// The socket stays open but the backend never learned what to probe.
    pub(crate) fn init_send_failed(&mut self) {
        self.status = Status::StartFailed;
    }

    /// Parses and applies one inbound text frame. Frames arriving outside
    /// `Active` are ignored. Returns whether the session changed.
    pub(crate) fn handle_frame(
        &mut self,
        raw: &str,
        received_at: DateTime<Utc>,
    ) -> Result<bool, serde_json::Error> {
        if self.state != SessionState::Active {
            return Ok(false);
        }
        let message: ServerMessage = serde_json::from_str(raw)?;
        self.apply(message, received_at);
        Ok(true)
    }

    pub(crate) fn apply(&mut self, message: ServerMessage, received_at: DateTime<Utc>) {
        match message {
            ServerMessage::Sample(frame) => {
                let sample = Sample::from_frame(frame, received_at);
                self.buffer.push(&sample);
                self.stats.record(&sample);
                self.status = if sample.ok {
                    Status::Monitoring
                } else {
                    Status::SampleFailed(sample.error)
                };
            }
            ServerMessage::Error { message } => {
                self.status = Status::ServerError(message.filter(|m| !m.is_empty()));
            }
        }
    }

    pub(crate) fn transport_failed(&mut self) {
        self.state = SessionState::Closed;
        self.status = Status::ConnectionFailed;
    }

    /// Close from either side. Buffer and stats stay for display until the next `begin`.
    pub(crate) fn closed(&mut self) {
        self.state = SessionState::Closed;
        self.status = Status::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Session {
        let mut session = Session::new(1000);
        session.begin();
        session.opened();
        session
    }

    fn feed(session: &mut Session, raw: &str) {
        session.handle_frame(raw, Utc::now()).unwrap();
    }

    #[test]
    fn concrete_sequence_yields_expected_stats() {
        let mut session = active();
        feed(&mut session, r#"{"type":"sample","ts":1,"ok":true,"latency_ms":120}"#);
        feed(&mut session, r#"{"type":"sample","ts":2,"ok":false,"latency_ms":null,"error":"timeout"}"#);
        feed(&mut session, r#"{"type":"sample","ts":3,"ok":true,"latency_ms":80}"#);

        let stats = session.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.down_count, 1);
        assert_eq!(stats.consecutive_down, 0);
        assert_eq!(stats.last_latency, Some(80.0));
        assert_eq!(stats.last_error.as_deref(), Some("timeout"));
        assert_eq!(stats.average_latency(), Some(100.0));

        let series: Vec<_> = session.buffer().iter().map(|p| p.latency_ms).collect();
        assert_eq!(series, vec![Some(120.0), None, Some(80.0)]);
        assert_eq!(session.status(), &Status::Monitoring);
    }

    #[test]
    fn failed_sample_sets_failure_status_with_fallback() {
        let mut session = active();
        feed(&mut session, r#"{"type":"sample","ok":false,"error":"refused"}"#);
        assert_eq!(session.status(), &Status::SampleFailed(Some("refused".into())));

        feed(&mut session, r#"{"type":"sample","ok":false,"error":""}"#);
        assert_eq!(session.status(), &Status::SampleFailed(None));
        assert_eq!(
            session.status().text(Locale::En),
            i18n::text(Locale::En, Key::SampleFailedFallback)
        );
        assert!(!session.status().is_ok());
    }

    #[test]
    fn error_frame_changes_status_only() {
        let mut session = active();
        feed(&mut session, r#"{"type":"error","message":"bad link"}"#);
        assert_eq!(session.status(), &Status::ServerError(Some("bad link".into())));
        assert_eq!(session.stats().total, 0);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn malformed_frame_is_an_error_and_leaves_state_untouched() {
        let mut session = active();
        feed(&mut session, r#"{"type":"sample","ok":true,"latency_ms":5}"#);
        assert!(session.handle_frame("not json", Utc::now()).is_err());
        assert!(session.handle_frame(r#"{"type":"bogus"}"#, Utc::now()).is_err());
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.stats().total, 1);
    }

    #[test]
    fn frames_after_close_are_ignored() {
        let mut session = active();
        session.closed();
        let changed = session
            .handle_frame(r#"{"type":"sample","ok":true,"latency_ms":5}"#, Utc::now())
            .unwrap();
        assert!(!changed);
        assert_eq!(session.stats().total, 0);
        assert_eq!(session.status(), &Status::Stopped);
    }

    #[test]
    fn begin_clears_previous_session() {
        let mut session = active();
        feed(&mut session, r#"{"type":"sample","ok":false,"error":"x"}"#);
        session.closed();
        assert_eq!(session.stats().total, 1);

        session.begin();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.status(), &Status::Connecting);
        assert!(session.status().is_ok());
        assert_eq!(session.stats(), &LiveStats::default());
        assert!(session.buffer().is_empty());
        assert_eq!(session.stats().last_error, None);
    }

    #[test]
    fn controls_follow_state() {
        let mut session = Session::new(10);
        assert_eq!(
            session.controls(),
            Controls { start_enabled: true, stop_enabled: false }
        );
        session.begin();
        assert_eq!(
            session.controls(),
            Controls { start_enabled: false, stop_enabled: true }
        );
        session.opened();
        assert!(session.controls().stop_enabled);
        session.transport_failed();
        assert_eq!(session.status(), &Status::ConnectionFailed);
        assert_eq!(
            session.controls(),
            Controls { start_enabled: true, stop_enabled: false }
        );
    }

    #[test]
    fn init_send_failure_keeps_session_active() {
        let mut session = active();
        session.init_send_failed();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.status(), &Status::StartFailed);
    }
}
