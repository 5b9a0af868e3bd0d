use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::MonitorError;
use crate::models::InitMessage;
use crate::session::{Session, SessionState};

pub(crate) const MIN_INTERVAL_SECONDS: f64 = 0.2;
pub(crate) const DEFAULT_INTERVAL_SECONDS: f64 = 0.5;

const TEARDOWN_GRACE: Duration = Duration::from_secs(2);

/// Lenient numeric parse for user input; `None` means "use the default".
pub(crate) fn parse_interval(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Missing, non-finite or zero input takes `fallback`; anything under the floor is raised to it.
pub(crate) fn clamp_interval(requested: Option<f64>, fallback: f64) -> f64 {
    requested
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(fallback)
        .max(MIN_INTERVAL_SECONDS)
}

#[derive(Debug)]
enum TransportEvent {
    Opened,
    InitSendFailed(String),
    Frame(String),
    Failed(String),
    Closed,
}

#[derive(Debug)]
struct Envelope {
    session_id: u64,
    event: TransportEvent,
}

struct SessionHandle {
    id: u64,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Drives at most one streaming session at a time.
///
/// Transport work happens on a spawned task; every lifecycle change and frame
/// comes back through a single channel and is applied by [`process_next`] one
/// event at a time, so the session itself is only ever touched from here.
/// Events are tagged with the session that produced them and anything from a
/// session other than the current one is dropped.
///
/// [`process_next`]: LiveMonitorClient::process_next
pub(crate) struct LiveMonitorClient {
    endpoint: Url,
    default_interval: f64,
    session: Session,
    handle: Option<SessionHandle>,
    next_id: u64,
    events_tx: mpsc::UnboundedSender<Envelope>,
    events_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl LiveMonitorClient {
    pub(crate) fn new(endpoint: Url, capacity: usize, default_interval: f64) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            default_interval,
            session: Session::new(capacity),
            handle: None,
            next_id: 0,
            events_tx,
            events_rx,
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Opens a new session, closing any previous one first. Returns as soon as
    /// the connect task is spawned; the outcome arrives through [`Self::process_next`].
    pub(crate) fn start(&mut self, link: &str, interval: Option<f64>) -> Result<(), MonitorError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(MonitorError::BlankLink);
        }
        let interval = clamp_interval(interval, self.default_interval);

        if self.release_handle() {
            debug!("closing previous session before restart");
        }
        self.session.begin();

        self.next_id += 1;
        let id = self.next_id;
        let init = InitMessage {
            link: link.to_string(),
            interval,
        };
        info!(session_id = id, endpoint = %self.endpoint, interval, "starting live monitor");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_transport(
            id,
            self.endpoint.clone(),
            init,
            self.events_tx.clone(),
            shutdown_rx,
        ));
        self.handle = Some(SessionHandle {
            id,
            shutdown: shutdown_tx,
            task,
        });
        Ok(())
    }

    /// Idempotent. Does not wait for the close handshake.
    pub(crate) fn stop(&mut self) {
        if self.release_handle() {
            info!("live monitor stopped");
        }
        self.session.closed();
    }

    /// Best-effort teardown on exit. Errors are swallowed.
    pub(crate) async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.shutdown.send(());
            if tokio::time::timeout(TEARDOWN_GRACE, handle.task).await.is_err() {
                debug!("transport did not finish closing before teardown");
            }
        }
        self.session.closed();
    }

    /// Waits for the next transport event and applies it. Returns `true` when
    /// the session changed and should be re-rendered. Cancel safe.
    pub(crate) async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(envelope) => self.dispatch(envelope),
            None => false,
        }
    }

    fn dispatch(&mut self, envelope: Envelope) -> bool {
        let Envelope { session_id, event } = envelope;
        if self.handle.as_ref().map(|h| h.id) != Some(session_id) {
            debug!(session_id, ?event, "dropping event from stale session");
            return false;
        }

        match event {
            TransportEvent::Opened => {
                info!(session_id, "live monitor connected");
                self.session.opened();
            }
            TransportEvent::InitSendFailed(e) => {
                warn!(session_id, error = %e, "failed to send init message");
                self.session.init_send_failed();
            }
            TransportEvent::Frame(raw) => {
                return match self.session.handle_frame(&raw, Utc::now()) {
                    Ok(changed) => changed,
                    Err(e) => {
                        warn!(session_id, error = %e, "dropping malformed frame");
                        false
                    }
                };
            }
            TransportEvent::Failed(e) => {
                warn!(session_id, error = %e, "live monitor connection failed");
                self.session.transport_failed();
                self.handle = None;
            }
            TransportEvent::Closed => {
                info!(session_id, "live monitor connection closed");
                self.session.closed();
                self.handle = None;
            }
        }
        true
    }

    fn release_handle(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let _ = handle.shutdown.send(());
                true
            }
            None => false,
        }
    }
}

async fn run_transport(
    id: u64,
    endpoint: Url,
    init: InitMessage,
    events: mpsc::UnboundedSender<Envelope>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(Envelope {
            session_id: id,
            event,
        });
    };

    let stream = tokio::select! {
        _ = &mut shutdown => {
            debug!(session_id = id, "cancelled while connecting");
            return;
        }
        result = tokio_tungstenite::connect_async(endpoint.as_str()) => match result {
            Ok((stream, _)) => stream,
            Err(e) => {
                emit(TransportEvent::Failed(e.to_string()));
                return;
            }
        },
    };

    emit(TransportEvent::Opened);
    let (mut write, mut read) = stream.split();

    match serde_json::to_string(&init) {
        Ok(payload) => {
            if let Err(e) = write.send(Message::Text(payload.into())).await {
                emit(TransportEvent::InitSendFailed(e.to_string()));
            }
        }
        Err(e) => emit(TransportEvent::InitSendFailed(e.to_string())),
    }

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = write.send(Message::Close(None)).await;
                debug!(session_id = id, "transport closed by client");
                return;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => emit(TransportEvent::Frame(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => {
                    emit(TransportEvent::Frame(String::from_utf8_lossy(&data).into_owned()))
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong handled by tungstenite
                Some(Err(e)) => {
                    emit(TransportEvent::Failed(e.to_string()));
                    return;
                }
            }
        }
    }

    emit(TransportEvent::Closed);
}
