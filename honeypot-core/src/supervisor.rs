use std::future::Future;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::ban::BanTable;
use crate::error::{DialogError, DialogOutcome, ListenerError};
use crate::event::{EventDetail, EventRecord};
use crate::metrics::Metrics;
use crate::session::SessionContext;
use crate::sink::EventSink;

/// Owns the listening socket; accepts; enforces admission; dispatches.
///
/// Admission happens *before* any protocol I/O: a banned or over-capacity
/// peer is closed with zero bytes sent, so a scanner cannot amplify
/// resource cost by waiting out a banner (spec §4.1).
pub struct ListenerSupervisor {
    bans: Arc<BanTable>,
    metrics: Arc<Metrics>,
    sink: Arc<EventSink>,
    max_connections: Option<usize>,
}

impl ListenerSupervisor {
    /// `max_connections = None` means no connection-count admission cap —
    /// only SMTP runs this way, per spec §5 ("unbounded-but-capped via max
    /// message size"); every other protocol passes `Some(n)`.
    pub fn new(
        bans: Arc<BanTable>,
        metrics: Arc<Metrics>,
        sink: Arc<EventSink>,
        max_connections: Option<usize>,
    ) -> Self {
        ListenerSupervisor {
            bans,
            metrics,
            sink,
            max_connections,
        }
    }

    pub fn bans(&self) -> &Arc<BanTable> {
        &self.bans
    }

    /// Binds `host:port` and runs the accept loop forever, handing each
    /// admitted connection to `dialog`. `dialog` receives the raw stream and
    /// a freshly constructed [`SessionContext`]; it is responsible for
    /// driving the protocol and emitting events through the shared sink
    /// passed back to it via closure capture.
    pub async fn run<F, Fut>(self, host: &str, port: u16, dialog: F) -> Result<(), ListenerError>
    where
        F: Fn(TcpStream, SessionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DialogOutcome> + Send + 'static,
    {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ListenerError::Bind { addr: addr.clone(), source })?;

        self.sink.emit(&EventRecord::new(
            host.to_string(),
            port,
            "server-startup".to_string(),
            EventDetail::ServerStarted {
                host: host.to_string(),
                port,
                max_connections: self.max_connections,
            },
        ));
        info!(%addr, max_connections = ?self.max_connections, "server_started");

        let dialog = Arc::new(dialog);
        let active = self.max_connections.map(|n| Arc::new(tokio::sync::Semaphore::new(n)));
        let ban_ttl = crate::config::ban_time_secs();

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(source) => return Err(ListenerError::Accept(source)),
            };

            if self.bans.is_banned(peer_addr.ip()) {
                // Close immediately, no bytes sent.
                drop(stream);
                continue;
            }

            let permit = match &active {
                Some(sem) => match sem.clone().try_acquire_owned() {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        // At capacity: close immediately.
                        drop(stream);
                        continue;
                    }
                },
                None => None,
            };

            let ctx = SessionContext::new(peer_addr);
            self.metrics.connection_opened();
            self.sink.emit(&EventRecord::new(
                ctx.source_ip.clone(),
                ctx.source_port,
                ctx.session_id.clone(),
                EventDetail::ConnectionOpened,
            ));

            let dialog = dialog.clone();
            let metrics = self.metrics.clone();
            let sink = self.sink.clone();
            let bans = self.bans.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let session_id = ctx.session_id.clone();
                let source_ip = ctx.source_ip.clone();
                let source_port = ctx.source_port;
                let ip = ctx.peer_addr.ip();

                let outcome = dialog(stream, ctx).await;

                match &outcome {
                    DialogOutcome::Banned => {
                        bans.ban(ip, ban_ttl);
                        sink.emit(&EventRecord::new(
                            source_ip.clone(),
                            source_port,
                            session_id.clone(),
                            EventDetail::IpBanned { ip: ip.to_string(), duration_secs: ban_ttl },
                        ));
                        warn!(%ip, ttl = ban_ttl, "ip_banned");
                    }
                    DialogOutcome::Error(error) => {
                        warn!(%error, %session_id, "session_error");
                        // Per spec §7, only local logic failures (not expected
                        // peer misbehavior like a bad frame or a timeout) are
                        // meant to surface as an `error` event on the wire.
                        if matches!(error, DialogError::ClassifyFailure(_)) {
                            sink.emit(&EventRecord::new(
                                source_ip.clone(),
                                source_port,
                                session_id.clone(),
                                EventDetail::Error { message: error.to_string() },
                            ));
                        }
                        if error.is_fatal_for_peer() {
                            bans.ban(ip, ban_ttl);
                            sink.emit(&EventRecord::new(
                                source_ip.clone(),
                                source_port,
                                session_id.clone(),
                                EventDetail::IpBanned { ip: ip.to_string(), duration_secs: ban_ttl },
                            ));
                            warn!(%ip, ttl = ban_ttl, "ip_banned");
                        }
                    }
                    DialogOutcome::Closed => {}
                }

                sink.emit(&EventRecord::new(
                    source_ip,
                    source_port,
                    session_id,
                    EventDetail::ConnectionClosed,
                ));
                metrics.connection_closed();
            });
        }
    }
}
