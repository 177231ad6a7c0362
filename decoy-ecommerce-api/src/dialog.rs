use std::sync::Arc;
use std::time::Duration;

use honeypot_core::http::{build_response, parse_request, path_only};
use honeypot_core::{DialogError, DialogOutcome, EventDetail, EventRecord, EventSink, Metrics, SessionContext};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::routes::route;

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REQUEST_SIZE: usize = 16 * 1024;

/// Single-shot request/response exchange against the fake REST surface,
/// per spec §4.8.
pub async fn run_api_dialog<S>(
    mut stream: S,
    ctx: SessionContext,
    sink: Arc<EventSink>,
    metrics: Arc<Metrics>,
) -> DialogOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; MAX_REQUEST_SIZE];
    let read = match timeout(READ_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(0)) => return DialogOutcome::Error(DialogError::ShortRead),
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return DialogOutcome::Error(DialogError::Io(e)),
        Err(_) => return DialogOutcome::Error(DialogError::Timeout),
    };

    let mut request = match parse_request(&buf[..read]) {
        Some(req) => req,
        None => return DialogOutcome::Error(DialogError::MalformedFrame("unparseable HTTP request".to_string())),
    };
    request.path = path_only(&request.path).to_string();

    let result = route(&request);

    if let Some(event) = &result.event {
        let is_attack = matches!(
            event,
            EventDetail::SuspiciousAccess { .. } | EventDetail::SqlQuery { is_injection: true, .. }
        );
        if is_attack {
            metrics.attack_detected();
        }
        sink.emit(&EventRecord::new(
            ctx.source_ip.clone(),
            ctx.source_port,
            ctx.session_id.clone(),
            event.clone(),
        ));
    }

    let response = build_response(result.status, result.status_text, &result.body);
    let _ = stream.write_all(&response).await;

    DialogOutcome::Closed
}
