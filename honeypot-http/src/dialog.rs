use std::sync::Arc;
use std::time::Duration;

use honeypot_core::http::{parse_request, path_only};
use honeypot_core::{
    AttackClassifier, DialogError, DialogOutcome, EventDetail, EventRecord, EventSink, Metrics, SessionContext,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::page_provider::PageProvider;

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REQUEST_SIZE: usize = 8 * 1024;

/// Drives one HTTP connection: a single request/response exchange, then
/// close, per spec §4.3. No keep-alive.
pub async fn run_http_dialog<S>(
    mut stream: S,
    ctx: SessionContext,
    sink: Arc<EventSink>,
    metrics: Arc<Metrics>,
    classifier: Arc<AttackClassifier>,
    pages: Arc<PageProvider>,
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

    let request = match parse_request(&buf[..read]) {
        Some(req) => req,
        None => return DialogOutcome::Error(DialogError::MalformedFrame("unparseable HTTP request".to_string())),
    };

    let recon_path = path_only(&request.path).to_string();
    let body = request.body_str();
    let headers_joined = request
        .headers
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    let user_agent = request.header("user-agent").unwrap_or("").to_string();

    let attack_type = classifier.classify_http(&request.path, &recon_path, &headers_joined, &body);
    if attack_type.is_some() {
        metrics.attack_detected();
    }

    sink.emit(&EventRecord::new(
        ctx.source_ip.clone(),
        ctx.source_port,
        ctx.session_id.clone(),
        EventDetail::http_request(
            request.method.clone(),
            request.path.clone(),
            request.headers.clone(),
            body,
            user_agent,
            attack_type.map(|t| t.as_str()).unwrap_or("none"),
        ),
    ));

    let response = pages.response_for(&recon_path);
    let _ = stream.write_all(&response).await;

    DialogOutcome::Closed
}
