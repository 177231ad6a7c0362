use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use honeypot_core::{
    AttackClassifier, DialogError, DialogOutcome, EventDetail, EventRecord, EventSink, Metrics, SessionContext,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::wire::{build_greeting_packet, build_ok_packet, build_query_response, parse_auth_packet, parse_query_packet};

const AUTH_TIMEOUT: Duration = Duration::from_secs(30);
const QUERY_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_AUTH_READ: usize = 1024;
const MAX_QUERY_READ: usize = 4096;

/// Drives one MySQL connection: greeting, a single auth packet, then
/// queries until the peer goes quiet or disconnects, per spec §4.5.
pub async fn run_mysql_dialog<S>(
    mut stream: S,
    ctx: SessionContext,
    sink: Arc<EventSink>,
    metrics: Arc<Metrics>,
    classifier: Arc<AttackClassifier>,
    connection_counter: Arc<AtomicU32>,
) -> DialogOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let connection_id = connection_counter.fetch_add(1, Ordering::Relaxed);

    if let Err(e) = stream.write_all(&build_greeting_packet(connection_id)).await {
        return DialogOutcome::Error(DialogError::Io(e));
    }

    let mut auth_buf = vec![0u8; MAX_AUTH_READ];
    let read = match timeout(AUTH_TIMEOUT, stream.read(&mut auth_buf)).await {
        Ok(Ok(0)) => return DialogOutcome::Error(DialogError::ShortRead),
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return DialogOutcome::Error(DialogError::Io(e)),
        Err(_) => return DialogOutcome::Error(DialogError::Timeout),
    };

    let (username, database) = parse_auth_packet(&auth_buf[..read]);
    sink.emit(&EventRecord::new(
        ctx.source_ip.clone(),
        ctx.source_port,
        ctx.session_id.clone(),
        EventDetail::DbAuth { username, database },
    ));

    if let Err(e) = stream.write_all(&build_ok_packet()).await {
        return DialogOutcome::Error(DialogError::Io(e));
    }

    let mut query_buf = vec![0u8; MAX_QUERY_READ];
    loop {
        let read = match timeout(QUERY_TIMEOUT, stream.read(&mut query_buf)).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(n)) => n,
            Ok(Err(_)) => break,
        };

        if let Some(query) = parse_query_packet(&query_buf[..read]) {
            let is_injection = classifier.is_sql_injection(&query);
            metrics.query_seen(is_injection);

            sink.emit(&EventRecord::new(
                ctx.source_ip.clone(),
                ctx.source_port,
                ctx.session_id.clone(),
                EventDetail::sql_query(query.clone(), is_injection),
            ));

            if stream.write_all(&build_query_response(&query)).await.is_err() {
                break;
            }
        }
    }

    DialogOutcome::Closed
}
