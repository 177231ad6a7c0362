use std::sync::Arc;
use std::time::Duration;

use honeypot_core::classifier::extract_ssh_credentials;
use honeypot_core::{DialogError, DialogOutcome, EventDetail, EventRecord, EventSink, Metrics, SessionContext};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::attempts::LoginAttemptTracker;
use crate::wire::{build_auth_failure, build_kexinit};

const SERVER_BANNER: &[u8] = b"SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.1\r\n";
const BANNER_READ_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_BANNER_LEN: usize = 255;
const MAX_AUTH_READ: usize = 4096;
const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Drives one SSH connection through banner exchange, a fake KEXINIT, and
/// up to three simulated authentication attempts, per spec §4.2.
///
/// Generic over the stream type (mirrors the teacher's
/// `_run_stream<R: AsyncRead + AsyncWrite + Unpin>` pattern) so the exact
/// same logic runs against a real `TcpStream` in production and an
/// in-memory `tokio::io::duplex` pair in tests.
pub async fn run_ssh_dialog<S>(
    mut stream: S,
    ctx: SessionContext,
    sink: Arc<EventSink>,
    metrics: Arc<Metrics>,
    attempts: Arc<LoginAttemptTracker>,
) -> DialogOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(e) = stream.write_all(SERVER_BANNER).await {
        return DialogOutcome::Error(DialogError::Io(e));
    }

    let client_banner = match read_line(&mut stream, MAX_BANNER_LEN, BANNER_READ_TIMEOUT).await {
        ReadLineResult::Line(line) => line,
        ReadLineResult::Eof => return DialogOutcome::Error(DialogError::ShortRead),
        ReadLineResult::Timeout => return DialogOutcome::Error(DialogError::Timeout),
    };

    sink.emit(&EventRecord::new(
        ctx.source_ip.clone(),
        ctx.source_port,
        ctx.session_id.clone(),
        EventDetail::SshClientVersion { version: client_banner },
    ));

    if let Err(e) = stream.write_all(&build_kexinit()).await {
        return DialogOutcome::Error(DialogError::Io(e));
    }

    let mut buf = vec![0u8; MAX_AUTH_READ];
    for attempt_index in 0..MAX_LOGIN_ATTEMPTS {
        let read = match timeout(AUTH_READ_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break, // peer closed
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return DialogOutcome::Error(DialogError::Io(e)),
            Err(_) => break, // inactivity deadline, clean close
        };

        match extract_ssh_credentials(&buf[..read]) {
            Some((username, password)) => {
                sink.emit(&EventRecord::new(
                    ctx.source_ip.clone(),
                    ctx.source_port,
                    ctx.session_id.clone(),
                    EventDetail::SshLoginAttempt {
                        username,
                        password,
                        success: false,
                    },
                ));
                metrics.login_failed();

                if let Err(e) = stream.write_all(&build_auth_failure()).await {
                    return DialogOutcome::Error(DialogError::Io(e));
                }

                let total = attempts.record(ctx.peer_addr.ip());
                if total >= MAX_LOGIN_ATTEMPTS {
                    return DialogOutcome::Banned;
                }
            }
            None if attempt_index > 0 => {
                // A parse failure after the first attempt: give up on the peer.
                return DialogOutcome::Banned;
            }
            None => {
                // First buffer didn't yield credentials; tolerate and keep reading.
            }
        }
    }

    DialogOutcome::Closed
}

enum ReadLineResult {
    Line(String),
    Timeout,
    Eof,
}

async fn read_line<S>(stream: &mut S, max_len: usize, deadline: Duration) -> ReadLineResult
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(max_len);
    let mut byte = [0u8; 1];

    let result = timeout(deadline, async {
        loop {
            if buf.len() >= max_len {
                break;
            }
            match stream.read(&mut byte).await {
                Ok(0) => return None,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    buf.push(byte[0]);
                }
                Err(_) => return None,
            }
        }
        Some(())
    })
    .await;

    match result {
        Ok(Some(())) => {
            let line = String::from_utf8_lossy(&buf);
            ReadLineResult::Line(line.trim_end_matches('\r').to_string())
        }
        Ok(None) => ReadLineResult::Eof,
        Err(_) => ReadLineResult::Timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::sync::Mutex;
    use tokio::io::AsyncWriteExt as _;

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn drive_one_session(
        ip: &str,
        sink: Arc<EventSink>,
        metrics: Arc<Metrics>,
        attempts: Arc<LoginAttemptTracker>,
    ) -> DialogOutcome {
        let (mut client, server) = tokio::io::duplex(4096);
        let ctx = SessionContext::new(format!("{ip}:4444").parse().unwrap());

        let handle = tokio::spawn(run_ssh_dialog(server, ctx, sink, metrics, attempts));

        let mut scratch = [0u8; 4096];
        let _ = tokio::time::timeout(Duration::from_millis(200), client.read(&mut scratch)).await;
        client.write_all(b"SSH-2.0-test\n").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(200), client.read(&mut scratch)).await;
        client.write_all(b"\x00user\x00pass\x00").await.unwrap();
        drop(client);

        handle.await.unwrap()
    }

    #[tokio::test]
    async fn three_separate_sessions_accumulate_to_a_ban() {
        let attempts = Arc::new(LoginAttemptTracker::new());
        let metrics = Arc::new(Metrics::new());
        let buf = SharedBuf::default();
        let sink = Arc::new(EventSink::new(buf.clone()));

        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.push(
                drive_one_session("10.0.0.7", sink.clone(), metrics.clone(), attempts.clone()).await,
            );
        }

        assert!(matches!(outcomes[0], DialogOutcome::Closed));
        assert!(matches!(outcomes[1], DialogOutcome::Closed));
        assert!(matches!(outcomes[2], DialogOutcome::Banned));

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let attempt_events = log.lines().filter(|l| l.contains("ssh_login_attempt")).count();
        assert_eq!(attempt_events, 3);
        assert_eq!(metrics.snapshot().failed_logins, 3);
    }

    #[tokio::test]
    async fn credentials_are_extracted_verbatim() {
        let attempts = Arc::new(LoginAttemptTracker::new());
        let metrics = Arc::new(Metrics::new());
        let buf = SharedBuf::default();
        let sink = Arc::new(EventSink::new(buf.clone()));

        drive_one_session("10.0.0.99", sink, metrics, attempts).await;

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let line = log.lines().find(|l| l.contains("ssh_login_attempt")).unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["username"], "user");
        assert_eq!(value["password"], "pass");
        assert_eq!(value["success"], false);
    }
}
