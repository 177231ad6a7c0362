use std::sync::Arc;
use std::time::Duration;

use honeypot_core::{config, DialogError, DialogOutcome, EventDetail, EventRecord, EventSink, Metrics, SessionContext};
use tokio::io::{split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

const LINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Drives one SMTP connection through the ESMTP command subset in spec §4.4:
/// HELO/EHLO, MAIL, RCPT, DATA (with a `.`-terminated body), RSET, NOOP,
/// VRFY, AUTH (always answered "successful" - this honeypot never actually
/// authenticates anyone), QUIT, and an unrecognized-command fallback.
pub async fn run_smtp_dialog<S>(
    stream: S,
    ctx: SessionContext,
    sink: Arc<EventSink>,
    _metrics: Arc<Metrics>,
) -> DialogOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let hostname = config::smtp_hostname();
    let max_message_size = config::max_message_size();

    let (read_half, mut write_half) = split(stream);
    let mut reader = BufReader::new(read_half);

    if let Err(e) = send(&mut write_half, &format!("220 {hostname} ESMTP ready")).await {
        return DialogOutcome::Error(DialogError::Io(e));
    }

    let mut mail_from = String::new();
    let mut rcpt_to: Vec<String> = Vec::new();
    let mut in_data = false;
    let mut message_data: Vec<String> = Vec::new();
    let mut any_command_seen = false;

    loop {
        let mut raw = String::new();
        let read = match timeout(LINE_TIMEOUT, reader.read_line(&mut raw)).await {
            Ok(Ok(0)) if !any_command_seen => return DialogOutcome::Error(DialogError::ShortRead),
            Ok(Ok(0)) => break, // peer hung up after at least one command: clean close
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return DialogOutcome::Error(DialogError::Io(e)),
            Err(_) => break, // inactivity deadline, clean close
        };
        any_command_seen = true;
        let _ = read;
        let line = raw.trim_end_matches(['\r', '\n']).to_string();

        if in_data {
            if line == "." {
                in_data = false;
                let message = message_data.join("\n");
                let subject = extract_subject(&message);

                sink.emit(&EventRecord::new(
                    ctx.source_ip.clone(),
                    ctx.source_port,
                    ctx.session_id.clone(),
                    EventDetail::SmtpMessage {
                        mail_from: mail_from.clone(),
                        rcpt_to: rcpt_to.clone(),
                        subject,
                        message_size: message.len(),
                    },
                ));

                if let Err(e) = send(&mut write_half, "250 OK: Message queued").await {
                    return DialogOutcome::Error(DialogError::Io(e));
                }
                message_data.clear();
            } else if message_data.join("\n").len() < max_message_size {
                message_data.push(line);
            }
            continue;
        }

        let command = line.split_whitespace().next().unwrap_or("").to_uppercase();
        let result = match command.as_str() {
            "HELO" | "EHLO" => send(&mut write_half, &format!("250 {hostname}")).await,
            "MAIL" => {
                mail_from = extract_address(&line);
                tracing::info!(session_id = %ctx.session_id, address = %mail_from, "mail_from");
                send(&mut write_half, "250 OK").await
            }
            "RCPT" => {
                let rcpt = extract_address(&line);
                rcpt_to.push(rcpt.clone());
                tracing::info!(session_id = %ctx.session_id, address = %rcpt, "rcpt_to");
                send(&mut write_half, "250 OK").await
            }
            "DATA" => {
                in_data = true;
                send(&mut write_half, "354 Start mail input; end with <CRLF>.<CRLF>").await
            }
            "RSET" => {
                mail_from.clear();
                rcpt_to.clear();
                message_data.clear();
                send(&mut write_half, "250 OK").await
            }
            "NOOP" => send(&mut write_half, "250 OK").await,
            "QUIT" => {
                let _ = send(&mut write_half, "221 Bye").await;
                break;
            }
            "VRFY" => send(&mut write_half, "252 Cannot VRFY user").await,
            "AUTH" => {
                sink.emit(&EventRecord::new(
                    ctx.source_ip.clone(),
                    ctx.source_port,
                    ctx.session_id.clone(),
                    EventDetail::SmtpAuthAttempt { command: line.clone() },
                ));
                send(&mut write_half, "235 Authentication successful").await
            }
            _ => send(&mut write_half, "500 Command not recognized").await,
        };

        if let Err(e) = result {
            return DialogOutcome::Error(DialogError::Io(e));
        }
    }

    DialogOutcome::Closed
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, message: &str) -> std::io::Result<()> {
    writer.write_all(format!("{message}\r\n").as_bytes()).await
}

/// Pulls the address out of `<...>` in a `MAIL FROM:<addr>` / `RCPT
/// TO:<addr>` line, falling back to the text after the first `:`.
fn extract_address(line: &str) -> String {
    if let (Some(start), Some(end)) = (line.find('<'), line.find('>')) {
        if start < end {
            return line[start + 1..end].to_string();
        }
    }
    if let Some((_, rest)) = line.split_once(':') {
        return rest.trim().trim_matches(|c| c == '<' || c == '>').to_string();
    }
    String::new()
}

/// First `subject:`-prefixed header line, case-insensitive.
fn extract_subject(message: &str) -> String {
    for line in message.split('\n') {
        if let Some(rest) = line.get(..8) {
            if rest.eq_ignore_ascii_case("subject:") {
                return line[8..].trim().to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

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

    #[tokio::test]
    async fn full_dialog_captures_message_and_subject() {
        let metrics = Arc::new(Metrics::new());
        let buf = SharedBuf::default();
        let sink = Arc::new(EventSink::new(buf.clone()));

        let (mut client, server) = tokio::io::duplex(16 * 1024);
        let ctx = SessionContext::new("198.51.100.20:33333".parse().unwrap());
        let handle = tokio::spawn(run_smtp_dialog(server, ctx, sink, metrics));

        let mut scratch = [0u8; 4096];
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"EHLO attacker.example\r\n").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"MAIL FROM:<bot@evil.example>\r\n").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"RCPT TO:<victim@example.com>\r\n").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"DATA\r\n").await.unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client
            .write_all(b"Subject: hello there\r\nbody line\r\n.\r\n")
            .await
            .unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"QUIT\r\n").await.unwrap();

        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, DialogOutcome::Closed));

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let line = log.lines().find(|l| l.contains("smtp_message")).unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["mail_from"], "bot@evil.example");
        assert_eq!(value["rcpt_to"][0], "victim@example.com");
        assert_eq!(value["subject"], "hello there");
    }

    #[tokio::test]
    async fn peer_disconnecting_before_any_command_is_a_short_read() {
        let metrics = Arc::new(Metrics::new());
        let buf = SharedBuf::default();
        let sink = Arc::new(EventSink::new(buf.clone()));

        let (mut client, server) = tokio::io::duplex(4096);
        let ctx = SessionContext::new("198.51.100.22:33335".parse().unwrap());
        let handle = tokio::spawn(run_smtp_dialog(server, ctx, sink, metrics));

        let mut scratch = [0u8; 4096];
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        drop(client);

        let outcome = handle.await.unwrap();
        assert!(matches!(
            outcome,
            DialogOutcome::Error(honeypot_core::DialogError::ShortRead)
        ));
    }

    #[tokio::test]
    async fn auth_always_succeeds_and_is_logged() {
        let metrics = Arc::new(Metrics::new());
        let buf = SharedBuf::default();
        let sink = Arc::new(EventSink::new(buf.clone()));

        let (mut client, server) = tokio::io::duplex(4096);
        let ctx = SessionContext::new("198.51.100.21:33334".parse().unwrap());
        let handle = tokio::spawn(run_smtp_dialog(server, ctx, sink, metrics));

        let mut scratch = [0u8; 4096];
        let _ = tokio::time::timeout(Duration::from_millis(100), client.read(&mut scratch)).await;
        client.write_all(b"AUTH LOGIN\r\n").await.unwrap();
        let n = tokio::time::timeout(Duration::from_millis(200), client.read(&mut scratch))
            .await
            .unwrap()
            .unwrap();
        assert!(String::from_utf8_lossy(&scratch[..n]).contains("235 Authentication successful"));
        client.write_all(b"QUIT\r\n").await.unwrap();
        handle.await.unwrap();

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(log.lines().any(|l| l.contains("\"event_type\":\"auth_attempt\"")));
    }
}
