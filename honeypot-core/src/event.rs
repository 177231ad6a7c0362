use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

/// Per-field truncation lengths applied at construction time, per spec §4.8.
pub const QUERY_TRUNCATE: usize = 200;
pub const BODY_TRUNCATE: usize = 1000;
pub const USER_AGENT_TRUNCATE: usize = 100;

fn truncate_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Truncate on a char boundary so we never split a multi-byte UTF-8
    // sequence in half.
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// One observed interaction, common fields plus a per-protocol [`EventDetail`].
///
/// Serializes to a single flat JSON object: `event_type` (from `detail`) sits
/// alongside `timestamp`, `source_ip`, `source_port` and `session_id`.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub source_ip: String,
    pub source_port: u16,
    pub session_id: String,
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl EventRecord {
    pub fn new(source_ip: String, source_port: u16, session_id: String, detail: EventDetail) -> Self {
        EventRecord {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            source_ip,
            source_port,
            session_id,
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventDetail {
    ServerStarted { host: String, port: u16, max_connections: Option<usize> },
    ConnectionOpened,
    ConnectionClosed,
    IpBanned { ip: String, duration_secs: u64 },
    Error { message: String },

    SshClientVersion { version: String },
    SshLoginAttempt { username: String, password: String, success: bool },

    HttpRequest {
        method: String,
        path: String,
        headers: BTreeMap<String, String>,
        body: String,
        user_agent: String,
        attack_type: String,
    },

    SmtpMessage {
        mail_from: String,
        rcpt_to: Vec<String>,
        subject: String,
        message_size: usize,
    },
    #[serde(rename = "auth_attempt")]
    SmtpAuthAttempt { command: String },

    DbAuth { username: String, database: String },
    SqlQuery { query: String, is_injection: bool },

    SuspiciousAccess { path: String, detail: String },
    LoginAttempt { username: String },
}

impl EventDetail {
    pub fn http_request(
        method: String,
        path: String,
        headers: BTreeMap<String, String>,
        body: String,
        user_agent: String,
        attack_type: &'static str,
    ) -> Self {
        EventDetail::HttpRequest {
            method,
            path,
            headers,
            body: truncate_str(&body, BODY_TRUNCATE),
            user_agent: truncate_str(&user_agent, USER_AGENT_TRUNCATE),
            attack_type: attack_type.to_string(),
        }
    }

    pub fn sql_query(query: String, is_injection: bool) -> Self {
        EventDetail::SqlQuery {
            query: truncate_str(&query, QUERY_TRUNCATE),
            is_injection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_body_on_char_boundary() {
        let body = "x".repeat(BODY_TRUNCATE + 50);
        let detail = EventDetail::http_request(
            "GET".into(),
            "/".into(),
            BTreeMap::new(),
            body,
            "".into(),
            "",
        );
        if let EventDetail::HttpRequest { body, .. } = detail {
            assert_eq!(body.len(), BODY_TRUNCATE);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn serializes_with_flat_event_type() {
        let rec = EventRecord::new(
            "10.0.0.7".into(),
            4444,
            "abc123".into(),
            EventDetail::ConnectionOpened,
        );
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"event_type\":\"connection_opened\""));
        assert!(json.contains("\"source_ip\":\"10.0.0.7\""));
    }
}
