use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Derives the 16-hex-char session id from `"{ip}:{port}:{nanos}"`.
///
/// Uniqueness is best-effort (two sessions from the same peer in the same
/// nanosecond would collide), never cryptographic — matching spec §3.
pub fn generate_session_id(ip: &str, port: u16) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let input = format!("{ip}:{port}:{nanos}");
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Per-connection state, owned exclusively by the `ProtocolDialog` handling
/// it. Created by the supervisor on accept, dropped on any exit path.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub source_ip: String,
    pub source_port: u16,
    pub peer_addr: SocketAddr,
}

impl SessionContext {
    pub fn new(peer_addr: SocketAddr) -> Self {
        let source_ip = peer_addr.ip().to_string();
        let source_port = peer_addr.port();
        SessionContext {
            session_id: generate_session_id(&source_ip, source_port),
            source_ip,
            source_port,
            peer_addr,
        }
    }
}
