use std::env;

/// Reads `HOST`, default `0.0.0.0`, per spec §6.
pub fn host() -> String {
    env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}

/// Reads a listener's bind port from `var_name`, falling back to `default`
/// when unset *or* when the value starts with `tcp://` — the literal
/// collision with Kubernetes' auto-injected `{SERVICE}_PORT` environment
/// variables, preserved from `original_source`.
pub fn port(var_name: &str, default: u16) -> u16 {
    match env::var(var_name) {
        Ok(v) if !v.starts_with("tcp://") => v.parse().unwrap_or(default),
        _ => default,
    }
}

pub fn max_connections(default: usize) -> usize {
    env::var("MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn ban_time_secs() -> u64 {
    env::var("BAN_TIME")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300)
}

pub fn max_message_size() -> usize {
    env::var("MAX_MESSAGE_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1024 * 1024)
}

pub fn smtp_hostname() -> String {
    env::var("HOSTNAME").unwrap_or_else(|_| "mail.example.com".to_string())
}

/// Installs a `tracing` subscriber honoring `RUST_LOG` if set, else
/// `LOG_LEVEL` (default `info`), mirroring `warpgate`'s `main.rs` setup.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    if env::var("RUST_LOG").is_err() {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
        env::set_var("RUST_LOG", level.to_lowercase());
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_scheme_port_falls_back_to_default() {
        std::env::set_var("TEST_HONEYPOT_PORT", "tcp://10.0.0.1:2222");
        assert_eq!(port("TEST_HONEYPOT_PORT", 2222), 2222);
        std::env::remove_var("TEST_HONEYPOT_PORT");
    }

    #[test]
    fn numeric_port_is_parsed() {
        std::env::set_var("TEST_HONEYPOT_PORT2", "9999");
        assert_eq!(port("TEST_HONEYPOT_PORT2", 2222), 9999);
        std::env::remove_var("TEST_HONEYPOT_PORT2");
    }
}
