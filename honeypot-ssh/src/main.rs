mod attempts;
mod dialog;
mod wire;

use std::sync::Arc;

use anyhow::Result;
use honeypot_core::{config, BanTable, EventSink, ListenerSupervisor, Metrics};

use attempts::LoginAttemptTracker;
use dialog::run_ssh_dialog;

#[tokio::main]
async fn main() -> Result<()> {
    honeypot_core::cli::parse();
    config::init_tracing();

    let host = config::host();
    let port = config::port("HONEYPOT_PORT", 2222);
    let max_connections = Some(config::max_connections(50));

    let bans = Arc::new(BanTable::new());
    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(EventSink::stdout());
    let attempts = Arc::new(LoginAttemptTracker::new());

    let supervisor = ListenerSupervisor::new(bans, metrics.clone(), sink.clone(), max_connections);

    supervisor
        .run(&host, port, move |stream, ctx| {
            let sink = sink.clone();
            let metrics = metrics.clone();
            let attempts = attempts.clone();
            async move { run_ssh_dialog(stream, ctx, sink, metrics, attempts).await }
        })
        .await?;

    Ok(())
}
