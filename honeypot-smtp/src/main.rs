mod dialog;

use std::sync::Arc;

use anyhow::Result;
use honeypot_core::{config, BanTable, EventSink, ListenerSupervisor, Metrics};

use dialog::run_smtp_dialog;

#[tokio::main]
async fn main() -> Result<()> {
    honeypot_core::cli::parse();
    config::init_tracing();

    let host = config::host();
    let port = config::port("SMTP_HONEYPOT_PORT", 2525);

    let bans = Arc::new(BanTable::new());
    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(EventSink::stdout());

    // No connection-count cap here: admission is bounded by max message size
    // instead, unlike the other three listeners.
    let supervisor = ListenerSupervisor::new(bans, metrics.clone(), sink.clone(), None);

    supervisor
        .run(&host, port, move |stream, ctx| {
            let sink = sink.clone();
            let metrics = metrics.clone();
            async move { run_smtp_dialog(stream, ctx, sink, metrics).await }
        })
        .await?;

    Ok(())
}
