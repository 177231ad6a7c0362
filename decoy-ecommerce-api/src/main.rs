mod dialog;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use honeypot_core::{config, BanTable, EventSink, ListenerSupervisor, Metrics};

use dialog::run_api_dialog;

#[tokio::main]
async fn main() -> Result<()> {
    honeypot_core::cli::parse();
    config::init_tracing();

    let host = config::host();
    let port = config::port("PORT", 8081);
    let max_connections = Some(config::max_connections(100));

    let bans = Arc::new(BanTable::new());
    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(EventSink::stdout());

    let supervisor = ListenerSupervisor::new(bans, metrics.clone(), sink.clone(), max_connections);

    supervisor
        .run(&host, port, move |stream, ctx| {
            let sink = sink.clone();
            let metrics = metrics.clone();
            async move { run_api_dialog(stream, ctx, sink, metrics).await }
        })
        .await?;

    Ok(())
}
