mod dialog;
mod wire;

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use anyhow::Result;
use honeypot_core::{config, AttackClassifier, BanTable, EventSink, ListenerSupervisor, Metrics};

use dialog::run_mysql_dialog;

#[tokio::main]
async fn main() -> Result<()> {
    honeypot_core::cli::parse();
    config::init_tracing();

    let host = config::host();
    let port = config::port("HONEYPOT_PORT", 3306);
    let max_connections = Some(config::max_connections(25));

    let bans = Arc::new(BanTable::new());
    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(EventSink::stdout());
    let classifier = Arc::new(AttackClassifier::new());
    let connection_counter = Arc::new(AtomicU32::new(0));

    let supervisor = ListenerSupervisor::new(bans, metrics.clone(), sink.clone(), max_connections);

    supervisor
        .run(&host, port, move |stream, ctx| {
            let sink = sink.clone();
            let metrics = metrics.clone();
            let classifier = classifier.clone();
            let connection_counter = connection_counter.clone();
            async move { run_mysql_dialog(stream, ctx, sink, metrics, classifier, connection_counter).await }
        })
        .await?;

    Ok(())
}
