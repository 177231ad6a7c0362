mod dialog;
mod page_provider;

use std::sync::Arc;

use anyhow::Result;
use honeypot_core::{config, AttackClassifier, BanTable, EventSink, ListenerSupervisor, Metrics};

use dialog::run_http_dialog;
use page_provider::PageProvider;

#[tokio::main]
async fn main() -> Result<()> {
    honeypot_core::cli::parse();
    config::init_tracing();

    let host = config::host();
    let port = config::port("HONEYPOT_PORT", 8080);
    let max_connections = Some(config::max_connections(100));

    let bans = Arc::new(BanTable::new());
    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(EventSink::stdout());
    let classifier = Arc::new(AttackClassifier::new());
    let pages = Arc::new(PageProvider::new());

    let supervisor = ListenerSupervisor::new(bans, metrics.clone(), sink.clone(), max_connections);

    supervisor
        .run(&host, port, move |stream, ctx| {
            let sink = sink.clone();
            let metrics = metrics.clone();
            let classifier = classifier.clone();
            let pages = pages.clone();
            async move { run_http_dialog(stream, ctx, sink, metrics, classifier, pages).await }
        })
        .await?;

    Ok(())
}
