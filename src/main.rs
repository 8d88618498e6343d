use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use hibiscus_player::player::track::Requester;
use hibiscus_player::sources::StaticResolver;
use hibiscus_player::ui::TraceSink;
use hibiscus_player::{
    node::MemoryNode, Config, ContextId, LifecycleReactor, PlayerResponse, PlayerService,
    SessionRegistry, SinkId,
};

/// Demo local: el mismo núcleo que usa el bot, cableado contra un nodo en
/// memoria cuyas canciones duran unos segundos.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hibiscus_player=debug".parse()?),
        )
        .init();

    info!("🌺 Iniciando Hibiscus Player v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("{}", config.summary());

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let node = MemoryNode::with_track_length(events_tx, Duration::from_secs(5));
    let service = Arc::new(PlayerService::new(
        Arc::new(SessionRegistry::new(config.max_queue_size)),
        Arc::new(StaticResolver::demo()),
        Arc::new(node.clone()),
        Arc::new(TraceSink),
    ));

    let reactor = LifecycleReactor::new(service.clone());
    tokio::spawn(reactor.run(events_rx));

    node.emit_ready(false);

    // guion de demostración contra el catálogo fijo
    let context = ContextId(1);
    let sink = SinkId(1);
    let dj = Requester::new(1, "dj-demo");

    for query in ["roxanne", "kingston", "playlist:chill"] {
        let response = service.play(context, sink, dj.clone(), query, false).await;
        info!("↩️ play '{query}': {response:?}");
    }

    if let PlayerResponse::Queue { snapshot } = service.queue_view(context).await {
        for page in snapshot.pages(config.songs_per_page) {
            for (offset, track) in page.tracks.iter().enumerate() {
                info!(
                    "  {}. {} (página {}/{})",
                    page.first_position + offset,
                    track,
                    page.number,
                    page.total_pages
                );
            }
        }
    }

    let response = service.skip(context).await;
    info!("↩️ skip: {response:?}");

    info!("🎧 Dejando correr la cola; Ctrl+C para salir");
    tokio::signal::ctrl_c().await?;

    let response = service.stop(context).await;
    info!("⚠️ Shutdown: {response:?}");
    Ok(())
}
