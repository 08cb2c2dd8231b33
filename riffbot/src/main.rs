mod console;
mod logs;

use anyhow::Context;
use console::Console;
use rifflavalink::{LavalinkConfigExt, NodePool};
use riffqueue::{
    LocalPlayer, PlaylistExpander, QueueOrchestrator, RequesterRegistry, TrackResolver,
};
use riffspotify::SpotifyClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = riffconfig::get_config();
    logs::init_logging(&config);
    info!("Configuration loaded from {}", config.directory());

    let spotify =
        SpotifyClient::from_config_obj(&config).context("Failed to set up the Spotify client")?;

    let pool = Arc::new(
        NodePool::from_config(&config).context("Failed to set up the Lavalink node pool")?,
    );
    let healthy = pool.check_health().await;
    if healthy == 0 {
        warn!("No Lavalink node answered, requests will be refused until one does");
    } else {
        info!("{} of {} Lavalink node(s) ready", healthy, pool.len());
    }
    spawn_health_checks(pool.clone(), config.get_lavalink_health_check_interval());

    let player = Arc::new(LocalPlayer::new());
    let orchestrator = QueueOrchestrator::new(
        PlaylistExpander::new(Arc::new(spotify)),
        TrackResolver::from_config(pool, &config),
        player.clone(),
        Arc::new(RequesterRegistry::from_config(&config)),
    );

    let requester = std::env::var("USER").unwrap_or_else(|_| "console".to_string());
    info!("RiffBot ready, requesting as {}", requester);

    Console::new(orchestrator, player, &requester)
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

/// Re-checks every node periodically so that nodes coming back are noticed
/// even when no request is sent to them
fn spawn_health_checks(pool: Arc<NodePool>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let healthy = pool.check_health().await;
            debug!("{} of {} Lavalink node(s) healthy", healthy, pool.len());
        }
    });
}
