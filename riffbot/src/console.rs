//! Line-based front-end
//!
//! Each input line is a music request, except for a few commands:
//! `/as <name>` switches requester, `/queue` shows the local queue and
//! `/quit` leaves.

use riffqueue::{LocalPlayer, QueueOrchestrator, RequestContext, Requester, Session};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const CONSOLE_GUILD: &str = "console";
const CONSOLE_CHANNEL: &str = "console";

const HELP: &str = "Type a search, a media URL or a Spotify link. \
Commands: /as <name>, /queue, /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Request(String),
    As(String),
    Queue,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    match line.split_once(char::is_whitespace) {
        Some(("/as", name)) if !name.trim().is_empty() => Command::As(name.trim().to_string()),
        _ => match line {
            "/queue" => Command::Queue,
            "/help" | "/as" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Request(line.to_string()),
        },
    }
}

pub struct Console {
    orchestrator: QueueOrchestrator,
    player: Arc<LocalPlayer>,
    ctx: RequestContext,
}

impl Console {
    pub fn new(orchestrator: QueueOrchestrator, player: Arc<LocalPlayer>, requester: &str) -> Self {
        Self {
            orchestrator,
            player,
            ctx: RequestContext {
                guild_id: CONSOLE_GUILD.to_string(),
                text_channel_id: CONSOLE_CHANNEL.to_string(),
                voice_channel_id: Some(CONSOLE_CHANNEL.to_string()),
                requester: Requester::new(requester, requester),
            },
        }
    }

    /// Reads lines until `/quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(format!("{}\n", HELP).as_bytes()).await?;

        while let Some(line) = lines.next_line().await? {
            let reply = match parse_line(&line) {
                Command::Empty => continue,
                Command::Quit => break,
                Command::Help => HELP.to_string(),
                Command::As(name) => {
                    self.ctx.requester = Requester::new(&name, &name);
                    format!("Now requesting as {}", name)
                }
                Command::Queue => self.render_queue().await,
                Command::Request(query) => {
                    debug!(query = %query, "Console request");
                    self.orchestrator
                        .handle_request(&self.ctx, &query)
                        .await
                        .message()
                }
            };
            output.write_all(format!("{}\n", reply).as_bytes()).await?;
            output.flush().await?;
        }

        Ok(())
    }

    async fn render_queue(&self) -> String {
        let Some(session) = self.player.session(CONSOLE_GUILD).await else {
            return "Queue is empty".to_string();
        };

        let mut lines = Vec::new();
        if let Some(track) = session.now_playing().await {
            let state = format!("{:?}", session.state().await).to_lowercase();
            lines.push(format!(
                "[{}] {} - {} (requested by {})",
                state,
                track.title(),
                track.author(),
                self.requested_by(track.uri(), track.requester()).await
            ));
        }
        for (position, track) in session.upcoming().await.iter().enumerate() {
            lines.push(format!(
                "{:>3}. {} - {} (requested by {})",
                position + 1,
                track.title(),
                track.author(),
                self.requested_by(track.uri(), track.requester()).await
            ));
        }

        if lines.is_empty() {
            "Queue is empty".to_string()
        } else {
            lines.join("\n")
        }
    }

    async fn requested_by(&self, uri: &str, fallback: &Requester) -> String {
        self.orchestrator
            .registry()
            .get(uri)
            .await
            .unwrap_or_else(|| fallback.display_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riffconfig::Config;
    use rifflavalink::{DEFAULT_REQUEST_TIMEOUT, NodeConfig, NodePool};
    use riffqueue::{
        PlaybackProvider, PlaylistExpander, RequesterRegistry, TrackInfo, TrackResolver,
        VoiceTarget,
    };
    use riffspotify::SpotifyClient;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_BODY: &str = r#"{
        "loadType": "search",
        "data": [{
            "encoded": "QAAAjQIAJVJpY2sgQXN0bGV5",
            "info": {
                "title": "Never Gonna Give You Up",
                "author": "Rick Astley",
                "length": 212000,
                "isStream": false,
                "uri": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            }
        }]
    }"#;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), Command::Empty);
        assert_eq!(parse_line("/queue"), Command::Queue);
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/as  bob "), Command::As("bob".into()));
        assert_eq!(parse_line("/as"), Command::Help);
        assert_eq!(
            parse_line(" daft punk around the world "),
            Command::Request("daft punk around the world".into())
        );
    }

    fn console(player: Arc<LocalPlayer>) -> Console {
        let spotify = SpotifyClient::builder()
            .client_id("test")
            .client_secret("test")
            .build()
            .unwrap();
        // no node: every request stops at the precondition check
        let orchestrator = QueueOrchestrator::new(
            PlaylistExpander::new(Arc::new(spotify)),
            TrackResolver::new(Arc::new(NodePool::new(Vec::new()))),
            player.clone(),
            Arc::new(RequesterRegistry::new()),
        );
        Console::new(orchestrator, player, "alice")
    }

    async fn run(console: &mut Console, input: &str) -> String {
        let mut output = Vec::new();
        console.run(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_session_commands() {
        let mut console = console(Arc::new(LocalPlayer::new()));
        let output = run(&mut console, "lofi\n/as bob\n/queue\n/quit\nnever read\n").await;

        assert!(output.contains("No audio node is available"));
        assert!(output.contains("Now requesting as bob"));
        assert!(output.contains("Queue is empty"));
        assert_eq!(console.ctx.requester.display_name, "bob");
    }

    #[tokio::test]
    async fn test_queue_listing() {
        let player = Arc::new(LocalPlayer::new());
        let session = player
            .create_or_get_connection(&VoiceTarget {
                guild_id: CONSOLE_GUILD.into(),
                voice_channel_id: CONSOLE_CHANNEL.into(),
                text_channel_id: CONSOLE_CHANNEL.into(),
            })
            .await
            .unwrap();
        for title in ["One", "Two"] {
            let track = TrackInfo {
                uri: format!("https://yt/{}", title),
                title: title.to_string(),
                author: "Band".into(),
                encoded: None,
                length_ms: 1000,
                is_stream: false,
                source_name: None,
            }
            .requested_by(Requester::new("u", "carol"));
            session.append(track).await.unwrap();
        }
        session.play().await.unwrap();

        let mut console = console(player);
        let output = run(&mut console, "/queue\n").await;

        assert!(output.contains("[playing] One - Band (requested by carol)"));
        assert!(output.contains("  1. Two - Band (requested by carol)"));
    }

    #[tokio::test]
    async fn test_default_config_without_spotify_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/loadtracks"))
            .and(query_param("identifier", "ytmsearch:rick astley"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_BODY))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        let spotify = SpotifyClient::from_config_obj(&config).unwrap();
        let pool = NodePool::from_node_configs(
            vec![NodeConfig {
                name: "main".into(),
                url: server.uri(),
                password: "youshallnotpass".into(),
            }],
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();

        let player = Arc::new(LocalPlayer::new());
        let orchestrator = QueueOrchestrator::new(
            PlaylistExpander::new(Arc::new(spotify)),
            TrackResolver::from_config(Arc::new(pool), &config),
            player.clone(),
            Arc::new(RequesterRegistry::from_config(&config)),
        );
        let mut console = Console::new(orchestrator, player, "alice");

        let output = run(
            &mut console,
            "rick astley\nhttps://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M\n",
        )
        .await;

        assert!(output.contains(
            "Now playing: [Never Gonna Give You Up](https://www.youtube.com/watch?v=dQw4w9WgXcQ)"
        ));
        assert!(output.contains("Failed to process Spotify link"));
    }
}
