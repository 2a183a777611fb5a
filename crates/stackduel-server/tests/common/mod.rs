use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use stackduel_core::net::messages::{ClientEvent, GameStartMsg, ServerEvent};
use stackduel_core::net::protocol::{decode_server_event, encode_client_event};

use stackduel_server::build_app;
use stackduel_server::config::{MatchmakingConfig, ServerConfig};
use stackduel_server::coordinator::CoordinatorStats;
use stackduel_server::state::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server that only sends directed events (no waiting-list
    /// broadcasts), which keeps per-client event order predictable.
    pub async fn new() -> Self {
        let mut config = ServerConfig::default();
        config.matchmaking = MatchmakingConfig {
            broadcast_waiting_list: false,
            ..MatchmakingConfig::default()
        };
        Self::from_config(config).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn send_event(stream: &mut WsStream, event: &ClientEvent) {
    let encoded = encode_client_event(event).unwrap();
    let text = String::from_utf8(encoded).unwrap();
    stream.send(Message::Text(text.into())).await.unwrap();
}

pub async fn send_raw(stream: &mut WsStream, text: &str) {
    stream.send(Message::Text(text.into())).await.unwrap();
}

pub async fn join(stream: &mut WsStream, name: &str) {
    send_event(stream, &ClientEvent::JoinGame(name.into())).await;
}

/// Read the next ServerEvent from a WebSocket stream (5s timeout).
pub async fn read_event(stream: &mut WsStream) -> ServerEvent {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return decode_server_event(text.as_bytes()).unwrap();
                },
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read an event, returning None on timeout.
pub async fn try_read_event(stream: &mut WsStream, timeout_ms: u64) -> Option<ServerEvent> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return decode_server_event(text.as_bytes()).unwrap();
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Poll the coordinator until `check` holds (2s budget). Connection setup
/// and disconnect cleanup run on server tasks, so tests wait for them
/// instead of sleeping.
pub async fn wait_until(server: &TestServer, check: impl Fn(CoordinatorStats) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let stats = server.state.coordinator.read().await.stats();
        if check(stats) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Coordinator never reached expected state: {stats:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connect two clients and pair them, returning both streams and the
/// shared `game_start` payload.
pub async fn start_pair(
    server: &TestServer,
    first: &str,
    second: &str,
) -> (WsStream, WsStream, GameStartMsg) {
    let mut a = ws_connect(&server.ws_url()).await;
    join(&mut a, first).await;
    assert_eq!(read_event(&mut a).await, ServerEvent::WaitingForPlayer);

    let mut b = ws_connect(&server.ws_url()).await;
    join(&mut b, second).await;

    let ServerEvent::GameStart(start) = read_event(&mut a).await else {
        panic!("Expected game_start for {first}");
    };
    assert_eq!(read_event(&mut b).await, ServerEvent::GameStart(start.clone()));
    (a, b, start)
}
