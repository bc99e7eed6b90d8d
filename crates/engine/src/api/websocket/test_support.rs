use super::*;

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use metaverse_domain::{Dimensions, ElementFootprint, MovementRules, SpaceGeometry, SpaceId};

use crate::app::App;
use crate::infrastructure::identity::JwtIdentityVerifier;
use crate::infrastructure::spaces::StaticSpaceStore;
use crate::stores::{EmptySpacePolicy, SpaceRegistry};

pub(crate) type TestWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) const TEST_SECRET: &[u8] = b"test-secret";

/// Sign a token the test server accepts.
pub(crate) fn token_for(user_id: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &serde_json::json!({ "userId": user_id }),
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap()
}

/// Spaces served by the test server:
/// - `arena`: 100x200, static element at (20, 20)
/// - `closet`: 1x1
pub(crate) fn test_spaces() -> StaticSpaceStore {
    StaticSpaceStore::new()
        .with_space(
            SpaceId::new("arena").unwrap(),
            SpaceGeometry::new(
                Dimensions::new(100, 200).unwrap(),
                vec![ElementFootprint::cell(20, 20)],
            )
            .unwrap(),
        )
        .with_space(
            SpaceId::new("closet").unwrap(),
            SpaceGeometry::open(Dimensions::new(1, 1).unwrap()),
        )
}

pub(crate) fn test_app(rules: MovementRules, outbound_buffer: usize) -> Arc<App> {
    Arc::new(App::new(
        Arc::new(SpaceRegistry::new(EmptySpacePolicy::Evict)),
        Arc::new(JwtIdentityVerifier::new(TEST_SECRET)),
        Arc::new(test_spaces()),
        rules,
        outbound_buffer,
    ))
}

pub(crate) async fn spawn_ws_server(app: Arc<App>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = crate::api::router(app);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn spawn_default_server() -> (SocketAddr, Arc<App>) {
    let app = test_app(MovementRules::default(), 256);
    let (addr, _handle) = spawn_ws_server(app.clone()).await;
    (addr, app)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> TestWs {
    let url = format!("ws://{}/", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut TestWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut TestWs, text: &str) {
    ws.send(WsMessage::Text(text.to_string().into())).await.unwrap();
}

/// Next server message, or `None` once the server closed the socket.
pub(crate) async fn ws_try_recv_server(ws: &mut TestWs) -> Option<ServerMessage> {
    loop {
        match ws.next().await? {
            Ok(WsMessage::Text(text)) => {
                return Some(serde_json::from_str::<ServerMessage>(&text).unwrap());
            }
            Ok(WsMessage::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

pub(crate) async fn ws_recv_server(ws: &mut TestWs) -> ServerMessage {
    ws_try_recv_server(ws)
        .await
        .expect("server closed the connection")
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            match ws_try_recv_server(ws).await {
                Some(msg) if predicate(&msg) => panic!("unexpected message: {:?}", msg),
                Some(_) => {}
                // Closed: nothing more can arrive, keep waiting out the timeout.
                None => std::future::pending::<()>().await,
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

/// Wait until the server closes the socket.
pub(crate) async fn ws_expect_closed(ws: &mut TestWs, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        while ws_try_recv_server(ws).await.is_some() {}
    })
    .await
    .unwrap()
}

pub(crate) fn join_msg(space_id: &str, user_id: &str) -> ClientMessage {
    ClientMessage::Join {
        space_id: space_id.to_string(),
        token: token_for(user_id),
    }
}

/// Connect and join, returning the socket and the `space-joined` payload.
pub(crate) async fn ws_join(addr: SocketAddr, space_id: &str, user_id: &str) -> (TestWs, ServerMessage) {
    let mut ws = ws_connect(addr).await;
    ws_send_client(&mut ws, &join_msg(space_id, user_id)).await;
    let joined = ws_expect_message(&mut ws, Duration::from_secs(2), |m| {
        matches!(m, ServerMessage::SpaceJoined { .. })
    })
    .await;
    (ws, joined)
}
