use super::*;

async fn expect_error(ws: &mut TestWs, expected: ErrorCode) {
    match ws_recv_server(ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, expected),
        other => panic!("expected {:?} error, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn malformed_json_is_protocol_error_and_connection_survives() {
    let (addr, _app) = spawn_default_server().await;
    let mut ws = ws_connect(addr).await;

    ws_send_raw(&mut ws, "{not json").await;
    expect_error(&mut ws, ErrorCode::ProtocolError).await;

    ws_send_raw(&mut ws, r#"{"type":"teleport","payload":{}}"#).await;
    expect_error(&mut ws, ErrorCode::ProtocolError).await;

    ws_send_client(&mut ws, &join_msg("arena", "alice")).await;
    assert!(matches!(
        ws_recv_server(&mut ws).await,
        ServerMessage::SpaceJoined { .. }
    ));
}

#[tokio::test]
async fn move_before_join_is_protocol_error() {
    let (addr, _app) = spawn_default_server().await;
    let mut ws = ws_connect(addr).await;
    ws_send_client(&mut ws, &ClientMessage::Move { x: 1, y: 1 }).await;
    expect_error(&mut ws, ErrorCode::ProtocolError).await;
}

#[tokio::test]
async fn move_beyond_coordinate_range_is_out_of_bounds() {
    let (addr, app) = spawn_default_server().await;
    let (mut ws, _) = ws_join(addr, "arena", "alice").await;

    for frame in [
        r#"{"type":"move","payload":{"x":3000000000,"y":5}}"#,
        r#"{"type":"move","payload":{"x":0,"y":-9000000000}}"#,
    ] {
        ws_send_raw(&mut ws, frame).await;
        assert_eq!(
            ws_recv_server(&mut ws).await,
            ServerMessage::MovementRejected {
                reason: MoveRejection::OutOfBounds,
                x: 0,
                y: 0
            },
            "{}",
            frame
        );
    }

    let arena = metaverse_domain::SpaceId::new("arena").unwrap();
    let sessions = app.registry.list_sessions(&arena).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].position(), metaverse_domain::Position::new(0, 0));
}

#[tokio::test]
async fn bad_token_is_auth_error() {
    let (addr, app) = spawn_default_server().await;
    let mut ws = ws_connect(addr).await;
    ws_send_client(
        &mut ws,
        &ClientMessage::Join {
            space_id: "arena".into(),
            token: "forged.token.value".into(),
        },
    )
    .await;
    expect_error(&mut ws, ErrorCode::AuthError).await;
    assert_eq!(app.registry.space_count(), 0);
}

#[tokio::test]
async fn unknown_space_is_not_found() {
    let (addr, _app) = spawn_default_server().await;
    let mut ws = ws_connect(addr).await;
    ws_send_client(&mut ws, &join_msg("atlantis", "alice")).await;
    expect_error(&mut ws, ErrorCode::NotFound).await;
}

#[tokio::test]
async fn second_join_is_already_joined() {
    let (addr, app) = spawn_default_server().await;
    let (mut ws, _) = ws_join(addr, "arena", "alice").await;
    ws_send_client(&mut ws, &join_msg("arena", "alice")).await;
    expect_error(&mut ws, ErrorCode::AlreadyJoined).await;
    assert_eq!(app.registry.session_count().await, 1);
}

#[tokio::test]
async fn idle_client_does_not_stall_movers() {
    // Tiny outboxes; the idle client never reads its socket.
    let app = test_app(metaverse_domain::MovementRules::default(), 2);
    let (addr, _handle) = spawn_ws_server(app).await;

    let (mut mover, _) = ws_join(addr, "arena", "mover").await;
    let (mut watcher, _) = ws_join(addr, "arena", "watcher").await;
    let (_idle, _) = ws_join(addr, "arena", "idle").await;
    ws_expect_message(&mut mover, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserJoined { user_id, .. } if user_id == "idle")
    })
    .await;

    for y in 1..=50 {
        ws_send_client(&mut mover, &ClientMessage::Move { x: 0, y }).await;
        ws_expect_message(&mut watcher, RECV_TIMEOUT, |m| {
            matches!(m, ServerMessage::Movement { y: seen, .. } if i64::from(*seen) == y)
        })
        .await;
    }
}
