use super::*;

#[tokio::test]
async fn two_users_join_move_and_leave() {
    let (addr, app) = spawn_default_server().await;

    let (mut admin, admin_joined) = ws_join(addr, "arena", "admin-1").await;
    let admin_session = match admin_joined {
        ServerMessage::SpaceJoined {
            session_id,
            spawn,
            dimensions,
            elements,
            occupants,
            ..
        } => {
            assert_eq!((spawn.x, spawn.y), (0, 0));
            assert_eq!((dimensions.width, dimensions.height), (100, 200));
            assert_eq!(elements.len(), 1);
            assert!(occupants.is_empty());
            session_id
        }
        other => panic!("unexpected {:?}", other),
    };

    let (mut user, user_joined) = ws_join(addr, "arena", "user-1").await;
    match user_joined {
        ServerMessage::SpaceJoined { occupants, spawn, .. } => {
            assert_eq!((spawn.x, spawn.y), (1, 0));
            assert_eq!(occupants.len(), 1);
            assert_eq!(occupants[0].session_id, admin_session);
        }
        other => panic!("unexpected {:?}", other),
    }

    let seen = ws_recv_server(&mut admin).await;
    assert!(
        matches!(&seen, ServerMessage::UserJoined { user_id, x: 1, y: 0, .. } if user_id == "user-1"),
        "admin saw {:?}",
        seen
    );

    // Outside the space.
    ws_send_client(&mut admin, &ClientMessage::Move { x: 100_000, y: 100_000 }).await;
    assert_eq!(
        ws_recv_server(&mut admin).await,
        ServerMessage::MovementRejected {
            reason: MoveRejection::OutOfBounds,
            x: 0,
            y: 0
        }
    );

    // Next to the element.
    ws_send_client(&mut admin, &ClientMessage::Move { x: 21, y: 20 }).await;
    let moved = ws_recv_server(&mut user).await;
    assert_eq!(
        moved,
        ServerMessage::Movement {
            session_id: admin_session,
            user_id: "admin-1".into(),
            x: 21,
            y: 20
        }
    );
    ws_expect_no_message_matching(&mut admin, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::Movement { .. })
    })
    .await;

    drop(admin);

    let left = ws_expect_message(&mut user, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserLeft { .. })
    })
    .await;
    let value = serde_json::to_value(&left).unwrap();
    assert_eq!(value["payload"]["userId"], "admin-1");

    assert_eq!(app.registry.session_count().await, 1);
}

#[tokio::test]
async fn move_onto_static_element_is_rejected() {
    let (addr, _app) = spawn_default_server().await;
    let (mut ws, _) = ws_join(addr, "arena", "alice").await;
    let (mut other, _) = ws_join(addr, "arena", "bob").await;

    ws_send_client(&mut ws, &ClientMessage::Move { x: 20, y: 20 }).await;
    let reply = ws_expect_message(&mut ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::MovementRejected { .. })
    })
    .await;
    assert_eq!(
        reply,
        ServerMessage::MovementRejected {
            reason: MoveRejection::BlockedByElement,
            x: 0,
            y: 0
        }
    );

    ws_expect_no_message_matching(&mut other, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::Movement { .. })
    })
    .await;
}

#[tokio::test]
async fn explicit_leave_closes_socket_and_frees_cell() {
    let (addr, app) = spawn_default_server().await;
    let (mut alice, _) = ws_join(addr, "arena", "alice").await;
    let (mut bob, _) = ws_join(addr, "arena", "bob").await;

    ws_send_client(&mut alice, &ClientMessage::Leave {}).await;
    ws_expect_closed(&mut alice, RECV_TIMEOUT).await;

    ws_expect_message(&mut bob, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserLeft { user_id, .. } if user_id == "alice")
    })
    .await;

    // Alice's spawn cell is free again.
    ws_send_client(&mut bob, &ClientMessage::Move { x: 0, y: 0 }).await;
    ws_expect_no_message_matching(&mut bob, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::MovementRejected { .. })
    })
    .await;
    assert_eq!(app.registry.session_count().await, 1);
}

#[tokio::test]
async fn last_leave_evicts_space() {
    let (addr, app) = spawn_default_server().await;
    let (mut alice, _) = ws_join(addr, "arena", "alice").await;
    assert_eq!(app.registry.space_count(), 1);

    ws_send_client(&mut alice, &ClientMessage::Leave {}).await;
    ws_expect_closed(&mut alice, RECV_TIMEOUT).await;

    tokio::time::timeout(RECV_TIMEOUT, async {
        while app.registry.space_count() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn full_space_rejects_second_joiner() {
    let (addr, _app) = spawn_default_server().await;
    let (_first, _) = ws_join(addr, "closet", "alice").await;

    let mut second = ws_connect(addr).await;
    ws_send_client(&mut second, &join_msg("closet", "bob")).await;
    let reply = ws_recv_server(&mut second).await;
    assert!(
        matches!(reply, ServerMessage::Error { code: ErrorCode::SpaceFull, .. }),
        "got {:?}",
        reply
    );
}

#[tokio::test]
async fn ws_path_serves_the_same_protocol() {
    let (addr, _app) = spawn_default_server().await;
    let (mut ws, _resp) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();
    ws_send_client(&mut ws, &join_msg("arena", "alice")).await;
    assert!(matches!(
        ws_recv_server(&mut ws).await,
        ServerMessage::SpaceJoined { .. }
    ));
}
