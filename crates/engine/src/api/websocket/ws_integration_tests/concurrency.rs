use super::*;

use std::collections::{HashMap, HashSet};

#[tokio::test]
async fn concurrent_joins_spawn_on_distinct_cells() {
    let (addr, app) = spawn_default_server().await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        tasks.push(tokio::spawn(async move {
            let (ws, joined) = ws_join(addr, "arena", &format!("user-{}", i)).await;
            let spawn = match joined {
                ServerMessage::SpaceJoined { spawn, .. } => (spawn.x, spawn.y),
                other => panic!("unexpected {:?}", other),
            };
            (ws, spawn)
        }));
    }

    let mut sockets = Vec::new();
    let mut cells = HashSet::new();
    for task in tasks {
        let (ws, spawn) = task.await.unwrap();
        assert!(cells.insert(spawn), "two sessions spawned on {:?}", spawn);
        sockets.push(ws);
    }
    assert_eq!(app.registry.session_count().await, 16);
}

/// Every other session, movers included, sees the accepted moves of each
/// mover in the order they were applied, and rejected moves never show up.
#[tokio::test]
async fn observers_agree_on_move_order() {
    let (addr, _app) = spawn_default_server().await;

    let (mut observer_a, _) = ws_join(addr, "arena", "observer-a").await;
    let (mut observer_b, _) = ws_join(addr, "arena", "observer-b").await;

    let movers = 4;
    let mut mover_sockets = Vec::new();
    for i in 0..movers {
        let (ws, _) = ws_join(addr, "arena", &format!("mover-{}", i)).await;
        mover_sockets.push(ws);
    }

    // Each mover walks its own column from row 10 upward; odd steps aim at
    // the out-of-bounds row and must be rejected.
    let steps = 20;
    let mut tasks = Vec::new();
    for (i, mut ws) in mover_sockets.into_iter().enumerate() {
        tasks.push(tokio::spawn(async move {
            let x = 50 + i as i64;
            for step in 0..steps {
                let y = if step % 2 == 0 { 10 + step } else { 10_000 };
                ws_send_client(&mut ws, &ClientMessage::Move { x, y }).await;
            }
            ws
        }));
    }
    let mut mover_sockets = Vec::new();
    for task in tasks {
        mover_sockets.push(task.await.unwrap());
    }

    let expected_moves = movers * (steps as usize / 2);
    let seen_a = collect_moves(&mut observer_a, expected_moves).await;
    let seen_b = collect_moves(&mut observer_b, expected_moves).await;

    assert_eq!(seen_a, seen_b, "observers disagree on event order");
    for observer in [&mut observer_a, &mut observer_b] {
        ws_expect_no_message_matching(observer, QUIET_PERIOD, |m| {
            matches!(m, ServerMessage::Movement { .. })
        })
        .await;
    }

    let mut per_mover: HashMap<String, Vec<i32>> = HashMap::new();
    for (user, _x, y) in &seen_a {
        assert!(*y < 200, "rejected move was broadcast: {}", y);
        per_mover.entry(user.clone()).or_default().push(*y);
    }
    assert_eq!(per_mover.len(), movers);
    for ys in per_mover.values() {
        assert_eq!(ys.len(), steps as usize / 2);
        let mut sorted = ys.clone();
        sorted.sort();
        assert_eq!(ys, &sorted, "a mover's moves arrived out of order");
    }

    // Movers see everyone else's moves exactly once, in the same order.
    let others_moves = (movers - 1) * (steps as usize / 2);
    for (i, ws) in mover_sockets.iter_mut().enumerate() {
        let me = format!("mover-{}", i);
        let seen = collect_moves(ws, others_moves).await;
        let expected: Vec<_> = seen_a.iter().filter(|(user, _, _)| *user != me).cloned().collect();
        assert_eq!(seen, expected, "{} disagrees with the observers", me);
        ws_expect_no_message_matching(ws, QUIET_PERIOD, |m| {
            matches!(m, ServerMessage::Movement { .. })
        })
        .await;
    }
}

async fn collect_moves(ws: &mut TestWs, count: usize) -> Vec<(String, i32, i32)> {
    let mut seen = Vec::with_capacity(count);
    while seen.len() < count {
        let msg = ws_expect_message(ws, RECV_TIMEOUT, |m| {
            matches!(m, ServerMessage::Movement { .. })
        })
        .await;
        if let ServerMessage::Movement { user_id, x, y, .. } = msg {
            seen.push((user_id, x, y));
        }
    }
    seen
}
