//! Full round flow through a spawned session: subscribe, receive a game,
//! win the bid, prove the solution by clicking, watch the goal rotate, and
//! finish — all over the channel-framed wire format.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use ricochet_client::config::ClientConfig;
use ricochet_client::round::{LocalCommand, RoundPhase, spawn_round_session};
use ricochet_client::transport::TransportAdapter;
use ricochet_core::protocol::channel_identifier;
use ricochet_core::robots::RobotColor;
use ricochet_core::test_helpers::bordered_rows;

fn test_config() -> ClientConfig {
    ClientConfig {
        room: "12".to_string(),
        user_id: "me".to_string(),
        ..ClientConfig::default()
    }
}

fn event_frame(identifier: &str, message: serde_json::Value) -> String {
    serde_json::json!({ "identifier": identifier, "message": message }).to_string()
}

fn start_message() -> serde_json::Value {
    serde_json::json!({
        "action": "start_new_game",
        "cells": bordered_rows(4),
        "goals": [
            { "color": "red", "number": 2 },
            { "color": "yellow", "number": 9 }
        ],
        "robot_colors": ["red", "yellow"],
        "robot_positions": [
            { "robot": "red", "position": { "row": 1, "column": 2 } },
            { "robot": "yellow", "position": { "row": 3, "column": 3 } }
        ],
        "current_goal": { "color": "red", "number": 2 }
    })
}

#[tokio::test(start_paused = true)]
async fn full_competitive_round() {
    let config = test_config();
    let identifier = channel_identifier(&config.channel, &config.room);

    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let transport = TransportAdapter::new(&config.channel, &config.room, out_tx);

    let (handle, mut view_rx, task) =
        spawn_round_session(&config, transport, UnboundedReceiverStream::new(frame_rx));

    // The session subscribes to the game channel on startup.
    let subscribe: serde_json::Value =
        serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
    assert_eq!(subscribe["command"], "subscribe");
    assert_eq!(subscribe["identifier"].as_str().unwrap(), identifier);

    // Server starts a game with a current goal.
    frame_tx
        .send(event_frame(&identifier, start_message()))
        .unwrap();
    let view = view_rx
        .wait_for(|v| v.phase == RoundPhase::SolutionBidding)
        .await
        .unwrap()
        .clone();
    assert_eq!(view.robots.len(), 2);
    assert_eq!(view.current_goal.map(|g| g.number), Some(2));

    // This client bids three moves.
    assert!(handle.command(LocalCommand::SendNumberOfMoves(3)));
    let bid: serde_json::Value =
        serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
    let data: serde_json::Value =
        serde_json::from_str(bid["data"].as_str().unwrap()).unwrap();
    assert_eq!(data["action"], "solution_in");
    assert_eq!(data["nr_moves"], 3);

    // The server echoes the bid and later closes bidding in our favor.
    frame_tx
        .send(event_frame(
            &identifier,
            serde_json::json!({
                "action": "solution_in",
                "current_winner": "Me",
                "current_winner_id": "me",
                "current_nr_moves": 3,
                "seconds_left": 60
            }),
        ))
        .unwrap();
    let view = view_rx.wait_for(|v| v.seconds_left == 60).await.unwrap().clone();
    assert_eq!(view.winner.as_deref(), Some("Me"));

    frame_tx
        .send(event_frame(
            &identifier,
            serde_json::json!({
                "action": "closed_for_solutions",
                "current_winner": "Me",
                "current_winner_id": "me",
                "seconds_left": 30
            }),
        ))
        .unwrap();
    view_rx
        .wait_for(|v| v.phase == RoundPhase::MovesWindow && v.can_provide_moves)
        .await
        .unwrap();

    // Select red at (1, 2) and slide it up onto the goal at (0, 2).
    assert!(handle.command(LocalCommand::ClickedBoard { row: 1, column: 2 }));
    view_rx
        .wait_for(|v| v.selected == Some(RobotColor::Red))
        .await
        .unwrap();
    assert!(handle.command(LocalCommand::ClickedBoard { row: 0, column: 2 }));

    let proof: serde_json::Value =
        serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
    let data: serde_json::Value =
        serde_json::from_str(proof["data"].as_str().unwrap()).unwrap();
    assert_eq!(data["action"], "solution_moves");
    assert_eq!(data["moves"][0]["robot"], "red");
    assert_eq!(data["moves"][0]["to"]["row"], 0);

    // Server confirms the win; the goal resolves and the preview replays.
    frame_tx
        .send(event_frame(
            &identifier,
            serde_json::json!({
                "action": "goal_won_by",
                "winner": "Me",
                "moves": [
                    { "robot": "red", "to": { "row": 0, "column": 2 } }
                ]
            }),
        ))
        .unwrap();
    view_rx
        .wait_for(|v| v.phase == RoundPhase::GoalResolved && v.ready_for_next_goal)
        .await
        .unwrap();

    // Next goal arrives with authoritative positions.
    frame_tx
        .send(event_frame(
            &identifier,
            serde_json::json!({
                "action": "new_goal",
                "goal": { "color": "yellow", "number": 9 },
                "robot_positions": [
                    { "robot": "red", "position": { "row": 0, "column": 2 } },
                    { "robot": "yellow", "position": { "row": 3, "column": 3 } }
                ]
            }),
        ))
        .unwrap();
    let view = view_rx
        .wait_for(|v| {
            v.phase == RoundPhase::SolutionBidding
                && v.current_goal.map(|g| g.number) == Some(9)
        })
        .await
        .unwrap()
        .clone();
    assert!(!view.can_provide_moves);
    assert!(!view.cant_provide_solution);
    assert!(view.moves.is_empty());

    // Traffic for another room's channel never reaches the round.
    let other = channel_identifier(&config.channel, "99");
    frame_tx
        .send(event_frame(&other, serde_json::json!({ "action": "game_finished" })))
        .unwrap();
    // An unknown action on our channel is ignored too.
    frame_tx
        .send(event_frame(
            &identifier,
            serde_json::json!({ "action": "chat", "body": "gg" }),
        ))
        .unwrap();

    frame_tx
        .send(event_frame(&identifier, serde_json::json!({ "action": "game_finished" })))
        .unwrap();
    view_rx
        .wait_for(|v| v.phase == RoundPhase::GameFinished)
        .await
        .unwrap();

    assert!(handle.command(LocalCommand::Stop));
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn closed_stream_stops_the_session() {
    let config = test_config();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
    let (out_tx, _out_rx) = mpsc::unbounded_channel::<String>();
    let transport = TransportAdapter::new(&config.channel, &config.room, out_tx);

    let (_handle, _view_rx, task) =
        spawn_round_session(&config, transport, UnboundedReceiverStream::new(frame_rx));

    drop(frame_tx);
    task.await.unwrap();
}
