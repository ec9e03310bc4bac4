//! Integration tests for the battle phase.

mod common;

use broadside_battle::{BattleError, TurnArbiter, TurnOutcome};
use broadside_protocol::{Coordinate, ServerMessage};
use broadside_session::{Phase, SessionError};
use common::{WAIT, ana_and_beto, battle_session, seat};

#[tokio::test]
async fn test_first_turn_hit_is_reported_to_both_players() {
    let (players, mut ana, mut beto) = ana_and_beto();
    let session = battle_session().await;
    let mut arbiter = TurnArbiter::new(players, session.clone()).unwrap();

    ana.attack(0, 0).await;
    let outcome = arbiter.play_turn().await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome {
            attacker: 0,
            coordinates: Coordinate::new(0, 0),
            hit: true,
            next_active: 1,
        }
    );

    assert_eq!(ana.next().await, ServerMessage::turn_notification(true));
    assert_eq!(
        ana.next().await,
        ServerMessage::UpdateAttackCoords {
            coordinates: Coordinate::new(0, 0),
            hit: true
        }
    );
    assert_eq!(beto.next().await, ServerMessage::turn_notification(false));
    assert_eq!(
        beto.next().await,
        ServerMessage::attacked(Coordinate::new(0, 0), true)
    );

    let snap = session.snapshot().await;
    assert_eq!(snap.turn_index, 1);
    assert_eq!(snap.turns_resolved, 1);
    assert!(arbiter.players()[1]
        .hits_received()
        .contains(&Coordinate::new(0, 0)));
}

#[tokio::test]
async fn test_second_turn_miss_goes_back_to_first_player() {
    let (players, mut ana, mut beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    ana.attack(0, 0).await;
    arbiter.play_turn().await.unwrap();
    beto.attack(5, 5).await;
    let outcome = arbiter.play_turn().await.unwrap();

    assert_eq!(outcome.attacker, 1);
    assert!(!outcome.hit);
    assert_eq!(outcome.next_active, 0);

    // Drain turn 1.
    for _ in 0..2 {
        ana.next().await;
        beto.next().await;
    }
    assert_eq!(beto.next().await, ServerMessage::turn_notification(true));
    assert_eq!(
        beto.next().await,
        ServerMessage::attack_result(Coordinate::new(5, 5), false)
    );
    assert_eq!(ana.next().await, ServerMessage::turn_notification(false));
    match ana.next().await {
        ServerMessage::Attacked {
            coordinates,
            hit,
            message,
        } => {
            assert_eq!(coordinates, Coordinate::new(5, 5));
            assert!(!hit);
            assert!(message.contains("missed"));
        }
        other => panic!("expected attacked, got {other:?}"),
    }
    assert!(arbiter.players()[0].hits_received().is_empty());
}

#[tokio::test]
async fn test_non_attack_messages_do_not_advance_the_turn() {
    let (players, mut ana, _beto) = ana_and_beto();
    let session = battle_session().await;
    let mut arbiter = TurnArbiter::new(players, session.clone()).unwrap();

    ana.set_boats(&[(7, 7)]).await;
    ana.send_line("{broken").await;
    ana.send_line(r#"{"type":"attack","coordinates":"nope"}"#).await;
    ana.attack(6, 6).await;

    let outcome = arbiter.play_turn().await.unwrap();
    assert_eq!(outcome.attacker, 0);
    assert_eq!(outcome.coordinates, Coordinate::new(6, 6));
    assert_eq!(session.snapshot().await.turns_resolved, 1);

    // One notification for the turn, no re-notification after rejects.
    assert_eq!(ana.next().await, ServerMessage::turn_notification(true));
    assert!(matches!(
        ana.next().await,
        ServerMessage::UpdateAttackCoords { .. }
    ));

    // Late setBoats did not change the placement.
    assert!(!arbiter.players()[0]
        .ships()
        .unwrap()
        .contains(&Coordinate::new(7, 7)));
}

#[tokio::test]
async fn test_early_attack_from_waiting_player_is_used_on_its_turn() {
    let (players, mut ana, mut beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    beto.attack(1, 1).await;
    ana.attack(9, 9).await;

    let first = arbiter.play_turn().await.unwrap();
    assert_eq!(first.attacker, 0);
    assert_eq!(first.coordinates, Coordinate::new(9, 9));

    let second = arbiter.play_turn().await.unwrap();
    assert_eq!(second.attacker, 1);
    assert_eq!(second.coordinates, Coordinate::new(1, 1));
    assert!(second.hit);
}

#[tokio::test]
async fn test_repeated_attack_on_same_cell_hits_again() {
    let (players, mut ana, mut beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    ana.attack(0, 0).await;
    beto.attack(5, 5).await;
    ana.attack(0, 0).await;

    let outcomes = [
        arbiter.play_turn().await.unwrap(),
        arbiter.play_turn().await.unwrap(),
        arbiter.play_turn().await.unwrap(),
    ];
    assert!(outcomes[0].hit);
    assert!(outcomes[2].hit);
    assert_eq!(outcomes[2].attacker, 0);
    assert_eq!(arbiter.session().snapshot().await.turns_resolved, 3);

    let [ana_player, beto_player] = arbiter.into_players();
    assert!(ana_player.hits_received().is_empty());
    assert_eq!(beto_player.hits_received().len(), 1);
}

#[tokio::test]
async fn test_active_index_alternates_each_turn() {
    let (players, mut ana, mut beto) = ana_and_beto();
    let session = battle_session().await;
    let mut arbiter = TurnArbiter::new(players, session.clone()).unwrap();

    for n in 0..6u32 {
        ana.attack(n, 0).await;
        beto.attack(n, 1).await;
    }
    for n in 1..=12u64 {
        let outcome = arbiter.play_turn().await.unwrap();
        assert_eq!(outcome.next_active as u64, n % 2);
        assert_eq!(session.active().await as u64, n % 2);
    }
    assert_eq!(session.phase().await, Phase::Battle);
}

#[tokio::test]
async fn test_out_of_range_attack_is_resolved_as_miss() {
    let (players, mut ana, _beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    ana.attack(42, 4_000_000).await;
    let outcome = arbiter.play_turn().await.unwrap();
    assert!(!outcome.hit);
    assert_eq!(outcome.coordinates, Coordinate::new(42, 4_000_000));
}

#[tokio::test]
async fn test_active_disconnect_stops_the_battle() {
    let (players, ana, _beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    ana.disconnect();
    let err = tokio::time::timeout(WAIT, arbiter.run())
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.lost_index(), Some(0));
}

#[tokio::test]
async fn test_waiting_player_disconnect_is_noticed_on_its_turn() {
    let (players, mut ana, beto) = ana_and_beto();
    let mut arbiter = TurnArbiter::new(players, battle_session().await).unwrap();

    ana.attack(0, 0).await;
    beto.disconnect();

    let err = tokio::time::timeout(WAIT, arbiter.run())
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.lost_index(), Some(1));
}

#[tokio::test]
async fn test_new_rejects_players_without_ships() {
    let (ana, _a) = seat(0, "Ana");
    let (mut beto, _b) = seat(1, "Beto");
    beto.place_ships([Coordinate::new(0, 0)]).unwrap();

    let err = TurnArbiter::new([ana, beto], battle_session().await)
        .err()
        .unwrap();
    assert!(matches!(err, BattleError::ShipsNotPlaced(0)));
}

#[tokio::test]
async fn test_play_turn_outside_battle_fails_after_resolving() {
    let (players, mut ana, _beto) = ana_and_beto();
    let session = std::sync::Arc::new(broadside_session::SessionState::new());
    let mut arbiter = TurnArbiter::new(players, session).unwrap();

    ana.attack(0, 0).await;
    let err = arbiter.play_turn().await.unwrap_err();
    assert!(matches!(
        err,
        BattleError::Session(SessionError::WrongPhase { .. })
    ));
}
