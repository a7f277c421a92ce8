mod common;

use auctioneer::auction::{PlayerEdit, SlotFilter};
use auctioneer::config::AuctionSettings;
use auctioneer::domain::{EventKind, NominationState};
use auctioneer::notify::run_notification_dispatch;
use auctioneer::ErrorKind;
use common::*;
use std::collections::BTreeMap;

fn kinds_for(notifications: &[auctioneer::Notification], subject: i64) -> Vec<EventKind> {
    notifications
        .iter()
        .filter(|n| n.subject == Some(subject) && !n.kind.is_round_event())
        .map(|n| n.kind)
        .collect()
}

#[tokio::test]
async fn test_round_creation() {
    let h = setup().await;
    let l = league(&h).await;

    assert_eq!(l.slots.len(), 4);
    assert_eq!(l.slots[0].closes_at, at(3, 12));
    assert_eq!(l.slots[3].closes_at, at(3, 15));

    let round_kinds: Vec<_> = h
        .repo
        .list_notifications()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind.is_round_event())
        .map(|n| n.kind)
        .collect();
    assert_eq!(round_kinds.len(), 3);

    let err = h.service.create_round(l.a.id, &plan(1, 2), at(1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h.service.create_round(l.b.id, &plan(2, 2), at(1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    let mut bad = plan(2, 2);
    bad.nomination_closes_at = bad.first_close_at + chrono::Duration::hours(1);
    let err = h.service.create_round(l.a.id, &bad, at(1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut sprawling = plan(2, 2);
    sprawling.spacing_minutes = i64::MAX / 100;
    let err = h.service.create_round(l.a.id, &sprawling, at(1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut crowded = plan(2, 2);
    crowded.num_slots = i64::MAX;
    let err = h.service.create_round(l.a.id, &crowded, at(1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(h.repo.list_slots(Some(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_slot_filters() {
    let h = setup().await;
    let l = league(&h).await;
    round(&h, l.a.id, 2, 3).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;
    h.service
        .nominate(l.a.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();

    let all = h.service.open_slots(SlotFilter::default()).await.unwrap();
    assert_eq!(all.len(), 6);

    let round_one = h
        .service
        .open_slots(SlotFilter {
            round: Some(1),
            nominatable_at: None,
        })
        .await
        .unwrap();
    assert_eq!(round_one.len(), 3);
    assert!(round_one.iter().all(|s| s.id != l.slots[0].id));

    let now_open = h
        .service
        .open_slots(SlotFilter {
            round: None,
            nominatable_at: Some(nominating()),
        })
        .await
        .unwrap();
    assert!(now_open.iter().all(|s| s.round == 1));
}

#[tokio::test]
async fn test_delete_round_keeps_occupied_slots() {
    let h = setup().await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;
    h.service
        .nominate(l.a.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();

    let outcome = h.service.delete_round(l.a.id, 1, nominating()).await.unwrap();
    assert_eq!(outcome.deleted, 3);
    assert_eq!(outcome.kept, 1);
    assert_eq!(h.repo.list_slots(Some(1)).await.unwrap().len(), 1);

    let round_events = h
        .repo
        .list_notifications()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind.is_round_event() && n.subject == Some(1))
        .count();
    assert_eq!(round_events, 3);

    round(&h, l.a.id, 2, 2).await;
    let outcome = h.service.delete_round(l.a.id, 2, nominating()).await.unwrap();
    assert_eq!(outcome.deleted, 2);
    assert_eq!(outcome.kept, 0);
    let round_two_events = h
        .repo
        .list_notifications()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind.is_round_event() && n.subject == Some(2))
        .count();
    assert_eq!(round_two_events, 0);

    let err = h.service.delete_round(l.a.id, 9, nominating()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_admin_delete_frees_player_and_retracts() {
    let h = setup().await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;
    let n = h
        .service
        .nominate(l.b.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();
    let notifications = h.repo.list_notifications().await.unwrap();
    assert_eq!(kinds_for(&notifications, n.id.as_i64()), vec![EventKind::PlayerNominated]);

    let err = h.service.admin_delete(l.b.id, n.id, nominating()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    h.service.admin_delete(l.a.id, n.id, nominating()).await.unwrap();
    assert!(h.repo.get_nomination(n.id).await.unwrap().is_none());
    assert!(h.repo.bids_for(n.id).await.unwrap().is_empty());
    let notifications = h.repo.list_notifications().await.unwrap();
    assert!(kinds_for(&notifications, n.id.as_i64()).is_empty());

    let available = h.repo.list_nominatable_players().await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, p.id);
}

#[tokio::test]
async fn test_admin_edit_owner_after_sent_match_schedules_retraction() {
    let h = setup().await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", Some(l.c.id), false).await;
    let n = h
        .service
        .nominate(l.a.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();
    h.service
        .place_bid(l.b.id, n.id, Some(30), nominating())
        .await
        .unwrap();
    h.service.close(n.id, after_close()).await.unwrap();

    run_notification_dispatch(&h.repo, h.emitter.as_ref(), after_close())
        .await
        .unwrap();
    assert!(h.emitter.sent_kinds().contains(&EventKind::MatchPending));

    let edited = h
        .service
        .admin_edit(l.a.id, n.id, l.slots[0].id, Some(l.b.id), after_close())
        .await
        .unwrap();
    assert_eq!(edited.state, NominationState::Resolved);
    assert_eq!(edited.winner_id, Some(l.b.id));
    assert_eq!(edited.winning_value, Some(30));
    assert_eq!(h.repo.get_player(p.id).await.unwrap().unwrap().owner, Some(l.b.id));

    let unsent: Vec<_> = h
        .repo
        .list_notifications()
        .await
        .unwrap()
        .into_iter()
        .filter(|x| !x.sent && x.subject == Some(n.id.as_i64()) && !x.kind.is_round_event())
        .map(|x| x.kind)
        .collect();
    assert_eq!(unsent, vec![EventKind::MatchRetracted]);
}

#[tokio::test]
async fn test_admin_edit_unassign_reopens() {
    let h = setup().await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;
    let n = h
        .service
        .nominate(l.a.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();
    h.service.close(n.id, after_close()).await.unwrap();

    let moved = h
        .service
        .admin_edit(l.a.id, n.id, l.slots[1].id, Some(l.b.id), after_close())
        .await
        .unwrap();
    assert_eq!(moved.winner_id, Some(l.b.id));
    assert_eq!(moved.winning_value, Some(20));

    let taken = player(&h, l.a.id, "Deuce", None, false).await;
    h.service
        .nominate(l.c.id, taken.id, l.slots[2].id, 20, nominating())
        .await
        .unwrap();
    let err = h
        .service
        .admin_edit(l.a.id, n.id, l.slots[2].id, None, after_close())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let reopened = h
        .service
        .admin_edit(l.a.id, n.id, l.slots[1].id, None, after_close())
        .await
        .unwrap();
    assert_eq!(reopened.state, NominationState::Open);
    assert_eq!(reopened.slot_id, l.slots[1].id);
    assert_eq!(reopened.winner_id, None);
    assert!(h.repo.get_player(p.id).await.unwrap().unwrap().owner.is_none());
}

#[tokio::test]
async fn test_sign_player() {
    let mut settings = AuctionSettings::default();
    settings.minimum_total_salary = BTreeMap::from([(3, 30)]);
    let h = setup_with(settings).await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;
    let n = h
        .service
        .nominate(l.a.id, p.id, l.slots[0].id, 20, nominating())
        .await
        .unwrap();

    let err = h.service.sign_player(l.a.id, p.id, 3, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    h.service
        .place_bid(l.b.id, n.id, Some(25), nominating())
        .await
        .unwrap();
    h.service.close(n.id, after_close()).await.unwrap();

    let err = h.service.sign_player(l.c.id, p.id, 3, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    let err = h.service.sign_player(l.b.id, p.id, 0, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h.service.sign_player(l.b.id, p.id, 3, 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h
        .service
        .sign_player(l.b.id, p.id, 3, i64::MAX / 2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h.service.sign_player(l.b.id, p.id, 3, -10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let signed = h.service.sign_player(l.b.id, p.id, 3, 10).await.unwrap();
    assert_eq!(signed.contract_length, Some(3));
    assert_eq!(signed.salary, Some(10));

    let err = h.service.sign_player(l.b.id, p.id, 2, 12).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[tokio::test]
async fn test_admin_edit_player_rights() {
    let h = setup().await;
    let l = league(&h).await;
    let p = player(&h, l.a.id, "Ace", None, false).await;

    let edit = PlayerEdit {
        owner: None,
        match_right_holder: Some(l.c.id),
        hometown_discount: true,
    };
    let err = h.service.admin_edit_player(l.b.id, p.id, &edit).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    let updated = h.service.admin_edit_player(l.a.id, p.id, &edit).await.unwrap();
    assert_eq!(updated.match_right_holder, Some(l.c.id));
    assert!(updated.hometown_discount);

    let owned = PlayerEdit {
        owner: Some(l.b.id),
        ..edit
    };
    let updated = h.service.admin_edit_player(l.a.id, p.id, &owned).await.unwrap();
    assert_eq!(updated.owner, Some(l.b.id));
    assert!(h.repo.list_nominatable_players().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tiebreaker_reorder() {
    let h = setup().await;
    let l = league(&h).await;
    let d = manager(&h, "dave", None, false).await;

    let clash = BTreeMap::from([(l.a.id, 1)]);
    let err = h.service.tiebreaker_reorder(l.a.id, &clash).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let rotate = BTreeMap::from([(l.a.id, 1), (l.b.id, 3), (l.c.id, 2), (d.id, 4)]);
    let err = h.service.tiebreaker_reorder(l.b.id, &rotate).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    h.service.tiebreaker_reorder(l.a.id, &rotate).await.unwrap();
    assert_eq!(
        ranks(&h).await,
        vec![(l.a.id, 1), (l.c.id, 2), (l.b.id, 3), (d.id, 4)]
    );

    let err = h
        .service
        .tiebreaker_reorder(l.a.id, &BTreeMap::from([(d.id, 0)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
