mod common;

use std::collections::BTreeSet;

use api::reservations::{service, ConfirmOutcome, NewReservation, ReservationError};
use common::*;
use infra::repos::reservations;
use uuid::Uuid;

fn booking(tables: &[Uuid], from: (u32, u32), to: (u32, u32)) -> NewReservation {
    NewReservation {
        table_ids: tables.to_vec(),
        from: at(from.0, from.1),
        to: at(to.0, to.1),
        user_name: "Grace Hopper".to_string(),
        user_email: "grace@example.com".to_string(),
    }
}

async fn reservations_of(app_state: &api::AppState, restaurant_id: Uuid) -> i64 {
    reservations::count_for_restaurant_within(&app_state.db, restaurant_id, at(0, 0), at(23, 59))
        .await
        .expect("count reservations")
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_empty_table_set_is_rejected_without_writes() {
    let app_state = setup_test_db().await;
    let (restaurant_id, _) = create_test_restaurant(&app_state, &unique_name("Empty"), &[4]).await;

    let result = service::create_reservation(&app_state, booking(&[], (12, 0), (13, 0))).await;

    assert!(matches!(result, Err(ReservationError::Validation(_))));
    assert_eq!(reservations_of(&app_state, restaurant_id).await, 0);
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_overlapping_booking_conflicts_and_keeps_first() {
    let app_state = setup_test_db().await;
    let (restaurant_id, tables) =
        create_test_restaurant(&app_state, &unique_name("Overlap"), &[2, 4]).await;

    let first = service::create_reservation(&app_state, booking(&tables[..1], (12, 0), (13, 0)))
        .await
        .expect("first booking succeeds");
    assert!(!first.details.reservation.confirmed);
    assert_eq!(first.restaurant_id, restaurant_id);
    assert_eq!(first.confirmation_token.len(), 32);
    assert_ne!(
        first.details.reservation.confirmation_token_hash,
        first.confirmation_token
    );

    // Shares table 0 for 12:30-13:30
    let second = service::create_reservation(&app_state, booking(&tables, (12, 30), (13, 30))).await;
    match second {
        Err(ReservationError::Conflict { tables: conflicting }) => {
            assert_eq!(conflicting, vec![tables[0]]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    assert_eq!(reservations_of(&app_state, restaurant_id).await, 1);
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_adjacent_intervals_do_not_conflict() {
    let app_state = setup_test_db().await;
    let (_, tables) = create_test_restaurant(&app_state, &unique_name("Adjacent"), &[4]).await;

    service::create_reservation(&app_state, booking(&tables, (12, 0), (13, 0)))
        .await
        .expect("12:00-13:00");
    service::create_reservation(&app_state, booking(&tables, (13, 0), (14, 0)))
        .await
        .expect("13:00-14:00 touches but does not overlap");
    service::create_reservation(&app_state, booking(&tables, (11, 0), (12, 0)))
        .await
        .expect("11:00-12:00 touches but does not overlap");

    let contained = service::create_reservation(&app_state, booking(&tables, (12, 30), (12, 45))).await;
    assert!(matches!(contained, Err(ReservationError::Conflict { .. })));
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_tables_of_different_restaurants_are_rejected() {
    let app_state = setup_test_db().await;
    let (_, a) = create_test_restaurant(&app_state, &unique_name("Left"), &[2]).await;
    let (_, b) = create_test_restaurant(&app_state, &unique_name("Right"), &[2]).await;

    let result =
        service::create_reservation(&app_state, booking(&[a[0], b[0]], (18, 0), (20, 0))).await;
    assert!(matches!(result, Err(ReservationError::Validation(_))));

    let missing = Uuid::new_v4();
    let result =
        service::create_reservation(&app_state, booking(&[a[0], missing], (18, 0), (20, 0))).await;
    match result {
        Err(ReservationError::NotFound(what)) => assert!(what.contains(&missing.to_string())),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_confirmation_lifecycle() {
    let app_state = setup_test_db().await;
    let (_, tables) = create_test_restaurant(&app_state, &unique_name("Confirm"), &[4]).await;

    let created = service::create_reservation(&app_state, booking(&tables, (19, 0), (21, 0)))
        .await
        .expect("booking succeeds");
    let id = created.details.reservation.id;

    // Wrong token leaves the reservation untouched
    let wrong = service::confirm_reservation(&app_state, id, "not-the-token").await;
    assert!(matches!(wrong, Err(ReservationError::Unauthorized)));
    let unchanged = service::get_reservation(&app_state, id).await.unwrap();
    assert!(!unchanged.reservation.confirmed);

    let confirmed =
        service::confirm_reservation(&app_state, id, &created.confirmation_token)
            .await
            .expect("right token confirms");
    assert_eq!(confirmed.outcome, ConfirmOutcome::Confirmed);
    assert!(confirmed.details.reservation.confirmed);
    assert!(confirmed.details.reservation.confirmed_at.is_some());

    let again = service::confirm_reservation(&app_state, id, &created.confirmation_token)
        .await
        .expect("re-confirmation succeeds");
    assert_eq!(again.outcome, ConfirmOutcome::AlreadyConfirmed);
    assert_eq!(
        again.details.reservation.confirmed_at,
        confirmed.details.reservation.confirmed_at
    );

    // Wrong token stays unauthorized after confirmation too
    let wrong = service::confirm_reservation(&app_state, id, "still-wrong").await;
    assert!(matches!(wrong, Err(ReservationError::Unauthorized)));

    let missing = service::confirm_reservation(&app_state, Uuid::new_v4(), "x").await;
    assert!(matches!(missing, Err(ReservationError::NotFound(_))));
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_delete_frees_tables() {
    let app_state = setup_test_db().await;
    let (_, tables) = create_test_restaurant(&app_state, &unique_name("Delete"), &[4, 6]).await;

    let missing = service::delete_reservation(&app_state, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(ReservationError::NotFound(_))));

    let created = service::create_reservation(&app_state, booking(&tables, (12, 0), (14, 0)))
        .await
        .expect("booking succeeds");
    let id = created.details.reservation.id;

    let removed = service::delete_reservation(&app_state, id)
        .await
        .expect("delete succeeds");
    assert_eq!(removed.reservation.id, id);
    assert_eq!(
        removed.table_ids.iter().copied().collect::<BTreeSet<_>>(),
        tables.iter().copied().collect::<BTreeSet<_>>()
    );

    assert!(matches!(
        service::get_reservation(&app_state, id).await,
        Err(ReservationError::NotFound(_))
    ));

    service::create_reservation(&app_state, booking(&tables, (12, 0), (14, 0)))
        .await
        .expect("tables are free again");
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_calendar_artifact() {
    let app_state = setup_test_db().await;
    let name = unique_name("Calendar");
    let (_, tables) = create_test_restaurant(&app_state, &name, &[4]).await;

    let created = service::create_reservation(&app_state, booking(&tables, (19, 0), (21, 0)))
        .await
        .expect("booking succeeds");
    let id = created.details.reservation.id;

    let ics = service::calendar_artifact(&app_state, id).await.unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics.contains("DTSTART:20990714T190000Z\r\n"));
    assert!(ics.contains("DTEND:20990714T210000Z\r\n"));
    assert!(ics.contains(&id.to_string()));
    assert!(ics.contains("STATUS:TENTATIVE\r\n"));

    service::confirm_reservation(&app_state, id, &created.confirmation_token)
        .await
        .unwrap();
    let ics = service::calendar_artifact(&app_state, id).await.unwrap();
    assert!(ics.contains("STATUS:CONFIRMED\r\n"));

    let missing = service::calendar_artifact(&app_state, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(ReservationError::NotFound(_))));
}

#[tokio::test]
#[ignore = "needs PostgreSQL at TEST_DATABASE_URL"]
async fn test_concurrent_bookings_of_one_table() {
    let app_state = setup_test_db().await;
    let (restaurant_id, tables) =
        create_test_restaurant(&app_state, &unique_name("Race"), &[4]).await;

    let mut handles = Vec::new();
    for i in 0..6u32 {
        let app_state = app_state.clone();
        let tables = tables.clone();
        // Every request overlaps 12:00-13:00
        handles.push(tokio::spawn(async move {
            service::create_reservation(&app_state, booking(&tables, (12, i * 5), (13, i * 5)))
                .await
        }));
    }

    let mut succeeded = 0;
    let mut conflicted = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(ReservationError::Conflict { .. }) => conflicted += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(conflicted, 5);
    assert_eq!(reservations_of(&app_state, restaurant_id).await, 1);
}
