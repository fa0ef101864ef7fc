//! Reservation operations against the database, shared by the REST routes and
//! the GraphQL resolvers.

use tracing::{info, warn};
use uuid::Uuid;

use infra::models::ReservationRow;
use infra::repos::{reservations, restaurant_tables, restaurants, CreateReservation};

use super::availability::find_conflicting_reservations;
use super::calendar;
use super::error::ReservationError;
use super::events::{self, ReservationEvent, ReservationEventKind};
use super::lifecycle::{self, ConfirmOutcome, NewReservation, ReservationState};
use crate::services::email_service::spawn_email;
use crate::state::AppState;

/// A reservation together with the tables it holds.
#[derive(Debug, Clone)]
pub struct ReservationDetails {
    pub reservation: ReservationRow,
    pub table_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreatedReservation {
    pub details: ReservationDetails,
    pub restaurant_id: Uuid,
    /// Raw token; only its digest is persisted. Delivered to the customer by mail.
    pub confirmation_token: String,
}

#[derive(Debug, Clone)]
pub struct ConfirmedReservation {
    pub details: ReservationDetails,
    pub outcome: ConfirmOutcome,
}

/// Book `request.table_ids` for `[request.from, request.to)`.
///
/// The existence check, the conflict check and the insert share one
/// transaction that holds an advisory lock per table, so two overlapping
/// requests for the same table cannot both succeed.
pub async fn create_reservation(
    state: &AppState,
    request: NewReservation,
) -> Result<CreatedReservation, ReservationError> {
    let request = request.validate()?;
    let table_ids: Vec<Uuid> = request.table_ids.iter().copied().collect();

    let mut tx = state.db.begin().await?;

    let tables = restaurant_tables::get_by_ids(&mut *tx, &table_ids).await?;
    let restaurant_id = lifecycle::restaurant_of_tables(&request.table_ids, &tables)?;

    reservations::lock_tables(&mut *tx, &table_ids).await?;

    let conflicts =
        find_conflicting_reservations(&mut *tx, &request.table_ids, request.from, request.to)
            .await?;
    if !conflicts.is_empty() {
        info!(
            restaurant_id = %restaurant_id,
            tables = ?conflicts.tables(),
            blocking = ?conflicts.reservations(),
            "Reservation rejected, tables already booked"
        );
    }
    conflicts.into_result()?;

    let confirmation_token = lifecycle::generate_token();
    let reservation = reservations::create(
        &mut *tx,
        CreateReservation {
            reservation_from: request.from,
            reservation_to: request.to,
            user_name: request.user_name,
            user_email: request.user_email,
            confirmation_token_hash: lifecycle::hash_token(&confirmation_token),
        },
    )
    .await?;
    reservations::attach_tables(&mut *tx, reservation.id, &table_ids).await?;

    tx.commit().await?;

    info!(
        reservation_id = %reservation.id,
        restaurant_id = %restaurant_id,
        tables = table_ids.len(),
        "Reservation created"
    );

    spawn_email(
        state.email_service(),
        state
            .reservation_mail()
            .confirmation_request(&reservation, &confirmation_token),
    );
    events::publish(ReservationEvent::new(
        ReservationEventKind::Created,
        restaurant_id,
        &reservation,
        &table_ids,
    ));

    Ok(CreatedReservation {
        details: ReservationDetails {
            reservation,
            table_ids,
        },
        restaurant_id,
        confirmation_token,
    })
}

pub async fn get_reservation(
    state: &AppState,
    id: Uuid,
) -> Result<ReservationDetails, ReservationError> {
    let reservation = reservations::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ReservationError::reservation_not_found(id))?;
    let table_ids = reservations::table_ids(&state.db, id).await?;

    Ok(ReservationDetails {
        reservation,
        table_ids,
    })
}

/// Move a reservation to `Confirmed` when `token` matches. Confirming twice
/// with the right token succeeds without touching the row.
pub async fn confirm_reservation(
    state: &AppState,
    id: Uuid,
    token: &str,
) -> Result<ConfirmedReservation, ReservationError> {
    let mut tx = state.db.begin().await?;

    let row = reservations::get_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| ReservationError::reservation_not_found(id))?;

    let outcome =
        match lifecycle::confirm(ReservationState::of(&row), &row.confirmation_token_hash, token) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(reservation_id = %id, "Rejected confirmation with wrong token");
                return Err(e);
            }
        };

    let table_ids = reservations::table_ids(&mut *tx, id).await?;

    if outcome == ConfirmOutcome::AlreadyConfirmed {
        tx.commit().await?;
        return Ok(ConfirmedReservation {
            details: ReservationDetails {
                reservation: row,
                table_ids,
            },
            outcome,
        });
    }

    // the row lock taken above keeps this from racing another confirmation
    let reservation = reservations::mark_confirmed(&mut *tx, id)
        .await?
        .ok_or_else(|| ReservationError::reservation_not_found(id))?;
    let restaurant = restaurants::get_for_reservation(&mut *tx, id).await?;

    tx.commit().await?;

    info!(reservation_id = %id, "Reservation confirmed");

    let ics = calendar::render_reservation(
        state.calendar(),
        &reservation,
        restaurant.as_ref(),
        &table_ids,
    );
    spawn_email(
        state.email_service(),
        state
            .reservation_mail()
            .reservation_confirmed(&reservation, restaurant.as_ref(), ics),
    );
    if let Some(restaurant) = &restaurant {
        events::publish(ReservationEvent::new(
            ReservationEventKind::Confirmed,
            restaurant.id,
            &reservation,
            &table_ids,
        ));
    }

    Ok(ConfirmedReservation {
        details: ReservationDetails {
            reservation,
            table_ids,
        },
        outcome,
    })
}

/// Hard delete. Returns the removed reservation as it was before deletion.
pub async fn delete_reservation(
    state: &AppState,
    id: Uuid,
) -> Result<ReservationDetails, ReservationError> {
    let mut tx = state.db.begin().await?;

    let table_ids = reservations::table_ids(&mut *tx, id).await?;
    let restaurant = restaurants::get_for_reservation(&mut *tx, id).await?;
    let reservation = reservations::delete(&mut *tx, id)
        .await?
        .ok_or_else(|| ReservationError::reservation_not_found(id))?;

    tx.commit().await?;

    info!(reservation_id = %id, "Reservation deleted");

    if let Some(restaurant) = &restaurant {
        events::publish(ReservationEvent::new(
            ReservationEventKind::Deleted,
            restaurant.id,
            &reservation,
            &table_ids,
        ));
    }

    Ok(ReservationDetails {
        reservation,
        table_ids,
    })
}

/// The iCalendar document for a reservation.
pub async fn calendar_artifact(state: &AppState, id: Uuid) -> Result<String, ReservationError> {
    let details = get_reservation(state, id).await?;
    let restaurant = restaurants::get_for_reservation(&state.db, id).await?;

    Ok(calendar::render_reservation(
        state.calendar(),
        &details.reservation,
        restaurant.as_ref(),
        &details.table_ids,
    ))
}
