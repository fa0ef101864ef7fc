use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::reservations::{calendar, service, NewReservation, ReservationDetails};
use crate::state::AppState;

/// Half-open interval in unix seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(default)]
    pub tables: Vec<Uuid>,
    pub time: TimeRange,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: Uuid,
    pub tables: Vec<Uuid>,
    pub time: TimeRange,
    pub user_name: String,
    pub user_email: String,
    pub confirmed: bool,
}

impl From<ReservationDetails> for ReservationResponse {
    fn from(details: ReservationDetails) -> Self {
        let r = details.reservation;
        Self {
            id: r.id,
            tables: details.table_ids,
            time: TimeRange {
                from: r.reservation_from.timestamp(),
                to: r.reservation_to.timestamp(),
            },
            user_name: r.user_name,
            user_email: r.user_email,
            confirmed: r.confirmed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmParams {
    pub confirmation_token: String,
}

fn instant(secs: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::BadRequest(format!("timestamp out of range: {secs}")))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Json(body): Json<CreateReservationRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let request = NewReservation {
        table_ids: body.tables,
        from: instant(body.time.from)?,
        to: instant(body.time.to)?,
        user_name: body.user_name,
        user_email: body.user_email,
    };

    let created = service::create_reservation(&state, request).await?;
    Ok(Json(created.details.into()))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let details = service::get_reservation(&state, id).await?;
    Ok(Json(details.into()))
}

pub async fn confirm_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ReservationResponse>, AppError> {
    let confirmed = service::confirm_reservation(&state, id, &params.confirmation_token).await?;
    Ok(Json(confirmed.details.into()))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let removed = service::delete_reservation(&state, id).await?;
    Ok(Json(removed.into()))
}

pub async fn reservation_ics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ics = service::calendar_artifact(&state, id).await?;

    Ok((
        [
            (CONTENT_TYPE, calendar::CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", calendar::FILE_NAME),
            ),
        ],
        ics,
    ))
}
