use async_graphql::{Enum, InputObject, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::common::TimeRange;
use crate::gql::error::GqlError;
use crate::reservations::{events, NewReservation, ReservationDetails};

/// A reservation as seen by the customer holding it. The confirmation token
/// is never exposed.
#[derive(SimpleObject, Clone)]
pub struct Reservation {
    pub id: ID,
    pub table_ids: Vec<ID>,
    pub time: TimeRange,
    pub user_name: String,
    pub user_email: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationDetails> for Reservation {
    fn from(details: ReservationDetails) -> Self {
        let r = details.reservation;
        Self {
            id: r.id.into(),
            table_ids: details.table_ids.into_iter().map(ID::from).collect(),
            time: TimeRange {
                from: r.reservation_from,
                to: r.reservation_to,
            },
            user_name: r.user_name,
            user_email: r.user_email,
            confirmed: r.confirmed,
            created_at: r.created_at,
        }
    }
}

#[derive(InputObject, Clone, Debug)]
pub struct CreateReservationInput {
    pub table_ids: Vec<ID>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

impl CreateReservationInput {
    pub fn into_request(self) -> Result<NewReservation, GqlError> {
        let table_ids = self
            .table_ids
            .iter()
            .map(|id| Uuid::parse_str(id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewReservation {
            table_ids,
            from: self.from,
            to: self.to,
            user_name: self.user_name,
            user_email: self.user_email,
        })
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum ReservationEventKind {
    #[graphql(name = "CREATED")]
    Created,
    #[graphql(name = "CONFIRMED")]
    Confirmed,
    #[graphql(name = "DELETED")]
    Deleted,
}

impl From<events::ReservationEventKind> for ReservationEventKind {
    fn from(kind: events::ReservationEventKind) -> Self {
        match kind {
            events::ReservationEventKind::Created => Self::Created,
            events::ReservationEventKind::Confirmed => Self::Confirmed,
            events::ReservationEventKind::Deleted => Self::Deleted,
        }
    }
}

/// Change notification published on the owning restaurant's channel.
#[derive(SimpleObject, Clone, Debug)]
pub struct ReservationEvent {
    pub kind: ReservationEventKind,
    pub restaurant_id: ID,
    pub reservation_id: ID,
    pub time: TimeRange,
    pub table_ids: Vec<ID>,
    pub occurred_at: DateTime<Utc>,
}

impl From<events::ReservationEvent> for ReservationEvent {
    fn from(event: events::ReservationEvent) -> Self {
        Self {
            kind: event.kind.into(),
            restaurant_id: event.restaurant_id.into(),
            reservation_id: event.reservation_id.into(),
            time: TimeRange {
                from: event.from,
                to: event.to,
            },
            table_ids: event.table_ids.into_iter().map(ID::from).collect(),
            occurred_at: event.occurred_at,
        }
    }
}
