use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use super::types::{CreateReservationInput, Reservation};
use crate::gql::error::parse_id;
use crate::reservations::service;
use crate::state::AppState;

#[derive(Default)]
pub struct ReservationQuery;

#[Object]
impl ReservationQuery {
    async fn reservation(&self, ctx: &Context<'_>, id: ID) -> Result<Reservation> {
        let state = ctx.data::<AppState>()?;
        let reservation_id = parse_id(&id, "reservation")?;

        let details = service::get_reservation(state, reservation_id)
            .await
            .map_err(|e| e.extend())?;

        Ok(details.into())
    }
}

#[derive(Default)]
pub struct ReservationMutation;

#[Object]
impl ReservationMutation {
    /// Book tables for `[from, to)`. The confirmation link is mailed to `userEmail`.
    async fn create_reservation(
        &self,
        ctx: &Context<'_>,
        input: CreateReservationInput,
    ) -> Result<Reservation> {
        let state = ctx.data::<AppState>()?;
        let request = input.into_request().map_err(|e| e.extend())?;

        let created = service::create_reservation(state, request)
            .await
            .map_err(|e| e.extend())?;

        Ok(created.details.into())
    }

    async fn confirm_reservation(
        &self,
        ctx: &Context<'_>,
        id: ID,
        confirmation_token: String,
    ) -> Result<Reservation> {
        let state = ctx.data::<AppState>()?;
        let reservation_id = parse_id(&id, "reservation")?;

        let confirmed = service::confirm_reservation(state, reservation_id, &confirmation_token)
            .await
            .map_err(|e| e.extend())?;

        Ok(confirmed.details.into())
    }

    /// Returns the reservation as it was before deletion
    async fn delete_reservation(&self, ctx: &Context<'_>, id: ID) -> Result<Reservation> {
        let state = ctx.data::<AppState>()?;
        let reservation_id = parse_id(&id, "reservation")?;

        let removed = service::delete_reservation(state, reservation_id)
            .await
            .map_err(|e| e.extend())?;

        Ok(removed.into())
    }
}
