use std::collections::BTreeMap;

use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::types::{
    timeslots, BookedReservation, Restaurant, RestaurantFilterInput, RestaurantTable, Timeslot,
};
use crate::gql::common::{PaginatedResponse, PaginationInput, TimeRange};
use crate::gql::error::{parse_id, GqlError};
use crate::state::AppState;
use infra::repos::{opening_hours, reservations, restaurant_tables, restaurants};

#[derive(Default)]
pub struct RestaurantQuery;

#[Object]
impl RestaurantQuery {
    /// All restaurants ordered by name
    async fn restaurants(
        &self,
        ctx: &Context<'_>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Restaurant>> {
        let state = ctx.data::<AppState>()?;
        let page = pagination.unwrap_or_default().to_limit_offset();

        let (rows, total_count) = tokio::try_join!(
            restaurants::list(&state.db, Some(page)),
            restaurants::count(&state.db)
        )
        .map_err(|e| GqlError::from(e).extend())?;

        let items = rows.into_iter().map(Restaurant::from).collect();
        Ok(PaginatedResponse::new(items, total_count, page))
    }

    async fn restaurant(&self, ctx: &Context<'_>, id: ID) -> Result<Restaurant> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&id, "restaurant")?;

        restaurants::get_by_id(&state.db, restaurant_id)
            .await
            .map_err(|e| GqlError::from(e).extend())?
            .map(Restaurant::from)
            .ok_or_else(|| GqlError::not_found(format!("restaurant {restaurant_id}")).extend())
    }

    /// Filter restaurants; every criterion is optional
    async fn search_restaurants(
        &self,
        ctx: &Context<'_>,
        filter: Option<RestaurantFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Restaurant>> {
        let state = ctx.data::<AppState>()?;
        let filter = filter
            .unwrap_or_default()
            .into_filter()
            .map_err(|e| e.extend())?;
        let page = pagination.unwrap_or_default().to_limit_offset();

        let (rows, total_count) = tokio::try_join!(
            restaurants::search(&state.db, filter.clone(), Some(page)),
            restaurants::count_search(&state.db, filter)
        )
        .map_err(|e| GqlError::from(e).extend())?;

        let items = rows.into_iter().map(Restaurant::from).collect();
        Ok(PaginatedResponse::new(items, total_count, page))
    }

    async fn restaurant_tables(
        &self,
        ctx: &Context<'_>,
        restaurant_id: ID,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<RestaurantTable>> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&restaurant_id, "restaurant")?;
        let page = pagination.unwrap_or_default().to_limit_offset();

        let (rows, total_count) = tokio::try_join!(
            restaurant_tables::list_by_restaurant(&state.db, restaurant_id, Some(page)),
            restaurant_tables::count_by_restaurant(&state.db, restaurant_id)
        )
        .map_err(|e| GqlError::from(e).extend())?;

        let items = rows.into_iter().map(RestaurantTable::from).collect();
        Ok(PaginatedResponse::new(items, total_count, page))
    }

    /// Opening-hours timeslots lying within one UTC calendar day
    async fn restaurant_timeslots(
        &self,
        ctx: &Context<'_>,
        restaurant_id: ID,
        date: NaiveDate,
    ) -> Result<Vec<Timeslot>> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&restaurant_id, "restaurant")?;
        let (day_start, day_end) = utc_day(date);

        let rows = opening_hours::list_within(&state.db, restaurant_id, day_start, day_end)
            .await
            .map_err(|e| GqlError::from(e).extend())?;

        Ok(timeslots(rows))
    }

    /// Reservations of a restaurant lying within `[from, to]`
    async fn restaurant_reservations(
        &self,
        ctx: &Context<'_>,
        restaurant_id: ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<BookedReservation>> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&restaurant_id, "restaurant")?;
        if from > to {
            return Err(GqlError::validation("from must not be after to").extend());
        }
        let page = pagination.unwrap_or_default().to_limit_offset();

        let (rows, total_count) = tokio::try_join!(
            reservations::list_for_restaurant_within(&state.db, restaurant_id, from, to, Some(page)),
            reservations::count_for_restaurant_within(&state.db, restaurant_id, from, to)
        )
        .map_err(|e| GqlError::from(e).extend())?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let links = reservations::table_ids_for_many(&state.db, &ids)
            .await
            .map_err(|e| GqlError::from(e).extend())?;

        let mut tables_by_reservation: BTreeMap<Uuid, Vec<ID>> = BTreeMap::new();
        for link in links {
            tables_by_reservation
                .entry(link.reservation_id)
                .or_default()
                .push(link.table_id.into());
        }

        let items = rows
            .into_iter()
            .map(|r| BookedReservation {
                id: r.id.into(),
                time: TimeRange {
                    from: r.reservation_from,
                    to: r.reservation_to,
                },
                table_ids: tables_by_reservation.remove(&r.id).unwrap_or_default(),
                confirmed: r.confirmed,
            })
            .collect();

        Ok(PaginatedResponse::new(items, total_count, page))
    }
}

/// `[date 00:00, date+1 00:00)` in UTC.
fn utc_day(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
