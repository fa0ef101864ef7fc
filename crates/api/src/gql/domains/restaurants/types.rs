use async_graphql::dataloader::DataLoader;
use async_graphql::{
    ComplexObject, Context, ErrorExtensions, InputObject, Result, SimpleObject, ID,
};
use chrono::{DateTime, Utc};

use crate::gql::common::TimeRange;
use crate::gql::error::{parse_id, GqlError};
use crate::gql::loaders::{RestaurantImagesLoader, RestaurantLoader};
use crate::state::AppState;
use infra::models::{RestaurantImageRow, RestaurantRow, RestaurantTableRow, TimeslotRow};
use infra::repos::{opening_hours, RestaurantFilter};

#[derive(SimpleObject, Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Restaurant {
    pub id: ID,
    pub name: String,
    pub location: Option<Location>,
    /// 1 (cheap) to 3 (expensive)
    pub price_category: i32,
    pub average_rating: Option<f64>,
    pub website: Option<String>,
    pub floor_plan_url: Option<String>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Self {
            id: row.id.into(),
            name: row.name,
            location,
            price_category: row.price_category,
            average_rating: row.average_rating,
            website: row.website,
            floor_plan_url: row.floor_plan_url,
        }
    }
}

#[ComplexObject]
impl Restaurant {
    async fn images(&self, ctx: &Context<'_>) -> Result<Vec<RestaurantImage>> {
        let loader = ctx.data::<DataLoader<RestaurantImagesLoader>>()?;
        let restaurant_id = parse_id(&self.id, "restaurant")?;

        let rows = loader
            .load_one(restaurant_id)
            .await
            .map_err(loader_error)?
            .unwrap_or_default();

        Ok(rows.into_iter().map(RestaurantImage::from).collect())
    }

    async fn opening_hours(&self, ctx: &Context<'_>) -> Result<Vec<Timeslot>> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&self.id, "restaurant")?;

        let rows = opening_hours::list_by_restaurant(&state.db, restaurant_id)
            .await
            .map_err(|e| GqlError::from(e).extend())?;

        Ok(timeslots(rows))
    }
}

fn loader_error(e: std::sync::Arc<sqlx::Error>) -> async_graphql::Error {
    tracing::error!("DataLoader error: {e}");
    async_graphql::Error::new("Internal database error")
}

#[derive(SimpleObject, Clone)]
pub struct RestaurantImage {
    pub id: ID,
    pub url: String,
}

impl From<RestaurantImageRow> for RestaurantImage {
    fn from(row: RestaurantImageRow) -> Self {
        Self {
            id: row.id.into(),
            url: row.image_url,
        }
    }
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct RestaurantTable {
    pub id: ID,
    pub restaurant_id: ID,
    pub seats: i32,
}

impl From<RestaurantTableRow> for RestaurantTable {
    fn from(row: RestaurantTableRow) -> Self {
        Self {
            id: row.id.into(),
            restaurant_id: row.restaurant_id.into(),
            seats: row.seats,
        }
    }
}

#[ComplexObject]
impl RestaurantTable {
    async fn restaurant(&self, ctx: &Context<'_>) -> Result<Restaurant> {
        let loader = ctx.data::<DataLoader<RestaurantLoader>>()?;
        let restaurant_id = parse_id(&self.restaurant_id, "restaurant")?;

        match loader
            .load_one(restaurant_id)
            .await
            .map_err(loader_error)?
        {
            Some(row) => Ok(Restaurant::from(row)),
            None => Err(GqlError::not_found(format!("restaurant {restaurant_id}")).extend()),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Timeslot {
    pub id: ID,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl From<TimeslotRow> for Timeslot {
    fn from(row: TimeslotRow) -> Self {
        Self {
            id: row.id.into(),
            from: row.timeslot_from,
            to: row.timeslot_to,
        }
    }
}

/// `Timeslot::from` names the derived `from` field resolver, so conversions
/// go through `Into`.
pub fn timeslots(rows: Vec<TimeslotRow>) -> Vec<Timeslot> {
    rows.into_iter().map(Into::into).collect()
}

/// A reservation as seen by the restaurant listing: when and where, without
/// customer data.
#[derive(SimpleObject, Clone)]
pub struct BookedReservation {
    pub id: ID,
    pub time: TimeRange,
    pub table_ids: Vec<ID>,
    pub confirmed: bool,
}

#[derive(InputObject, Clone, Debug, Default)]
pub struct RestaurantFilterInput {
    /// Case-insensitive substring of the restaurant name
    pub query: Option<String>,
    pub price_category: Option<i32>,
    pub minimum_average_rating: Option<f64>,
    /// Some table must seat at least this many guests
    pub number_of_visitors: Option<i32>,
    /// Some table must be free during `[timeFrom, timeTo)`
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
}

impl RestaurantFilterInput {
    pub fn into_filter(self) -> std::result::Result<RestaurantFilter, GqlError> {
        if let Some(price) = self.price_category {
            if !(1..=3).contains(&price) {
                return Err(GqlError::validation("priceCategory must be between 1 and 3"));
            }
        }

        if let Some(visitors) = self.number_of_visitors {
            if visitors < 1 {
                return Err(GqlError::validation("numberOfVisitors must be positive"));
            }
        }

        match (self.time_from, self.time_to) {
            (Some(from), Some(to)) if from >= to => {
                return Err(GqlError::validation("timeFrom must be before timeTo"));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(GqlError::validation(
                    "timeFrom and timeTo must be given together",
                ));
            }
            _ => {}
        }

        if let Some(radius) = self.radius_km {
            if radius < 0.0 {
                return Err(GqlError::validation("radiusKm must not be negative"));
            }
            if self.latitude.is_none() || self.longitude.is_none() {
                return Err(GqlError::validation(
                    "radiusKm needs latitude and longitude",
                ));
            }
        }

        let query = self
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Ok(RestaurantFilter {
            query,
            price_category: self.price_category,
            minimum_average_rating: self.minimum_average_rating,
            number_of_visitors: self.number_of_visitors,
            time_from: self.time_from,
            time_to: self.time_to,
            latitude: self.latitude,
            longitude: self.longitude,
            radius_km: self.radius_km,
        })
    }
}
