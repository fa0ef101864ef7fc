use async_graphql::{InputObject, OutputType, SimpleObject};
use chrono::{DateTime, Utc};

use infra::pagination::{LimitOffset, DEFAULT_LIMIT};

use crate::gql::domains::comments::types::Comment;
use crate::gql::domains::restaurants::types::{BookedReservation, Restaurant, RestaurantTable};

#[derive(InputObject, Clone, Copy, Debug, Default)]
pub struct PaginationInput {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl PaginationInput {
    pub fn to_limit_offset(self) -> LimitOffset {
        LimitOffset::new(
            self.limit.map(i64::from).unwrap_or(DEFAULT_LIMIT),
            self.offset.map(i64::from).unwrap_or(0),
        )
    }
}

#[derive(SimpleObject)]
#[graphql(concrete(name = "PaginatedRestaurants", params(Restaurant)))]
#[graphql(concrete(name = "PaginatedRestaurantTables", params(RestaurantTable)))]
#[graphql(concrete(name = "PaginatedComments", params(Comment)))]
#[graphql(concrete(name = "PaginatedBookedReservations", params(BookedReservation)))]
pub struct PaginatedResponse<T: OutputType> {
    pub items: Vec<T>,
    pub total_count: i32,
    pub page_size: i32,
    pub offset: i32,
    pub has_next_page: bool,
}

impl<T: OutputType> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: LimitOffset) -> Self {
        let page_size = items.len() as i32;
        let offset = page.offset as i32;
        let total_count = total_count as i32;

        Self {
            items,
            total_count,
            page_size,
            offset,
            has_next_page: (offset + page_size) < total_count,
        }
    }
}

/// Half-open interval `[from, to)`.
#[derive(SimpleObject, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
