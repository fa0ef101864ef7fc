use async_graphql::MergedObject;

use crate::gql::domains::comments::CommentQuery;
use crate::gql::domains::reservations::ReservationQuery;
use crate::gql::domains::restaurants::RestaurantQuery;

#[derive(MergedObject, Default)]
pub struct QueryRoot(CommentQuery, ReservationQuery, RestaurantQuery);
