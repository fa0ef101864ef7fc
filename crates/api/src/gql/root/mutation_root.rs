use async_graphql::MergedObject;

use crate::gql::domains::comments::CommentMutation;
use crate::gql::domains::reservations::ReservationMutation;

#[derive(MergedObject, Default)]
pub struct MutationRoot(CommentMutation, ReservationMutation);
