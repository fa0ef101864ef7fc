use async_graphql::{Result, Subscription, ID};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::gql::domains::reservations::types::ReservationEvent;
use crate::gql::error::parse_id;
use crate::reservations::events;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Reservations created, confirmed or deleted at one restaurant
    async fn restaurant_reservation_events(
        &self,
        restaurant_id: ID,
    ) -> Result<impl Stream<Item = Result<ReservationEvent, BroadcastStreamRecvError>>> {
        let restaurant_uuid = parse_id(&restaurant_id, "restaurant")?;
        let receiver = events::subscribe(restaurant_uuid);

        Ok(BroadcastStream::new(receiver).map(|event| event.map(ReservationEvent::from)))
    }
}
