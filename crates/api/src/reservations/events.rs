//! Reservation change notifications, fanned out per restaurant.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use infra::models::ReservationRow;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReservationEventKind {
    Created,
    Confirmed,
    Deleted,
}

#[derive(Clone, Debug)]
pub struct ReservationEvent {
    pub kind: ReservationEventKind,
    pub restaurant_id: Uuid,
    pub reservation_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub table_ids: Vec<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl ReservationEvent {
    pub fn new(
        kind: ReservationEventKind,
        restaurant_id: Uuid,
        reservation: &ReservationRow,
        table_ids: &[Uuid],
    ) -> Self {
        Self {
            kind,
            restaurant_id,
            reservation_id: reservation.id,
            from: reservation.reservation_from,
            to: reservation.reservation_to,
            table_ids: table_ids.to_vec(),
            occurred_at: Utc::now(),
        }
    }
}

struct EventChannels {
    restaurants: HashMap<Uuid, broadcast::Sender<ReservationEvent>>,
}

impl EventChannels {
    fn new() -> Self {
        Self {
            restaurants: HashMap::new(),
        }
    }

    fn subscribe(&mut self, restaurant_id: Uuid) -> broadcast::Receiver<ReservationEvent> {
        self.restaurants
            .entry(restaurant_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish(&mut self, event: ReservationEvent) {
        let restaurant_id = event.restaurant_id;
        let Some(sender) = self.restaurants.get(&restaurant_id) else {
            return;
        };

        // A send only fails once every receiver is gone
        if sender.receiver_count() == 0 || sender.send(event).is_err() {
            self.restaurants.remove(&restaurant_id);
        }
    }

    #[cfg(test)]
    fn has_channel(&self, restaurant_id: Uuid) -> bool {
        self.restaurants.contains_key(&restaurant_id)
    }
}

static CHANNELS: Lazy<Arc<Mutex<EventChannels>>> =
    Lazy::new(|| Arc::new(Mutex::new(EventChannels::new())));

/// Receive every event of one restaurant published from now on.
pub fn subscribe(restaurant_id: Uuid) -> broadcast::Receiver<ReservationEvent> {
    CHANNELS.lock().subscribe(restaurant_id)
}

/// Deliver an event to the subscribers of its restaurant. Restaurants nobody
/// listens to get no channel, and a channel whose last subscriber left is
/// dropped.
pub fn publish(event: ReservationEvent) {
    CHANNELS.lock().publish(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn has_channel(restaurant_id: Uuid) -> bool {
        CHANNELS.lock().has_channel(restaurant_id)
    }

    fn row(id: u128) -> ReservationRow {
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        ReservationRow {
            id: Uuid::from_u128(id),
            reservation_from: from,
            reservation_to: from + chrono::Duration::hours(2),
            user_name: "Ana".to_string(),
            user_email: "ana@example.com".to_string(),
            confirmed: true,
            confirmation_token_hash: String::new(),
            confirmed_at: Some(from),
            reminder_sent_at: None,
            created_at: from,
            updated_at: from,
        }
    }

    #[test]
    fn event_carries_interval_and_tables() {
        let tables = [Uuid::from_u128(1), Uuid::from_u128(2)];
        let event = ReservationEvent::new(
            ReservationEventKind::Created,
            Uuid::from_u128(99),
            &row(10),
            &tables,
        );

        assert_eq!(event.reservation_id, Uuid::from_u128(10));
        assert_eq!(event.restaurant_id, Uuid::from_u128(99));
        assert_eq!(event.table_ids, tables.to_vec());
        assert_eq!(event.to - event.from, chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn events_reach_only_their_restaurant() {
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut receiver = subscribe(watched);

        publish(ReservationEvent::new(
            ReservationEventKind::Created,
            other,
            &row(1),
            &[],
        ));
        publish(ReservationEvent::new(
            ReservationEventKind::Confirmed,
            watched,
            &row(2),
            &[Uuid::from_u128(7)],
        ));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.kind, ReservationEventKind::Confirmed);
        assert_eq!(event.reservation_id, Uuid::from_u128(2));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_opens_no_channel() {
        let restaurant_id = Uuid::new_v4();

        publish(ReservationEvent::new(
            ReservationEventKind::Created,
            restaurant_id,
            &row(3),
            &[],
        ));

        assert!(!has_channel(restaurant_id));
    }

    #[test]
    fn channel_is_dropped_after_last_subscriber_leaves() {
        let restaurant_id = Uuid::new_v4();
        let receiver = subscribe(restaurant_id);
        assert!(has_channel(restaurant_id));

        drop(receiver);
        publish(ReservationEvent::new(
            ReservationEventKind::Deleted,
            restaurant_id,
            &row(4),
            &[],
        ));

        assert!(!has_channel(restaurant_id));
    }
}
