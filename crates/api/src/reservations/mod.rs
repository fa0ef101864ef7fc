//! Table reservations: availability checking, the confirmation lifecycle and
//! calendar export. `service` ties these to the database and to mail dispatch,
//! and announces changes through `events`.

pub mod availability;
pub mod calendar;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod service;

pub use availability::{is_overlapping, Conflicts};
pub use calendar::CalendarConfig;
pub use error::ReservationError;
pub use events::{ReservationEvent, ReservationEventKind};
pub use lifecycle::{ConfirmOutcome, NewReservation, ReservationState};
pub use service::{ConfirmedReservation, CreatedReservation, ReservationDetails};
