pub mod email_service;
pub mod reminder_service;
pub mod reservation_mail;

pub use email_service::{EmailConfig, EmailService};
pub use reminder_service::{spawn_reminder_service, ReminderConfig, ReminderService};
pub use reservation_mail::ReservationMailConfig;
