use sqlx::PgPool;
use tracing::info;

use crate::reservations::CalendarConfig;
use crate::services::email_service::{EmailConfig, EmailService};
use crate::services::reservation_mail::ReservationMailConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    email_service: Option<EmailService>,
    reservation_mail: ReservationMailConfig,
    calendar: CalendarConfig,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let email_service = EmailConfig::from_env().map(EmailService::new);
        if email_service.is_none() {
            info!("SCW_* variables not set, reservation mails will not be delivered");
        }

        Self::with_config(
            db,
            email_service,
            ReservationMailConfig::from_env(),
            CalendarConfig::from_env(),
        )
    }

    pub fn with_config(
        db: PgPool,
        email_service: Option<EmailService>,
        reservation_mail: ReservationMailConfig,
        calendar: CalendarConfig,
    ) -> Self {
        Self {
            db,
            email_service,
            reservation_mail,
            calendar,
        }
    }

    pub fn email_service(&self) -> Option<&EmailService> {
        self.email_service.as_ref()
    }

    pub fn reservation_mail(&self) -> &ReservationMailConfig {
        &self.reservation_mail
    }

    pub fn calendar(&self) -> &CalendarConfig {
        &self.calendar
    }
}
