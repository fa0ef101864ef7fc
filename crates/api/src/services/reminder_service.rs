use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::time::{interval, Interval};
use tracing::{error, info, warn};

use crate::reservations::calendar;
use crate::services::email_service::OutgoingEmail;
use crate::AppState;
use infra::models::ReservationRow;
use infra::repos::{reservations, restaurants};

const DEFAULT_LEAD_HOURS: i64 = 24;
const DEFAULT_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    pub enabled: bool,
    /// How far before the start of a reservation the reminder goes out.
    pub lead_time: ChronoDuration,
    pub check_interval: Duration,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_time: ChronoDuration::hours(DEFAULT_LEAD_HOURS),
            check_interval: Duration::from_secs(DEFAULT_INTERVAL_SECONDS),
        }
    }
}

impl ReminderConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("REMINDERS_ENABLED").ok().as_deref(),
            std::env::var("REMINDER_LEAD_HOURS").ok().as_deref(),
            std::env::var("REMINDER_INTERVAL_SECONDS").ok().as_deref(),
        )
    }

    fn from_vars(enabled: Option<&str>, lead_hours: Option<&str>, interval: Option<&str>) -> Self {
        let enabled = enabled
            .map(|v| !matches!(v.trim(), "false" | "0" | "no"))
            .unwrap_or(true);
        let lead_hours = lead_hours
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_LEAD_HOURS);
        let interval_seconds = interval
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECONDS);

        Self {
            enabled,
            lead_time: ChronoDuration::hours(lead_hours),
            check_interval: Duration::from_secs(interval_seconds),
        }
    }
}

pub struct ReminderService {
    state: AppState,
    config: ReminderConfig,
    interval: Interval,
}

impl ReminderService {
    pub fn new(state: AppState, config: ReminderConfig) -> Self {
        let interval = interval(config.check_interval);

        Self {
            state,
            config,
            interval,
        }
    }

    /// Start the background reminder loop
    pub async fn run(&mut self) {
        info!(
            "Starting reminder service (lead time {}h)",
            self.config.lead_time.num_hours()
        );

        loop {
            self.interval.tick().await;

            match self.send_due_reminders().await {
                Ok(0) => {}
                Ok(sent) => info!("Sent {} reservation reminders", sent),
                Err(e) => error!("Error checking upcoming reservations: {}", e),
            }
        }
    }

    /// Remind every confirmed reservation that starts within the lead time.
    /// A reservation is only marked once its mail went out, so a failed
    /// delivery is retried on the next tick.
    pub async fn send_due_reminders(&self) -> Result<usize, sqlx::Error> {
        let Some(email_service) = self.state.email_service() else {
            return Ok(0);
        };

        let until = Utc::now() + self.config.lead_time;
        let due = reservations::list_due_for_reminder(&self.state.db, until).await?;

        let mut sent = 0;
        for reservation in due {
            let email = self.render_reminder(&reservation).await?;

            if let Err(e) = email_service.send(&email).await {
                warn!(
                    reservation_id = %reservation.id,
                    "Failed to send reminder: {}", e
                );
                continue;
            }

            if reservations::mark_reminder_sent(&self.state.db, reservation.id).await? {
                sent += 1;
            }
        }

        Ok(sent)
    }

    async fn render_reminder(
        &self,
        reservation: &ReservationRow,
    ) -> Result<OutgoingEmail, sqlx::Error> {
        let restaurant = restaurants::get_for_reservation(&self.state.db, reservation.id).await?;
        let table_ids = reservations::table_ids(&self.state.db, reservation.id).await?;
        let ics = calendar::render_reservation(
            self.state.calendar(),
            reservation,
            restaurant.as_ref(),
            &table_ids,
        );

        Ok(self
            .state
            .reservation_mail()
            .reservation_reminder(reservation, restaurant.as_ref(), ics))
    }
}

/// Spawn the reminder service as a background task
pub fn spawn_reminder_service(
    state: AppState,
    config: ReminderConfig,
) -> Option<tokio::task::JoinHandle<()>> {
    if !config.enabled {
        info!("Reminder service disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut service = ReminderService::new(state, config);
        service.run().await;
    }))
}
