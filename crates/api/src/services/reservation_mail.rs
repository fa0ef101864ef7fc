//! Customer facing reservation mails. Rendering only; delivery is
//! [`spawn_email`](super::email_service::spawn_email)'s job.

use chrono::{DateTime, Utc};
use html_escape::encode_text;
use rand::seq::IndexedRandom;
use url::Url;
use uuid::Uuid;

use infra::models::{ReservationRow, RestaurantRow};

use super::email_service::{
    cta_button, highlight, muted_paragraph, paragraph, wrap_in_layout, Attachment, OutgoingEmail,
};
use crate::reservations::calendar;

pub const DEFAULT_ICONS: [&str; 14] = [
    "🍚", "🥗", "🍕", "🍔", "🍝", "🍰", "🧇", "🌮", "🥙", "🍣", "🥗", "🍺", "🍹", "🍷",
];

const FALLBACK_ICON: &str = "🍽";
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ReservationMailConfig {
    /// `host:port` of the frontend serving the reservation details page.
    link_authority: String,
    icons: Vec<String>,
}

impl ReservationMailConfig {
    pub fn new(frontend_base_url: &str, icons: Vec<String>) -> Self {
        Self {
            link_authority: link_authority(frontend_base_url),
            icons,
        }
    }

    pub fn from_env() -> Self {
        let base = std::env::var("FRONTEND_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_BASE_URL.to_string());

        let icons = match std::env::var("RESERVATION_MAIL_ICONS") {
            Ok(raw) => parse_icons(&raw),
            Err(_) => Vec::new(),
        };

        if icons.is_empty() {
            Self::new(&base, DEFAULT_ICONS.iter().map(|s| s.to_string()).collect())
        } else {
            Self::new(&base, icons)
        }
    }

    pub fn pick_icon(&self) -> &str {
        self.icons
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_ICON)
    }

    pub fn details_link(&self, reservation_id: Uuid, confirmation_token: &str) -> String {
        format!(
            "{}/reservation-details/{}?confirmationToken={}",
            self.link_authority, reservation_id, confirmation_token
        )
    }

    /// Sent right after creation; carries the link that confirms the booking.
    pub fn confirmation_request(
        &self,
        reservation: &ReservationRow,
        confirmation_token: &str,
    ) -> OutgoingEmail {
        let name = first_name(&reservation.user_name);
        let link = self.details_link(reservation.id, confirmation_token);
        let icon = self.pick_icon();
        let safe_name = encode_text(name);
        let safe_link = encode_text(&link);
        let when = format_interval(reservation.reservation_from, reservation.reservation_to);

        let body_html = format!(
            "{}{}{}{}",
            paragraph(&format!("Hi {safe_name},")),
            paragraph(&format!(
                "Thank you for booking through our service. Your table is held for {}. \
                 Please confirm the reservation with the button below:",
                highlight(&encode_text(&when))
            )),
            cta_button(&safe_link, "Confirm reservation"),
            muted_paragraph(
                "If you did not request this reservation you can ignore this email; \
                 unconfirmed reservations are not final.",
            ),
        );

        OutgoingEmail {
            to_email: reservation.user_email.clone(),
            to_name: reservation.user_name.clone(),
            subject: format!(
                "{icon} Confirmation of your reservation ({})",
                reservation.id
            ),
            html: wrap_in_layout("Reservation confirmation", icon, &body_html),
            text: format!(
                "Hi {name},\n\nThank you for booking through our service. \
                 Your table is held for {when}.\n\nConfirm your reservation: {link}\n\n-- Reservation Bear"
            ),
            attachment: None,
        }
    }

    pub fn reservation_confirmed(
        &self,
        reservation: &ReservationRow,
        restaurant: Option<&RestaurantRow>,
        ics: String,
    ) -> OutgoingEmail {
        let name = first_name(&reservation.user_name);
        let icon = self.pick_icon();
        let place = restaurant.map(|r| r.name.as_str()).unwrap_or("the restaurant");
        let when = format_interval(reservation.reservation_from, reservation.reservation_to);

        let body_html = format!(
            "{}{}{}",
            paragraph(&format!("Hi {},", encode_text(name))),
            paragraph(&format!(
                "Your reservation at {} for {} is confirmed.",
                highlight(&encode_text(place)),
                encode_text(&when)
            )),
            muted_paragraph("The attached calendar file adds the reservation to your calendar."),
        );

        OutgoingEmail {
            to_email: reservation.user_email.clone(),
            to_name: reservation.user_name.clone(),
            subject: format!("{icon} Your reservation is confirmed ({})", reservation.id),
            html: wrap_in_layout("Reservation confirmed", icon, &body_html),
            text: format!(
                "Hi {name},\n\nYour reservation at {place} for {when} is confirmed.\n\n-- Reservation Bear"
            ),
            attachment: Some(calendar_attachment(ics)),
        }
    }

    pub fn reservation_reminder(
        &self,
        reservation: &ReservationRow,
        restaurant: Option<&RestaurantRow>,
        ics: String,
    ) -> OutgoingEmail {
        let name = first_name(&reservation.user_name);
        let icon = self.pick_icon();
        let place = restaurant.map(|r| r.name.as_str()).unwrap_or("the restaurant");
        let when = format_interval(reservation.reservation_from, reservation.reservation_to);

        let body_html = format!(
            "{}{}{}",
            paragraph(&format!("Hi {},", encode_text(name))),
            paragraph(&format!(
                "A friendly reminder of your upcoming reservation at {} for {}.",
                highlight(&encode_text(place)),
                encode_text(&when)
            )),
            paragraph("We look forward to seeing you."),
        );

        OutgoingEmail {
            to_email: reservation.user_email.clone(),
            to_name: reservation.user_name.clone(),
            subject: format!("{icon} Reminder: your reservation ({})", reservation.id),
            html: wrap_in_layout("See you soon", icon, &body_html),
            text: format!(
                "Hi {name},\n\nA friendly reminder of your upcoming reservation at {place} for {when}.\n\n-- Reservation Bear"
            ),
            attachment: Some(calendar_attachment(ics)),
        }
    }
}

/// The part of a full name before the first space.
pub fn first_name(full_name: &str) -> &str {
    full_name.split(' ').next().unwrap_or(full_name)
}

fn link_authority(frontend_base_url: &str) -> String {
    match Url::parse(frontend_base_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("localhost");
            match url.port_or_known_default() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
        Err(_) => frontend_base_url.trim_end_matches('/').to_string(),
    }
}

fn parse_icons(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn format_interval(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    if from.date_naive() == to.date_naive() {
        format!(
            "{} to {} UTC",
            from.format("%A, %d %B %Y %H:%M"),
            to.format("%H:%M")
        )
    } else {
        format!(
            "{} to {} UTC",
            from.format("%A, %d %B %Y %H:%M"),
            to.format("%A, %d %B %Y %H:%M")
        )
    }
}

fn calendar_attachment(ics: String) -> Attachment {
    Attachment {
        name: calendar::FILE_NAME.to_string(),
        content_type: "text/calendar".to_string(),
        content: ics.into_bytes(),
    }
}
