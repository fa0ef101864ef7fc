//! iCalendar (RFC 5545) export of a reservation as a single VEVENT.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use infra::models::{ReservationRow, RestaurantRow};

pub const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";
pub const FILE_NAME: &str = "reservation.ics";

const PRODID: &str = "-//Reservation Bear//Table Reservations//EN";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Right hand side of every event UID.
    pub uid_domain: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            uid_domain: "reservationbear.de".to_string(),
        }
    }
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        match std::env::var("CALENDAR_DOMAIN") {
            Ok(domain) if !domain.trim().is_empty() => Self {
                uid_domain: domain.trim().to_string(),
            },
            _ => Self::default(),
        }
    }

    pub fn event_uid(&self, reservation_id: Uuid) -> String {
        format!("{reservation_id}@{}", self.uid_domain)
    }
}

/// Render the calendar document for a reservation. Unconfirmed reservations
/// are exported as tentative events.
pub fn render_reservation(
    config: &CalendarConfig,
    reservation: &ReservationRow,
    restaurant: Option<&RestaurantRow>,
    table_ids: &[Uuid],
) -> String {
    let summary = match restaurant {
        Some(r) => format!("Table reservation at {}", r.name),
        None => "Table reservation".to_string(),
    };

    let tables = table_ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let description = format!(
        "Reservation {} for {}\nTables: {}",
        reservation.id, reservation.user_name, tables
    );

    let status = if reservation.confirmed {
        "CONFIRMED"
    } else {
        "TENTATIVE"
    };

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", config.event_uid(reservation.id)),
        format!("DTSTAMP:{}", format_utc(reservation.created_at)),
        format!("DTSTART:{}", format_utc(reservation.reservation_from)),
        format!("DTEND:{}", format_utc(reservation.reservation_to)),
        format!("SUMMARY:{}", escape_text(&summary)),
        format!("DESCRIPTION:{}", escape_text(&description)),
    ];

    if let Some(r) = restaurant {
        lines.push(format!("LOCATION:{}", escape_text(&r.name)));
        if let (Some(lat), Some(lon)) = (r.latitude, r.longitude) {
            lines.push(format!("GEO:{lat:.6};{lon:.6}"));
        }
        if let Some(website) = &r.website {
            lines.push(format!("URL:{website}"));
        }
    }

    lines.push(format!("STATUS:{status}"));
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Split a content line into chunks of at most 75 octets, never inside a
/// UTF-8 sequence. Continuation lines start with a single space.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    // the leading space counts against the limit on continuation lines
    let mut budget = MAX_LINE_OCTETS;

    for c in line.chars() {
        if current + c.len_utf8() > budget {
            out.push_str("\r\n ");
            current = 0;
            budget = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        current += c.len_utf8();
    }

    out
}
