//! Reservation state machine.
//!
//! ```text
//! Unconfirmed --confirm(token)--> Confirmed
//!      \                              /
//!       `-------- delete -----------> (gone)
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::RngExt;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use infra::models::{ReservationRow, RestaurantTableRow};

use super::error::ReservationError;

pub const TOKEN_LENGTH: usize = 32;

/// A booking request as received from a client.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub table_ids: Vec<Uuid>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

/// A booking request that passed input validation. Table ids are deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReservation {
    pub table_ids: BTreeSet<Uuid>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

impl NewReservation {
    pub fn validate(self) -> Result<ValidatedReservation, ReservationError> {
        if self.table_ids.is_empty() {
            return Err(ReservationError::validation(
                "a reservation needs at least one table",
            ));
        }

        if self.from >= self.to {
            return Err(ReservationError::validation(
                "reservation start must be before its end",
            ));
        }

        let user_name = self.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(ReservationError::validation("customer name is required"));
        }

        let user_email = self.user_email.trim().to_string();
        if !looks_like_email(&user_email) {
            return Err(ReservationError::validation(format!(
                "invalid customer email: {user_email}"
            )));
        }

        Ok(ValidatedReservation {
            table_ids: self.table_ids.into_iter().collect(),
            from: self.from,
            to: self.to,
            user_name,
            user_email,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Check that every requested table exists and that they all belong to a
/// single restaurant. Returns that restaurant's id.
pub fn restaurant_of_tables(
    requested: &BTreeSet<Uuid>,
    found: &[RestaurantTableRow],
) -> Result<Uuid, ReservationError> {
    let found_ids: BTreeSet<Uuid> = found.iter().map(|t| t.id).collect();
    let missing: Vec<String> = requested
        .difference(&found_ids)
        .map(Uuid::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(ReservationError::NotFound(format!(
            "table {}",
            missing.join(", ")
        )));
    }

    let restaurants: BTreeSet<Uuid> = found.iter().map(|t| t.restaurant_id).collect();
    let mut iter = restaurants.into_iter();
    match (iter.next(), iter.next()) {
        (Some(restaurant_id), None) => Ok(restaurant_id),
        (None, _) => Err(ReservationError::validation(
            "a reservation needs at least one table",
        )),
        (Some(_), Some(_)) => Err(ReservationError::validation(
            "all tables of a reservation must belong to the same restaurant",
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Unconfirmed,
    Confirmed,
}

impl ReservationState {
    pub fn of(row: &ReservationRow) -> Self {
        if row.confirmed {
            ReservationState::Confirmed
        } else {
            ReservationState::Unconfirmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The reservation moved from unconfirmed to confirmed.
    Confirmed,
    /// The token matched but the reservation was confirmed before; nothing changes.
    AlreadyConfirmed,
}

/// Decide the confirmation transition. A wrong token is rejected in every
/// state; a repeated confirmation with the right token is a no-op.
pub fn confirm(
    state: ReservationState,
    stored_token_hash: &str,
    presented_token: &str,
) -> Result<ConfirmOutcome, ReservationError> {
    if hash_token(presented_token) != stored_token_hash {
        return Err(ReservationError::Unauthorized);
    }

    Ok(match state {
        ReservationState::Unconfirmed => ConfirmOutcome::Confirmed,
        ReservationState::Confirmed => ConfirmOutcome::AlreadyConfirmed,
    })
}

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(tables: Vec<Uuid>) -> NewReservation {
        NewReservation {
            table_ids: tables,
            from: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap(),
            user_name: "Ada Lovelace".to_string(),
            user_email: "ada@example.com".to_string(),
        }
    }

    fn table(id: u128, restaurant: u128) -> RestaurantTableRow {
        RestaurantTableRow {
            id: Uuid::from_u128(id),
            restaurant_id: Uuid::from_u128(restaurant),
            seats: 4,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_table_set_is_rejected() {
        let err = request(vec![]).validate().unwrap_err();
        assert!(matches!(err, ReservationError::Validation(_)));
    }

    #[test]
    fn inverted_or_empty_interval_is_rejected() {
        let mut req = request(vec![Uuid::from_u128(1)]);
        req.to = req.from;
        assert!(matches!(
            req.validate(),
            Err(ReservationError::Validation(_))
        ));

        let mut req = request(vec![Uuid::from_u128(1)]);
        std::mem::swap(&mut req.from, &mut req.to);
        assert!(matches!(
            req.validate(),
            Err(ReservationError::Validation(_))
        ));
    }

    #[test]
    fn customer_fields_are_checked_and_trimmed() {
        let mut req = request(vec![Uuid::from_u128(1)]);
        req.user_email = "not-an-email".to_string();
        assert!(matches!(
            req.validate(),
            Err(ReservationError::Validation(_))
        ));

        let mut req = request(vec![Uuid::from_u128(1)]);
        req.user_name = "   ".to_string();
        assert!(matches!(
            req.validate(),
            Err(ReservationError::Validation(_))
        ));

        let mut req = request(vec![Uuid::from_u128(2), Uuid::from_u128(1), Uuid::from_u128(2)]);
        req.user_email = "  ada@example.com ".to_string();
        let valid = req.validate().unwrap();
        assert_eq!(valid.user_email, "ada@example.com");
        assert_eq!(
            valid.table_ids.into_iter().collect::<Vec<_>>(),
            vec![Uuid::from_u128(1), Uuid::from_u128(2)]
        );
    }

    #[test]
    fn tables_must_exist_and_share_a_restaurant() {
        let requested: BTreeSet<Uuid> = [1, 2].into_iter().map(Uuid::from_u128).collect();

        let restaurant =
            restaurant_of_tables(&requested, &[table(1, 100), table(2, 100)]).unwrap();
        assert_eq!(restaurant, Uuid::from_u128(100));

        let err = restaurant_of_tables(&requested, &[table(1, 100)]).unwrap_err();
        match err {
            ReservationError::NotFound(what) => {
                assert!(what.contains(&Uuid::from_u128(2).to_string()))
            }
            other => panic!("expected not found, got {other:?}"),
        }

        let err = restaurant_of_tables(&requested, &[table(1, 100), table(2, 200)]).unwrap_err();
        assert!(matches!(err, ReservationError::Validation(_)));
    }

    #[test]
    fn confirmation_requires_matching_token() {
        let token = generate_token();
        let hash = hash_token(&token);

        assert_eq!(
            confirm(ReservationState::Unconfirmed, &hash, &token).unwrap(),
            ConfirmOutcome::Confirmed
        );
        assert!(matches!(
            confirm(ReservationState::Unconfirmed, &hash, "wrong"),
            Err(ReservationError::Unauthorized)
        ));
    }

    #[test]
    fn reconfirmation_is_a_no_op_but_still_checks_the_token() {
        let token = generate_token();
        let hash = hash_token(&token);

        assert_eq!(
            confirm(ReservationState::Confirmed, &hash, &token).unwrap(),
            ConfirmOutcome::AlreadyConfirmed
        );
        assert!(matches!(
            confirm(ReservationState::Confirmed, &hash, ""),
            Err(ReservationError::Unauthorized)
        ));
    }

    #[test]
    fn tokens_are_random_alphanumeric() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
        assert_eq!(hash_token(&a).len(), 64);
    }
}
