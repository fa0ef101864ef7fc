use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("invalid reservation: {0}")]
    Validation(String),

    #[error("tables already booked for the requested time: {}", join_ids(.tables))]
    Conflict { tables: Vec<Uuid> },

    #[error("{0} not found")]
    NotFound(String),

    #[error("confirmation token does not match")]
    Unauthorized,

    #[error("database error")]
    Db(#[from] sqlx::Error),
}

impl ReservationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ReservationError::Validation(msg.into())
    }

    pub fn reservation_not_found(id: Uuid) -> Self {
        ReservationError::NotFound(format!("reservation {id}"))
    }

    /// Stable machine readable code, used in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            ReservationError::Validation(_) => "VALIDATION",
            ReservationError::Conflict { .. } => "CONFLICT",
            ReservationError::NotFound(_) => "NOT_FOUND",
            ReservationError::Unauthorized => "UNAUTHORIZED",
            ReservationError::Db(_) => "INTERNAL",
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
