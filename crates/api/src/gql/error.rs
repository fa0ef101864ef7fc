use async_graphql::ErrorExtensions;

use crate::reservations::ReservationError;

/// Unified error type for GraphQL resolvers.
///
/// async-graphql has a blanket `impl<T: Display + Send + Sync + 'static> From<T> for Error`,
/// so any type implementing `Display` auto-converts via `?`.
///
/// This enum gives us:
///   - `From<sqlx::Error>`: logs the DB detail, shows a sanitized message to clients
///   - `From<uuid::Error>`: shows "Invalid ID: …"
///   - `GqlError::validation` / `GqlError::not_found`: input problems, coded via `.extend()`
#[derive(Debug)]
pub enum GqlError {
    Sqlx(sqlx::Error),
    Uuid(uuid::Error),
    Validation(String),
    NotFound(String),
}

impl GqlError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GqlError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        GqlError::NotFound(what.into())
    }

    fn code(&self) -> &'static str {
        match self {
            GqlError::Sqlx(_) => "INTERNAL",
            GqlError::Uuid(_) | GqlError::Validation(_) => "VALIDATION",
            GqlError::NotFound(_) => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for GqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GqlError::Sqlx(e) => {
                // Log the real error server-side; return a generic message to clients
                tracing::error!("Database error: {e}");
                write!(f, "Internal database error")
            }
            GqlError::Uuid(e) => write!(f, "Invalid ID: {e}"),
            GqlError::Validation(msg) => write!(f, "{msg}"),
            GqlError::NotFound(what) => write!(f, "{what} not found"),
        }
    }
}

impl std::error::Error for GqlError {}

impl From<sqlx::Error> for GqlError {
    fn from(e: sqlx::Error) -> Self {
        GqlError::Sqlx(e)
    }
}

impl From<uuid::Error> for GqlError {
    fn from(e: uuid::Error) -> Self {
        GqlError::Uuid(e)
    }
}

impl ErrorExtensions for GqlError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

impl ErrorExtensions for ReservationError {
    fn extend(&self) -> async_graphql::Error {
        if let ReservationError::Db(e) = self {
            tracing::error!("Database error: {e}");
        }

        let mut error = async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.code()));

        if let ReservationError::Conflict { tables } = self {
            let tables: Vec<String> = tables.iter().map(|t| t.to_string()).collect();
            error = error.extend_with(|_, e| e.set("tables", tables.clone()));
        }

        error
    }
}

/// Parse a GraphQL `ID` into a `Uuid`, reporting a coded validation error.
pub fn parse_id(id: &async_graphql::ID, what: &str) -> async_graphql::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str())
        .map_err(|_| GqlError::validation(format!("Invalid {what} ID: {}", id.as_str())).extend())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn code_of(error: &async_graphql::Error) -> Option<Value> {
        let extensions = serde_json::to_value(error.extensions.as_ref()?).ok()?;
        extensions.get("code").cloned()
    }

    #[test]
    fn reservation_errors_carry_their_code() {
        let err = ReservationError::Unauthorized.extend();
        assert_eq!(code_of(&err), Some(json!("UNAUTHORIZED")));

        let err = ReservationError::Conflict {
            tables: vec![Uuid::from_u128(3)],
        }
        .extend();
        assert_eq!(code_of(&err), Some(json!("CONFLICT")));
        assert!(err.message.contains(&Uuid::from_u128(3).to_string()));
    }

    #[test]
    fn database_errors_are_sanitized() {
        let err = GqlError::from(sqlx::Error::PoolTimedOut).extend();
        assert_eq!(err.message, "Internal database error");
        assert_eq!(code_of(&err), Some(json!("INTERNAL")));
    }

    #[test]
    fn invalid_ids_are_validation_errors() {
        let err = parse_id(&async_graphql::ID::from("nope"), "restaurant").unwrap_err();
        assert_eq!(code_of(&err), Some(json!("VALIDATION")));
    }
}
