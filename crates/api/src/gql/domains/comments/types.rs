use async_graphql::{InputObject, SimpleObject, ID};
use chrono::{DateTime, Utc};

use crate::gql::error::GqlError;
use infra::models::CommentRow;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(SimpleObject, Clone)]
pub struct Comment {
    pub id: ID,
    pub restaurant_id: ID,
    /// 1 to 5
    pub rating: i32,
    pub comment: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id.into(),
            restaurant_id: row.restaurant_id.into(),
            rating: row.rating,
            comment: row.comment,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(InputObject, Clone, Debug)]
pub struct CreateCommentInput {
    pub restaurant_id: ID,
    pub rating: i32,
    #[graphql(default)]
    pub comment: String,
    pub name: String,
}

impl CreateCommentInput {
    /// Checks the rating bounds and trims the author name and body.
    pub fn validate(&self) -> Result<(String, String), GqlError> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(GqlError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(GqlError::validation("name must not be empty"));
        }

        Ok((name.to_string(), self.comment.trim().to_string()))
    }
}
