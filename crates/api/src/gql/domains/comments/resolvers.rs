use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use super::types::{Comment, CreateCommentInput};
use crate::gql::common::{PaginatedResponse, PaginationInput};
use crate::gql::error::{parse_id, GqlError};
use crate::state::AppState;
use infra::repos::{comments, restaurants, CreateComment};

#[derive(Default)]
pub struct CommentQuery;

#[Object]
impl CommentQuery {
    /// Comments of a restaurant, newest first
    async fn restaurant_comments(
        &self,
        ctx: &Context<'_>,
        restaurant_id: ID,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Comment>> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&restaurant_id, "restaurant")?;
        let page = pagination.unwrap_or_default().to_limit_offset();

        let (rows, total_count) = tokio::try_join!(
            comments::list_by_restaurant(&state.db, restaurant_id, Some(page)),
            comments::count_by_restaurant(&state.db, restaurant_id)
        )
        .map_err(|e| GqlError::from(e).extend())?;

        let items = rows.into_iter().map(Comment::from).collect();
        Ok(PaginatedResponse::new(items, total_count, page))
    }
}

#[derive(Default)]
pub struct CommentMutation;

#[Object]
impl CommentMutation {
    /// Add a comment and recompute the restaurant's average rating
    async fn create_comment(&self, ctx: &Context<'_>, input: CreateCommentInput) -> Result<Comment> {
        let state = ctx.data::<AppState>()?;
        let restaurant_id = parse_id(&input.restaurant_id, "restaurant")?;
        let (name, comment) = input.validate().map_err(|e| e.extend())?;

        let mut tx = state
            .db
            .begin()
            .await
            .map_err(|e| GqlError::from(e).extend())?;

        if restaurants::get_by_id(&mut *tx, restaurant_id)
            .await
            .map_err(|e| GqlError::from(e).extend())?
            .is_none()
        {
            return Err(GqlError::not_found(format!("restaurant {restaurant_id}")).extend());
        }

        let row = comments::create(
            &mut *tx,
            CreateComment {
                restaurant_id,
                rating: input.rating,
                comment,
                name,
            },
        )
        .await
        .map_err(|e| GqlError::from(e).extend())?;

        let average_rating = restaurants::refresh_average_rating(&mut *tx, restaurant_id)
            .await
            .map_err(|e| GqlError::from(e).extend())?;

        tx.commit().await.map_err(|e| GqlError::from(e).extend())?;

        tracing::info!(
            comment_id = %row.id,
            restaurant_id = %restaurant_id,
            average_rating = ?average_rating,
            "Comment created"
        );

        Ok(Comment::from(row))
    }
}
