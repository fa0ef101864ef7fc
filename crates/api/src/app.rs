use std::sync::Arc;
use std::time::Duration;

use async_graphql::{ObjectType, Schema, SubscriptionType};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    http::{
        header::{HeaderValue, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::Response,
    routing::{get, post},
    Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::routes::reservations;
use crate::state::AppState;

/// Build the Axum router with health endpoint, the reservation REST routes and GraphQL.
pub fn build_router<Q, M, S>(state: AppState, schema: Schema<Q, M, S>) -> Router
where
    Q: ObjectType + Send + Sync + 'static,
    M: ObjectType + Send + Sync + 'static,
    S: SubscriptionType + Send + Sync + 'static,
{
    // Rate limiting: about 10 bookings per minute per client IP
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(6)
        .burst_size(10)
        .finish()
        .expect("rate limiter config is non-zero");

    let rate_limited_routes = Router::new()
        .route("/reservation", post(reservations::create_reservation))
        .layer(GovernorLayer::new(Arc::new(governor_conf)));

    let api_routes = Router::new()
        .route(
            "/reservation/{id}",
            get(reservations::get_reservation)
                .patch(reservations::confirm_reservation)
                .delete(reservations::delete_reservation),
        )
        .route("/reservation/{id}/ics", get(reservations::reservation_ics))
        .merge(rate_limited_routes);

    Router::new()
        // Simple liveness check; also proves DB connectivity.
        .route("/health", get(health))
        .nest("/api", api_routes)
        .route(
            "/graphql",
            post({
                let schema_clone = schema.clone();
                move |req| graphql_handler(req, schema_clone)
            })
            .get({
                let schema_clone = schema.clone();
                move |protocol, upgrade| graphql_ws_handler(protocol, upgrade, schema_clone)
            }),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer({
            let allowed_origins = std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string());

            let origins: Vec<HeaderValue> = allowed_origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE])
        })
}

async fn graphql_handler<Q, M, S>(req: GraphQLRequest, schema: Schema<Q, M, S>) -> GraphQLResponse
where
    Q: ObjectType + Send + Sync + 'static,
    M: ObjectType + Send + Sync + 'static,
    S: SubscriptionType + Send + Sync + 'static,
{
    // AppState is already part of the schema data
    schema.execute(req.into_inner()).await.into()
}

/// WebSocket handler for GraphQL subscriptions.
async fn graphql_ws_handler<Q, M, S>(
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
    schema: Schema<Q, M, S>,
) -> Response
where
    Q: ObjectType + Send + Sync + 'static,
    M: ObjectType + Send + Sync + 'static,
    S: SubscriptionType + Send + Sync + 'static,
{
    upgrade
        .protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |stream| GraphQLWebSocket::new(stream, schema, protocol).serve())
}

/// Liveness check that also round-trips to the database.
async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&state.db).await?;
    Ok("ok")
}
