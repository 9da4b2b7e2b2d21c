use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{
    ServerError, admin, bookings, expeditions, media, payments, reviews, trails, users,
};
use engine::{Engine, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// The authenticated caller. Rejects with 401 on routes reached without
/// credentials.
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ServerError::Unauthenticated)
    }
}

/// Resolves Basic credentials into a [`User`] extension.
///
/// Requests without an `Authorization` header pass through anonymously so the
/// public catalog stays reachable; wrong credentials are always a 401.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Ok(next.run(request).await);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(ServerError::Unauthenticated);
    }

    let user = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await?
        .ok_or(ServerError::Unauthenticated)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/signup", post(users::signup))
        .route("/me", get(users::me))
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get).patch(users::update))
        .route("/users/{id}/cadastur", post(users::verify_cadastur))
        .route("/trails", get(trails::list).post(trails::create))
        .route("/trails/states", get(trails::states))
        .route(
            "/trails/{id}",
            get(trails::get).patch(trails::update).delete(trails::delete),
        )
        .route("/trails/{id}/expeditions", get(expeditions::list_for_trail))
        .route("/expeditions", get(expeditions::list).post(expeditions::create))
        .route(
            "/expeditions/{id}",
            get(expeditions::get).patch(expeditions::update),
        )
        .route(
            "/expeditions/{id}/availability",
            get(expeditions::availability),
        )
        .route("/bookings", get(bookings::list).post(bookings::reserve))
        .route(
            "/bookings/{id}",
            get(bookings::get)
                .patch(bookings::update)
                .delete(bookings::delete),
        )
        .route("/bookings/{id}/cancel", post(bookings::cancel))
        .route("/bookings/{id}/refund-quote", get(bookings::refund_quote))
        .route("/bookings/{id}/commission", get(bookings::commission))
        .route(
            "/bookings/{id}/payment",
            get(payments::get).post(payments::capture),
        )
        .route("/bookings/{id}/payment/refund", post(payments::refund))
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route("/media", get(media::list).post(media::create))
        .route("/media/{id}", axum::routing::delete(media::delete))
        .route("/admin/audit-logs", get(admin::audit_log))
        .route("/admin/metrics", get(admin::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
