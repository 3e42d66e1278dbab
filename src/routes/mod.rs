use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::AppState;
use crate::handlers::{auth, bookings, dashboard, driver, notifications, rides};
use crate::middleware::auth::{auth_middleware, require_driver};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{RateLimitedRole, create_role_governor};

pub fn create_router(state: AppState) -> Router {
    // Role-specific governors key on the authenticated profile id
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    // Booking routes serve both roles, so they get the roomier quota
    let booking_governor = create_role_governor(RateLimitedRole::Either);
    // IP-based governor for routes reachable without a token
    let public_governor = create_public_governor();

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Ride search is open to anonymous visitors
    let public_routes = Router::new()
        .route("/rides", get(rides::list_rides))
        .route("/rides/{id}", get(rides::get_ride))
        .layer(public_governor);

    // Driver routes (requires auth + driver role)
    let driver_routes = Router::new()
        .route("/rides", post(driver::offer_ride))
        .route("/rides", get(driver::my_rides))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Booking creation is passenger-only (enforced by the lifecycle
    // service); listing and status transitions are open to either party
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/", get(bookings::my_bookings))
        .route("/{id}/status", put(bookings::update_status))
        .layer(booking_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let account_routes = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/dashboard", get(dashboard::summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes.merge(account_routes))
        .nest("/api/driver", driver_routes)
        .nest("/api/bookings", booking_routes)
        .with_state(state)
}
