use axum::{Extension, Json, extract::State};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::entities::booking::BookingStatus;
use crate::entities::profile::ProfileRole;
use crate::entities::{booking, notification, ride};
use crate::error::AppResult;
use crate::utils::jwt::Claims;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub role: ProfileRole,
    /// Rides offered by a driver, open rides visible to a passenger
    pub rides: u64,
    pub upcoming_bookings: u64,
    pub unread_notifications: u64,
}

/// Activity summary for the signed-in profile
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<DashboardResponse>> {
    let (rides, upcoming_bookings) = match claims.role {
        ProfileRole::Driver => {
            let ride_ids: Vec<Uuid> = ride::Entity::find()
                .filter(ride::Column::DriverId.eq(claims.sub))
                .all(&state.db)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect();

            let upcoming = booking::Entity::find()
                .filter(booking::Column::RideId.is_in(ride_ids.clone()))
                .filter(booking::Column::Status.eq(BookingStatus::Upcoming))
                .count(&state.db)
                .await?;

            (ride_ids.len() as u64, upcoming)
        }
        ProfileRole::Passenger => {
            let open_rides = ride::Entity::find()
                .filter(ride::Column::DateTime.gte(Utc::now()))
                .filter(ride::Column::AvailableSeats.gt(0))
                .count(&state.db)
                .await?;

            let upcoming = booking::Entity::find()
                .filter(booking::Column::PassengerId.eq(claims.sub))
                .filter(booking::Column::Status.eq(BookingStatus::Upcoming))
                .count(&state.db)
                .await?;

            (open_rides, upcoming)
        }
    };

    let unread = notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(claims.sub))
        .filter(notification::Column::Read.eq(false))
        .count(&state.db)
        .await?;

    Ok(Json(DashboardResponse {
        role: claims.role,
        rides,
        upcoming_bookings,
        unread_notifications: unread,
    }))
}
