use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::booking::BookingStatus;
use crate::entities::profile::ProfileRole;
use crate::entities::{booking, profile, ride};
use crate::error::{AppError, AppResult};
use crate::services::Actor;
use crate::utils::jwt::Claims;

/// Load the acting profile for a lifecycle operation
async fn load_actor(state: &AppState, claims: &Claims) -> AppResult<Actor> {
    let found = profile::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Profile no longer exists".to_string()))?;

    Ok(Actor::from(found))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub ride_id: Uuid,
}

/// Book a seat on a ride
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let actor = load_actor(&state, &claims).await?;
    let booked = state.lifecycle.create_booking(&actor, payload.ride_id).await?;
    Ok(Json(booked))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Move a booking to a new lifecycle status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<booking::Model>> {
    let actor = load_actor(&state, &claims).await?;
    let updated = state
        .lifecycle
        .transition(&actor, booking_id, payload.status)
        .await?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct RideSummary {
    pub id: Uuid,
    pub pickup_location: String,
    pub destination: String,
    pub date_time: DateTime<Utc>,
    pub price_per_seat: i32,
    pub car_model: String,
    pub number_plate: String,
}

#[derive(Debug, Serialize)]
pub struct PartyInfo {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BookingEntry {
    pub id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub ride: RideSummary,
    /// Driver for a passenger's bookings, passenger for a driver's
    pub other_party: PartyInfo,
}

#[derive(Debug, Default, Serialize)]
pub struct GroupedBookings {
    pub upcoming: Vec<BookingEntry>,
    pub going: Vec<BookingEntry>,
    pub finished: Vec<BookingEntry>,
    pub cancelled: Vec<BookingEntry>,
}

/// List the actor's bookings grouped by status. Passengers see their own
/// bookings with the driver as counterparty; drivers see bookings taken on
/// their rides with the passenger as counterparty.
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<GroupedBookings>> {
    let (bookings, rides) = match claims.role {
        ProfileRole::Passenger => {
            let bookings = booking::Entity::find()
                .filter(booking::Column::PassengerId.eq(claims.sub))
                .all(&state.db)
                .await?;
            let ride_ids: Vec<Uuid> = bookings.iter().map(|b| b.ride_id).collect();
            let rides = ride::Entity::find()
                .filter(ride::Column::Id.is_in(ride_ids))
                .all(&state.db)
                .await?;
            (bookings, rides)
        }
        ProfileRole::Driver => {
            let rides = ride::Entity::find()
                .filter(ride::Column::DriverId.eq(claims.sub))
                .all(&state.db)
                .await?;
            let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
            let bookings = booking::Entity::find()
                .filter(booking::Column::RideId.is_in(ride_ids))
                .all(&state.db)
                .await?;
            (bookings, rides)
        }
    };

    let party_ids: Vec<Uuid> = match claims.role {
        ProfileRole::Passenger => rides.iter().map(|r| r.driver_id).collect(),
        ProfileRole::Driver => bookings.iter().map(|b| b.passenger_id).collect(),
    };
    let parties = profile::Entity::find()
        .filter(profile::Column::Id.is_in(party_ids))
        .all(&state.db)
        .await?;

    let mut grouped = GroupedBookings::default();
    for b in bookings {
        let Some(r) = rides.iter().find(|r| r.id == b.ride_id) else {
            continue;
        };

        let party_id = match claims.role {
            ProfileRole::Passenger => r.driver_id,
            ProfileRole::Driver => b.passenger_id,
        };
        let Some(party) = parties.iter().find(|p| p.id == party_id) else {
            continue;
        };

        let entry = BookingEntry {
            id: b.id,
            status: b.status,
            created_at: b.created_at.with_timezone(&Utc),
            ride: RideSummary {
                id: r.id,
                pickup_location: r.pickup_location.clone(),
                destination: r.destination.clone(),
                date_time: r.date_time.with_timezone(&Utc),
                price_per_seat: r.price_per_seat,
                car_model: r.car_model.clone(),
                number_plate: r.number_plate.clone(),
            },
            other_party: PartyInfo {
                id: party.id,
                full_name: party.full_name.clone(),
                phone_number: party.phone_number.clone(),
                email: party.email.clone(),
            },
        };

        match b.status {
            BookingStatus::Upcoming => grouped.upcoming.push(entry),
            BookingStatus::Going => grouped.going.push(entry),
            BookingStatus::Finished => grouped.finished.push(entry),
            BookingStatus::Cancelled => grouped.cancelled.push(entry),
        }
    }

    Ok(Json(grouped))
}
