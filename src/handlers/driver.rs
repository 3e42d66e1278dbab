use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::booking::BookingStatus;
use crate::entities::{booking, ride};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::utils::validate::{is_in_future, is_valid_number_plate};

#[derive(Debug, Deserialize)]
pub struct OfferRideRequest {
    pub pickup_location: String,
    pub destination: String,
    pub date_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price_per_seat: i32,
    pub car_model: String,
    pub number_plate: String,
}

/// Publish a new ride offer
pub async fn offer_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<OfferRideRequest>,
) -> AppResult<Json<ride::Model>> {
    if payload.pickup_location.trim().is_empty()
        || payload.destination.trim().is_empty()
        || payload.car_model.trim().is_empty()
        || payload.number_plate.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "Please fill in all fields".to_string(),
        ));
    }

    let number_plate = payload.number_plate.to_uppercase();
    if !is_valid_number_plate(&number_plate) {
        return Err(AppError::BadRequest(
            "Invalid number plate format. Example: DL01AB1234".to_string(),
        ));
    }

    if !is_in_future(payload.date_time) {
        return Err(AppError::BadRequest(
            "Ride date and time must be in the future".to_string(),
        ));
    }

    if payload.available_seats < 1 {
        return Err(AppError::BadRequest(
            "A ride must offer at least 1 seat".to_string(),
        ));
    }

    if payload.price_per_seat < 0 {
        return Err(AppError::BadRequest(
            "Price per seat cannot be negative".to_string(),
        ));
    }

    let new_ride = ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(claims.sub),
        pickup_location: Set(payload.pickup_location.clone()),
        destination: Set(payload.destination.clone()),
        date_time: Set(payload.date_time.into()),
        available_seats: Set(payload.available_seats),
        price_per_seat: Set(payload.price_per_seat),
        car_model: Set(payload.car_model.clone()),
        number_plate: Set(number_plate),
        ..Default::default()
    };

    let created = new_ride.insert(&state.db).await?;

    tracing::info!(ride_id = %created.id, driver_id = %claims.sub, "ride offered");

    Ok(Json(created))
}

#[derive(Debug, Serialize)]
pub struct DriverRideResponse {
    pub id: Uuid,
    pub pickup_location: String,
    pub destination: String,
    pub date_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price_per_seat: i32,
    pub car_model: String,
    pub number_plate: String,
    pub booked_seats: i32,
}

/// List rides offered by the logged-in driver
pub async fn my_rides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<DriverRideResponse>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DriverId.eq(claims.sub))
        .order_by_asc(ride::Column::DateTime)
        .all(&state.db)
        .await?;

    let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
    let bookings = booking::Entity::find()
        .filter(booking::Column::RideId.is_in(ride_ids))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
        .all(&state.db)
        .await?;

    let responses = rides
        .into_iter()
        .map(|r| {
            let booked = bookings.iter().filter(|b| b.ride_id == r.id).count() as i32;
            DriverRideResponse {
                id: r.id,
                pickup_location: r.pickup_location,
                destination: r.destination,
                date_time: r.date_time.with_timezone(&Utc),
                available_seats: r.available_seats,
                price_per_seat: r.price_per_seat,
                car_model: r.car_model,
                number_plate: r.number_plate,
                booked_seats: booked,
            }
        })
        .collect();

    Ok(Json(responses))
}
