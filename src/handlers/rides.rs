use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::{profile, ride};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RideFilter {
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub driver_name: String,
    pub pickup_location: String,
    pub destination: String,
    pub date_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price_per_seat: i32,
    pub car_model: String,
    pub number_plate: String,
}

fn to_response(r: ride::Model, drivers: &[profile::Model]) -> RideResponse {
    let driver_name = drivers
        .iter()
        .find(|d| d.id == r.driver_id)
        .map(|d| d.full_name.clone())
        .unwrap_or_default();

    RideResponse {
        id: r.id,
        driver_name,
        pickup_location: r.pickup_location,
        destination: r.destination,
        date_time: r.date_time.with_timezone(&Utc),
        available_seats: r.available_seats,
        price_per_seat: r.price_per_seat,
        car_model: r.car_model,
        number_plate: r.number_plate,
    }
}

/// List open rides (future departure, seats left), soonest first
pub async fn list_rides(
    State(state): State<AppState>,
    Query(filter): Query<RideFilter>,
) -> AppResult<Json<Vec<RideResponse>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DateTime.gte(Utc::now()))
        .filter(ride::Column::AvailableSeats.gt(0))
        .order_by_asc(ride::Column::DateTime)
        .all(&state.db)
        .await?;

    let rides: Vec<ride::Model> = rides
        .into_iter()
        .filter(|r| {
            let destination_ok = filter.destination.as_deref().is_none_or(|q| {
                r.destination.to_lowercase().contains(&q.to_lowercase())
            });
            let date_ok = filter
                .date
                .is_none_or(|d| r.date_time.with_timezone(&Utc).date_naive() == d);
            destination_ok && date_ok
        })
        .collect();

    let driver_ids: Vec<Uuid> = rides.iter().map(|r| r.driver_id).collect();
    let drivers = profile::Entity::find()
        .filter(profile::Column::Id.is_in(driver_ids))
        .all(&state.db)
        .await?;

    let responses = rides
        .into_iter()
        .map(|r| to_response(r, &drivers))
        .collect();

    Ok(Json(responses))
}

/// Get ride details
pub async fn get_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let found = ride::Entity::find_by_id(ride_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let drivers = profile::Entity::find()
        .filter(profile::Column::Id.eq(found.driver_id))
        .all(&state.db)
        .await?;

    Ok(Json(to_response(found, &drivers)))
}
