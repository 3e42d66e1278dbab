use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::{booking, notification, profile, ride};
use crate::error::{AppError, AppResult};
use crate::store::BookingStore;

/// Postgres-backed store. Mutating operations run inside a transaction; the
/// seat decrement is guarded by `available_seats > 0` so two passengers
/// racing for the last seat cannot both get through.
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for DbStore {
    async fn profile(&self, id: Uuid) -> AppResult<Option<profile::Model>> {
        Ok(profile::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn ride(&self, id: Uuid) -> AppResult<Option<ride::Model>> {
        Ok(ride::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn booking(&self, id: Uuid) -> AppResult<Option<booking::Model>> {
        Ok(booking::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn active_booking(
        &self,
        ride_id: Uuid,
        passenger_id: Uuid,
    ) -> AppResult<Option<booking::Model>> {
        Ok(booking::Entity::find()
            .filter(booking::Column::RideId.eq(ride_id))
            .filter(booking::Column::PassengerId.eq(passenger_id))
            .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
            .one(&self.db)
            .await?)
    }

    async fn record_booking(
        &self,
        new_booking: booking::Model,
        note: notification::Model,
    ) -> AppResult<booking::Model> {
        let txn = self.db.begin().await?;

        let taken = ride::Entity::update_many()
            .col_expr(
                ride::Column::AvailableSeats,
                Expr::col(ride::Column::AvailableSeats).sub(1),
            )
            .filter(ride::Column::Id.eq(new_booking.ride_id))
            .filter(ride::Column::AvailableSeats.gt(0))
            .exec(&txn)
            .await?;

        if taken.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::RideFull);
        }

        // The partial unique index on (ride_id, passenger_id) catches a
        // duplicate that slipped past the service-level check concurrently.
        let inserted = match new_booking.into_active_model().insert(&txn).await {
            Ok(model) => model,
            Err(e) => {
                txn.rollback().await?;
                return Err(match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyBooked,
                    _ => AppError::Database(e),
                });
            }
        };
        note.into_active_model().insert(&txn).await?;

        txn.commit().await?;
        Ok(inserted)
    }

    async fn apply_transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        new_status: BookingStatus,
        restore_seat: bool,
        note: notification::Model,
    ) -> AppResult<booking::Model> {
        let txn = self.db.begin().await?;

        // Guarded by the expected current status so a concurrent transition
        // cannot be overwritten with a stale one.
        let moved = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(new_status))
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::Status.eq(from))
            .exec(&txn)
            .await?;

        if moved.rows_affected == 0 {
            let actual = booking::Entity::find_by_id(booking_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
            txn.rollback().await?;
            return Err(AppError::InvalidTransition {
                from: actual.status,
                to: new_status,
            });
        }

        let updated = booking::Entity::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if restore_seat {
            ride::Entity::update_many()
                .col_expr(
                    ride::Column::AvailableSeats,
                    Expr::col(ride::Column::AvailableSeats).add(1),
                )
                .filter(ride::Column::Id.eq(updated.ride_id))
                .exec(&txn)
                .await?;
        }

        note.into_active_model().insert(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }
}
