mod db;
mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::{booking, notification, profile, ride};
use crate::error::AppResult;

/// Persistence seam for the booking lifecycle. The production implementation
/// wraps Postgres, the in-memory one backs the service tests. Each mutating
/// method covers one lifecycle operation end to end, so a booking, its seat
/// adjustment and its notification land atomically or not at all.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn profile(&self, id: Uuid) -> AppResult<Option<profile::Model>>;

    async fn ride(&self, id: Uuid) -> AppResult<Option<ride::Model>>;

    async fn booking(&self, id: Uuid) -> AppResult<Option<booking::Model>>;

    /// The passenger's non-cancelled booking on a ride, if any.
    async fn active_booking(
        &self,
        ride_id: Uuid,
        passenger_id: Uuid,
    ) -> AppResult<Option<booking::Model>>;

    /// Insert a booking, take one seat off its ride and record the driver
    /// notification in a single transaction. Fails with `AppError::RideFull`
    /// when no seat is left at commit time.
    async fn record_booking(
        &self,
        new_booking: booking::Model,
        note: notification::Model,
    ) -> AppResult<booking::Model>;

    /// Move a booking from `from` to `new_status`, optionally hand the seat
    /// back to the ride, and record the counterparty notification in a
    /// single transaction. The status update is guarded by `from`: if a
    /// concurrent transition got there first, the call fails with
    /// `AppError::InvalidTransition` instead of overwriting the newer state.
    async fn apply_transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        new_status: BookingStatus,
        restore_seat: bool,
        note: notification::Model,
    ) -> AppResult<booking::Model>;
}
