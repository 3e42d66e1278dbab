use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::{booking, notification, profile, ride};
use crate::error::{AppError, AppResult};
use crate::store::BookingStore;

#[derive(Default)]
struct State {
    profiles: HashMap<Uuid, profile::Model>,
    rides: HashMap<Uuid, ride::Model>,
    bookings: HashMap<Uuid, booking::Model>,
    notifications: Vec<notification::Model>,
}

/// In-memory implementation of [`BookingStore`] with the same atomicity
/// contract as the Postgres one: every mutating call happens under a single
/// lock. Used by the lifecycle tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }

    pub fn add_profile(&self, p: profile::Model) {
        self.lock().profiles.insert(p.id, p);
    }

    pub fn add_ride(&self, r: ride::Model) {
        self.lock().rides.insert(r.id, r);
    }

    pub fn notifications(&self) -> Vec<notification::Model> {
        self.lock().notifications.clone()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn profile(&self, id: Uuid) -> AppResult<Option<profile::Model>> {
        Ok(self.lock().profiles.get(&id).cloned())
    }

    async fn ride(&self, id: Uuid) -> AppResult<Option<ride::Model>> {
        Ok(self.lock().rides.get(&id).cloned())
    }

    async fn booking(&self, id: Uuid) -> AppResult<Option<booking::Model>> {
        Ok(self.lock().bookings.get(&id).cloned())
    }

    async fn active_booking(
        &self,
        ride_id: Uuid,
        passenger_id: Uuid,
    ) -> AppResult<Option<booking::Model>> {
        Ok(self
            .lock()
            .bookings
            .values()
            .find(|b| {
                b.ride_id == ride_id
                    && b.passenger_id == passenger_id
                    && b.status != BookingStatus::Cancelled
            })
            .cloned())
    }

    async fn record_booking(
        &self,
        new_booking: booking::Model,
        note: notification::Model,
    ) -> AppResult<booking::Model> {
        let mut state = self.lock();

        let ride = state
            .rides
            .get_mut(&new_booking.ride_id)
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

        if ride.available_seats <= 0 {
            return Err(AppError::RideFull);
        }
        ride.available_seats -= 1;

        state.bookings.insert(new_booking.id, new_booking.clone());
        state.notifications.push(note);
        Ok(new_booking)
    }

    async fn apply_transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        new_status: BookingStatus,
        restore_seat: bool,
        note: notification::Model,
    ) -> AppResult<booking::Model> {
        let mut state = self.lock();

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        if booking.status != from {
            return Err(AppError::InvalidTransition {
                from: booking.status,
                to: new_status,
            });
        }
        booking.status = new_status;
        let updated = booking.clone();

        if restore_seat {
            if let Some(ride) = state.rides.get_mut(&updated.ride_id) {
                ride.available_seats += 1;
            }
        }

        state.notifications.push(note);
        Ok(updated)
    }
}
