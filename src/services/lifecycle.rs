use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::notification::NotificationType;
use crate::entities::profile::ProfileRole;
use crate::entities::{booking, notification, profile};
use crate::error::{AppError, AppResult};
use crate::store::BookingStore;

/// The authenticated profile performing a lifecycle operation. Always passed
/// in explicitly; the service holds no session state.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub role: ProfileRole,
}

impl From<profile::Model> for Actor {
    fn from(p: profile::Model) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            phone_number: p.phone_number,
            role: p.role,
        }
    }
}

/// Whether `role` may move a booking from `from` to `to`.
///
/// Drivers confirm (`upcoming -> going`) and complete (`upcoming/going ->
/// finished`); either party may cancel a booking that is not yet finished.
/// `finished` and `cancelled` are terminal.
pub fn transition_allowed(from: BookingStatus, to: BookingStatus, role: ProfileRole) -> bool {
    use BookingStatus::*;

    match (from, to) {
        (Upcoming, Going) => role == ProfileRole::Driver,
        (Upcoming, Finished) | (Going, Finished) => role == ProfileRole::Driver,
        (Upcoming, Cancelled) | (Going, Cancelled) => true,
        _ => false,
    }
}

/// Drives a booking through its lifecycle: creation, confirmation,
/// completion and cancellation. Every operation validates against the
/// current state, then hands the full effect (booking row, seat adjustment,
/// counterparty notification) to the store as one atomic unit.
#[derive(Clone)]
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Book one seat on a ride for the acting passenger.
    pub async fn create_booking(&self, actor: &Actor, ride_id: Uuid) -> AppResult<booking::Model> {
        if actor.role != ProfileRole::Passenger {
            return Err(AppError::Forbidden(
                "Only passengers can book rides".to_string(),
            ));
        }

        let ride = self
            .store
            .ride(ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

        if ride.date_time.with_timezone(&Utc) < Utc::now() {
            return Err(AppError::BadRequest(
                "Cannot book a ride that has already departed".to_string(),
            ));
        }

        // The duplicate check comes before the seat check: a passenger who
        // already holds the last seat gets the duplicate error, not "full".
        if self
            .store
            .active_booking(ride_id, actor.id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyBooked);
        }

        if ride.available_seats <= 0 {
            return Err(AppError::RideFull);
        }

        let new_booking = booking::Model {
            id: Uuid::new_v4(),
            ride_id,
            passenger_id: actor.id,
            status: BookingStatus::Upcoming,
            created_at: Utc::now().into(),
        };

        let content = format!(
            "{} has booked your ride from {} to {}. Contact: {}, Email: {}",
            actor.full_name, ride.pickup_location, ride.destination, actor.phone_number, actor.email
        );
        let note = build_notification(
            actor.id,
            ride.driver_id,
            NotificationType::Booking,
            content,
            ride.id,
        );

        let booked = self.store.record_booking(new_booking, note).await?;

        tracing::info!(
            booking_id = %booked.id,
            ride_id = %ride.id,
            passenger_id = %actor.id,
            "booking created"
        );

        Ok(booked)
    }

    /// Move a booking to `new_status` on behalf of `actor`, who must be the
    /// ride's driver or the booking's passenger.
    pub async fn transition(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> AppResult<booking::Model> {
        let current = self
            .store
            .booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let ride = self
            .store
            .ride(current.ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

        let is_party = match actor.role {
            ProfileRole::Driver => ride.driver_id == actor.id,
            ProfileRole::Passenger => current.passenger_id == actor.id,
        };
        if !is_party {
            return Err(AppError::Forbidden(
                "You are not a party to this booking".to_string(),
            ));
        }

        if !transition_allowed(current.status, new_status, actor.role) {
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        // Only a driver cancellation hands the seat back; a passenger
        // cancellation leaves available_seats untouched.
        let restore_seat =
            new_status == BookingStatus::Cancelled && actor.role == ProfileRole::Driver;

        let recipient = match actor.role {
            ProfileRole::Driver => current.passenger_id,
            ProfileRole::Passenger => ride.driver_id,
        };

        let (kind, content) = match new_status {
            BookingStatus::Going => (
                NotificationType::Confirmation,
                format!(
                    "Your ride from {} to {} has been confirmed by the driver. Contact: {}, Email: {}",
                    ride.pickup_location, ride.destination, actor.phone_number, actor.email
                ),
            ),
            BookingStatus::Finished => (
                NotificationType::Confirmation,
                format!(
                    "Your ride from {} to {} has been marked as completed.",
                    ride.pickup_location, ride.destination
                ),
            ),
            BookingStatus::Cancelled => (
                NotificationType::Cancellation,
                format!(
                    "{} has cancelled the ride from {} to {}.",
                    match actor.role {
                        ProfileRole::Driver => "Driver",
                        ProfileRole::Passenger => "Passenger",
                    },
                    ride.pickup_location,
                    ride.destination
                ),
            ),
            BookingStatus::Upcoming => {
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to: new_status,
                });
            }
        };

        let note = build_notification(actor.id, recipient, kind, content, ride.id);
        let updated = self
            .store
            .apply_transition(booking_id, current.status, new_status, restore_seat, note)
            .await?;

        tracing::info!(
            booking_id = %booking_id,
            from = %current.status,
            to = %new_status,
            actor_role = ?actor.role,
            "booking status changed"
        );

        Ok(updated)
    }
}

fn build_notification(
    sender_id: Uuid,
    recipient_id: Uuid,
    kind: NotificationType,
    content: String,
    ride_id: Uuid,
) -> notification::Model {
    notification::Model {
        id: Uuid::new_v4(),
        sender_id,
        recipient_id,
        kind,
        content,
        ride_id,
        read: false,
        created_at: Utc::now().into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::entities::ride;
    use crate::store::MemoryStore;

    fn profile_with_role(role: ProfileRole, name: &str) -> profile::Model {
        profile::Model {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone_number: "9876543210".to_string(),
            password_hash: "x".to_string(),
            role,
            created_at: Utc::now().into(),
        }
    }

    fn ride_with_seats(driver: &profile::Model, seats: i32) -> ride::Model {
        ride::Model {
            id: Uuid::new_v4(),
            driver_id: driver.id,
            pickup_location: "Delhi".to_string(),
            destination: "Jaipur".to_string(),
            date_time: (Utc::now() + Duration::days(2)).into(),
            available_seats: seats,
            price_per_seat: 450,
            car_model: "Swift".to_string(),
            number_plate: "DL01AB1234".to_string(),
            created_at: Utc::now().into(),
        }
    }

    struct Setup {
        store: Arc<MemoryStore>,
        lifecycle: BookingLifecycle,
        driver: Actor,
        passenger: Actor,
        ride: ride::Model,
    }

    fn setup(seats: i32) -> Setup {
        let store = Arc::new(MemoryStore::new());
        let driver = profile_with_role(ProfileRole::Driver, "Asha Mehta");
        let passenger = profile_with_role(ProfileRole::Passenger, "Ravi Kumar");
        let ride = ride_with_seats(&driver, seats);

        store.add_profile(driver.clone());
        store.add_profile(passenger.clone());
        store.add_ride(ride.clone());

        Setup {
            lifecycle: BookingLifecycle::new(store.clone()),
            store,
            driver: Actor::from(driver),
            passenger: Actor::from(passenger),
            ride,
        }
    }

    async fn seats_left(s: &Setup) -> i32 {
        s.store
            .ride(s.ride.id)
            .await
            .unwrap()
            .unwrap()
            .available_seats
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use BookingStatus::*;
        use ProfileRole::*;

        let allowed = [
            (Upcoming, Going, Driver),
            (Upcoming, Finished, Driver),
            (Going, Finished, Driver),
            (Upcoming, Cancelled, Driver),
            (Upcoming, Cancelled, Passenger),
            (Going, Cancelled, Driver),
            (Going, Cancelled, Passenger),
        ];

        for (from, to, role) in allowed {
            assert!(
                transition_allowed(from, to, role),
                "{from} -> {to} should be allowed for {role:?}"
            );
        }

        for from in [Upcoming, Going, Finished, Cancelled] {
            for to in [Upcoming, Going, Finished, Cancelled] {
                for role in [Driver, Passenger] {
                    let expected = allowed.contains(&(from, to, role));
                    assert_eq!(
                        transition_allowed(from, to, role),
                        expected,
                        "{from} -> {to} for {role:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_states() {
        assert!(BookingStatus::Finished.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Upcoming.is_terminal());
        assert!(!BookingStatus::Going.is_terminal());
    }

    #[tokio::test]
    async fn booking_takes_a_seat_and_notifies_the_driver() {
        let s = setup(2);

        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Upcoming);
        assert_eq!(seats_left(&s).await, 1);

        let notes = s.store.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient_id, s.driver.id);
        assert_eq!(notes[0].kind, NotificationType::Booking);
        assert!(notes[0].content.contains("Ravi Kumar"));
        assert!(notes[0].content.contains("9876543210"));
    }

    #[tokio::test]
    async fn duplicate_booking_is_rejected_without_touching_seats() {
        let s = setup(3);

        s.lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        let err = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyBooked));
        assert_eq!(seats_left(&s).await, 2);
        assert_eq!(s.store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_booking_on_the_last_seat_reports_the_duplicate() {
        let s = setup(1);

        s.lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        assert_eq!(seats_left(&s).await, 0);

        // The holder of the last seat must see the duplicate error, not "full"
        let err = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyBooked));
        assert_eq!(seats_left(&s).await, 0);
        assert_eq!(s.store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn stale_transition_cannot_overwrite_a_newer_status() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();

        s.lifecycle
            .transition(&s.passenger, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        // A racing confirmation that read the booking as upcoming loses at
        // the store: the guarded update refuses to revive the cancellation.
        let note = build_notification(
            s.driver.id,
            s.passenger.id,
            NotificationType::Confirmation,
            "stale".to_string(),
            s.ride.id,
        );
        let err = s
            .store
            .apply_transition(
                booking.id,
                BookingStatus::Upcoming,
                BookingStatus::Going,
                false,
                note,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
        let current = s.store.booking(booking.id).await.unwrap().unwrap();
        assert_eq!(current.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn full_ride_is_rejected_without_side_effects() {
        let s = setup(0);

        let err = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RideFull));
        assert_eq!(seats_left(&s).await, 0);
        assert!(s.store.notifications().is_empty());
    }

    #[tokio::test]
    async fn unknown_ride_is_not_found() {
        let s = setup(1);

        let err = s
            .lifecycle
            .create_booking(&s.passenger, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn drivers_cannot_book() {
        let s = setup(1);

        let err = s
            .lifecycle
            .create_booking(&s.driver, s.ride.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(seats_left(&s).await, 1);
    }

    #[tokio::test]
    async fn passenger_cannot_confirm_a_booking() {
        let s = setup(1);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();

        let err = s
            .lifecycle
            .transition(&s.passenger, booking.id, BookingStatus::Going)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
        let unchanged = s.store.booking(booking.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, BookingStatus::Upcoming);
    }

    #[tokio::test]
    async fn strangers_cannot_touch_a_booking() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();

        let other = Actor::from(profile_with_role(ProfileRole::Passenger, "Meera Iyer"));
        let err = s
            .lifecycle
            .transition(&other, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn no_transition_leaves_a_terminal_state() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();

        s.lifecycle
            .transition(&s.passenger, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        for target in [
            BookingStatus::Upcoming,
            BookingStatus::Going,
            BookingStatus::Finished,
        ] {
            let err = s
                .lifecycle
                .transition(&s.driver, booking.id, target)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn driver_cancellation_restores_the_seat() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        assert_eq!(seats_left(&s).await, 1);

        s.lifecycle
            .transition(&s.driver, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(seats_left(&s).await, 2);
        let notes = s.store.notifications();
        let last = notes.last().unwrap();
        assert_eq!(last.kind, NotificationType::Cancellation);
        assert_eq!(last.recipient_id, s.passenger.id);
        assert!(last.content.starts_with("Driver has cancelled"));
    }

    #[tokio::test]
    async fn passenger_cancellation_keeps_the_seat() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        assert_eq!(seats_left(&s).await, 1);

        s.lifecycle
            .transition(&s.passenger, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(seats_left(&s).await, 1);
        let notes = s.store.notifications();
        let last = notes.last().unwrap();
        assert_eq!(last.recipient_id, s.driver.id);
        assert!(last.content.starts_with("Passenger has cancelled"));
    }

    #[tokio::test]
    async fn cancelled_booking_can_be_rebooked() {
        let s = setup(2);
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        s.lifecycle
            .transition(&s.passenger, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let again = s.lifecycle.create_booking(&s.passenger, s.ride.id).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn every_operation_emits_exactly_one_notification() {
        let s = setup(3);

        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        assert_eq!(s.store.notifications().len(), 1);

        s.lifecycle
            .transition(&s.driver, booking.id, BookingStatus::Going)
            .await
            .unwrap();
        assert_eq!(s.store.notifications().len(), 2);

        s.lifecycle
            .transition(&s.driver, booking.id, BookingStatus::Finished)
            .await
            .unwrap();
        assert_eq!(s.store.notifications().len(), 3);
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let s = setup(2);

        // Passenger books: one seat taken, booking upcoming.
        let booking = s
            .lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        assert_eq!(seats_left(&s).await, 1);
        assert_eq!(booking.status, BookingStatus::Upcoming);

        // Driver confirms: going, confirmation notification to passenger.
        let confirmed = s
            .lifecycle
            .transition(&s.driver, booking.id, BookingStatus::Going)
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Going);
        let notes = s.store.notifications();
        let last = notes.last().unwrap();
        assert_eq!(last.kind, NotificationType::Confirmation);
        assert_eq!(last.recipient_id, s.passenger.id);
        assert!(last.content.contains("confirmed by the driver"));
        assert!(last.content.contains(&s.driver.phone_number));

        // Driver cancels: seat restored, cancellation notification.
        let cancelled = s
            .lifecycle
            .transition(&s.driver, booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(seats_left(&s).await, 2);
        let notes = s.store.notifications();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes.last().unwrap().kind, NotificationType::Cancellation);
    }

    #[tokio::test]
    async fn last_seat_admits_only_one_booking() {
        let s = setup(1);
        let second = Actor::from({
            let p = profile_with_role(ProfileRole::Passenger, "Meera Iyer");
            s.store.add_profile(p.clone());
            p
        });

        s.lifecycle
            .create_booking(&s.passenger, s.ride.id)
            .await
            .unwrap();
        let err = s
            .lifecycle
            .create_booking(&second, s.ride.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RideFull));
        assert_eq!(seats_left(&s).await, 0);
    }
}
