pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod driver;
pub mod notifications;
pub mod rides;
