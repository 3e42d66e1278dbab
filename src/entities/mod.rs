pub mod booking;
pub mod notification;
pub mod profile;
pub mod ride;
