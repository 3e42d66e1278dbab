pub mod lifecycle;

pub use lifecycle::{Actor, BookingLifecycle};
