pub mod bookings;
pub mod distance;
pub mod health;
pub mod locations;
