pub mod admin_location;
pub mod booking;
