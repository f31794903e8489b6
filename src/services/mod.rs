pub mod addresses;
pub mod applications;
pub mod bookings;
pub mod catalog;
pub mod cleaners;
pub mod invites;
pub mod matching;
pub mod notify;
pub mod pricing;
pub mod reviews;
pub mod tokens;
