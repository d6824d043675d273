pub mod auth;
pub mod availability;
pub mod events;
pub mod health;
pub mod requests;
pub mod scheduler;
pub mod shifts;
pub mod volunteers;
