pub mod availability;
pub mod check_in;
pub mod events;
pub mod init;
pub mod requests;
pub mod scheduler;
pub mod session;
pub mod shifts;
pub mod volunteers;

use chrono::{Local, NaiveDate};

/// Calendar day at the venue. The server runs in the event's timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
