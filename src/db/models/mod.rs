//! Document models, one file per collection.
//! Everything is re-exported so callers can `use crate::db::models::*;`.

pub mod availability;
pub mod change_request;
pub mod check_in;
pub mod event;
pub mod help_request;
pub mod scheduled_volunteer;
pub mod shift;
pub mod volunteer;
pub mod waitlist;

pub use self::availability::*;
pub use self::change_request::*;
pub use self::check_in::*;
pub use self::event::*;
pub use self::help_request::*;
pub use self::scheduled_volunteer::*;
pub use self::shift::*;
pub use self::volunteer::*;
pub use self::waitlist::*;
