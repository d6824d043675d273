pub mod availability;
pub mod change_request;
pub mod check_in;
pub mod event;
pub mod help_request;
pub mod scheduled_volunteer;
pub mod shift;
pub mod volunteer;
pub mod waitlist;

pub use availability::AvailabilityRepository;
pub use change_request::ChangeRequestRepository;
pub use check_in::CheckInRepository;
pub use event::EventRepository;
pub use help_request::HelpRequestRepository;
pub use scheduled_volunteer::ScheduledVolunteerRepository;
pub use shift::{AppendPolicy, ShiftRepository};
pub use volunteer::VolunteerRepository;
pub use waitlist::WaitlistRepository;
