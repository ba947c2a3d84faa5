pub mod availability;
pub mod scheduling;

pub use availability::AvailabilityService;
pub use scheduling::ScheduleService;
