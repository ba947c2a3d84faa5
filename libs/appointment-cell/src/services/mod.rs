pub mod booking;
pub mod conflict;
pub mod consistency;
pub mod slots;

pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use consistency::SchedulingLocks;
pub use slots::SlotService;
