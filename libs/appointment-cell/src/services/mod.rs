pub mod appointment;
pub mod stats;

pub use appointment::AppointmentService;
pub use stats::DashboardStatsService;
