pub mod clinic;
pub mod dentist;

pub use clinic::ClinicService;
pub use dentist::DentistService;
