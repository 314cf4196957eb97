pub mod doctor;
pub mod identify;
pub mod onboard;
pub mod plan;

mod services;
