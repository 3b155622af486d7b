//! BDD step definitions for the TWS sentinel service

pub mod configuration_steps;
pub mod notification_steps;
