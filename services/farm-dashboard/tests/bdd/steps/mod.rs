//! BDD step definitions for the farm dashboard client

pub mod client_steps;
pub mod polling_steps;
