//! Query parameters and response shapes exchanged between routes and services.

pub mod agenda;
pub mod clinics;
pub mod finance;
pub mod members;
pub mod patients;
pub mod reports;
