//! Reconciliation of Master Facility Registry records into DHIS2
//! organisation units, with a failed queue and an approval datastore mirror.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod services;
