//! Catalog backend for a medical-tourism booking platform
//!
//! Serves hospitals, doctors, treatments and packages over a JSON API and
//! records inquiries and appointment requests. Treatment listings collapse
//! competing offers into one best offer per treatment ([`ranking`]) and
//! packages are ordered by a view/inquiry weighted score ([`scoring`]).

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod ranking;
pub mod scoring;
