//! Name Analyzer API Library
//!
//! CRUD service for person records enriched with age, gender and nationality
//! inferred from the first name by three public lookup services (agify.io,
//! genderize.io, nationalize.io).
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection pool and schema.
//! - `db_storage`: Person persistence (`PersonStore`).
//! - `enrichment`: Concurrent fan-out over the three lookups.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `person_service`: Person CRUD and validation.
//! - `routes`: Router and OpenAPI document.
//! - `services`: Lookup service clients.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod person_service;
pub mod routes;
pub mod services;
