//! Shared library for the appointment webhook Lambda functions.
//!
//! This crate holds the ingestion pipeline for third-party appointment events
//! along with the configuration, storage and HTTP plumbing around it.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod ingest;
pub mod memory;
pub mod models;
pub mod payload;
pub mod postgres;
pub mod secrets;
pub mod store;
pub mod webhook;

pub use config::{Config, DatabaseSource};
pub use error::{Error, Result};
pub use ingest::IngestionService;
pub use memory::{FailPoint, InMemoryStore};
pub use models::{Appointment, Client, IngestionReceipt, Service, WebhookLog};
pub use payload::{AppointmentRequest, AppointmentStatus, PayloadError, WebhookPayload};
pub use postgres::PgStore;
pub use secrets::{get_database_credentials, DatabaseCredentials};
pub use store::{AppointmentStore, StoreTransaction};
pub use webhook::handle_webhook;
