//! Shared data models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::payload::AppointmentStatus;

/// Provenance tag stamped on appointments created by the webhook.
pub const APPOINTMENT_ORIGIN: &str = "whatsapp";

/// Source tag stamped on webhook audit rows.
pub const WEBHOOK_SOURCE: &str = "n8n_google_sheets";

/// A client, keyed in practice by phone number.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog service. Looked up by name, never created here.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub duration_minutes: i32,
}

/// Appointment to insert.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub client_name: String,
    pub client_phone: String,
    pub staff: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub origin: &'static str,
    pub payload: serde_json::Value,
}

/// Stored appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub staff: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
    pub origin: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub webhook_processed: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome recorded on a webhook audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Processed,
    Failed,
}

impl ProcessingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingOutcome::Processed => "processed",
            ProcessingOutcome::Failed => "failed",
        }
    }
}

/// Audit row to append.
#[derive(Debug, Clone)]
pub struct NewWebhookLog {
    pub source: &'static str,
    pub appointment_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub outcome: ProcessingOutcome,
}

/// Stored audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookLog {
    pub id: Uuid,
    pub source: String,
    pub appointment_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
    pub processing_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReceipt {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub message: String,
}
