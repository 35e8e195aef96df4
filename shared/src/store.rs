//! Storage contract consumed by the ingestion pipeline.
//!
//! Client resolution and appointment creation run inside one
//! [`StoreTransaction`]; the audit trail is appended afterwards through
//! [`AppointmentStore::insert_webhook_log`] so a failed audit write can never
//! undo a committed appointment.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Appointment, Client, NewAppointment, NewWebhookLog, Service, WebhookLog};
use crate::Result;

/// Backing store for clients, services, appointments and webhook logs.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Open a unit of work. Writes become visible only after `commit`.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Append an audit row outside of any unit of work.
    async fn insert_webhook_log(&self, log: NewWebhookLog) -> Result<WebhookLog>;
}

/// A unit of work. Dropping it without calling `commit` discards its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_client_by_phone(&mut self, phone: &str) -> Result<Option<Client>>;

    async fn insert_client(&mut self, name: &str, phone: &str) -> Result<Client>;

    /// Overwrite the display name and refresh `updated_at`.
    async fn update_client_name(&mut self, client_id: Uuid, name: &str) -> Result<Client>;

    async fn find_service_by_name(&mut self, name: &str) -> Result<Option<Service>>;

    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
