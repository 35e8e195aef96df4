//! Appointment webhook ingestion pipeline.
//!
//! Each call runs validate → resolve client → resolve service → create
//! appointment → audit log, once, with no retries. The three middle steps
//! share a single store transaction, so a missing service or a failed
//! appointment insert leaves no client row behind.
//!
//! There is no idempotency key: delivering the same event twice creates two
//! appointments. Concurrent deliveries for a new phone number can still both
//! insert a client unless the table carries a unique constraint on `phone`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    Client, IngestionReceipt, NewAppointment, NewWebhookLog, ProcessingOutcome,
    APPOINTMENT_ORIGIN, WEBHOOK_SOURCE,
};
use crate::payload::AppointmentRequest;
use crate::store::{AppointmentStore, StoreTransaction};
use crate::{Error, Result};

/// Ingests validated appointment events into the store.
pub struct IngestionService {
    store: Arc<dyn AppointmentStore>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Reconcile one event against the client and service catalog and create
    /// the appointment.
    pub async fn ingest(&self, request: AppointmentRequest) -> Result<IngestionReceipt> {
        let snapshot = request.snapshot(Utc::now());

        match self.create_appointment(&request, &snapshot).await {
            Ok(receipt) => {
                info!(
                    appointment_id = %receipt.appointment_id,
                    client_id = %receipt.client_id,
                    "Appointment created from webhook"
                );
                self.record_attempt(
                    ProcessingOutcome::Processed,
                    Some(receipt.appointment_id),
                    snapshot,
                )
                .await;
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    service_name = %request.service_name,
                    "Webhook ingestion failed"
                );
                self.record_attempt(ProcessingOutcome::Failed, None, snapshot)
                    .await;
                Err(e)
            }
        }
    }

    async fn create_appointment(
        &self,
        request: &AppointmentRequest,
        snapshot: &serde_json::Value,
    ) -> Result<IngestionReceipt> {
        let mut tx = self.store.begin().await?;

        let client = resolve_client(tx.as_mut(), request).await?;

        let service = tx
            .find_service_by_name(&request.service_name)
            .await?
            .ok_or_else(|| Error::ServiceNotFound(request.service_name.clone()))?;
        debug!(service_id = %service.id, price = service.price, "Service resolved");

        let appointment = tx
            .insert_appointment(NewAppointment {
                client_id: client.id,
                service_id: service.id,
                client_name: request.client_name.clone(),
                client_phone: request.client_phone.clone(),
                staff: request.staff.clone(),
                date: request.date,
                time: request.time,
                status: request.status,
                notes: request.notes.clone(),
                origin: APPOINTMENT_ORIGIN,
                payload: snapshot.clone(),
            })
            .await?;

        tx.commit().await?;

        Ok(IngestionReceipt {
            appointment_id: appointment.id,
            client_id: client.id,
            message: "Appointment created successfully".to_string(),
        })
    }

    /// Append the audit row. A failure here never reaches the caller; the
    /// snapshot is emitted on the `webhook_audit` target instead so operators
    /// can replay it.
    async fn record_attempt(
        &self,
        outcome: ProcessingOutcome,
        appointment_id: Option<Uuid>,
        snapshot: serde_json::Value,
    ) {
        let log = NewWebhookLog {
            source: WEBHOOK_SOURCE,
            appointment_id,
            payload: snapshot,
            outcome,
        };

        if let Err(e) = self.store.insert_webhook_log(log.clone()).await {
            error!(
                target: "webhook_audit",
                error = %e,
                outcome = outcome.as_str(),
                appointment_id = ?appointment_id,
                payload = %log.payload,
                "Failed to write webhook audit log"
            );
        }
    }
}

/// Find the client by phone and refresh its name, or create it.
async fn resolve_client(
    tx: &mut dyn StoreTransaction,
    request: &AppointmentRequest,
) -> Result<Client> {
    match tx.find_client_by_phone(&request.client_phone).await? {
        Some(existing) => {
            let client = tx
                .update_client_name(existing.id, &request.client_name)
                .await?;
            debug!(client_id = %client.id, "Existing client updated");
            Ok(client)
        }
        None => {
            let client = tx
                .insert_client(&request.client_name, &request.client_phone)
                .await?;
            info!(client_id = %client.id, "New client created");
            Ok(client)
        }
    }
}
