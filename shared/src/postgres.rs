//! Postgres implementation of the appointment store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, Client, NewAppointment, NewWebhookLog, Service, WebhookLog};
use crate::store::{AppointmentStore, StoreTransaction};
use crate::Result;

const CLIENT_COLUMNS: &str = "id, name, phone, created_at, updated_at";

/// Appointment row as returned by Postgres
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    client_id: Uuid,
    service_id: Uuid,
    client_name: Option<String>,
    client_phone: Option<String>,
    staff: String,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    status: String,
    notes: Option<String>,
    origin: Option<String>,
    webhook_payload: Option<serde_json::Value>,
    webhook_processed: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            service_id: row.service_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            staff: row.staff,
            date: row.appointment_date,
            time: row.appointment_time,
            status: row.status,
            notes: row.notes,
            origin: row.origin,
            payload: row.webhook_payload,
            webhook_processed: row.webhook_processed.unwrap_or(false),
            created_at: row.created_at,
        }
    }
}

/// Webhook log row as returned by Postgres
#[derive(Debug, sqlx::FromRow)]
struct WebhookLogRow {
    id: Uuid,
    source: String,
    appointment_id: Option<Uuid>,
    payload: Option<serde_json::Value>,
    processing_status: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<WebhookLogRow> for WebhookLog {
    fn from(row: WebhookLogRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            appointment_id: row.appointment_id,
            payload: row.payload,
            processing_status: row.processing_status,
            created_at: row.created_at,
        }
    }
}

/// Store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn insert_webhook_log(&self, log: NewWebhookLog) -> Result<WebhookLog> {
        let row: WebhookLogRow = sqlx::query_as(
            r#"
            INSERT INTO webhook_logs (source, appointment_id, payload, processing_status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, source, appointment_id, payload, processing_status, created_at
            "#,
        )
        .bind(log.source)
        .bind(log.appointment_id)
        .bind(&log.payload)
        .bind(log.outcome.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!(log_id = %row.id, "Webhook log inserted");
        Ok(row.into())
    }
}

/// Open Postgres transaction. sqlx rolls it back when dropped uncommitted.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_client_by_phone(&mut self, phone: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE phone = $1 ORDER BY created_at LIMIT 1"
        ))
        .bind(phone)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(client)
    }

    async fn insert_client(&mut self, name: &str, phone: &str) -> Result<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (name, phone) VALUES ($1, $2) RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(name)
        .bind(phone)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(client)
    }

    async fn update_client_name(&mut self, client_id: Uuid, name: &str) -> Result<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET name = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(client_id)
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(client)
    }

    async fn find_service_by_name(&mut self, name: &str) -> Result<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, price::float8 AS price, duration_minutes
            FROM services
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(service)
    }

    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment> {
        let row: AppointmentRow = sqlx::query_as(
            r#"
            INSERT INTO appointments (
                client_id, service_id, client_name, client_phone,
                staff, appointment_date, appointment_time, status,
                notes, origin, webhook_payload, webhook_processed
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7, $8,
                $9, $10, $11, TRUE
            )
            RETURNING
                id, client_id, service_id, client_name, client_phone,
                staff, appointment_date, appointment_time, status,
                notes, origin, webhook_payload, webhook_processed, created_at
            "#,
        )
        .bind(appointment.client_id)
        .bind(appointment.service_id)
        .bind(&appointment.client_name)
        .bind(&appointment.client_phone)
        .bind(&appointment.staff)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(appointment.origin)
        .bind(&appointment.payload)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
