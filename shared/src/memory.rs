//! In-memory implementation of the appointment store, used in tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, Client, NewAppointment, NewWebhookLog, Service, WebhookLog};
use crate::store::{AppointmentStore, StoreTransaction};
use crate::{Error, Result};

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertClient,
    InsertAppointment,
    InsertWebhookLog,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    clients: Vec<Client>,
    services: Vec<Service>,
    appointments: Vec<Appointment>,
    webhook_logs: Vec<WebhookLog>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: Tables,
    failures: HashSet<FailPoint>,
}

/// In-memory store with transactional staging and failure injection.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service to the catalog.
    pub async fn add_service(&self, name: &str, price: f64, duration_minutes: i32) -> Service {
        let service = Service {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            duration_minutes,
        };
        self.state.write().await.tables.services.push(service.clone());
        service
    }

    /// Add a client directly, bypassing the webhook.
    pub async fn add_client(&self, name: &str, phone: &str) -> Client {
        let client = new_client(name, phone);
        self.state.write().await.tables.clients.push(client.clone());
        client
    }

    pub async fn fail_on(&self, point: FailPoint) {
        self.state.write().await.failures.insert(point);
    }

    pub async fn clients(&self) -> Vec<Client> {
        self.state.read().await.tables.clients.clone()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.read().await.tables.appointments.clone()
    }

    pub async fn webhook_logs(&self) -> Vec<WebhookLog> {
        self.state.read().await.tables.webhook_logs.clone()
    }
}

fn new_client(name: &str, phone: &str) -> Client {
    let now = Utc::now();
    Client {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: Some(phone.to_string()),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let working = self.state.read().await.tables.clone();
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            working,
            staged: Vec::new(),
        }))
    }

    async fn insert_webhook_log(&self, log: NewWebhookLog) -> Result<WebhookLog> {
        let mut state = self.state.write().await;
        if state.failures.contains(&FailPoint::InsertWebhookLog) {
            return Err(Error::Store("webhook_logs insert rejected".to_string()));
        }

        let row = WebhookLog {
            id: Uuid::new_v4(),
            source: log.source.to_string(),
            appointment_id: log.appointment_id,
            payload: Some(log.payload),
            processing_status: Some(log.outcome.as_str().to_string()),
            created_at: Utc::now(),
        };
        state.tables.webhook_logs.push(row.clone());
        Ok(row)
    }
}

enum Staged {
    UpsertClient(Client),
    InsertAppointment(Appointment),
}

/// Reads see a snapshot taken at `begin` plus this transaction's own writes.
/// Writes are replayed onto the shared tables on commit.
struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    working: Tables,
    staged: Vec<Staged>,
}

impl MemoryTransaction {
    async fn check(&self, point: FailPoint, what: &str) -> Result<()> {
        if self.state.read().await.failures.contains(&point) {
            return Err(Error::Store(format!("{what} insert rejected")));
        }
        Ok(())
    }
}

fn upsert_client(clients: &mut Vec<Client>, client: Client) {
    match clients.iter_mut().find(|c| c.id == client.id) {
        Some(existing) => *existing = client,
        None => clients.push(client),
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_client_by_phone(&mut self, phone: &str) -> Result<Option<Client>> {
        Ok(self
            .working
            .clients
            .iter()
            .find(|c| c.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn insert_client(&mut self, name: &str, phone: &str) -> Result<Client> {
        self.check(FailPoint::InsertClient, "clients").await?;

        let client = new_client(name, phone);
        self.working.clients.push(client.clone());
        self.staged.push(Staged::UpsertClient(client.clone()));
        Ok(client)
    }

    async fn update_client_name(&mut self, client_id: Uuid, name: &str) -> Result<Client> {
        let client = self
            .working
            .clients
            .iter_mut()
            .find(|c| c.id == client_id)
            .ok_or_else(|| Error::Store(format!("client {client_id} does not exist")))?;

        client.name = name.to_string();
        client.updated_at = Utc::now();
        let client = client.clone();
        self.staged.push(Staged::UpsertClient(client.clone()));
        Ok(client)
    }

    async fn find_service_by_name(&mut self, name: &str) -> Result<Option<Service>> {
        Ok(self
            .working
            .services
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment> {
        self.check(FailPoint::InsertAppointment, "appointments").await?;

        let row = Appointment {
            id: Uuid::new_v4(),
            client_id: appointment.client_id,
            service_id: appointment.service_id,
            client_name: Some(appointment.client_name),
            client_phone: Some(appointment.client_phone),
            staff: appointment.staff,
            date: appointment.date,
            time: appointment.time,
            status: appointment.status.as_str().to_string(),
            notes: appointment.notes,
            origin: Some(appointment.origin.to_string()),
            payload: Some(appointment.payload),
            webhook_processed: true,
            created_at: Utc::now(),
        };
        self.working.appointments.push(row.clone());
        self.staged.push(Staged::InsertAppointment(row.clone()));
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { state, staged, .. } = *self;
        let mut state = state.write().await;
        for change in staged {
            match change {
                Staged::UpsertClient(client) => upsert_client(&mut state.tables.clients, client),
                Staged::InsertAppointment(row) => state.tables.appointments.push(row),
            }
        }
        Ok(())
    }
}
