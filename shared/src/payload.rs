//! Inbound appointment webhook payload and its schema validation.
//!
//! The automation that feeds this endpoint sends a flat JSON object. Every
//! field is optional at the serde layer so that a missing field surfaces as a
//! [`PayloadError::MissingFields`] rather than an opaque parse failure.
//!
//! Each field accepts one key: its canonical name or one of its aliases. A
//! body carrying two spellings of the same field (`name` and `client_name`)
//! is ambiguous and fails to deserialize with a duplicate field error.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Required fields in the order they are reported back to callers.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "client_name",
    "client_phone",
    "date",
    "time",
    "staff",
    "service_name",
];

/// Appointment webhook body as received.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct WebhookPayload {
    #[serde(alias = "nome_cliente", alias = "name")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(alias = "telefone_cliente", alias = "phone")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,

    #[serde(alias = "data_agendamento")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(alias = "hora_agendamento")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(alias = "funcionario")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff: Option<String>,

    #[serde(alias = "servico_nome", alias = "service")]
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(alias = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Audit only. The service record owns the real price, so the hint is
    /// kept exactly as sent (number, string, anything).
    #[serde(alias = "preco_servico", skip_serializing_if = "Option::is_none")]
    pub price: Option<serde_json::Value>,
}

/// Enumerated reasons a payload is rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Required fields: {} (missing: {})", REQUIRED_FIELDS.join(", "), .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM or HH:MM:SS")]
    InvalidTime(String),

    #[error("Invalid status '{0}', expected one of: scheduled, confirmed, completed, canceled")]
    InvalidStatus(String),
}

impl PayloadError {
    pub fn reason(&self) -> &'static str {
        match self {
            PayloadError::MissingFields(_) => "missing_required_fields",
            PayloadError::InvalidDate(_) => "invalid_date",
            PayloadError::InvalidTime(_) => "invalid_time",
            PayloadError::InvalidStatus(_) => "invalid_status",
        }
    }
}

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    /// Parse a status label. The dashboard's Portuguese labels are accepted too.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "scheduled" | "agendado" => Some(AppointmentStatus::Scheduled),
            "confirmed" | "confirmado" => Some(AppointmentStatus::Confirmed),
            "completed" | "concluido" | "concluído" => Some(AppointmentStatus::Completed),
            "canceled" | "cancelled" | "cancelado" => Some(AppointmentStatus::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload that passed validation.
#[derive(Debug, Clone)]
pub struct AppointmentRequest {
    pub client_name: String,
    pub client_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub staff: String,
    pub service_name: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub price_hint: Option<serde_json::Value>,
    received: WebhookPayload,
}

impl WebhookPayload {
    /// Validate and normalize into an [`AppointmentRequest`].
    pub fn into_request(self) -> Result<AppointmentRequest, PayloadError> {
        if let Err(errors) = self.validate() {
            let failed = errors.field_errors();
            let missing: Vec<&'static str> = REQUIRED_FIELDS
                .iter()
                .copied()
                .filter(|field| failed.keys().any(|key| key.to_string() == *field))
                .collect();
            return Err(PayloadError::MissingFields(missing));
        }

        let received = self.clone();
        let (
            Some(client_name),
            Some(client_phone),
            Some(date),
            Some(time),
            Some(staff),
            Some(service_name),
        ) = (
            self.client_name,
            self.client_phone,
            self.date,
            self.time,
            self.staff,
            self.service_name,
        )
        else {
            return Err(PayloadError::MissingFields(REQUIRED_FIELDS.to_vec()));
        };

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| PayloadError::InvalidDate(date.clone()))?;
        let time =
            parse_time(time.trim()).ok_or_else(|| PayloadError::InvalidTime(time.clone()))?;

        let status = match self.status.as_deref() {
            None | Some("") => AppointmentStatus::default(),
            Some(label) => AppointmentStatus::parse(label)
                .ok_or_else(|| PayloadError::InvalidStatus(label.to_string()))?,
        };

        Ok(AppointmentRequest {
            client_name,
            client_phone,
            date,
            time,
            staff,
            service_name,
            status,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            price_hint: self.price,
            received,
        })
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

impl AppointmentRequest {
    /// JSON snapshot of everything received, kept for forensic audit
    /// independently of the normalized columns.
    pub fn snapshot(&self, received_at: DateTime<Utc>) -> serde_json::Value {
        let mut snapshot = serde_json::to_value(&self.received)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        if let Some(fields) = snapshot.as_object_mut() {
            fields.insert("status".to_string(), self.status.as_str().into());
            fields.insert("received_at".to_string(), received_at.to_rfc3339().into());
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<AppointmentRequest, PayloadError> {
        serde_json::from_value::<WebhookPayload>(value).unwrap().into_request()
    }

    fn complete() -> serde_json::Value {
        json!({
            "client_name": "Ana",
            "client_phone": "+551199990000",
            "date": "2024-05-01",
            "time": "14:00",
            "staff": "barber1",
            "service_name": "Corte"
        })
    }

    #[test]
    fn test_defaults_status_to_scheduled() {
        let request = parse(complete()).unwrap();
        assert_eq!(request.status, AppointmentStatus::Scheduled);
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(request.time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_reports_missing_fields_in_canonical_order() {
        let mut body = complete();
        body.as_object_mut().unwrap().remove("staff");
        body["client_name"] = json!("");

        let err = parse(body).unwrap_err();
        assert_eq!(err, PayloadError::MissingFields(vec!["client_name", "staff"]));
        assert!(err.to_string().starts_with(
            "Required fields: client_name, client_phone, date, time, staff, service_name"
        ));
    }

    #[test]
    fn test_accepts_automation_field_names() {
        let request = parse(json!({
            "nome_cliente": "Ana",
            "telefone_cliente": "+551199990000",
            "data_agendamento": "2024-05-01",
            "hora_agendamento": "09:30:00",
            "funcionario": "barber1",
            "servico_nome": "Corte",
            "status": "Confirmado",
            "observacoes": "first visit",
            "preco_servico": 40.0
        }))
        .unwrap();

        assert_eq!(request.status, AppointmentStatus::Confirmed);
        assert_eq!(request.notes.as_deref(), Some("first visit"));
        assert_eq!(request.price_hint, Some(json!(40.0)));
    }

    #[test]
    fn test_rejects_malformed_date_time_and_status() {
        let mut body = complete();
        body["date"] = json!("01/05/2024");
        assert_eq!(parse(body).unwrap_err().reason(), "invalid_date");

        let mut body = complete();
        body["time"] = json!("2pm");
        assert_eq!(parse(body).unwrap_err().reason(), "invalid_time");

        let mut body = complete();
        body["status"] = json!("pending");
        assert_eq!(
            parse(body).unwrap_err(),
            PayloadError::InvalidStatus("pending".to_string())
        );
    }

    #[test]
    fn test_rejects_two_spellings_of_one_field() {
        let mut body = complete();
        body["name"] = json!("Ana Silva");

        let err = serde_json::from_value::<WebhookPayload>(body).unwrap_err();
        assert!(err.to_string().contains("duplicate field `client_name`"));
    }

    #[test]
    fn test_price_hint_is_kept_verbatim() {
        let mut body = complete();
        body["price"] = json!("R$ 40,00");
        let request = parse(body).unwrap();

        assert_eq!(request.price_hint, Some(json!("R$ 40,00")));
        assert_eq!(request.snapshot(Utc::now())["price"], json!("R$ 40,00"));
    }

    #[test]
    fn test_snapshot_keeps_price_hint_and_capture_time() {
        let mut body = complete();
        body["price"] = json!(55.5);
        let request = parse(body).unwrap();

        let received_at = Utc::now();
        let snapshot = request.snapshot(received_at);
        assert_eq!(snapshot["price"], json!(55.5));
        assert_eq!(snapshot["time"], json!("14:00"));
        assert_eq!(snapshot["status"], json!("scheduled"));
        assert_eq!(snapshot["received_at"], json!(received_at.to_rfc3339()));
    }
}
