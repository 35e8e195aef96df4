//! HTTP adapter for the appointment webhook endpoint.

use lambda_http::{Body, Request, Response};
use tracing::{error, info};

use crate::http::{error_response, json_response, preflight_response, ErrorBody, SuccessBody};
use crate::ingest::IngestionService;
use crate::payload::WebhookPayload;
use crate::Error;

/// Turn one inbound request into the endpoint's HTTP response.
///
/// Every failure is converted into a JSON error body here; nothing propagates
/// to the Lambda runtime except failures to build the response itself.
pub async fn handle_webhook(
    service: &IngestionService,
    event: Request,
) -> Result<Response<Body>, lambda_http::Error> {
    match event.method().as_str() {
        "OPTIONS" => return preflight_response(),
        "POST" => {}
        other => {
            return error_response(
                405,
                "method_not_allowed",
                format!("Method {other} not allowed"),
            )
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(event.body().as_ref()) {
        Ok(payload) => payload,
        Err(e) => {
            return error_response(400, "invalid_body", format!("Invalid request body: {e}"))
        }
    };

    let request = match payload.into_request() {
        Ok(request) => request,
        Err(e) => {
            info!(reason = e.reason(), "Rejected webhook payload: {}", e);
            return error_response(400, e.reason(), e.to_string());
        }
    };

    match service.ingest(request).await {
        Ok(receipt) => json_response(200, &SuccessBody::new(receipt)),
        Err(e) => failure_response(&e),
    }
}

fn failure_response(e: &Error) -> Result<Response<Body>, lambda_http::Error> {
    let status = e.status_code();
    if status < 500 {
        return error_response(status, e.reason(), e.to_string());
    }

    error!("Webhook processing error: {}", e);
    json_response(
        status,
        &ErrorBody {
            error: "internal error".to_string(),
            reason: e.reason(),
            details: Some(e.diagnostic()),
        },
    )
}
