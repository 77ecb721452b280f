//! Adaptateur HTTP
//!
//! Une seule route, POST uniquement. Le succès comme le fault sont renvoyés
//! avec un statut 200 : un fault SOAP est une réussite du transport.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use std::sync::Arc;
use tracing::{debug, error, warn};
use usersoap::{Dispatch, Dispatcher, FaultCode};

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Router exposant `dispatcher` en POST sur `path`
pub fn soap_router(path: &str, dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(path, post(soap_handler))
        .with_state(dispatcher)
}

/// Handler POST de l'enveloppe SOAP
pub async fn soap_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(b) => b,
        Err(e) => {
            warn!("❌ Failed to read SOAP request body: {}", e);
            return soap_response(Dispatch::fault(
                FaultCode::Client,
                "Failed to read request body",
            ));
        }
    };

    debug!("📥 HTTP SOAP request ({} bytes)", body.len());

    // Le stockage est bloquant
    match tokio::task::spawn_blocking(move || dispatcher.handle(&body)).await {
        Ok(reply) => {
            debug!("📤 HTTP SOAP reply: {:?}", reply.outcome);
            soap_response(reply)
        }
        Err(e) => {
            error!("❌ SOAP dispatch task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn soap_response(reply: Dispatch) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(SOAP_CONTENT_TYPE)),
            (HeaderName::from_static("soapaction"), HeaderValue::from_static("")),
        ],
        reply.body,
    )
        .into_response()
}
