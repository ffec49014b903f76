use actix_web::HttpResponse;
use log::warn;
use serde::Serialize;

use super::models::EnvelopeError;
use crate::mining::{ErrorKind, MiningError};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

/// Map an engine failure to an HTTP status by its class.
pub fn mining_error(action: &str, err: &MiningError) -> HttpResponse {
    warn!("{} rejected: {}", action, err);
    let body = ErrorResponse {
        kind: err.kind(),
        code: err.code(),
        message: err.to_string(),
    };
    match err.kind() {
        ErrorKind::Authorization => HttpResponse::Forbidden().json(body),
        ErrorKind::ProtocolSequence => HttpResponse::Conflict().json(body),
        ErrorKind::ProofValidity => HttpResponse::UnprocessableEntity().json(body),
        ErrorKind::Exhausted => HttpResponse::Gone().json(body),
        ErrorKind::Configuration => HttpResponse::InternalServerError().json(body),
    }
}

/// Signature or envelope problems, before the engine is touched.
pub fn envelope_error(action: &str, err: EnvelopeError) -> HttpResponse {
    match err {
        EnvelopeError::Unauthenticated(msg) => {
            warn!("{} unauthenticated: {}", action, msg);
            HttpResponse::Unauthorized().body(msg)
        }
        EnvelopeError::MalformedBody(msg) => {
            warn!("{} malformed body: {}", action, msg);
            HttpResponse::BadRequest().body(msg)
        }
    }
}
