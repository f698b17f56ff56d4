//! HTTP surface of the attested enclave.
//!
//! Exposes three endpoints: attestation-on-demand (`/get_attestation`),
//! reachability-on-demand (`/health_check`), and the signing path
//! (`/process_data`). The enclave identity is generated once at boot and
//! threaded through every handler as read-only shared state; no endpoint
//! mutates anything, so every response is a pure function of the identity
//! and the request.

use std::collections::BTreeMap;

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};

pub mod cli;
pub mod host;

/// Crate version of the server binary, sourced from `Cargo.toml`.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Egress domains available to application logic, fixed at image build
/// time. Embedding the file means the allowlist is part of the measured
/// artifact: editing it yields different PCRs.
pub const ALLOWED_ENDPOINTS: &str = include_str!("../allowed_endpoints.txt");

const GET_ATTESTATION: &str = "/get_attestation";
const HEALTH_CHECK: &str = "/health_check";
const PROCESS_DATA: &str = "/process_data";

/// Simple error that implements [`IntoResponse`] so it can be returned from
/// handlers as an http response (and not get silently dropped).
pub(crate) struct Error {
	status: StatusCode,
	message: String,
}

impl Error {
	/// Request rejected before any signing occurred.
	pub(crate) fn bad_request(message: String) -> Self {
		Self { status: StatusCode::BAD_REQUEST, message }
	}

	/// The platform attestation subsystem is unavailable; retryable.
	pub(crate) fn unavailable(message: String) -> Self {
		Self { status: StatusCode::SERVICE_UNAVAILABLE, message }
	}

	pub(crate) fn internal(message: String) -> Self {
		Self { status: StatusCode::INTERNAL_SERVER_ERROR, message }
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let body = JsonError { error: self.message };
		tracing::error!(error = %body.error, "request failed");
		(self.status, Json(body)).into_response()
	}
}

/// Response body of `GET /get_attestation`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AttestationResponse {
	/// Hex encoded, platform-signed attestation document committed to the
	/// enclave's public key.
	pub attestation: String,
}

/// Response body of `GET /health_check`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthCheckResponse {
	/// Hex encoded enclave public key.
	pub pk: String,
	/// Reachability of every allowed egress domain, one entry per domain.
	pub endpoints_status: BTreeMap<String, bool>,
}

/// Request body of `POST /process_data`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ProcessDataRequest {
	/// Application-defined payload handed to the business logic.
	pub payload: serde_json::Value,
}

/// Body of a 4xx or 5xx response.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct JsonError {
	/// Error message.
	pub error: String,
}
