//! Server state, router and request handlers.

use std::{
	net::SocketAddr,
	sync::Arc,
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use argo_identity::EphemeralPair;
use argo_intent::{sign_intent, IntentError, IntentScope, SignedResponse};
use argo_net::EgressChannel;
use argo_nsm::NsmProvider;
use axum::{
	extract::State,
	routing::{get, post},
	Json, Router,
};

use crate::{
	AttestationResponse, Error, HealthCheckResponse, ProcessDataRequest,
	GET_ATTESTATION, HEALTH_CHECK, PROCESS_DATA,
};

/// Read-only resources shared across request handlers. The identity is
/// created once at boot and never mutated, so no locking is needed.
pub struct AppState {
	identity: EphemeralPair,
	attestor: Box<dyn NsmProvider>,
	egress: EgressChannel,
	probe_port: u16,
	probe_timeout: Duration,
}

impl AppState {
	/// Assemble the shared state from boot-time resources.
	pub fn new(
		identity: EphemeralPair,
		attestor: Box<dyn NsmProvider>,
		egress: EgressChannel,
		probe_port: u16,
		probe_timeout: Duration,
	) -> Self {
		Self { identity, attestor, egress, probe_port, probe_timeout }
	}
}

/// HTTP server running inside the enclave.
pub struct EnclaveServer {
	addr: SocketAddr,
	state: Arc<AppState>,
}

impl EnclaveServer {
	/// Create a new `EnclaveServer`. See [`Self::serve`] for starting it.
	pub fn new(addr: SocketAddr, state: AppState) -> Self {
		Self { addr, state: Arc::new(state) }
	}

	/// Start the server, running indefinitely.
	///
	/// # Panics
	///
	/// Panics if there is an issue starting the server.
	pub async fn serve(self) {
		let app = router(self.state);

		tracing::info!("EnclaveServer listening on {}", self.addr);

		axum::Server::bind(&self.addr)
			.serve(app.into_make_service())
			.await
			.expect("server failed to start");
	}
}

/// Build the application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
	Router::new()
		.route(GET_ATTESTATION, get(get_attestation))
		.route(HEALTH_CHECK, get(health_check))
		.route(PROCESS_DATA, post(process_data))
		.with_state(state)
}

/// Issue a fresh attestation document bound to the enclave public key.
async fn get_attestation(
	State(state): State<Arc<AppState>>,
) -> Result<Json<AttestationResponse>, Error> {
	tracing::info!("attestation requested");

	let public_key = state.identity.public_key_bytes();
	// The NSM request is a blocking ioctl against the host boundary.
	let document = tokio::task::spawn_blocking(move || {
		argo_nsm::attestation_doc(state.attestor.as_ref(), &public_key)
	})
	.await
	.map_err(|e| Error::internal(format!("attestation task failed: {e}")))?
	.map_err(|e| {
		Error::unavailable(format!("attestation unavailable: {e:?}"))
	})?;

	Ok(Json(AttestationResponse { attestation: hex::encode(document) }))
}

/// Report the enclave public key and per-domain egress reachability.
async fn health_check(
	State(state): State<Arc<AppState>>,
) -> Json<HealthCheckResponse> {
	tracing::info!("health check requested");

	let endpoints_status = state
		.egress
		.check_reachability(state.probe_port, state.probe_timeout)
		.await
		.into_iter()
		.collect();

	Json(HealthCheckResponse {
		pk: state.identity.public_key_hex(),
		endpoints_status,
	})
}

/// Run the application logic over the payload and sign the result.
///
/// Signing is all-or-nothing: any failure before the signing call returns
/// early and no partial response is ever produced.
async fn process_data(
	State(state): State<Arc<AppState>>,
	Json(request): Json<ProcessDataRequest>,
) -> Result<Json<SignedResponse>, Error> {
	tracing::info!("process data requested");

	// The bundled application logic signs the canonical JSON bytes of the
	// payload. A real deployment replaces this with its own computation;
	// an upstream failure there must return before signing, exactly as the
	// serialization failure does here.
	let data = serde_json::to_vec(&request.payload)
		.map_err(|e| Error::bad_request(format!("invalid payload: {e}")))?;

	let signed = sign_intent(
		&state.identity,
		IntentScope::ProcessData,
		unix_ms()?,
		data,
	)
	.map_err(|e| match e {
		IntentError::OversizedData(_)
		| IntentError::UnknownIntent(_)
		| IntentError::UnknownIntentName(_) => {
			Error::bad_request(format!("{e:?}"))
		}
		other => Error::internal(format!("signing failed: {other:?}")),
	})?;

	Ok(Json(signed))
}

fn unix_ms() -> Result<u64, Error> {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|e| Error::internal(format!("system clock error: {e}")))
		.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
	use argo_identity::PublicVerifier;
	use argo_net::Allowlist;
	use argo_nsm::mock::MockNsm;
	use aws_nitro_enclaves_nsm_api::api::AttestationDoc;
	use axum::{
		body::Body,
		http::{Request, StatusCode},
	};
	use tower::ServiceExt;

	use super::*;
	use crate::ALLOWED_ENDPOINTS;

	fn test_router(allowed: &str) -> (Router, String) {
		let identity = EphemeralPair::generate().unwrap();
		let pk_hex = identity.public_key_hex();

		let egress = EgressChannel::new(
			Allowlist::parse(allowed).unwrap(),
			vec![],
			53,
		);
		let state = AppState::new(
			identity,
			Box::new(MockNsm),
			egress,
			// Probe a port that is almost certainly closed; reachability
			// values are not what these tests assert on.
			1,
			Duration::from_millis(500),
		);

		(router(Arc::new(state)), pk_hex)
	}

	async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
		let response = app.oneshot(request).await.unwrap();
		let status = response.status();
		let body = hyper::body::to_bytes(response.into_body())
			.await
			.unwrap()
			.to_vec();
		(status, body)
	}

	#[test]
	fn allowed_endpoints_file_parses_and_is_not_empty() {
		let allowlist = Allowlist::parse(ALLOWED_ENDPOINTS).unwrap();
		assert!(!allowlist.is_empty());
	}

	#[tokio::test]
	async fn get_attestation_returns_document_bound_to_identity() {
		let (app, pk_hex) = test_router("127.0.0.1");

		let request = Request::builder()
			.uri(GET_ATTESTATION)
			.body(Body::empty())
			.unwrap();
		let (status, body) = send(app, request).await;
		assert_eq!(status, StatusCode::OK);

		let response: crate::AttestationResponse =
			serde_json::from_slice(&body).unwrap();
		let document = hex::decode(response.attestation).unwrap();
		let doc = AttestationDoc::from_binary(&document).unwrap();

		assert_eq!(hex::encode(doc.public_key.unwrap()), pk_hex);
	}

	#[tokio::test]
	async fn health_check_reports_pk_and_every_allowed_domain() {
		let (app, pk_hex) = test_router("127.0.0.1");

		let request = Request::builder()
			.uri(HEALTH_CHECK)
			.body(Body::empty())
			.unwrap();
		let (status, body) = send(app, request).await;
		assert_eq!(status, StatusCode::OK);

		let response: crate::HealthCheckResponse =
			serde_json::from_slice(&body).unwrap();
		assert_eq!(response.pk, pk_hex);
		assert_eq!(response.endpoints_status.len(), 1);
		assert!(response.endpoints_status.contains_key("127.0.0.1"));
	}

	#[tokio::test]
	async fn process_data_returns_a_verifiable_signed_response() {
		let (app, pk_hex) = test_router("127.0.0.1");

		let request = Request::builder()
			.method("POST")
			.uri(PROCESS_DATA)
			.header("content-type", "application/json")
			.body(Body::from(r#"{"payload":{"name":"alice"}}"#))
			.unwrap();
		let (status, body) = send(app, request).await;
		assert_eq!(status, StatusCode::OK);

		let signed: SignedResponse = serde_json::from_slice(&body).unwrap();
		assert_eq!(signed.response.intent, IntentScope::ProcessData);
		assert_eq!(signed.response.data, br#"{"name":"alice"}"#.to_vec());

		let verifier = PublicVerifier::from_hex(&pk_hex).unwrap();
		assert!(signed.verify(&verifier).is_ok());
	}

	#[tokio::test]
	async fn process_data_rejects_a_malformed_body_before_signing() {
		let (app, _) = test_router("127.0.0.1");

		let request = Request::builder()
			.method("POST")
			.uri(PROCESS_DATA)
			.header("content-type", "application/json")
			.body(Body::from(r#"{"wrong_key": 1}"#))
			.unwrap();
		let (status, _) = send(app, request).await;
		assert!(status.is_client_error());
	}
}
