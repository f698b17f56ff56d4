//! Entry point for the enclave server binary.

use std::{net::SocketAddr, time::Duration};

use argo_identity::EphemeralPair;
use argo_net::{Allowlist, EgressChannel};
use argo_nsm::NsmProvider;
use argo_server::{
	cli::Cli,
	host::{AppState, EnclaveServer},
	ALLOWED_ENDPOINTS, CRATE_VERSION,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let cli = Cli::parse();

	// Boot-time fatal: the process must not serve any endpoint without a
	// valid identity.
	let identity = EphemeralPair::generate()
		.expect("failed to generate the enclave identity from the OS CSPRNG");

	let allowlist = Allowlist::parse(ALLOWED_ENDPOINTS)
		.expect("the compiled-in allowed endpoints file is malformed");
	let egress =
		EgressChannel::new(allowlist, cli.dns_resolvers.clone(), cli.dns_port);

	let attestor = attestor(&cli);

	tracing::info!(
		version = CRATE_VERSION,
		pk = %identity.public_key_hex(),
		allowed_domains = egress.allowlist().len(),
		"enclave identity generated"
	);

	let state = AppState::new(
		identity,
		attestor,
		egress,
		cli.probe_port,
		Duration::from_millis(cli.probe_timeout_ms),
	);

	let addr = SocketAddr::new(cli.host_ip, cli.host_port);
	EnclaveServer::new(addr, state).serve().await;
}

#[cfg(feature = "mock")]
fn attestor(cli: &Cli) -> Box<dyn NsmProvider> {
	if cli.mock_nsm {
		tracing::warn!(
			"using the mock NSM: attestations carry zero measurements and \
			 prove nothing"
		);
		Box::new(argo_nsm::mock::MockNsm)
	} else {
		Box::new(argo_nsm::Nsm)
	}
}

#[cfg(not(feature = "mock"))]
fn attestor(_cli: &Cli) -> Box<dyn NsmProvider> {
	Box::new(argo_nsm::Nsm)
}
