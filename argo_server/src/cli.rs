//! Command line interface for the enclave server.

use std::net::IpAddr;

use argo_net::{DEFAULT_PROBE_PORT, DEFAULT_PROBE_TIMEOUT_MS};
use clap::Parser;

/// Attested enclave server: proves its code identity on demand and signs
/// the results it produces.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
	/// IP address this server should listen on.
	#[arg(long, default_value = "0.0.0.0")]
	pub host_ip: IpAddr,

	/// Port this server should listen on.
	#[arg(long, default_value_t = 3000)]
	pub host_port: u16,

	/// DNS resolver used for egress name resolution. Repeatable.
	#[arg(long = "dns-resolver", default_value = "8.8.8.8")]
	pub dns_resolvers: Vec<IpAddr>,

	/// Port of the DNS resolvers.
	#[arg(long, default_value_t = 53)]
	pub dns_port: u16,

	/// Port probed on each allowed domain during health checks.
	#[arg(long, default_value_t = DEFAULT_PROBE_PORT)]
	pub probe_port: u16,

	/// Per-domain reachability probe timeout in milliseconds.
	#[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
	pub probe_timeout_ms: u64,

	/// Serve attestations from the mock NSM instead of the Nitro device.
	/// Mock documents carry all-zero measurements and no platform
	/// signature; no verifier accepts them.
	#[cfg(feature = "mock")]
	#[arg(long)]
	pub mock_nsm: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_parse() {
		let cli = Cli::parse_from(["argo_server"]);
		assert_eq!(cli.host_port, 3000);
		assert_eq!(cli.probe_port, DEFAULT_PROBE_PORT);
		assert_eq!(cli.dns_resolvers, vec!["8.8.8.8".parse::<IpAddr>().unwrap()]);
	}

	#[test]
	fn flags_override_defaults() {
		let cli = Cli::parse_from([
			"argo_server",
			"--host-ip",
			"127.0.0.1",
			"--host-port",
			"8080",
			"--probe-timeout-ms",
			"250",
		]);
		assert_eq!(cli.host_ip, "127.0.0.1".parse::<IpAddr>().unwrap());
		assert_eq!(cli.host_port, 8080);
		assert_eq!(cli.probe_timeout_ms, 250);
	}
}
