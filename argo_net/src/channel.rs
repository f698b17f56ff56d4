//! The single sanctioned egress path plus reachability probing: allowlist
//! check, DNS resolution and TCP connection.

use std::{
	collections::HashMap,
	net::{IpAddr, SocketAddr},
	time::Duration,
};

use hickory_resolver::{
	config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
	name_server::TokioConnectionProvider,
	TokioResolver,
};
use tokio::{net::TcpStream, task::JoinSet};

use crate::{allowlist::Allowlist, error::EgressError};

/// Port probed during reachability checks.
pub const DEFAULT_PROBE_PORT: u16 = 443;
/// Per-domain reachability probe timeout in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;

/// The only path from the enclave to the outside world. Every connect is
/// gated on the allowlist before resolution; there is no bypass.
#[derive(Debug, Clone)]
pub struct EgressChannel {
	allowlist: Allowlist,
	dns_resolvers: Vec<IpAddr>,
	dns_port: u16,
}

impl EgressChannel {
	/// Create a channel gated on `allowlist`, resolving names against the
	/// given DNS resolver addresses.
	#[must_use]
	pub fn new(
		allowlist: Allowlist,
		dns_resolvers: Vec<IpAddr>,
		dns_port: u16,
	) -> Self {
		Self { allowlist, dns_resolvers, dns_port }
	}

	/// The allowlist this channel enforces.
	#[must_use]
	pub fn allowlist(&self) -> &Allowlist {
		&self.allowlist
	}

	/// Open a TCP connection to `(domain, port)`.
	///
	/// Fails closed with [`EgressError::DomainNotAllowed`] before any DNS
	/// query is made if `domain` is not in the allowlist.
	pub async fn connect(
		&self,
		domain: &str,
		port: u16,
	) -> Result<TcpStream, EgressError> {
		if !self.allowlist.contains(domain) {
			return Err(EgressError::DomainNotAllowed(domain.to_string()));
		}

		let ip = self.resolve(domain).await?;
		let stream = TcpStream::connect(SocketAddr::new(ip, port)).await?;
		Ok(stream)
	}

	/// Probe every allowed domain concurrently and report which are
	/// reachable through this channel.
	///
	/// The result has exactly one entry per configured domain. Each probe
	/// is a TCP connect to `(domain, probe_port)` bounded by its own
	/// `probe_timeout`; a failed or timed-out probe reads as `false`
	/// without aborting the others, and the call returns once all probes
	/// resolve.
	pub async fn check_reachability(
		&self,
		probe_port: u16,
		probe_timeout: Duration,
	) -> HashMap<String, bool> {
		// Seed with `false` so a domain is present in the result no matter
		// how its probe ends.
		let mut status: HashMap<String, bool> = self
			.allowlist
			.domains()
			.map(|domain| (domain.to_string(), false))
			.collect();

		let mut probes = JoinSet::new();
		for domain in self.allowlist.domains() {
			let domain = domain.to_string();
			let channel = self.clone();
			probes.spawn(async move {
				let reachable = match tokio::time::timeout(
					probe_timeout,
					channel.connect(&domain, probe_port),
				)
				.await
				{
					Ok(Ok(_stream)) => true,
					Ok(Err(e)) => {
						tracing::warn!(
							%domain,
							error = ?e,
							"reachability probe failed"
						);
						false
					}
					Err(_elapsed) => {
						tracing::warn!(
							%domain,
							?probe_timeout,
							"reachability probe timed out"
						);
						false
					}
				};
				(domain, reachable)
			});
		}

		while let Some(joined) = probes.join_next().await {
			if let Ok((domain, reachable)) = joined {
				status.insert(domain, reachable);
			}
		}

		status
	}

	async fn resolve(&self, domain: &str) -> Result<IpAddr, EgressError> {
		// IP literals skip DNS entirely.
		if let Ok(ip) = domain.parse() {
			return Ok(ip);
		}

		let resolver_config = ResolverConfig::from_parts(
			None,
			vec![],
			NameServerConfigGroup::from_ips_clear(
				&self.dns_resolvers,
				self.dns_port,
				true,
			),
		);

		// Keep resolution well under the probe timeout so a slow resolver
		// yields a meaningful per-domain failure.
		let mut resolver_opts = ResolverOpts::default();
		resolver_opts.timeout = Duration::from_secs(1);
		resolver_opts.attempts = 1;

		let resolver = TokioResolver::builder_with_config(
			resolver_config,
			TokioConnectionProvider::default(),
		)
		.with_options(resolver_opts)
		.build();

		let response =
			resolver.lookup_ip(domain).await.map_err(EgressError::from)?;
		response.iter().next().ok_or_else(|| {
			EgressError::DnsResolution(format!(
				"Empty response when querying for host {domain}"
			))
		})
	}
}
