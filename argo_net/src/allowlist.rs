//! The compiled-in set of domains the enclave may reach.

use std::collections::BTreeSet;

use crate::error::EgressError;

/// Immutable set of allowed egress domains. The raw list is fixed at image
/// build time (the server embeds it with `include_str!`), so changing it
/// produces a different measured artifact and different PCRs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowlist {
	domains: BTreeSet<String>,
}

impl Allowlist {
	/// Parse an allowlist from its build-time file contents: one entry per
	/// line, `#` comments and blank lines ignored, yaml-style `- ` list
	/// markers tolerated. Entries are domain names or IP literals, matched
	/// case-insensitively.
	pub fn parse(raw: &str) -> Result<Self, EgressError> {
		let mut domains = BTreeSet::new();
		for line in raw.lines() {
			let entry = line.trim();
			if entry.is_empty() || entry.starts_with('#') {
				continue;
			}
			let entry = entry.strip_prefix("- ").unwrap_or(entry).trim();

			let malformed = entry.is_empty()
				|| entry.contains('/')
				|| entry.contains("://")
				|| entry.chars().any(char::is_whitespace);
			if malformed {
				return Err(EgressError::InvalidAllowlistEntry(
					entry.to_string(),
				));
			}

			domains.insert(entry.to_ascii_lowercase());
		}

		Ok(Self { domains })
	}

	/// Whether `domain` is allowed.
	#[must_use]
	pub fn contains(&self, domain: &str) -> bool {
		self.domains.contains(&domain.to_ascii_lowercase())
	}

	/// The allowed domains, in stable order.
	pub fn domains(&self) -> impl Iterator<Item = &str> {
		self.domains.iter().map(String::as_str)
	}

	/// Number of allowed domains.
	#[must_use]
	pub fn len(&self) -> usize {
		self.domains.len()
	}

	/// Whether the allowlist is empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.domains.is_empty()
	}
}
