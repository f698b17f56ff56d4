//! Seam between the attestation flow and the Nitro Secure Module driver.

use aws_nitro_enclaves_nsm_api as nsm;

use crate::types;

/// Something that implements the Nitro Secure Module endpoints. This is made
/// generic so mock providers can be subbed in for testing. In production use
/// [`Nsm`].
// https://github.com/aws/aws-nitro-enclaves-nsm-api/blob/main/docs/attestation_process.md
pub trait NsmProvider: Send + Sync {
	/// Send `request` to the NSM device referenced by `fd` and wait for the
	/// driver's response.
	fn nsm_process_request(
		&self,
		fd: i32,
		request: types::NsmRequest,
	) -> types::NsmResponse;

	/// Open the NSM device file, returning its descriptor.
	fn nsm_init(&self) -> i32;

	/// Close the NSM device file obtained from [`Self::nsm_init`].
	fn nsm_exit(&self, fd: i32);
}

/// The production Nitro Secure Module endpoints. Only meaningful inside a
/// measured enclave; everywhere else the driver is unreachable and requests
/// surface as errors.
pub struct Nsm;

impl NsmProvider for Nsm {
	fn nsm_process_request(
		&self,
		fd: i32,
		request: types::NsmRequest,
	) -> types::NsmResponse {
		nsm::driver::nsm_process_request(fd, request.into()).into()
	}

	fn nsm_init(&self) -> i32 {
		nsm::driver::nsm_init()
	}

	fn nsm_exit(&self, fd: i32) {
		nsm::driver::nsm_exit(fd);
	}
}
