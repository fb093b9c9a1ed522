// SPDX-License-Identifier: Apache-2.0

use super::{types::*, SecurityAccess};
use crate::{
    error::{Error, NativeError, Result},
    transport::{Binder, SecurityService},
};

const SIGN_CHALLENGE: &str = "signChallenge";
const FETCH_CERTS: &str = "getBMWCerts";

impl<B: Binder> SecurityAccess<B> {
    /// Signs `challenge` through the named, connected security service.
    ///
    /// An empty challenge is rejected with [`Error::InvalidArgument`]
    /// before anything else is checked. A native failure is reported as
    /// [`Error::InvalidArgument`] when the primitive rejected the input and
    /// as [`Error::NativeCallFailed`] otherwise.
    pub fn sign_challenge(&self, service_name: &str, challenge: &[u8]) -> Result<SignedChallenge> {
        if challenge.is_empty() {
            return Err(Error::InvalidArgument {
                function: SIGN_CHALLENGE,
                reason: "challenge must not be empty".to_string(),
            });
        }

        let handle = self.connected_handle(service_name)?;
        tracing::debug!(service = service_name, len = challenge.len(), "signing challenge");

        let response = handle
            .sign_challenge(service_name, challenge)
            .map_err(|e| Error::from_native(SIGN_CHALLENGE, e))?;

        if response.len() != SIGNED_CHALLENGE_LEN {
            return Err(Error::NativeCallFailed {
                function: SIGN_CHALLENGE,
                cause: NativeError::UnexpectedLength {
                    expected: SIGNED_CHALLENGE_LEN,
                    actual: response.len(),
                },
            });
        }

        Ok(SignedChallenge::new(response))
    }

    /// Exports the vehicle certificate bundle from the first connected
    /// service, in registry order.
    pub fn fetch_bmw_certs(&self) -> Result<Vec<u8>> {
        let (service, handle) = self.connected().next().ok_or(Error::NotConnected(None))?;
        tracing::debug!(%service, "fetching vehicle certificates");
        handle
            .fetch_cert_bundle()
            .map_err(|e| Error::from_native(FETCH_CERTS, e))
    }

    /// Exports the vehicle certificate bundle from the named service.
    pub fn fetch_bmw_certs_from(&self, service_name: &str) -> Result<Vec<u8>> {
        let handle = self.connected_handle(service_name)?;
        tracing::debug!(service = service_name, "fetching vehicle certificates");
        handle
            .fetch_cert_bundle()
            .map_err(|e| Error::from_native(FETCH_CERTS, e))
    }
}
