// SPDX-License-Identifier: Apache-2.0

use crate::services::ServiceDescriptor;

use std::fmt;

/// The number of bytes in a signed challenge.
pub const SIGNED_CHALLENGE_LEN: usize = 512;

/// Where a single bind attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Not started.
    Idle,

    /// Bind requested, no outcome yet.
    Connecting,

    /// Bound; the attempt holds a handle.
    Connected,

    /// The bind failed or the service went away.
    Failed,
}

impl AttemptState {
    /// Whether no further transitions are expected without a new connect.
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptState::Idle | AttemptState::Failed)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttemptState::Idle => "idle",
            AttemptState::Connecting => "connecting",
            AttemptState::Connected => "connected",
            AttemptState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A bind attempt against one registry entry.
#[derive(Debug)]
pub struct ConnectionAttempt<H> {
    pub(crate) service: &'static ServiceDescriptor,
    pub(crate) state: AttemptState,
    pub(crate) handle: Option<H>,
}

impl<H> ConnectionAttempt<H> {
    pub(crate) fn new(service: &'static ServiceDescriptor) -> Self {
        Self {
            service,
            state: AttemptState::Idle,
            handle: None,
        }
    }

    /// The service being bound.
    pub fn service(&self) -> &'static ServiceDescriptor {
        self.service
    }

    /// The current state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// The service handle, present only while connected.
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }
}

/// A 512-byte response from the signing primitive.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedChallenge(Vec<u8>);

impl SignedChallenge {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), SIGNED_CHALLENGE_LEN);
        Self(bytes)
    }

    /// The status/version marker in the first byte. Not interpreted here.
    pub fn status(&self) -> u8 {
        self.0[0]
    }

    /// The raw response.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Always [`SIGNED_CHALLENGE_LEN`].
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; a response is always full size.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwraps the raw response.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for SignedChallenge {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SignedChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedChallenge {{ status: {:#04x}, len: {} }}",
            self.status(),
            self.len()
        )
    }
}
