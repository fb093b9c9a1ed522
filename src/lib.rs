// SPDX-License-Identifier: Apache-2.0

//! The `idrive-security` crate lets a companion app establish a trusted
//! channel to a BMW or Mini head unit.
//!
//! ## Security services
//!
//! The head unit only talks to apps that prove they are authorized. The
//! proof comes from a vendor security service shipped inside one of the
//! official Connected apps: it signs challenges from the car and exports
//! the vehicle certificates. Several variants of that service exist,
//! one per brand, region and app generation, and any of them may be
//! installed. The [services] module lists them; by default both the
//! `bmw` and the `mini` variants are compiled in:
//!
//! `idrive-security = { version = "0.3", default-features = false, features = ["bmw"] }`
//!
//! ## Security access
//!
//! [`access::SecurityAccess`] binds to every installed variant, tracks
//! which ones connected and forwards challenge signing and certificate
//! export to them. The platform IPC and the native signing primitive are
//! reached through the traits in the [transport] module.
//!
//! ## Certificates
//!
//! The [certs] module parses certificate bundles, extracts common names
//! and merges an app's certificate with the vehicle bundle into the chain
//! the head unit expects. Merged chains can be cached on disk with
//! [cached_chain].
//!
//! ## Remarks
//!
//! Diagnostics are emitted through [`tracing`]; this crate never installs
//! a subscriber.

#![deny(clippy::all)]
#![deny(missing_docs)]

pub mod access;

/// Vehicle and app certificates interface.
pub mod certs;

/// Error module.
pub mod error;

pub mod services;
pub mod transport;
mod util;

pub use util::cached_chain;

pub use access::{SecurityAccess, SignedChallenge, SIGNED_CHALLENGE_LEN};
pub use error::{Error, Result};
