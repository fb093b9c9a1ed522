// SPDX-License-Identifier: Apache-2.0

//! Vehicle and app certificate handling.
//!
//! The vehicle exports its certificates as a bundle; each companion app
//! ships its own. A head unit only trusts an app whose chain contains
//! the app certificate followed by the vehicle-issued ones, so the two
//! bundles are merged into a single [`Chain`] before use.

mod cert;
mod chain;

pub use cert::Certificate;
pub use chain::{build_trust_chain, get_cn, load_certs, merge_bmw_cert, Chain};
