// SPDX-License-Identifier: Apache-2.0

//! Utilities for adhering to a cached trust chain convention.
//!
//! Merging a chain needs a live connection to a security service, so a
//! merged chain can be cached and reused. The search path is:
//!   1. The path specified in the "IDRIVE_SECURITY_CHAIN" environment
//!      variable (if present).
//!   2. `$HOME/.cache/idrive-security/chain`
//!   3. `/var/cache/idrive-security/chain`

use crate::{certs::Chain, error::Result};

use std::{
    env,
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use codicon::{Decoder, Encoder};

/// The environment variable overriding the cache location.
pub const ENV_VAR: &str = "IDRIVE_SECURITY_CHAIN";

fn append_rest<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut path = path.as_ref().to_path_buf();
    path.push("idrive-security");
    path.push("chain");
    path
}

/// Returns the path stored in the optional `IDRIVE_SECURITY_CHAIN`
/// environment variable.
pub fn env_var() -> Option<PathBuf> {
    env::var_os(ENV_VAR).map(PathBuf::from)
}

/// Returns the "user-level" search path for the cached chain
/// (`$HOME/.cache/idrive-security/chain`).
pub fn home() -> Option<PathBuf> {
    dirs::cache_dir().map(append_rest)
}

/// Returns the "system-level" search path for the cached chain
/// (`/var/cache/idrive-security/chain`).
pub fn sys() -> Option<PathBuf> {
    let sys = PathBuf::from("/var/cache");
    if sys.exists() {
        Some(append_rest(sys))
    } else {
        None
    }
}

/// Returns the list of search paths in the order that they
/// will be searched for the cached chain.
pub fn path() -> Vec<PathBuf> {
    vec![env_var(), home(), sys()]
        .into_iter()
        .flatten()
        .collect()
}

/// Searches for and decodes a cached chain.
pub fn get() -> Result<Chain> {
    let not_found: std::io::Error = ErrorKind::NotFound.into();

    let paths: Vec<_> = path().into_iter().filter(|p| p.exists()).collect();
    let file_name = paths.first().ok_or(not_found)?;
    tracing::debug!(path = %file_name.display(), "loading cached chain");
    let mut file = File::open(file_name)?;
    Chain::decode(&mut file, ())
}

/// Writes `chain` to the first search path, creating its directory.
/// Returns where it was written.
pub fn store(chain: &Chain) -> Result<PathBuf> {
    let not_found: std::io::Error = ErrorKind::NotFound.into();

    let file_name = path().into_iter().next().ok_or(not_found)?;
    if let Some(parent) = file_name.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&file_name)?;
    chain.encode(&mut file, ())?;
    tracing::debug!(path = %file_name.display(), len = chain.len(), "stored chain");
    Ok(file_name)
}
