// SPDX-License-Identifier: Apache-2.0

//! Parsing and merging of certificate bundles.

use super::Certificate;
use crate::{
    access::SecurityAccess,
    error::{Error, Result},
    transport::{AppCertificateSource, Binder},
};

use der::{Decode, Reader, SliceReader};
use std::{
    collections::{HashMap, HashSet},
    io::{Read, Write},
};
use x509_cert::der; // re-export of der crate

const PEM_PREAMBLE: &[u8] = b"-----BEGIN";

/// Parses a bundle of concatenated DER or PEM certificates.
///
/// Returns `None` when the bundle cannot be parsed, which is different
/// from `Some` of an empty list for a well-formed bundle without entries.
pub fn load_certs(bundle: &[u8]) -> Option<Vec<Certificate>> {
    let start = bundle
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bundle.len());
    let trimmed = &bundle[start..];

    let certs = if trimmed.is_empty() {
        Some(Vec::new())
    } else if trimmed.starts_with(PEM_PREAMBLE) {
        load_pem(trimmed)
    } else {
        load_der(bundle)
    };

    if certs.is_none() {
        tracing::warn!(len = bundle.len(), "unparsable certificate bundle");
    }
    certs
}

fn load_pem(bundle: &[u8]) -> Option<Vec<Certificate>> {
    let certs = x509_cert::Certificate::load_pem_chain(bundle).ok()?;
    certs
        .into_iter()
        .map(|cert| {
            let raw = der::Encode::to_der(&cert).ok()?;
            Some(Certificate::from_parts(cert, raw))
        })
        .collect()
}

fn load_der(bundle: &[u8]) -> Option<Vec<Certificate>> {
    let mut reader = SliceReader::new(bundle).ok()?;
    let mut certs = Vec::new();

    while !reader.is_finished() {
        let start = usize::try_from(reader.position()).ok()?;
        let cert = x509_cert::Certificate::decode(&mut reader).ok()?;
        let end = usize::try_from(reader.position()).ok()?;
        certs.push(Certificate::from_parts(cert, bundle[start..end].to_vec()));
    }

    Some(certs)
}

/// Returns the subject common name of a certificate.
pub fn get_cn(cert: &Certificate) -> Option<String> {
    cert.common_name()
}

/// Drops every certificate whose common name was already seen; the first
/// one wins. Certificates without a common name are only dropped when
/// they are byte-identical to an earlier one.
fn dedup(certs: impl IntoIterator<Item = Certificate>) -> Vec<Certificate> {
    let mut by_cn: HashMap<String, [u8; 32]> = HashMap::new();
    let mut anonymous: HashSet<[u8; 32]> = HashSet::new();
    let mut merged = Vec::new();

    for cert in certs {
        let fingerprint = cert.fingerprint();
        match cert.common_name() {
            Some(cn) => {
                if let Some(kept) = by_cn.get(&cn) {
                    if *kept != fingerprint {
                        tracing::warn!(
                            cn = %cn,
                            kept = %hex::encode(kept),
                            dropped = %hex::encode(fingerprint),
                            "dropping certificate with duplicate common name"
                        );
                    }
                    continue;
                }
                by_cn.insert(cn, fingerprint);
            }
            None => {
                if !anonymous.insert(fingerprint) {
                    continue;
                }
            }
        }
        merged.push(cert);
    }

    merged
}

/// Merges an app certificate bundle with the vehicle bundle into one DER
/// bundle: app entries first, then vehicle entries, one certificate per
/// common name.
///
/// Returns `None` if either input cannot be parsed.
pub fn merge_bmw_cert(app_cert: &[u8], bmw_cert: &[u8]) -> Option<Vec<u8>> {
    Chain::merge(app_cert, bmw_cert).ok().map(|c| c.to_bundle())
}

/// An ordered certificate chain with unique common names.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Chain(Vec<Certificate>);

impl Chain {
    /// Parses a bundle and drops duplicate common names.
    pub fn from_bundle(bundle: &[u8]) -> Result<Self> {
        let certs = load_certs(bundle).ok_or(Error::ParseFailure)?;
        Ok(Self(dedup(certs)))
    }

    /// Builds the combined chain from an app bundle and a vehicle bundle.
    pub fn merge(app_cert: &[u8], bmw_cert: &[u8]) -> Result<Self> {
        let app = load_certs(app_cert).ok_or(Error::ParseFailure)?;
        let bmw = load_certs(bmw_cert).ok_or(Error::ParseFailure)?;
        let chain = Self(dedup(app.into_iter().chain(bmw)));

        tracing::debug!(len = chain.len(), "merged certificate chain");
        Ok(chain)
    }

    /// The certificates, leaf first.
    pub fn certificates(&self) -> &[Certificate] {
        &self.0
    }

    /// Common names in chain order; entries without one are skipped.
    pub fn common_names(&self) -> Vec<String> {
        self.0.iter().filter_map(Certificate::common_name).collect()
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no certificates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenated DER encoding of the chain.
    pub fn to_bundle(&self) -> Vec<u8> {
        self.0.iter().flat_map(|c| c.as_der()).copied().collect()
    }
}

impl IntoIterator for Chain {
    type Item = Certificate;
    type IntoIter = std::vec::IntoIter<Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl codicon::Decoder<()> for Chain {
    type Error = Error;

    fn decode(mut reader: impl Read, _: ()) -> Result<Self> {
        let mut bundle = Vec::new();
        reader.read_to_end(&mut bundle)?;
        Self::from_bundle(&bundle)
    }
}

impl codicon::Encoder<()> for Chain {
    type Error = Error;

    fn encode(&self, mut writer: impl Write, _: ()) -> Result<()> {
        for cert in &self.0 {
            writer.write_all(cert.as_der())?;
        }
        Ok(())
    }
}

/// Looks up the app's certificate, fetches the vehicle bundle from the
/// first connected security service and merges the two.
pub fn build_trust_chain<B, S>(access: &SecurityAccess<B>, apps: &S, app_id: &str) -> Result<Chain>
where
    B: Binder,
    S: AppCertificateSource + ?Sized,
{
    let app_cert = apps
        .lookup_app_certificate(app_id)
        .ok_or_else(|| Error::AppNotFound(app_id.to_string()))?;
    let bmw_cert = access.fetch_bmw_certs()?;

    Chain::merge(&app_cert, &bmw_cert)
}
