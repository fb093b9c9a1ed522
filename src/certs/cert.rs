// SPDX-License-Identifier: Apache-2.0

use der::{Decode, EncodePem, Tag, Tagged};
use sha2::{Digest, Sha256};
use spki::ObjectIdentifier;
use std::io::{self, ErrorKind, Result};
use x509_cert::der; // re-export of der crate
use x509_cert::spki; // re-export of spki crate

/// Subject attribute `commonName` (RFC 4519).
const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// A parsed X.509 certificate that keeps the exact bytes it was parsed
/// from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Certificate {
    cert: x509_cert::Certificate,
    raw: Vec<u8>,
}

impl Certificate {
    pub(crate) fn from_parts(cert: x509_cert::Certificate, raw: Vec<u8>) -> Self {
        Self { cert, raw }
    }

    /// Gets a reference to the X509 certificate inside
    pub fn cert(&self) -> &x509_cert::Certificate {
        &self.cert
    }

    /// Create a Certificate from a single DER-encoded X509 structure.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = x509_cert::Certificate::from_der(der)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, format!("invalid DER: {}", e)))?;
        Ok(Self::from_parts(cert, der.to_vec()))
    }

    /// The DER bytes this certificate was parsed from.
    pub fn as_der(&self) -> &[u8] {
        &self.raw
    }

    /// Serialize a Certificate struct to PEM.
    pub fn to_pem(&self) -> Result<String> {
        self.cert
            .to_pem(der::pem::LineEnding::LF)
            .map_err(|e| io::Error::other(format!("PEM-encoding failed: {}", e)))
    }

    /// The subject common name, if the subject carries one.
    pub fn common_name(&self) -> Option<String> {
        self.cert
            .tbs_certificate
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == COMMON_NAME_OID)
            .and_then(|atv| directory_string(atv.value.tag(), atv.value.value()))
    }

    /// SHA-256 over the DER bytes.
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(&self.raw).into()
    }

    /// [`fingerprint`](Self::fingerprint) as lowercase hex.
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }
}

impl From<Certificate> for x509_cert::Certificate {
    fn from(value: Certificate) -> Self {
        value.cert
    }
}

/// Decodes the string choices X.520 allows for naming attributes.
fn directory_string(tag: Tag, bytes: &[u8]) -> Option<String> {
    match tag {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(bytes).ok().map(str::to_string)
        }
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}
