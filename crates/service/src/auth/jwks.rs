use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::AuthError;

/// One entry of a JSON Web Key Set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x5c: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl Jwk {
    /// RSA signature key with a kid and usable material.
    pub fn is_signing_key(&self) -> bool {
        self.key_use.as_deref() == Some("sig")
            && self.kty.as_deref() == Some("RSA")
            && self.kid.is_some()
            && (!self.x5c.is_empty() || (self.n.is_some() && self.e.is_some()))
    }

    /// Modulus/exponent when present, otherwise the key inside the first certificate.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if let (Some(n), Some(e)) = (&self.n, &self.e) {
            return DecodingKey::from_rsa_components(n, e).map_err(|e| AuthError::InvalidKey(e.to_string()));
        }
        let cert = self
            .x5c
            .first()
            .ok_or_else(|| AuthError::InvalidKey("key has neither n/e nor x5c".into()))?;
        let der = STANDARD
            .decode(cert.trim())
            .map_err(|e| AuthError::InvalidKey(format!("x5c is not base64: {e}")))?;
        let rsa = certificate_public_key(&der)
            .ok_or_else(|| AuthError::InvalidKey("x5c certificate has no RSA public key".into()))?;
        Ok(DecodingKey::from_rsa_der(rsa))
    }
}

/// A selected signing key, ready for verification.
pub struct SigningKey {
    pub kid: String,
    pub key: DecodingKey,
}

/// Pick the signing key whose kid matches.
pub fn find_signing_key(set: &JwkSet, kid: &str) -> Result<SigningKey, AuthError> {
    let jwk = set
        .keys
        .iter()
        .filter(|k| k.is_signing_key())
        .find(|k| k.kid.as_deref() == Some(kid))
        .ok_or_else(|| AuthError::NoMatchingKey(kid.to_string()))?;
    Ok(SigningKey { kid: kid.to_string(), key: jwk.decoding_key()? })
}

const DER_SEQUENCE: u8 = 0x30;
const DER_BIT_STRING: u8 = 0x03;
const DER_OID: u8 = 0x06;
const DER_EXPLICIT_VERSION: u8 = 0xa0;
/// 1.2.840.113549.1.1.1
const RSA_ENCRYPTION_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

/// Split one DER TLV off the front: (tag, content, rest).
fn der_next(input: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = input.split_first()?;
    let (&first, mut rest) = rest.split_first()?;
    let len = if first & 0x80 == 0 {
        first as usize
    } else {
        let n = (first & 0x7f) as usize;
        if n == 0 || n > 4 || rest.len() < n {
            return None;
        }
        let (len_bytes, tail) = rest.split_at(n);
        rest = tail;
        len_bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize)
    };
    if rest.len() < len {
        return None;
    }
    let (content, tail) = rest.split_at(len);
    Some((tag, content, tail))
}

/// PKCS#1 public key from an X.509 certificate's SubjectPublicKeyInfo.
fn certificate_public_key(cert: &[u8]) -> Option<&[u8]> {
    let (tag, cert, _) = der_next(cert)?;
    if tag != DER_SEQUENCE {
        return None;
    }
    let (tag, tbs, _) = der_next(cert)?;
    if tag != DER_SEQUENCE {
        return None;
    }
    // [0] version is optional; serial number follows it
    let (tag, _, rest) = der_next(tbs)?;
    let mut fields = if tag == DER_EXPLICIT_VERSION { der_next(rest)?.2 } else { rest };
    // signature algorithm, issuer, validity, subject
    for _ in 0..4 {
        fields = der_next(fields)?.2;
    }
    let (tag, spki, _) = der_next(fields)?;
    if tag != DER_SEQUENCE {
        return None;
    }
    // AlgorithmIdentifier must name rsaEncryption before the key bits mean PKCS#1
    let (tag, algorithm, rest) = der_next(spki)?;
    if tag != DER_SEQUENCE {
        return None;
    }
    match der_next(algorithm)? {
        (DER_OID, oid, _) if oid == RSA_ENCRYPTION_OID => {}
        _ => return None,
    }
    let (tag, bits, _) = der_next(rest)?;
    if tag != DER_BIT_STRING {
        return None;
    }
    match bits.split_first()? {
        (&0, key) => Some(key),
        _ => None,
    }
}

/// Where the issuer's key set comes from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<JwkSet, AuthError>;
}

/// Fetches the key set over HTTP with a shared client.
#[derive(Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
}

impl HttpKeySetSource {
    pub fn new(timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self, url: &str) -> Result<JwkSet, AuthError> {
        let set: JwkSet = common::fetch::fetch_json(&self.client, url)
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;
        debug!(url, keys = set.keys.len(), "jwks_fetched");
        Ok(set)
    }
}

/// Fixed key set, for tests and offline runs. Counts fetches.
#[derive(Debug, Default)]
pub struct StaticKeySetSource {
    set: JwkSet,
    fetches: AtomicUsize,
}

impl StaticKeySetSource {
    pub fn new(set: JwkSet) -> Self { Self { set, fetches: AtomicUsize::new(0) } }

    pub fn fetch_count(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

#[async_trait]
impl KeySetSource for StaticKeySetSource {
    async fn fetch(&self, _url: &str) -> Result<JwkSet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.set.clone())
    }
}
