use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::domain::VerifiedIdentity;
use super::errors::AuthError;
use super::jwks::{find_signing_key, KeySetSource};

/// Where keys come from and which claims a token must carry.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub jwks_url: String,
    pub algorithm: Algorithm,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

impl VerifierConfig {
    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self {
            jwks_url: cfg.jwks_url.clone(),
            algorithm: Algorithm::RS256,
            issuer: cfg.issuer.clone().filter(|s| !s.is_empty()),
            audience: cfg.audience.clone().filter(|s| !s.is_empty()),
            leeway_secs: cfg.leeway_secs,
        }
    }
}

/// Token from an `Authorization: Bearer <token>` value; the scheme is case-insensitive.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingHeader)?;
    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::InvalidHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidHeader);
    }
    Ok(token)
}

/// Verifies RS256 bearer tokens against the configured issuer's key set.
#[derive(Clone)]
pub struct TokenVerifier {
    source: Arc<dyn KeySetSource>,
    cfg: VerifierConfig,
}

impl TokenVerifier {
    pub fn new(source: Arc<dyn KeySetSource>, cfg: VerifierConfig) -> Self { Self { source, cfg } }

    pub fn config(&self) -> &VerifierConfig { &self.cfg }

    /// Verify the raw `Authorization` header value.
    pub async fn verify_header(&self, header: Option<&str>) -> Result<VerifiedIdentity, AuthError> {
        let token = extract_bearer_token(header)?;
        self.verify(token).await
    }

    /// Verify `token`; the key set is fetched on every call.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let set = self.source.fetch(&self.cfg.jwks_url).await?;
        let signing = find_signing_key(&set, &kid)?;

        let mut validation = Validation::new(self.cfg.algorithm);
        validation.leeway = self.cfg.leeway_secs;
        validation.validate_nbf = true;
        if let Some(issuer) = &self.cfg.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.cfg.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Map<String, Value>>(token, &signing.key, &validation)
            .map_err(|e| AuthError::Verification(e.to_string()))?;
        let subject = data
            .claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSubject)?
            .to_string();
        debug!(kid = %signing.kid, subject = %subject, "token_verified");
        Ok(VerifiedIdentity { subject, claims: data.claims })
    }
}
