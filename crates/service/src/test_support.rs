#![cfg(test)]
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sea_orm::DatabaseConnection;
use serde_json::{json, Map, Value};

use crate::auth::jwks::Jwk;

pub const TRUSTED_PEM: &str = include_str!("../tests/fixtures/rsa_trusted.pem");
pub const ROGUE_PEM: &str = include_str!("../tests/fixtures/rsa_rogue.pem");
/// Self-signed certificate over the trusted key, base64 DER as published in `x5c`.
pub const TRUSTED_X5C: &str = include_str!("../tests/fixtures/rsa_trusted.x5c");

/// Base64url modulus of `rsa_trusted.pem`; exponent is `AQAB`.
pub const TRUSTED_N: &str = "5eNFdGKoPZqXvZ6a9M185cE7fQoQ8rpUHMFz7vfxHZgNy26bNSFQZcLGeKY6sGSlf8V8759WtnyEOWfn7i0X1BgKpP86DH0eB-WFPpBaNBqoBpImL-1H4avkEse4NOCeCt4cTV4VcCtv4sGgzLM2guy2Gbuid-YE-mFnQPHd1ZOL_U9uTh9seViOELEQv_hjt4fNwrgxtdHM1V3asDRG2_ZKkNiYVqHPZCzL4TPp_sJevQM3IYuCQsHHcWEyYdQW097rbbPFb1_OErTadMxkswXuli7qhcm_f_lbIpxumXE8wPySEclrFbKYTAGShnPK_m5gai9Ifi_P4EEjWgy3OQ";

pub fn rsa_jwk(kid: &str, n: &str) -> Jwk {
    Jwk {
        kid: Some(kid.into()),
        kty: Some("RSA".into()),
        key_use: Some("sig".into()),
        alg: Some("RS256".into()),
        n: Some(n.into()),
        e: Some("AQAB".into()),
        x5c: Vec::new(),
    }
}

/// `sub` plus `iat`/`exp`, with `exp` offset from now (negative means already expired).
pub fn claims(sub: &str, exp_offset_secs: i64) -> Map<String, Value> {
    let now = Utc::now().timestamp();
    let mut map = Map::new();
    map.insert("sub".into(), json!(sub));
    map.insert("iat".into(), json!(now));
    map.insert("exp".into(), json!(now + exp_offset_secs));
    map
}

pub fn mint_token(kid: &str, pem: &str, claims: &Map<String, Value>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key");
    encode(&header, claims, &key).expect("encode token")
}

/// Migrated Postgres connection, or `None` when no database is reachable.
pub async fn live_db() -> Option<DatabaseConnection> {
    use migration::MigratorTrait;

    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match models::db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}
