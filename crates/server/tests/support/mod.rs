#![allow(dead_code)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};
use tower::Service;

use configs::AttachmentsConfig;
use server::routes::{self, ServerState};
use service::attachments::S3AttachmentStore;
use service::auth::jwks::{Jwk, JwkSet, KeySetSource, StaticKeySetSource};
use service::auth::{TokenVerifier, VerifierConfig};
use service::errors::ServiceError;
use service::todo::domain::{TodoItem, UpdateTodoRequest};
use service::todo::repository::mock::MemoryTodoRepository;
use service::todo::{TodoRepository, TodoService};

pub const TRUSTED_PEM: &str = include_str!("../fixtures/rsa_trusted.pem");
pub const ROGUE_PEM: &str = include_str!("../fixtures/rsa_rogue.pem");
pub const TRUSTED_N: &str = "5eNFdGKoPZqXvZ6a9M185cE7fQoQ8rpUHMFz7vfxHZgNy26bNSFQZcLGeKY6sGSlf8V8759WtnyEOWfn7i0X1BgKpP86DH0eB-WFPpBaNBqoBpImL-1H4avkEse4NOCeCt4cTV4VcCtv4sGgzLM2guy2Gbuid-YE-mFnQPHd1ZOL_U9uTh9seViOELEQv_hjt4fNwrgxtdHM1V3asDRG2_ZKkNiYVqHPZCzL4TPp_sJevQM3IYuCQsHHcWEyYdQW097rbbPFb1_OErTadMxkswXuli7qhcm_f_lbIpxumXE8wPySEclrFbKYTAGShnPK_m5gai9Ifi_P4EEjWgy3OQ";
pub const KID: &str = "trusted-key";
pub const BUCKET: &str = "todo-attachments";
pub const JWKS_URL: &str = "https://issuer.test/.well-known/jwks.json";

/// In-memory repository that counts every store access.
#[derive(Default)]
pub struct CountingRepository {
    inner: MemoryTodoRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn hit(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

#[async_trait]
impl TodoRepository for CountingRepository {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
        self.hit();
        self.inner.list_by_owner(owner_id).await
    }

    async fn insert(&self, item: TodoItem) -> Result<TodoItem, ServiceError> {
        self.hit();
        self.inner.insert(item).await
    }

    async fn update(&self, owner_id: &str, item_id: &str, update: &UpdateTodoRequest) -> Result<(), ServiceError> {
        self.hit();
        self.inner.update(owner_id, item_id, update).await
    }

    async fn set_attachment_url(&self, owner_id: &str, item_id: &str, url: &str) -> Result<(), ServiceError> {
        self.hit();
        self.inner.set_attachment_url(owner_id, item_id, url).await
    }

    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError> {
        self.hit();
        self.inner.delete(owner_id, item_id).await
    }
}

pub fn trusted_jwks() -> JwkSet {
    JwkSet {
        keys: vec![Jwk {
            kid: Some(KID.into()),
            kty: Some("RSA".into()),
            key_use: Some("sig".into()),
            alg: Some("RS256".into()),
            n: Some(TRUSTED_N.into()),
            e: Some("AQAB".into()),
            x5c: Vec::new(),
        }],
    }
}

pub fn attachments_config() -> AttachmentsConfig {
    AttachmentsConfig { bucket: BUCKET.into(), ..AttachmentsConfig::default() }
}

/// S3 client with fixed keys so presigning needs no network or ambient credentials.
pub fn s3_client(cfg: &AttachmentsConfig) -> aws_sdk_s3::Client {
    let conf = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(cfg.region.clone()))
        .credentials_provider(Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None, None, "tests"))
        .build();
    aws_sdk_s3::Client::from_conf(conf)
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<CountingRepository>,
}

/// App wired with an in-memory store, a real S3 signer and the given key source.
pub fn build_app_with(source: Arc<dyn KeySetSource>, jwks_url: &str) -> TestApp {
    let repo = Arc::new(CountingRepository::default());
    let cfg = attachments_config();
    let attachments = Arc::new(S3AttachmentStore::new(s3_client(&cfg), &cfg).expect("attachments config"));
    let todos = TodoService::new(repo.clone() as Arc<dyn TodoRepository>, attachments);
    let verifier = TokenVerifier::new(
        source,
        VerifierConfig {
            jwks_url: jwks_url.to_string(),
            algorithm: Algorithm::RS256,
            issuer: None,
            audience: None,
            leeway_secs: 0,
        },
    );
    let router = routes::build_router(ServerState::new(todos, verifier), tower_http::cors::CorsLayer::very_permissive());
    TestApp { router, repo }
}

pub fn build_app() -> TestApp {
    build_app_with(Arc::new(StaticKeySetSource::new(trusted_jwks())), JWKS_URL)
}

pub fn token_for(sub: &str) -> String {
    mint_token(KID, TRUSTED_PEM, sub, 3600)
}

pub fn mint_token(kid: &str, pem: &str, sub: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let mut claims = Map::new();
    claims.insert("sub".into(), json!(sub));
    claims.insert("iat".into(), json!(now));
    claims.insert("exp".into(), json!(now + exp_offset_secs));
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key");
    encode(&header, &claims, &key).expect("encode token")
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("origin", "https://app.example.com");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

/// Send through the router; returns status and parsed JSON body (`Null` when empty).
pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, json))
}
