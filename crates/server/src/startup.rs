use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::{AppConfig, StoreBackend};
use service::{
    attachments::{AttachmentStore, S3AttachmentStore},
    auth::{jwks::HttpKeySetSource, TokenVerifier, VerifierConfig},
    runtime,
    todo::{
        repo::{file::FileTodoRepository, seaorm::SeaOrmTodoRepository},
        TodoRepository, TodoService,
    },
};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

async fn build_repository(cfg: &AppConfig) -> Result<Arc<dyn TodoRepository>, StartupError> {
    match cfg.storage.backend {
        StoreBackend::File => {
            let path = cfg.storage.file_path.clone();
            runtime::ensure_store_dir(&path).await?;
            let repo = FileTodoRepository::new(path.clone())
                .await
                .map_err(|e| StartupError::Runtime(e.to_string()))?;
            info!(path = %path.display(), "using file-backed todo store");
            Ok(Arc::new(repo))
        }
        StoreBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None)
                .await
                .map_err(|e| StartupError::Runtime(format!("migrations failed: {e}")))?;
            info!("using postgres todo store");
            Ok(Arc::new(SeaOrmTodoRepository::new(db)))
        }
    }
}

/// Wire the store, the attachment signer and the token verifier from configuration.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let repo = build_repository(cfg).await?;
    let attachments: Arc<dyn AttachmentStore> = Arc::new(
        S3AttachmentStore::from_env(&cfg.attachments)
            .await
            .map_err(|e| StartupError::InvalidConfig(e.to_string()))?,
    );
    let source = HttpKeySetSource::new(Duration::from_secs(cfg.auth.jwks_timeout_secs))
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    let verifier = TokenVerifier::new(Arc::new(source), VerifierConfig::from_config(&cfg.auth));
    Ok(ServerState::new(TodoService::new(repo, attachments), verifier))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Public entry: build the app from `cfg` and serve until `shutdown` resolves.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, bucket = %cfg.attachments.bucket, jwks_url = %cfg.auth.jwks_url, "starting todo api");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Runtime(format!("bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(dir: &std::path::Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.storage.file_path = dir.join("nested").join("todos.json");
        cfg.attachments.bucket = "bucket".into();
        cfg.auth.jwks_url = "https://issuer.test/.well-known/jwks.json".into();
        cfg
    }

    #[tokio::test]
    async fn builds_file_backed_state_without_static_keys() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("todo_startup_{}", std::process::id()));
        let cfg = cfg(&dir);
        build_state(&cfg).await?;
        assert!(cfg.storage.file_path.exists());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn bad_attachments_endpoint_fails_startup() {
        let dir = std::env::temp_dir().join(format!("todo_startup_endpoint_{}", std::process::id()));
        let mut cfg = cfg(&dir);
        cfg.attachments.endpoint = Some("mailto:ops@example.com".into());
        let err = build_state(&cfg).await.err();
        assert!(matches!(err, Some(StartupError::InvalidConfig(_))));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn bind_addr_from_server_section() -> anyhow::Result<()> {
        let mut cfg = AppConfig::default();
        cfg.server.host = "127.0.0.1".into();
        cfg.server.port = 9090;
        assert_eq!(bind_addr(&cfg)?.to_string(), "127.0.0.1:9090");
        Ok(())
    }
}
