//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime` without depending directly on `common`.

use std::path::Path;

/// Ensure the directory holding the file-backed task store exists.
pub async fn ensure_store_dir(store_file: &Path) -> anyhow::Result<()> {
    common::env::ensure_parent_dir(store_file).await
}
