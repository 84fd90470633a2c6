//! Object store access for task attachments.
//!
//! The service never touches object bytes; it only hands out signed URLs
//! that let the client `PUT` the object directly.

pub mod s3;

use async_trait::async_trait;

use crate::errors::ServiceError;

pub use s3::S3AttachmentStore;

/// Produces signed upload URLs and the matching public URL for an object key.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Time-limited URL permitting one `PUT` of `key`.
    async fn upload_url(&self, key: &str) -> Result<String, ServiceError>;
    /// Where the object can be read once uploaded.
    fn public_url(&self, key: &str) -> String;
}

/// Static URLs for tests and doc examples; never fails.
pub mod mock {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct StaticAttachmentStore {
        pub base: String,
    }

    impl Default for StaticAttachmentStore {
        fn default() -> Self { Self { base: "https://attachments.test".into() } }
    }

    #[async_trait]
    impl AttachmentStore for StaticAttachmentStore {
        async fn upload_url(&self, key: &str) -> Result<String, ServiceError> {
            Ok(format!("{}/{key}?signed=1", self.base))
        }

        fn public_url(&self, key: &str) -> String {
            format!("{}/{key}", self.base)
        }
    }

    /// Always refuses to sign.
    #[derive(Debug, Default, Clone)]
    pub struct FailingAttachmentStore;

    #[async_trait]
    impl AttachmentStore for FailingAttachmentStore {
        async fn upload_url(&self, _key: &str) -> Result<String, ServiceError> {
            Err(ServiceError::Storage("signing unavailable".into()))
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://attachments.test/{key}")
        }
    }
}
