//! Service layer providing the todo use cases on top of models.
//! - Separates business logic from data access and object storage.
//! - Verifies bearer tokens against the issuer's key set.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod attachments;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
pub mod storage;
pub mod todo;
