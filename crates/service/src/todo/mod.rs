//! Todo module: three-layer architecture (domain, repository, service).
//!
//! Tasks are keyed by (owner, item); the owner is always the verified caller.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use repository::TodoRepository;
pub use service::TodoService;
