//! Concrete `TodoRepository` backends.

pub mod file;
pub mod seaorm;
