//! Store layer for the psychometric questionnaire application: answer key,
//! respondent entries, class roster/attendance and workspace backups.

pub mod backup;
pub mod config;
pub mod db;
mod document;
pub mod entries;
pub mod error;
pub mod ipc;
pub mod keys;
pub mod merge;
pub mod roster;
pub mod scoring;
pub mod workspace;

pub use error::{StoreError, StoreResult};
