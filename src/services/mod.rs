//! External service interactions
//!
//! This module contains services for interacting with external systems:
//! - Project file loading and saving
//! - Utterance dataset paging
//! - Background page fetching
//! - Authorization checks

pub mod authorization;
pub mod dataset;
pub mod fetch_runner;
pub mod project;

pub use authorization::{Authorizer, CapabilityAuthorizer, EDIT_RULES};
pub use dataset::{load_page, DatasetError, Page};
pub use fetch_runner::{FetchMessage, FetchRunner};
pub use project::{load_project, save_project, ProjectError};
