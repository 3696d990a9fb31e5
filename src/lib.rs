pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};
pub use config::{AppConfig, Credentials};

pub use crate::core::{
    bulk::BulkSender,
    chunker::Chunker,
    identity::IdentityProcessor,
    retry::{RetryClient, RetryPolicy},
    runner::BatchRunner,
    transport::ReqwestTransport,
};
pub use utils::error::{DedupeError, Result};
