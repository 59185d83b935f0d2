//! Logging utilities and structured logging support

use std::fmt;

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default level filter
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_with_level(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Per-import logging context
///
/// Carries the asset name and the verbosity chosen for one import. Verbose
/// detail is emitted at `info`, quiet detail at `trace`.
#[derive(Debug, Clone, Default)]
pub struct ImportLog {
    asset: String,
    verbose: bool,
}

impl ImportLog {
    /// Quiet log for an asset
    pub fn quiet(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            verbose: false,
        }
    }

    /// Verbose log for an asset
    pub fn verbose(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            verbose: true,
        }
    }

    /// Builder pattern: set verbosity
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Name of the asset being processed
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Whether verbose detail is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Processing detail
    pub fn detail(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            log::info!("[{}] {}", self.asset, args);
        } else {
            log::trace!("[{}] {}", self.asset, args);
        }
    }

    /// Recoverable problem with the asset
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!("[{}] {}", self.asset, args);
    }

    /// Misconfiguration that degrades processing
    pub fn error(&self, args: fmt::Arguments<'_>) {
        log::error!("[{}] {}", self.asset, args);
    }
}
