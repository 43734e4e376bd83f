//! Server state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::CoverError;
use crate::merge::{AssetLocator, AssetResolver, HttpSigner, NoSigner};

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub signer: Arc<dyn AssetResolver>,
    pub locator: AssetLocator,
}

impl AppState {
    /// Build state from config. Uses [`HttpSigner`] when a signing endpoint
    /// is configured, [`NoSigner`] otherwise.
    pub fn new(config: ServerConfig) -> Result<Self, CoverError> {
        let signer: Arc<dyn AssetResolver> = match config.signing.endpoint {
            Some(_) => Arc::new(HttpSigner::new(&config.signing)?),
            None => {
                tracing::warn!("no signing endpoint configured; internal assets will not resolve");
                Arc::new(NoSigner)
            }
        };
        Ok(Self::with_signer(config, signer))
    }

    pub fn with_signer(config: ServerConfig, signer: Arc<dyn AssetResolver>) -> Self {
        let locator = AssetLocator::from_config(&config.signing);
        Self {
            config,
            signer,
            locator,
        }
    }
}
