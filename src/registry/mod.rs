mod file_registry;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;

pub use file_registry::FileSubscriberRegistry;

#[derive(thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read the subscriber registry at {path}.")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write the subscriber registry at {path}.")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl std::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The durable set of currently-subscribed email addresses.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    /// Prepares the backing store. Safe to call more than once.
    async fn initialize(&self) -> Result<(), RegistryError>;

    /// Adds the address. Registering an address twice stores it once.
    async fn register(&self, email: &SubscriberEmail) -> Result<(), RegistryError>;

    /// Removes the address. Removing an absent address is a no-op.
    async fn unsubscribe(&self, email: &SubscriberEmail) -> Result<(), RegistryError>;

    async fn is_registered(&self, email: &SubscriberEmail) -> Result<bool, RegistryError>;

    /// Every stored address. Entries that no longer parse are returned as
    /// errors so that callers can skip them.
    async fn list_subscribers(
        &self,
    ) -> Result<Vec<Result<SubscriberEmail, anyhow::Error>>, RegistryError>;
}
