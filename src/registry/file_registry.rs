use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{RegistryError, SubscriberRegistry};
use crate::domain::SubscriberEmail;

/// Registry stored as a plain-text file, one address per line.
///
/// Every operation holds `lock` from its first read to its last write, so
/// concurrent requests within the process cannot lose each other's updates.
/// Removals go through a temporary file and a rename.
pub struct FileSubscriberRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSubscriberRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_contents(&self) -> Result<String, RegistryError> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|source| RegistryError::Read {
                path: self.path.clone(),
                source,
            })
    }

    async fn append_address(
        &self,
        contents: &str,
        email: &SubscriberEmail,
    ) -> Result<(), RegistryError> {
        let mut line = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(email.as_ref());
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.write_error(source))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.write_error(source))?;
        file.flush().await.map_err(|source| self.write_error(source))
    }

    async fn replace_contents(&self, contents: String) -> Result<(), RegistryError> {
        let temporary_path = self.temporary_path();
        fs::write(&temporary_path, contents)
            .await
            .map_err(|source| self.write_error(source))?;
        fs::rename(&temporary_path, &self.path)
            .await
            .map_err(|source| self.write_error(source))
    }

    fn temporary_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }

    fn write_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn stored_addresses(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

#[async_trait]
impl SubscriberRegistry for FileSubscriberRegistry {
    #[tracing::instrument(name = "Initializing the subscriber registry", skip(self), fields(path = %self.path.display()))]
    async fn initialize(&self) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().await;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.write_error(source))?;
        Ok(())
    }

    #[tracing::instrument(name = "Registering a subscriber", skip(self), fields(subscriber_email = %email))]
    async fn register(&self, email: &SubscriberEmail) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().await;
        let contents = self.read_contents().await?;
        if stored_addresses(&contents).any(|stored| stored == email.as_ref()) {
            tracing::info!("Subscriber is already registered.");
            return Ok(());
        }
        self.append_address(&contents, email).await
    }

    #[tracing::instrument(name = "Unsubscribing a subscriber", skip(self), fields(subscriber_email = %email))]
    async fn unsubscribe(&self, email: &SubscriberEmail) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().await;
        let contents = self.read_contents().await?;
        let remaining: Vec<&str> = stored_addresses(&contents)
            .filter(|stored| *stored != email.as_ref())
            .collect();
        if remaining.len() == stored_addresses(&contents).count() {
            tracing::info!("Subscriber was not registered.");
            return Ok(());
        }
        let mut updated = remaining.join("\n");
        if !updated.is_empty() {
            updated.push('\n');
        }
        self.replace_contents(updated).await
    }

    #[tracing::instrument(name = "Checking a subscriber", skip(self), fields(subscriber_email = %email))]
    async fn is_registered(&self, email: &SubscriberEmail) -> Result<bool, RegistryError> {
        let _guard = self.lock.lock().await;
        let contents = self.read_contents().await?;
        let found = stored_addresses(&contents).any(|stored| stored == email.as_ref());
        Ok(found)
    }

    #[tracing::instrument(name = "Listing subscribers", skip(self))]
    async fn list_subscribers(
        &self,
    ) -> Result<Vec<Result<SubscriberEmail, anyhow::Error>>, RegistryError> {
        let _guard = self.lock.lock().await;
        let contents = self.read_contents().await?;
        let subscribers = stored_addresses(&contents)
            .map(|stored| SubscriberEmail::parse(stored.to_string()).map_err(|e| anyhow!(e)))
            .collect();
        Ok(subscribers)
    }
}
