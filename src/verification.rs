use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::domain::{SubscriberEmail, VerificationCode};

/// What a verification code, once confirmed, will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationFlow {
    Register,
    Unsubscribe,
}

impl VerificationFlow {
    pub fn email_subject(&self) -> &'static str {
        match self {
            Self::Register => "Your Verification Code",
            Self::Unsubscribe => "Confirm Un-subscription",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No verification code was issued for this address.")]
    NotIssued,
    #[error("The verification code has expired.")]
    Expired,
    #[error("The verification code is invalid.")]
    InvalidCode,
}

struct PendingCode {
    code: VerificationCode,
    expires_at: DateTime<Utc>,
    attempts_left: u32,
}

/// Short-lived, single-use codes keyed by address and flow.
pub struct PendingVerifications {
    ttl: Duration,
    max_attempts: u32,
    pending: Mutex<HashMap<(SubscriberEmail, VerificationFlow), PendingCode>>,
}

impl PendingVerifications {
    pub fn new(ttl: std::time::Duration, max_attempts: u32) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
            max_attempts: max_attempts.max(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh code, replacing any code still pending for the same
    /// address and flow.
    #[tracing::instrument(name = "Issuing a verification code", skip(self))]
    pub async fn issue(&self, email: &SubscriberEmail, flow: VerificationFlow) -> VerificationCode {
        let now = Utc::now();
        let code = VerificationCode::generate();
        let mut pending = self.pending.lock().await;
        purge_expired(&mut pending, now);
        pending.insert(
            (email.clone(), flow),
            PendingCode {
                code,
                expires_at: now
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
                attempts_left: self.max_attempts,
            },
        );
        code
    }

    /// Consumes the pending code when it matches.
    #[tracing::instrument(name = "Checking a verification code", skip(self, code))]
    pub async fn verify(
        &self,
        email: &SubscriberEmail,
        flow: VerificationFlow,
        code: VerificationCode,
    ) -> Result<(), VerificationError> {
        let key = (email.clone(), flow);
        let now = Utc::now();
        let mut pending = self.pending.lock().await;
        if pending.get(&key).map_or(false, |entry| now >= entry.expires_at) {
            pending.remove(&key);
            return Err(VerificationError::Expired);
        }
        purge_expired(&mut pending, now);
        let entry = pending.get_mut(&key).ok_or(VerificationError::NotIssued)?;

        if entry.code != code {
            entry.attempts_left = entry.attempts_left.saturating_sub(1);
            if entry.attempts_left == 0 {
                tracing::warn!("Too many failed attempts, discarding the pending code.");
                pending.remove(&key);
            }
            return Err(VerificationError::InvalidCode);
        }
        pending.remove(&key);
        Ok(())
    }

    /// Withdraws `code` if it is still the pending one, e.g. when it could
    /// not be delivered.
    #[tracing::instrument(name = "Discarding a verification code", skip(self, code))]
    pub async fn discard(&self, email: &SubscriberEmail, flow: VerificationFlow, code: VerificationCode) {
        let key = (email.clone(), flow);
        let mut pending = self.pending.lock().await;
        if pending.get(&key).map_or(false, |entry| entry.code == code) {
            pending.remove(&key);
        }
    }

    #[cfg(test)]
    async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn purge_expired(pending: &mut HashMap<(SubscriberEmail, VerificationFlow), PendingCode>, now: DateTime<Utc>) {
    pending.retain(|_, entry| entry.expires_at > now);
}
