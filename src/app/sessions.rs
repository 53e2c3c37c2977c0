//! In-memory send sessions: SMTP settings bound to a Sending campaign.
//!
//! Sessions live only as long as the process. A Sending campaign whose session
//! is gone (restart, or the trigger never registered one) is failed by the
//! dispatch loop.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use time::OffsetDateTime;

use crate::app::domain::SmtpSettings;

/// SMTP settings captured when a campaign was told to send.
#[derive(Debug, Clone)]
pub struct SendSession {
    pub campaign_id: String,
    pub settings: SmtpSettings,
    pub created_at: OffsetDateTime,
}

impl SendSession {
    pub fn new(campaign_id: impl Into<String>, settings: SmtpSettings) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            settings,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Time since the session was registered, in whole seconds.
    pub fn age_secs(&self, now: OffsetDateTime) -> i64 {
        (now - self.created_at).whole_seconds().max(0)
    }
}

/// Thread-safe campaign id -> session map. Cloning shares the same map;
/// construct one at startup and hand clones to the HTTP state and the
/// dispatcher.
#[derive(Debug, Clone, Default)]
pub struct SendSessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SendSession>>>,
}

impl SendSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the session for its campaign.
    pub fn upsert(&self, session: SendSession) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.campaign_id.clone(), session);
    }

    pub fn get(&self, campaign_id: &str) -> Option<SendSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(campaign_id).cloned()
    }

    /// Drop the session. Returns the removed session, if any.
    pub fn remove(&self, campaign_id: &str) -> Option<SendSession> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(campaign_id)
    }

    pub fn contains(&self, campaign_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.contains_key(campaign_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::EncryptionMode;

    fn settings(host: &str) -> SmtpSettings {
        SmtpSettings {
            host: host.to_string(),
            port: 587,
            username: None,
            password: None,
            encryption: EncryptionMode::StartTls,
            tls_hostname: None,
            allow_self_signed: false,
            override_from_name: None,
            override_from_address: None,
        }
    }

    #[test]
    fn upsert_get_remove() {
        let registry = SendSessionRegistry::new();
        assert!(registry.get("c1").is_none());

        registry.upsert(SendSession::new("c1", settings("a.example.com")));
        assert_eq!(registry.get("c1").unwrap().settings.host, "a.example.com");
        assert!(registry.contains("c1"));

        assert!(registry.remove("c1").is_some());
        assert!(registry.get("c1").is_none());
        assert!(registry.remove("c1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn age_counts_from_registration() {
        let session = SendSession::new("c1", settings("smtp.example.com"));
        let later = session.created_at + time::Duration::seconds(90);
        assert_eq!(session.age_secs(later), 90);
        assert_eq!(session.age_secs(session.created_at - time::Duration::seconds(5)), 0);
    }

    #[test]
    fn upsert_overwrites() {
        let registry = SendSessionRegistry::new();
        registry.upsert(SendSession::new("c1", settings("old.example.com")));
        registry.upsert(SendSession::new("c1", settings("new.example.com")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("c1").unwrap().settings.host, "new.example.com");
    }

    #[test]
    fn clones_share_state_across_threads() {
        let registry = SendSessionRegistry::new();
        let writer = registry.clone();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = writer.clone();
                std::thread::spawn(move || {
                    r.upsert(SendSession::new(format!("c{i}"), settings("smtp.example.com")));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
