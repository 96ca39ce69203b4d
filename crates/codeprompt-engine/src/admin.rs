use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use tracing::{info, warn};

use crate::access::remote_store_for;
use crate::config::{AdminConfig, AppConfig};
use crate::leads::{Lead, LeadStore};

pub const ADMIN_URL_PARAM: &str = "admin_key";

/// Lead listing and limit overrides, behind a shared secret.
pub struct AdminConsole {
    admin: AdminConfig,
    store: Option<Arc<dyn LeadStore>>,
    unlocked: bool,
}

impl AdminConsole {
    pub fn new(admin: AdminConfig, store: Option<Arc<dyn LeadStore>>) -> Self {
        Self {
            admin,
            store,
            unlocked: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.admin.clone(), remote_store_for(&config.remote))
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn unlock_with_password(&mut self, password: &str) -> bool {
        let matched = matches_secret(self.admin.password.as_deref(), password);
        if !matched {
            warn!("admin unlock refused");
        }
        self.unlocked |= matched;
        self.unlocked
    }

    /// Accepts a full URL or a bare query string carrying `admin_key`.
    pub fn unlock_with_url(&mut self, url_or_query: &str) -> bool {
        let candidate = admin_key_from(url_or_query);
        let matched = candidate
            .as_deref()
            .map(|key| matches_secret(self.admin.url_key.as_deref(), key))
            .unwrap_or(false);
        self.unlocked |= matched;
        self.unlocked
    }

    fn store(&self) -> Result<&Arc<dyn LeadStore>> {
        if !self.unlocked {
            bail!("admin console is locked");
        }
        let Some(store) = self.store.as_ref() else {
            bail!("the remote lead store is not configured (set CODEPROMPT_SUPABASE_URL and CODEPROMPT_SUPABASE_ANON_KEY)");
        };
        Ok(store)
    }

    /// Every lead, newest first.
    pub fn list_leads(&self) -> Result<Vec<Lead>> {
        self.store()?.list_recent().context("failed to list leads")
    }

    pub fn set_limit(&self, lead_id: &str, usage_limit: i64) -> Result<()> {
        let store = self.store()?;
        let lead_id = lead_id.trim();
        if lead_id.is_empty() {
            bail!("lead id is required");
        }
        let Ok(usage_limit) = u64::try_from(usage_limit) else {
            bail!("usage limit cannot be negative (got {usage_limit})");
        };
        store
            .update_limit(lead_id, usage_limit)
            .with_context(|| format!("failed to update the limit of lead '{lead_id}'"))?;
        info!(lead = lead_id, usage_limit, "lead usage limit updated");
        Ok(())
    }
}

fn matches_secret(expected: Option<&str>, provided: &str) -> bool {
    match expected.map(str::trim).filter(|value| !value.is_empty()) {
        Some(expected) => expected == provided.trim(),
        None => false,
    }
}

fn admin_key_from(url_or_query: &str) -> Option<String> {
    let raw = url_or_query.trim();
    let url = Url::parse(raw).or_else(|_| {
        let query = raw.trim_start_matches('?');
        Url::parse(&format!("http://localhost/?{query}"))
    });
    let url = url.ok()?;
    url.query_pairs()
        .find(|(key, _)| key == ADMIN_URL_PARAM)
        .map(|(_, value)| value.to_string())
}

/// WhatsApp deep link that opens a chat with the lead.
pub fn contact_link(lead: &Lead) -> Result<Url> {
    let message = format!(
        "Hi {}, I saw you are using our AI prompt creator! How can I help?",
        lead.name
    );
    whatsapp_link(&lead.contact_handle, &message)
}

/// Link a user follows to ask support for more generations.
pub fn support_link(support_contact: &str) -> Result<Url> {
    whatsapp_link(
        support_contact,
        "I came from the AI prompt app and I want more access",
    )
}

/// `wa.me` chat link with a prefilled message; only the handle's digits are kept.
pub fn whatsapp_link(handle: &str, message: &str) -> Result<Url> {
    let digits: String = handle.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        bail!("'{handle}' has no phone digits");
    }
    Url::parse_with_params(&format!("https://wa.me/{digits}"), &[("text", message)])
        .context("failed to build the contact link")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use codeprompt_contracts::features::Identity;

    use super::{admin_key_from, contact_link, support_link, AdminConsole};
    use crate::config::AdminConfig;
    use crate::leads::{Lead, LeadStore, MemoryLeadStore};

    fn config() -> AdminConfig {
        AdminConfig {
            password: Some("s3cret".to_string()),
            url_key: Some("1234".to_string()),
            support_contact: None,
        }
    }

    fn seeded() -> Result<Arc<MemoryLeadStore>> {
        let store = Arc::new(MemoryLeadStore::new());
        store.insert_if_absent(&Identity::new("Ana", "+55 (34) 99999-0000", "ana@example.com"), 1)?;
        Ok(store)
    }

    #[test]
    fn locked_until_a_secret_matches() -> Result<()> {
        let mut console = AdminConsole::new(config(), Some(seeded()?));
        assert!(console.list_leads().is_err());
        assert!(!console.unlock_with_password("admin123"));
        assert!(console.unlock_with_password("s3cret"));
        assert_eq!(console.list_leads()?.len(), 1);
        Ok(())
    }

    #[test]
    fn url_key_unlocks_from_full_url_or_query() {
        assert_eq!(
            admin_key_from("https://app.example.com/?tab=video&admin_key=1234").as_deref(),
            Some("1234")
        );
        assert_eq!(admin_key_from("?admin_key=abc").as_deref(), Some("abc"));
        assert_eq!(admin_key_from("admin_key=abc&x=1").as_deref(), Some("abc"));
        assert_eq!(admin_key_from("https://app.example.com/"), None);

        let mut console = AdminConsole::new(config(), None);
        assert!(!console.unlock_with_url("?admin_key=9999"));
        assert!(console.unlock_with_url("?admin_key=1234"));
    }

    #[test]
    fn unset_secrets_never_unlock() {
        let mut console = AdminConsole::new(AdminConfig::default(), None);
        assert!(!console.unlock_with_password(""));
        assert!(!console.unlock_with_url("?admin_key="));
    }

    #[test]
    fn remote_store_is_required() {
        let mut console = AdminConsole::new(config(), None);
        console.unlock_with_password("s3cret");
        let err = console.list_leads().err().map(|err| err.to_string());
        assert!(err.unwrap_or_default().contains("not configured"));
    }

    #[test]
    fn set_limit_rejects_negative_and_updates() -> Result<()> {
        let store = seeded()?;
        let mut console = AdminConsole::new(config(), Some(store.clone()));
        console.unlock_with_password("s3cret");
        assert!(console.set_limit("1", -2).is_err());
        console.set_limit("1", 6)?;
        let leads = store.list_recent()?;
        assert_eq!(leads[0].usage_limit, 6);
        Ok(())
    }

    #[test]
    fn contact_link_keeps_only_digits() -> Result<()> {
        let lead = Lead::from_identity(&Identity::new("Ana", "+55 (34) 99999-0000", "a@b.c"), 1);
        let link = contact_link(&lead)?;
        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/5534999990000");
        assert!(link
            .query_pairs()
            .any(|(key, value)| key == "text" && value.starts_with("Hi Ana")));
        Ok(())
    }

    #[test]
    fn support_link_prefills_an_access_request() -> Result<()> {
        let link = support_link("+55 34 90000-1111")?;
        assert_eq!(link.path(), "/5534900001111");
        assert!(link
            .query_pairs()
            .any(|(key, value)| key == "text" && value.contains("more access")));
        assert!(support_link("support desk").is_err());
        Ok(())
    }
}
