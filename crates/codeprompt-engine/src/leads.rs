//! Remote lead records, mirrored from the local identity.
//!
//! [`SupabaseLeadStore`] talks to the PostgREST interface of a Supabase
//! project (`/rest/v1/leads`). [`MemoryLeadStore`] keeps the same semantics
//! in process.

use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::SecondsFormat;
use codeprompt_contracts::features::Identity;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::http::{response_json_or_error, response_text_or_error};

pub const LEADS_TABLE: &str = "leads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "whatsapp")]
    pub contact_handle: String,
    pub email: String,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub usage_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_usage_at: Option<String>,
}

impl Lead {
    pub fn from_identity(identity: &Identity, usage_limit: u64) -> Self {
        Self {
            id: None,
            name: identity.name.clone(),
            contact_handle: identity.contact_handle.clone(),
            email: identity.email.clone(),
            usage_count: 0,
            usage_limit,
            created_at: None,
            last_usage_at: None,
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.usage_count >= self.usage_limit
    }
}

// Row ids may be bigint or uuid columns.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadInsert {
    Created,
    AlreadyPresent,
}

pub trait LeadStore: Send + Sync {
    fn insert_if_absent(&self, identity: &Identity, usage_limit: u64) -> Result<LeadInsert>;
    fn get_by_handle(&self, contact_handle: &str) -> Result<Option<Lead>>;
    /// Read-then-write increment. Returns the new count, or `None` when no
    /// lead matches.
    fn increment_usage(&self, contact_handle: &str) -> Result<Option<u64>>;
    /// Every lead, newest first.
    fn list_recent(&self) -> Result<Vec<Lead>>;
    fn update_limit(&self, id: &str, usage_limit: u64) -> Result<()>;
}

fn now_utc_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct SupabaseLeadStore {
    base_url: String,
    anon_key: String,
    http: HttpClient,
}

impl SupabaseLeadStore {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            http: HttpClient::new(),
        }
    }

    pub fn table_endpoint(&self) -> String {
        format!("{}/rest/v1/{LEADS_TABLE}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn select(&self, query: &[(&str, String)]) -> Result<Vec<Lead>> {
        let endpoint = self.table_endpoint();
        let response = self
            .authorized(self.http.get(&endpoint))
            .query(query)
            .send()
            .with_context(|| format!("Supabase request failed ({endpoint})"))?;
        parse_leads(&response_json_or_error("Supabase", response)?)
    }

    fn patch(&self, filter: (&str, String), body: Value) -> Result<()> {
        let endpoint = self.table_endpoint();
        let response = self
            .authorized(self.http.patch(&endpoint))
            .query(&[filter])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .with_context(|| format!("Supabase update failed ({endpoint})"))?;
        response_text_or_error("Supabase", response)?;
        Ok(())
    }
}

pub(crate) fn parse_leads(payload: &Value) -> Result<Vec<Lead>> {
    let Some(rows) = payload.as_array() else {
        bail!("Supabase returned a non-array payload for {LEADS_TABLE}");
    };
    rows.iter()
        .map(|row| {
            serde_json::from_value::<Lead>(row.clone())
                .with_context(|| format!("unreadable {LEADS_TABLE} row"))
        })
        .collect()
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl LeadStore for SupabaseLeadStore {
    fn insert_if_absent(&self, identity: &Identity, usage_limit: u64) -> Result<LeadInsert> {
        if self.get_by_handle(&identity.contact_handle)?.is_some() {
            return Ok(LeadInsert::AlreadyPresent);
        }
        let endpoint = self.table_endpoint();
        let response = self
            .authorized(self.http.post(&endpoint))
            .header("Prefer", "return=minimal")
            .json(&json!([Lead::from_identity(identity, usage_limit)]))
            .send()
            .with_context(|| format!("Supabase insert failed ({endpoint})"))?;
        response_text_or_error("Supabase", response)?;
        debug!(handle = %identity.contact_handle, "lead registered remotely");
        Ok(LeadInsert::Created)
    }

    fn get_by_handle(&self, contact_handle: &str) -> Result<Option<Lead>> {
        let rows = self.select(&[
            ("select", "*".to_string()),
            ("whatsapp", eq(contact_handle)),
            ("limit", "1".to_string()),
        ])?;
        Ok(rows.into_iter().next())
    }

    fn increment_usage(&self, contact_handle: &str) -> Result<Option<u64>> {
        let Some(lead) = self.get_by_handle(contact_handle)? else {
            return Ok(None);
        };
        let next = lead.usage_count + 1;
        self.patch(
            ("whatsapp", eq(contact_handle)),
            json!({ "usage_count": next, "last_usage_at": now_utc_iso() }),
        )?;
        Ok(Some(next))
    }

    fn list_recent(&self) -> Result<Vec<Lead>> {
        self.select(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ])
    }

    fn update_limit(&self, id: &str, usage_limit: u64) -> Result<()> {
        self.patch(("id", eq(id)), json!({ "usage_limit": usage_limit }))
    }
}

#[derive(Default)]
pub struct MemoryLeadStore {
    rows: Mutex<Vec<Lead>>,
    next_id: Mutex<u64>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let next = leads.len() as u64;
        Self {
            rows: Mutex::new(leads),
            next_id: Mutex::new(next),
        }
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<Lead>>> {
        self.rows
            .lock()
            .map_err(|_| anyhow!("lead table lock poisoned"))
    }
}

impl LeadStore for MemoryLeadStore {
    fn insert_if_absent(&self, identity: &Identity, usage_limit: u64) -> Result<LeadInsert> {
        let mut rows = self.rows()?;
        if rows
            .iter()
            .any(|lead| lead.contact_handle == identity.contact_handle)
        {
            return Ok(LeadInsert::AlreadyPresent);
        }
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|_| anyhow!("lead id lock poisoned"))?;
        *next_id += 1;
        let mut lead = Lead::from_identity(identity, usage_limit);
        lead.id = Some(next_id.to_string());
        lead.created_at = Some(now_utc_iso());
        rows.push(lead);
        Ok(LeadInsert::Created)
    }

    fn get_by_handle(&self, contact_handle: &str) -> Result<Option<Lead>> {
        Ok(self
            .rows()?
            .iter()
            .find(|lead| lead.contact_handle == contact_handle)
            .cloned())
    }

    fn increment_usage(&self, contact_handle: &str) -> Result<Option<u64>> {
        let mut rows = self.rows()?;
        let Some(lead) = rows
            .iter_mut()
            .find(|lead| lead.contact_handle == contact_handle)
        else {
            return Ok(None);
        };
        lead.usage_count += 1;
        lead.last_usage_at = Some(now_utc_iso());
        Ok(Some(lead.usage_count))
    }

    fn list_recent(&self) -> Result<Vec<Lead>> {
        let mut rows = self.rows()?.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn update_limit(&self, id: &str, usage_limit: u64) -> Result<()> {
        let mut rows = self.rows()?;
        let Some(lead) = rows
            .iter_mut()
            .find(|lead| lead.id.as_deref() == Some(id))
        else {
            bail!("no lead with id '{id}'");
        };
        lead.usage_limit = usage_limit;
        Ok(())
    }
}
