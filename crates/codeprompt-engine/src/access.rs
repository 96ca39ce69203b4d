use std::sync::Arc;

use anyhow::{bail, Result};
use codeprompt_contracts::features::{FeatureTag, Identity};
use codeprompt_contracts::local_store::LocalUsageStore;
use tracing::{debug, warn};

use crate::config::{AppConfig, RemoteConfig, UsagePolicy};
use crate::error::error_chain_text;
use crate::leads::{LeadInsert, LeadStore, SupabaseLeadStore};

const MAX_REASON_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// No identity is known, locally or remotely.
    RegistrationRequired,
    /// The identity exists but has used up its allowance.
    LimitReached,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::RegistrationRequired => "registration_required",
            Self::LimitReached => "limit_reached",
        }
    }
}

/// Second half of the local-then-remote usage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    Disabled,
    Synced { count: u64 },
    /// The remote table has no lead for this identity.
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReceipt {
    pub feature: FeatureTag,
    pub local_count: u64,
    pub remote: RemoteSync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRegistration {
    Disabled,
    Created,
    AlreadyPresent,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub identity: Identity,
    pub remote: RemoteRegistration,
}

/// Local and remote counters side by side. The remote side is advisory, so
/// nothing is rewritten when they drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub local_total: u64,
    pub remote_count: Option<u64>,
    pub remote_limit: Option<u64>,
    pub remote: RemoteSync,
}

impl Reconciliation {
    pub fn drift(&self) -> Option<i64> {
        self.remote_count
            .map(|remote| remote as i64 - self.local_total as i64)
    }
}

pub struct AccessGate {
    local: LocalUsageStore,
    remote: Option<Arc<dyn LeadStore>>,
    policy: UsagePolicy,
}

impl AccessGate {
    pub fn new(
        local: LocalUsageStore,
        remote: Option<Arc<dyn LeadStore>>,
        policy: UsagePolicy,
    ) -> Self {
        Self {
            local,
            remote,
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            LocalUsageStore::new(config.resolved_data_dir()),
            remote_store_for(&config.remote),
            config.policy,
        )
    }

    pub fn local(&self) -> &LocalUsageStore {
        &self.local
    }

    pub fn policy(&self) -> UsagePolicy {
        self.policy
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.local.identity()
    }

    pub fn register(&self, identity: Identity) -> Result<RegistrationOutcome> {
        if !identity.is_complete() {
            bail!("registration is missing: {}", identity.missing_fields().join(", "));
        }
        self.local.save_identity(&identity)?;

        let remote = match self.remote.as_ref() {
            None => RemoteRegistration::Disabled,
            Some(store) => match store.insert_if_absent(&identity, self.policy.default_remote_limit) {
                Ok(LeadInsert::Created) => RemoteRegistration::Created,
                Ok(LeadInsert::AlreadyPresent) => RemoteRegistration::AlreadyPresent,
                Err(err) => {
                    let reason = error_chain_text(&err, MAX_REASON_CHARS);
                    warn!(handle = %identity.contact_handle, %reason, "remote lead registration failed");
                    RemoteRegistration::Failed { reason }
                }
            },
        };
        Ok(RegistrationOutcome { identity, remote })
    }

    pub fn check_access(&self, feature: FeatureTag) -> AccessDecision {
        let decision = self.decide(feature);
        debug!(feature = %feature, decision = decision.as_str(), "access checked");
        decision
    }

    fn decide(&self, feature: FeatureTag) -> AccessDecision {
        let Some(identity) = self.local.identity() else {
            return AccessDecision::RegistrationRequired;
        };
        let Some(store) = self.remote.as_ref() else {
            return match self.local.usage_count(feature) {
                Ok(count) if count < self.policy.free_uses_per_feature => AccessDecision::Allowed,
                Ok(_) => AccessDecision::LimitReached,
                Err(err) => {
                    warn!(
                        feature = %feature,
                        reason = %error_chain_text(&err, MAX_REASON_CHARS),
                        "local usage unreadable, denying"
                    );
                    AccessDecision::LimitReached
                }
            };
        };
        match store.get_by_handle(&identity.contact_handle) {
            Ok(Some(lead)) if lead.limit_reached() => AccessDecision::LimitReached,
            Ok(Some(_)) => AccessDecision::Allowed,
            Ok(None) => AccessDecision::RegistrationRequired,
            Err(err) => {
                warn!(
                    reason = %error_chain_text(&err, MAX_REASON_CHARS),
                    "remote access check failed"
                );
                AccessDecision::RegistrationRequired
            }
        }
    }

    /// Bumps the local counter, then the remote one. A remote failure is
    /// reported in the receipt and never rolls the local write back.
    pub fn record_usage(&self, feature: FeatureTag) -> Result<UsageReceipt> {
        let local_count = self.local.increment(feature)?;
        let remote = match (self.remote.as_ref(), self.local.identity()) {
            (None, _) => RemoteSync::Disabled,
            (Some(_), None) => RemoteSync::Missing,
            (Some(store), Some(identity)) => match store.increment_usage(&identity.contact_handle) {
                Ok(Some(count)) => RemoteSync::Synced { count },
                Ok(None) => RemoteSync::Missing,
                Err(err) => {
                    let reason = error_chain_text(&err, MAX_REASON_CHARS);
                    warn!(feature = %feature, %reason, "remote usage increment failed");
                    RemoteSync::Failed { reason }
                }
            },
        };
        Ok(UsageReceipt {
            feature,
            local_count,
            remote,
        })
    }

    /// Fails only when the local usage document cannot be read.
    pub fn reconcile(&self) -> Result<Reconciliation> {
        let local_total = self.local.usage()?.total();
        let lookup = match (self.remote.as_ref(), self.local.identity()) {
            (None, _) => Err(RemoteSync::Disabled),
            (Some(_), None) => Err(RemoteSync::Missing),
            (Some(store), Some(identity)) => match store.get_by_handle(&identity.contact_handle) {
                Ok(Some(lead)) => Ok(lead),
                Ok(None) => Err(RemoteSync::Missing),
                Err(err) => Err(RemoteSync::Failed {
                    reason: error_chain_text(&err, MAX_REASON_CHARS),
                }),
            },
        };
        Ok(match lookup {
            Ok(lead) => Reconciliation {
                local_total,
                remote_count: Some(lead.usage_count),
                remote_limit: Some(lead.usage_limit),
                remote: RemoteSync::Synced {
                    count: lead.usage_count,
                },
            },
            Err(remote) => Reconciliation {
                local_total,
                remote_count: None,
                remote_limit: None,
                remote,
            },
        })
    }
}

pub fn remote_store_for(remote: &RemoteConfig) -> Option<Arc<dyn LeadStore>> {
    match remote {
        RemoteConfig::Disabled => None,
        RemoteConfig::Supabase { url, anon_key } => {
            Some(Arc::new(SupabaseLeadStore::new(url, anon_key.clone())))
        }
    }
}
