//! Per-origin authorization grants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All authorization grants, keyed by canonical origin.
pub type AuthUrls = BTreeMap<String, AuthUrlInfo>;

/// Batch account-scope update: canonical origin -> new account list.
pub type AuthorizedAccountsDiff = BTreeMap<String, Vec<String>>;

/// The persisted record of an origin's authorization grant and the accounts
/// it is allowed to see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlInfo {
    /// Id of the request that created this grant.
    pub id: String,
    /// The name the requesting page presented itself with.
    pub origin: String,
    /// Canonical origin, also the key of this entry in [`AuthUrls`].
    pub url: String,
    /// Accounts exposed to this origin. `None` on entries written before
    /// account scoping existed; read through [`Self::grants_access`] and
    /// [`Self::accounts`] only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_accounts: Option<Vec<String>>,
    /// Unix millis of the most recent grant or account-scope change.
    pub last_auth: u64,
    /// Legacy usage counter, kept for storage-layout compatibility.
    #[serde(default)]
    pub count: u32,
    /// Legacy grant flag predating account scoping. Read through
    /// [`Self::grants_access`] only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_allowed: Option<bool>,
}

impl AuthUrlInfo {
    /// Creates a fresh grant for `url` scoped to `authorized_accounts`.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        url: impl Into<String>,
        authorized_accounts: Vec<String>,
        now: u64,
    ) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            url: url.into(),
            authorized_accounts: Some(authorized_accounts),
            last_auth: now,
            count: 0,
            is_allowed: None,
        }
    }

    /// Whether this entry represents a decided, access-granting
    /// authorization. An account-scoped entry always does, even with an
    /// empty account list; legacy entries only via `is_allowed`.
    pub fn grants_access(&self) -> bool {
        self.authorized_accounts.is_some() || self.is_allowed.unwrap_or(false)
    }

    /// The accounts visible to this origin.
    pub fn accounts(&self) -> &[String] {
        self.authorized_accounts.as_deref().unwrap_or_default()
    }

    /// Replaces the account scope and refreshes the grant timestamp.
    pub fn set_accounts(&mut self, accounts: Vec<String>, now: u64) {
        self.authorized_accounts = Some(accounts);
        self.last_auth = now;
    }
}

/// The response delivered to a page that asked for authorization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub authorized_accounts: Vec<String>,
    pub result: bool,
}

impl AuthResponse {
    /// The response for an origin that is already decided: no accounts, no
    /// new prompt.
    pub fn already_decided() -> Self {
        Self::default()
    }

    /// A granting response exposing the given accounts.
    pub fn granted(authorized_accounts: Vec<String>) -> Self {
        Self { authorized_accounts, result: true }
    }
}
