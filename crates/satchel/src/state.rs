//! The request-authorization state machine.
//!
//! `State` composes the persistent stores, the provider registry, the
//! injected-provider session table and the popup controller into the
//! background half of the extension. All operations run on the extension's
//! single event loop; operations can still interleave at await points, so
//! every queue check-then-write happens inside one atomic
//! [`Store::update`](crate::store::Store::update), never as a separate
//! read and write.

use crate::{
    config::{Config, NotificationMode},
    error::StateError,
    popup::{badge_text, Badge, PopupController, WindowManager},
    port::{Port, PortId},
    provider::ProviderRegistry,
    pubsub::ConnectedSubscription,
    store::{StorageBackend, StoreError, Stores},
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use satchel_core::{
    auth::{AuthResponse, AuthUrlInfo, AuthUrls, AuthorizedAccountsDiff},
    metadata::ChainMetadataDef,
    provider::{
        ProviderMeta, RpcProvider, RpcSendRequest, RpcSubscribeRequest, RpcUnsubscribeRequest,
        SubscriptionSink,
    },
    request::{AccountInfo, AuthRequest, AuthorizePayload, MetadataRequest, SignPayload, SignRequest},
    subscription::SubscriptionId,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Canonical scheme+host+port of `url`, the unit of authorization.
pub fn canonical_origin(url: &str) -> Result<String, StateError> {
    let parsed = url::Url::parse(url)
        .map_err(|source| StateError::InvalidUrl { url: url.to_string(), source })?;
    Ok(parsed.origin().ascii_serialization())
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// The background controller.
pub struct State {
    stores: Stores,
    /// Providers exposed by the extension, retrievable by key.
    providers: ProviderRegistry,
    /// Providers currently injected in tabs, keyed by owning port.
    sessions: Arc<Mutex<HashMap<PortId, Arc<dyn RpcProvider>>>>,
    /// Response channels of enqueued authorization requests. Dropped (read:
    /// cancelled) when the request is removed without a decision.
    responders: Mutex<HashMap<String, oneshot::Sender<AuthResponse>>>,
    /// Origins of currently open tabs that hold an authorization.
    connected_tabs: RwLock<Vec<String>>,
    popup: PopupController,
    badge: Arc<dyn Badge>,
}

impl State {
    pub fn new(
        config: Config,
        providers: ProviderRegistry,
        windows: Arc<dyn WindowManager>,
        badge: Arc<dyn Badge>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            stores: Stores::new(backend),
            providers,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            responders: Mutex::new(HashMap::new()),
            connected_tabs: RwLock::new(Vec::new()),
            popup: PopupController::new(&config, windows),
            badge,
        }
    }

    /// The popup controller arbitrating the notification surface.
    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    // === queue and registry reads ===

    pub fn known_metadata(&self) -> Result<Vec<ChainMetadataDef>, StateError> {
        Ok(self.stores.chain_metadata.get()?.into_values().collect())
    }

    pub fn auth_requests_number(&self) -> Result<usize, StateError> {
        Ok(self.stores.auth_requests.get()?.len())
    }

    pub fn metadata_requests_number(&self) -> Result<usize, StateError> {
        Ok(self.stores.metadata_requests.get()?.len())
    }

    pub fn sign_requests_number(&self) -> Result<usize, StateError> {
        Ok(self.stores.sign_requests.get()?.len())
    }

    pub fn all_sign_requests(&self) -> Result<Vec<SignRequest>, StateError> {
        Ok(self.stores.sign_requests.get()?)
    }

    pub fn auth_urls(&self) -> Result<AuthUrls, StateError> {
        Ok(self.stores.auth_urls.get()?)
    }

    pub fn default_auth_account_selection(&self) -> Result<Vec<String>, StateError> {
        Ok(self.stores.default_auth_accounts.get()?)
    }

    pub fn get_auth_request(&self, id: &str) -> Result<Option<AuthRequest>, StateError> {
        Ok(self.stores.auth_requests.get()?.into_iter().find(|request| request.id == id))
    }

    pub fn get_metadata_request(&self, id: &str) -> Result<Option<MetadataRequest>, StateError> {
        Ok(self.stores.metadata_requests.get()?.into_iter().find(|request| request.id == id))
    }

    pub fn get_sign_request(&self, id: &str) -> Result<Option<SignRequest>, StateError> {
        Ok(self.stores.sign_requests.get()?.into_iter().find(|request| request.id == id))
    }

    // === authorization ===

    /// Handles a page's request for account access.
    ///
    /// Fails with [`StateError::DuplicateRequest`] while the origin already
    /// has an unresolved request queued. For an origin that was decided
    /// before, the response is sent immediately and nothing is enqueued;
    /// an origin that was decided without any grant fails with
    /// [`StateError::NotAuthorized`]. Otherwise the
    /// request joins the queue, the badge is refreshed and the notification
    /// surface is opened; `respond` stays pending until the UI resolves or
    /// removes the request.
    pub async fn authorize_url(
        &self,
        url: &str,
        id: &str,
        payload: AuthorizePayload,
        respond: oneshot::Sender<AuthResponse>,
    ) -> Result<(), StateError> {
        let origin = canonical_origin(url)?;

        // Do not enqueue duplicate authorization requests.
        let pending = self.stores.auth_requests.get()?;
        if pending.iter().any(|request| request.origin == origin) {
            return Err(StateError::DuplicateRequest(url.to_string()));
        }

        if let Some(entry) = self.stores.auth_urls.get()?.get(&origin) {
            if !entry.grants_access() {
                return Err(StateError::NotAuthorized(url.to_string()));
            }
            // Already decided, nothing to prompt.
            let _ = respond.send(AuthResponse::already_decided());
            return Ok(());
        }

        let request = AuthRequest {
            id: id.to_string(),
            origin,
            payload,
            url: url.to_string(),
        };
        let mut duplicate = false;
        self.stores.auth_requests.update(|mut requests| {
            if requests.iter().any(|existing| existing.origin == request.origin) {
                duplicate = true;
            } else {
                requests.push(request);
            }
            requests
        })?;
        if duplicate {
            return Err(StateError::DuplicateRequest(url.to_string()));
        }

        self.responders.lock().insert(id.to_string(), respond);
        self.update_icon().await;
        self.popup.open().await;
        Ok(())
    }

    /// Records a grant for `url`: a fresh entry keyed by canonical origin,
    /// replacing any previous entry, plus the default account selection for
    /// future prompts. Both writes belong to one logical operation; the
    /// call fails if either does.
    pub fn add_authorized_url(
        &self,
        id: &str,
        origin: &str,
        url: &str,
        authorized_accounts: Vec<String>,
    ) -> Result<(), StateError> {
        let origin_key = canonical_origin(url)?;
        let entry =
            AuthUrlInfo::new(id, origin, origin_key.clone(), authorized_accounts.clone(), now_millis());
        self.stores.auth_urls.update(|mut urls| {
            urls.insert(origin_key, entry);
            urls
        })?;
        self.update_default_auth_accounts(authorized_accounts)?;
        Ok(())
    }

    /// Batch account-scope update over the whole auth-url map in one atomic
    /// pass. Unknown origins get a minimal entry, matching the grant shape
    /// the consent UI writes next.
    pub fn update_authorized_accounts(
        &self,
        diff: AuthorizedAccountsDiff,
    ) -> Result<(), StateError> {
        // normalize keys upfront so one malformed url fails the whole call
        // before anything is written
        let mut normalized = Vec::with_capacity(diff.len());
        for (url, accounts) in diff {
            normalized.push((canonical_origin(&url)?, accounts));
        }
        let now = now_millis();
        self.stores.auth_urls.update(|mut urls| {
            for (origin, accounts) in normalized {
                match urls.get_mut(&origin) {
                    Some(entry) => entry.set_accounts(accounts, now),
                    None => {
                        let entry =
                            AuthUrlInfo::new("", origin.clone(), origin.clone(), accounts, now);
                        urls.insert(origin, entry);
                    }
                }
            }
            urls
        })?;
        Ok(())
    }

    /// Refreshes the grant timestamp of a known origin on re-visit.
    pub fn update_authorized_date(&self, url: &str) -> Result<(), StateError> {
        let origin = canonical_origin(url)?;
        let now = now_millis();
        self.stores.auth_urls.update(|mut urls| {
            match urls.get_mut(&origin) {
                Some(entry) => entry.last_auth = now,
                None => {
                    debug!(target: "satchel::state", %origin, "auth date refresh for unknown origin")
                }
            }
            urls
        })?;
        Ok(())
    }

    /// Removes the grant for `url`'s origin. Fails with
    /// [`StateError::UnknownOrigin`] if there is none.
    pub fn remove_authorization(&self, url: &str) -> Result<AuthUrls, StateError> {
        let origin = canonical_origin(url)?;
        let mut removed = false;
        let urls = self.stores.auth_urls.update(|mut urls| {
            removed = urls.remove(&origin).is_some();
            urls
        })?;
        if !removed {
            return Err(StateError::UnknownOrigin(url.to_string()));
        }
        Ok(urls)
    }

    /// Fails with [`StateError::NotEnabled`] unless `url`'s origin has an
    /// authorization entry. Existence alone suffices here; account scope is
    /// checked by the caller picking accounts to expose.
    pub fn ensure_url_authorized(&self, url: &str) -> Result<(), StateError> {
        let origin = canonical_origin(url)?;
        if !self.stores.auth_urls.get()?.contains_key(&origin) {
            return Err(StateError::NotEnabled(url.to_string()));
        }
        Ok(())
    }

    /// Replaces the default pre-checked account selection for future
    /// authorization prompts.
    pub fn update_default_auth_accounts(&self, accounts: Vec<String>) -> Result<(), StateError> {
        self.stores.default_auth_accounts.set(accounts)?;
        Ok(())
    }

    /// Completes a pending authorization request with the UI's decision.
    /// Returns `false` when no response channel is held for `id` (the
    /// request was already resolved, or the requester is gone).
    pub fn respond_auth_request(&self, id: &str, response: AuthResponse) -> bool {
        match self.responders.lock().remove(id) {
            Some(sender) => sender.send(response).is_ok(),
            None => false,
        }
    }

    pub async fn remove_auth_request(&self, id: &str) -> Result<(), StateError> {
        self.stores.auth_requests.update(|mut requests| {
            requests.retain(|request| request.id != id);
            requests
        })?;
        // a dropped responder reads as cancellation on the requesting side
        self.responders.lock().remove(id);
        self.update_icon().await;
        Ok(())
    }

    // === metadata ===

    /// Queues a page's request to register chain metadata.
    pub async fn inject_metadata(
        &self,
        url: &str,
        payload: ChainMetadataDef,
        id: &str,
    ) -> Result<(), StateError> {
        let request = MetadataRequest { id: id.to_string(), payload, url: url.to_string() };
        self.stores.metadata_requests.update(|mut requests| {
            requests.push(request);
            requests
        })?;
        self.update_icon().await;
        self.popup.open().await;
        Ok(())
    }

    pub async fn remove_metadata_request(&self, id: &str) -> Result<(), StateError> {
        self.stores.metadata_requests.update(|mut requests| {
            requests.retain(|request| request.id != id);
            requests
        })?;
        self.update_icon().await;
        Ok(())
    }

    /// Upserts a chain's metadata, keyed by genesis hash.
    pub fn save_metadata(&self, def: ChainMetadataDef) -> Result<(), StateError> {
        self.stores.chain_metadata.update(|mut metadata| {
            metadata.insert(def.genesis_hash, def);
            metadata
        })?;
        Ok(())
    }

    // === signing ===

    /// Queues a page's request to sign a payload with `account`.
    pub async fn invoke_signature_request(
        &self,
        url: &str,
        payload: SignPayload,
        account: AccountInfo,
        id: &str,
    ) -> Result<(), StateError> {
        let request =
            SignRequest { id: id.to_string(), account, payload, url: url.to_string() };
        self.stores.sign_requests.update(|mut requests| {
            requests.push(request);
            requests
        })?;
        self.update_icon().await;
        self.popup.open().await;
        Ok(())
    }

    pub async fn remove_sign_request(&self, id: &str) -> Result<(), StateError> {
        self.stores.sign_requests.update(|mut requests| {
            requests.retain(|request| request.id != id);
            requests
        })?;
        self.update_icon().await;
        Ok(())
    }

    // === connected tabs ===

    /// Recomputes the connected-tabs snapshot from the open-tab urls the UI
    /// collaborator pushed. Tab urls that do not parse (new-tab pages and
    /// the like) are skipped.
    pub fn update_current_tabs_url(&self, urls: &[String]) -> Result<(), StateError> {
        let auth_urls = self.stores.auth_urls.get()?;
        let connected = urls
            .iter()
            .filter_map(|url| match canonical_origin(url) {
                Ok(origin) => auth_urls.contains_key(&origin).then_some(origin),
                Err(err) => {
                    debug!(target: "satchel::state", %err, "ignoring tab url");
                    None
                }
            })
            .collect();
        *self.connected_tabs.write() = connected;
        Ok(())
    }

    pub fn connected_tabs_url(&self) -> Vec<String> {
        self.connected_tabs.read().clone()
    }

    // === notification surface ===

    pub fn set_notification(&self, mode: NotificationMode) {
        self.popup.set_notification(mode);
    }

    // === rpc pass-through ===

    /// Lists all providers the extension is exposing.
    pub fn rpc_list_providers(&self) -> BTreeMap<String, ProviderMeta> {
        self.providers.list()
    }

    /// Starts the provider `key` for `port`, returning its metadata.
    /// Idempotent per port: a port that already runs a provider keeps it.
    /// The provider is torn down with its owning connection; it never
    /// outlives the port.
    pub fn rpc_start_provider(&self, key: &str, port: &Port) -> Result<ProviderMeta, StateError> {
        let entry = self
            .providers
            .get(key)
            .ok_or_else(|| StateError::UnknownProvider(key.to_string()))?;

        {
            let mut sessions = self.sessions.lock();
            if sessions.contains_key(&port.id()) {
                return Ok(entry.meta.clone());
            }
            sessions.insert(port.id(), (entry.start)());
        }

        let sessions = Arc::clone(&self.sessions);
        let port = port.clone();
        tokio::spawn(async move {
            port.disconnected().await;
            let provider = sessions.lock().remove(&port.id());
            if let Some(provider) = provider {
                if let Err(err) = provider.disconnect().await {
                    warn!(
                        target: "satchel::state",
                        %err,
                        port = %port.id(),
                        "provider teardown failed"
                    );
                }
            }
        });

        Ok(entry.meta.clone())
    }

    pub async fn rpc_send(
        &self,
        request: RpcSendRequest,
        port: &Port,
    ) -> Result<serde_json::Value, StateError> {
        let provider = self.session(port)?;
        Ok(provider.send(request).await?)
    }

    pub async fn rpc_subscribe(
        &self,
        request: RpcSubscribeRequest,
        sink: SubscriptionSink,
        port: &Port,
    ) -> Result<SubscriptionId, StateError> {
        let provider = self.session(port)?;
        Ok(provider.subscribe(request, sink).await?)
    }

    pub async fn rpc_unsubscribe(
        &self,
        request: RpcUnsubscribeRequest,
        port: &Port,
    ) -> Result<bool, StateError> {
        let provider = self.session(port)?;
        Ok(provider.unsubscribe(request).await?)
    }

    /// Subscribes to the connectivity of the port's provider: the current
    /// snapshot is delivered first, then every transition for the life of
    /// the subscription.
    pub fn rpc_subscribe_connected(
        &self,
        port: &Port,
    ) -> Result<ConnectedSubscription, StateError> {
        let provider = self.session(port)?;
        Ok(ConnectedSubscription::new(provider.is_connected(), provider.connection_events()))
    }

    fn session(&self, port: &Port) -> Result<Arc<dyn RpcProvider>, StateError> {
        self.sessions.lock().get(&port.id()).cloned().ok_or(StateError::ProviderNotStarted)
    }

    // === badge ===

    /// Recomputes the toolbar badge from the queue lengths. Best-effort:
    /// failures are logged and never propagate into the operation that
    /// triggered the refresh.
    async fn update_icon(&self) {
        let counts = self.queue_counts();
        let text = match counts {
            Ok((auth, meta, sign)) => badge_text(auth, meta, sign),
            Err(err) => {
                warn!(target: "satchel::state", %err, "badge refresh failed");
                return;
            }
        };
        if let Err(err) = self.badge.set_badge_text(&text).await {
            warn!(target: "satchel::state", %err, "failed to set badge text");
        }
    }

    fn queue_counts(&self) -> Result<(usize, usize, usize), StoreError> {
        Ok((
            self.stores.auth_requests.get()?.len(),
            self.stores.metadata_requests.get()?.len(),
            self.stores.sign_requests.get()?.len(),
        ))
    }
}
