//! RPC provider contract and pass-through request types.
//!
//! The extension exposes a fixed set of node connections to pages. A
//! provider is lazily started per browser connection and torn down with it;
//! the controller never hands the same instance to two connections.

use crate::subscription::SubscriptionId;
use futures::channel::mpsc;
use satchel_rpc::{error::RpcError, response::ResponseResult};
use serde::{Deserialize, Serialize};

/// Static description of a provider exposed by the extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMeta {
    /// Network the provider connects to, e.g. a chain name.
    pub network: String,
    pub node: NodeType,
    /// Where the endpoint definition came from.
    pub source: String,
    pub transport: String,
}

/// Kind of node a provider fronts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Full,
    Light,
}

/// A one-shot RPC call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSendRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// A subscription start call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSubscribeRequest {
    /// Subscription namespace, e.g. `chain_newHead`'s `chain`.
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// A subscription cancel call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcUnsubscribeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    pub subscription_id: SubscriptionId,
}

/// A single notification produced by an active subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionMessage {
    pub subscription: SubscriptionId,
    #[serde(flatten)]
    pub result: ResponseResult,
}

/// Where a provider pushes subscription notifications. The receiving half is
/// owned by the message layer forwarding to the page; dropping it ends
/// delivery.
pub type SubscriptionSink = mpsc::UnboundedSender<SubscriptionMessage>;

/// Connect/disconnect transitions of a provider's upstream connection.
pub type ConnectionEvents = mpsc::UnboundedReceiver<bool>;

/// A long-lived connection to a node, exposed to pages through the
/// background controller.
#[async_trait::async_trait]
pub trait RpcProvider: Send + Sync {
    /// Current connectivity snapshot.
    fn is_connected(&self) -> bool;

    /// Registers a listener for subsequent connect/disconnect transitions.
    fn connection_events(&self) -> ConnectionEvents;

    /// Performs a one-shot RPC call.
    async fn send(&self, request: RpcSendRequest) -> Result<serde_json::Value, RpcError>;

    /// Starts a subscription, pushing notifications into `sink` until it is
    /// unsubscribed or the sink is dropped.
    async fn subscribe(
        &self,
        request: RpcSubscribeRequest,
        sink: SubscriptionSink,
    ) -> Result<SubscriptionId, RpcError>;

    /// Cancels an active subscription. Returns whether it existed.
    async fn unsubscribe(&self, request: RpcUnsubscribeRequest) -> Result<bool, RpcError>;

    /// Tears down the upstream connection. Invoked exactly once, when the
    /// owning browser connection closes.
    async fn disconnect(&self) -> Result<(), RpcError>;
}
