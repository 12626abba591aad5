//! Pending consent requests.
//!
//! One queue exists per request kind; insertion order is display order in
//! the consent UI. Requests are correlated by a caller-supplied id and
//! removed on approval, rejection or cancellation.

use crate::metadata::ChainMetadataDef;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Payload of a tab's authorization request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizePayload {
    /// The name the requesting page presents itself with.
    pub origin: String,
}

/// A pending account-access request from a web origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Caller-supplied correlation id.
    pub id: String,
    /// Canonical origin, the per-origin deduplication key.
    pub origin: String,
    pub payload: AuthorizePayload,
    /// The full url the request came from.
    pub url: String,
}

/// A pending chain-metadata registration request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    pub id: String,
    pub payload: ChainMetadataDef,
    pub url: String,
}

/// An account as the signing UI sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_hash: Option<B256>,
}

impl AccountInfo {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), name: None, genesis_hash: None }
    }
}

/// What a page asked to have signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SignPayload {
    /// A full extrinsic payload, decodable against chain metadata.
    #[serde(rename = "payload")]
    Extrinsic(ExtrinsicPayload),
    /// Opaque bytes, shown to the user as-is.
    #[serde(rename = "bytes")]
    Raw(RawPayload),
}

impl SignPayload {
    /// The address the payload targets.
    pub fn address(&self) -> &str {
        match self {
            Self::Extrinsic(payload) => &payload.address,
            Self::Raw(payload) => &payload.address,
        }
    }
}

/// The signable fields of an extrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrinsicPayload {
    pub address: String,
    pub block_hash: B256,
    pub genesis_hash: B256,
    /// Hex-encoded call data.
    pub method: String,
    pub nonce: u64,
    pub spec_version: u32,
    pub transaction_version: u32,
}

/// Raw bytes to sign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    pub address: String,
    /// Hex-encoded bytes.
    pub data: String,
}

/// A pending signing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub id: String,
    /// The account the request targets.
    pub account: AccountInfo,
    pub payload: SignPayload,
    pub url: String,
}
