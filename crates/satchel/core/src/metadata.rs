//! Chain metadata registry types.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All known chain metadata, keyed by genesis hash.
pub type ChainMetadata = BTreeMap<B256, ChainMetadataDef>;

/// Runtime flavor of a chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    #[default]
    Substrate,
    Ethereum,
}

/// A known chain's registry entry, used by the consent UI to decode
/// payloads into something human readable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadataDef {
    /// Genesis hash of the chain, also the key of this entry in
    /// [`ChainMetadata`].
    pub genesis_hash: B256,
    /// Chain display name.
    pub chain: String,
    #[serde(default)]
    pub chain_type: ChainType,
    /// Identicon theme used for addresses of this chain.
    pub icon: String,
    pub spec_version: u32,
    pub ss58_format: u16,
    pub token_decimals: u8,
    pub token_symbol: String,
    /// Registry type overrides consumed by the decoder; opaque to the
    /// controller and stored verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub types: serde_json::Value,
}
