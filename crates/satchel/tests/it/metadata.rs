//! tests for chain-metadata requests and the metadata registry

use crate::utils::TestController;
use alloy_primitives::b256;
use satchel_core::metadata::{ChainMetadataDef, ChainType};

fn westend_metadata() -> ChainMetadataDef {
    ChainMetadataDef {
        genesis_hash: b256!("e143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e"),
        chain: "Westend".to_string(),
        chain_type: ChainType::Substrate,
        icon: "polkadot".to_string(),
        spec_version: 1_008_000,
        ss58_format: 42,
        token_decimals: 12,
        token_symbol: "WND".to_string(),
        types: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn inject_metadata_queues_and_signals() {
    let t = TestController::new();

    t.state.inject_metadata("https://dapp.test", westend_metadata(), "m1").await.unwrap();

    assert_eq!(t.state.metadata_requests_number().unwrap(), 1);
    assert_eq!(t.badge.last().as_deref(), Some("Meta"));
    assert_eq!(t.windows.created.load(std::sync::atomic::Ordering::SeqCst), 1);

    let request = t.state.get_metadata_request("m1").unwrap().unwrap();
    assert_eq!(request.payload.chain, "Westend");

    t.state.remove_metadata_request("m1").await.unwrap();
    assert_eq!(t.state.metadata_requests_number().unwrap(), 0);
    assert_eq!(t.badge.last().as_deref(), Some(""));
}

#[tokio::test]
async fn save_metadata_upserts_by_genesis_hash() {
    let t = TestController::new();

    t.state.save_metadata(westend_metadata()).unwrap();
    assert_eq!(t.state.known_metadata().unwrap().len(), 1);

    // a newer runtime replaces the entry wholesale
    let mut upgraded = westend_metadata();
    upgraded.spec_version = 1_009_000;
    t.state.save_metadata(upgraded).unwrap();

    let known = t.state.known_metadata().unwrap();
    assert_eq!(known.len(), 1);
    assert_eq!(known[0].spec_version, 1_009_000);
}

#[tokio::test]
async fn metadata_survives_controller_restart() {
    let backend = std::sync::Arc::new(satchel::store::MemoryBackend::default());
    {
        let t = TestController::with_backend(std::sync::Arc::clone(&backend) as _);
        t.state.save_metadata(westend_metadata()).unwrap();
    }

    let t = TestController::with_backend(backend);
    let known = t.state.known_metadata().unwrap();
    assert_eq!(known.len(), 1);
    assert_eq!(known[0].token_symbol, "WND");
}
