//! # satchel-rpc
//!
//! JSON-RPC 2.0 error and response bindings shared by the provider
//! pass-through bridge and the extension-facing message layer.

pub mod error;
pub mod response;

pub use error::{ErrorCode, RpcError};
pub use response::{to_rpc_result, ResponseResult};
