//! JSON-RPC response bindings
use crate::error::RpcError;
use serde::{Deserialize, Serialize};

/// The result of a handled JSON-RPC call: either the serialized return value
/// or a JSON-RPC error object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseResult {
    Result(serde_json::Value),
    Error(RpcError),
}

impl ResponseResult {
    /// Wraps the given value, already serialized.
    pub fn success(value: serde_json::Value) -> Self {
        Self::Result(value)
    }

    /// Wraps the given error.
    pub fn error(error: RpcError) -> Self {
        Self::Error(error)
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

impl From<RpcError> for ResponseResult {
    fn from(err: RpcError) -> Self {
        Self::Error(err)
    }
}

/// Serializes the given value into a [`ResponseResult`], turning serialization
/// failures into an internal error.
pub fn to_rpc_result<T: Serialize>(value: T) -> ResponseResult {
    match serde_json::to_value(value) {
        Ok(value) => ResponseResult::Result(value),
        Err(err) => ResponseResult::Error(RpcError::internal_error_with(format!(
            "failed to serialize response: {err}"
        ))),
    }
}
