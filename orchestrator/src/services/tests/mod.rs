//! Service-specific tests
//!
//! Each real collaborator is exercised against a wiremock server standing in
//! for the NEAR RPC node, the hosting API or a solver endpoint.

mod transfer;

// Common test utilities for services
pub mod common {
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::services::near_rpc::NearRpcClient;

    pub fn rpc_client(server: &MockServer) -> NearRpcClient {
        NearRpcClient::new(server.uri().parse().expect("mock server uri"))
    }

    /// JSON-RPC envelope around a successful result
    pub fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "result": result,
        }))
    }

    pub fn rpc_error(error: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "error": error,
        }))
    }

    /// `call_function` result carrying `value` as JSON bytes
    pub fn view_result(value: Value) -> ResponseTemplate {
        let bytes = serde_json::to_vec(&value).expect("serializable view result");
        rpc_result(json!({
            "result": bytes,
            "logs": [],
            "block_height": 1,
            "block_hash": "11111111111111111111111111111111",
        }))
    }

    /// Mount a view call expectation for `method_name`
    pub async fn mount_view(server: &MockServer, method_name: &str, value: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "params": { "method_name": method_name } })))
            .respond_with(view_result(value))
            .mount(server)
            .await;
    }
}
