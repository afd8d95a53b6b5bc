use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::MailcowError;
use crate::resource::{Operation, ResourceKind};
use crate::response::{ApiResponse, Interpretation};

/// One logical operation against the remote resource API.
///
/// Transport failures come back as `Err`; anything the API actually
/// answered, including refusals, comes back as an [`ApiResponse`].
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn execute(
        &self,
        operation: Operation,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ApiResponse, MailcowError>;
}

pub async fn list<G: Gateway + ?Sized>(
    gateway: &G,
    kind: ResourceKind,
    include_log: bool,
) -> Result<Vec<Value>, MailcowError> {
    let response = gateway
        .execute(Operation::List { include_log }, kind, Value::Null)
        .await?;
    Ok(response.into_items())
}

pub fn update_payload(id: &str, attrs: &serde_json::Map<String, Value>) -> Value {
    json!({ "items": [id], "attr": attrs })
}

pub async fn update<G: Gateway + ?Sized>(
    gateway: &G,
    kind: ResourceKind,
    id: &str,
    attrs: &serde_json::Map<String, Value>,
) -> Result<Interpretation, MailcowError> {
    let response = gateway
        .execute(Operation::Update, kind, update_payload(id, attrs))
        .await?;
    Ok(response.interpret())
}

pub async fn delete<G: Gateway + ?Sized>(
    gateway: &G,
    kind: ResourceKind,
    ids: &[String],
) -> Result<Interpretation, MailcowError> {
    let response = gateway
        .execute(Operation::Delete, kind, json!(ids))
        .await?;
    Ok(response.interpret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_wraps_id_and_attrs() {
        let mut attrs = serde_json::Map::new();
        attrs.insert("active".into(), json!("0"));
        assert_eq!(
            update_payload("5", &attrs),
            json!({"items": ["5"], "attr": {"active": "0"}})
        );
    }
}
