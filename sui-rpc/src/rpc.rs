use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),
}

impl From<RpcError> for common::FetchError {
    fn from(error: RpcError) -> Self {
        common::FetchError::Rpc(error.to_string())
    }
}

/// Content of an on-chain object as returned by the fullnode: loosely-typed
/// nested field bags. Accessors fail closed (`None`), never panic, so a
/// malformed object degrades to "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiObjectData {
    #[serde(rename = "objectId", default)]
    pub object_id: String,
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl SuiObjectData {
    pub fn fields(&self) -> Option<&Value> {
        self.content.as_ref()?.get("fields")
    }
}

/// Navigate a nested field bag by path, e.g. `field(v, &["value", "fields"])`.
pub fn field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

pub fn field_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    field(value, path)?.as_str()
}

/// Numeric fields arrive as JSON numbers or decimal strings depending on
/// width; accept both.
pub fn field_u64(value: &Value, path: &[&str]) -> Option<u64> {
    let v = field(value, path)?;
    v.as_u64().or_else(|| v.as_str()?.parse().ok())
}

pub fn field_u128(value: &Value, path: &[&str]) -> Option<u128> {
    let v = field(value, path)?;
    v.as_u64().map(u128::from).or_else(|| v.as_str()?.parse().ok())
}

pub fn field_bool(value: &Value, path: &[&str]) -> Option<bool> {
    field(value, path)?.as_bool()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinMetadata {
    pub decimals: u8,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<PageEntry>,
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
    #[serde(rename = "nextCursor", default)]
    next_cursor: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    data: Option<SuiObjectData>,
}

/// JSON-RPC read client for a Sui fullnode. Cheap to clone; all reads are
/// non-blocking.
#[derive(Debug, Clone)]
pub struct SuiRpcClient {
    http: reqwest::Client,
    url: String,
}

impl SuiRpcClient {
    pub fn new(url: &str) -> Self {
        Self { http: reqwest::Client::new(), url: url.to_string() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse<T> =
            self.http.post(&self.url).json(&body).send().await?.json().await?;
        if let Some(error) = response.error {
            return Err(RpcError::Node { code: error.code, message: error.message });
        }
        response.result.ok_or_else(|| RpcError::Parse(format!("{method}: empty result")))
    }

    /// All objects of one struct type owned by an address, following
    /// pagination to the end.
    pub async fn get_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
    ) -> Result<Vec<SuiObjectData>, RpcError> {
        let mut objects = Vec::new();
        let mut cursor: Option<Value> = None;
        loop {
            let page: Page = self
                .call(
                    "suix_getOwnedObjects",
                    json!([
                        owner,
                        {
                            "filter": { "StructType": struct_type },
                            "options": { "showContent": true, "showType": true },
                        },
                        cursor,
                        null,
                    ]),
                )
                .await?;
            objects.extend(page.data.into_iter().filter_map(|entry| entry.data));
            if !page.has_next_page {
                return Ok(objects);
            }
            cursor = page.next_cursor;
        }
    }

    pub async fn get_object(&self, object_id: &str) -> Result<SuiObjectData, RpcError> {
        #[derive(Deserialize)]
        struct Wrapper {
            data: Option<SuiObjectData>,
        }
        let wrapper: Wrapper = self
            .call("sui_getObject", json!([object_id, { "showContent": true, "showType": true }]))
            .await?;
        wrapper.data.ok_or_else(|| RpcError::Parse(format!("object {object_id} not found")))
    }

    /// One dynamic-field child of a table-like parent object. `name_type` is
    /// the Move type of the key (e.g. `u64`, `0x2::object::ID`).
    pub async fn get_dynamic_field_object(
        &self,
        parent_id: &str,
        name_type: &str,
        name_value: Value,
    ) -> Result<SuiObjectData, RpcError> {
        #[derive(Deserialize)]
        struct Wrapper {
            data: Option<SuiObjectData>,
        }
        let wrapper: Wrapper = self
            .call(
                "suix_getDynamicFieldObject",
                json!([parent_id, { "type": name_type, "value": name_value }]),
            )
            .await?;
        wrapper
            .data
            .ok_or_else(|| RpcError::Parse(format!("dynamic field of {parent_id} not found")))
    }

    /// Coin metadata; `Ok(None)` when the node has none registered for the
    /// type (decimals then stay unresolved).
    pub async fn get_coin_metadata(
        &self,
        coin_type: &str,
    ) -> Result<Option<CoinMetadata>, RpcError> {
        self.call("suix_getCoinMetadata", json!([coin_type])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_helpers_fail_closed() {
        let value = json!({
            "fields": {
                "share": "42",
                "nested": { "fields": { "value": 7 } },
                "flag": true,
            }
        });
        assert_eq!(field_u64(&value, &["fields", "share"]), Some(42));
        assert_eq!(field_u64(&value, &["fields", "nested", "fields", "value"]), Some(7));
        assert_eq!(field_bool(&value, &["fields", "flag"]), Some(true));
        assert_eq!(field_str(&value, &["fields", "missing"]), None);
        assert_eq!(field_u64(&value, &["fields", "flag"]), None);
    }

    #[test]
    fn field_u128_accepts_strings() {
        let value = json!({ "value": "340282366920938463463374607431768211455" });
        assert_eq!(field_u128(&value, &["value"]), Some(u128::MAX));
    }
}
