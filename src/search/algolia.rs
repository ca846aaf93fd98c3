//! Hosted search client (Algolia REST API) / 托管搜索客户端
//!
//! The build side uses the admin key to push records, the query side uses the
//! public search key. Both talk to the same named index.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::SearchError;
use super::schema::IndexRecord;

const APP_ID_HEADER: &str = "X-Algolia-Application-Id";
const API_KEY_HEADER: &str = "X-Algolia-API-Key";
const OBJECT_ID: &str = "objectID";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<IndexRecord>,
}

/// Algolia REST client / Algolia REST 客户端
#[derive(Clone)]
pub struct AlgoliaClient {
    app_id: String,
    api_key: String,
    write_host: String,
    read_host: String,
    client: Client,
}

impl std::fmt::Debug for AlgoliaClient {
    // 不输出密钥
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgoliaClient")
            .field("app_id", &self.app_id)
            .field("write_host", &self.write_host)
            .field("read_host", &self.read_host)
            .finish()
    }
}

impl AlgoliaClient {
    pub fn new(app_id: &str, api_key: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            api_key: api_key.to_string(),
            write_host: format!("https://{}.algolia.net", app_id),
            read_host: format!("https://{}-dsn.algolia.net", app_id),
            client: Client::new(),
        }
    }

    /// Point both read and write requests at a custom host / 自定义服务地址
    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim_end_matches('/').to_string();
        self.write_host = host.clone();
        self.read_host = host;
        self
    }

    /// Remove every object of an index / 清空索引
    pub async fn clear_objects(&self, index: &str) -> Result<(), SearchError> {
        let url = format!("{}/1/indexes/{}/clear", self.write_host, urlencoding::encode(index));
        let response = self
            .client
            .post(&url)
            .header(APP_ID_HEADER, &self.app_id)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status { url, status: response.status() });
        }
        Ok(())
    }

    /// Save objects keyed by `objectID` in one batch, replacing existing ones / 按 objectID 批量保存
    pub async fn save_objects(&self, index: &str, objects: Vec<(String, IndexRecord)>) -> Result<(), SearchError> {
        let url = format!("{}/1/indexes/{}/batch", self.write_host, urlencoding::encode(index));
        let requests: Vec<Value> = objects
            .into_iter()
            .map(|(object_id, mut body)| {
                body.insert(OBJECT_ID, object_id);
                json!({ "action": "updateObject", "body": body })
            })
            .collect();

        let response = self
            .client
            .post(&url)
            .header(APP_ID_HEADER, &self.app_id)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status { url, status: response.status() });
        }
        Ok(())
    }

    /// Query an index, the service owns ranking / 查询索引，排序由服务端负责
    ///
    /// `filters` uses the service's filter syntax, e.g. `locale:"zh"`; the
    /// filtered attribute must be declared for faceting on the index.
    pub async fn search(
        &self,
        index: &str,
        query: &str,
        filters: Option<&str>,
    ) -> Result<Vec<IndexRecord>, SearchError> {
        let url = format!("{}/1/indexes/{}/query", self.read_host, urlencoding::encode(index));
        let mut params = format!("query={}", urlencoding::encode(query));
        if let Some(filters) = filters {
            params.push_str(&format!("&filters={}", urlencoding::encode(filters)));
        }

        let response = self
            .client
            .post(&url)
            .header(APP_ID_HEADER, &self.app_id)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "params": params }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status { url, status: response.status() });
        }

        let body: QueryResponse = response.json().await?;
        Ok(body.hits)
    }
}
