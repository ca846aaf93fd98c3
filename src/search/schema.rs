//! Search index schema definition / 搜索索引的 Schema 定义

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index record - flattened projection of a page / 索引记录
///
/// Keys keep insertion order (the configured field order) / 键保持插入顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRecord(Map<String, Value>);

impl IndexRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), Value::String(value.into()));
    }

    /// String value of a field / 字段的字符串值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Raw value of a field / 字段的原始值
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace a field's value / 替换字段值
    pub fn set_value(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }
}

impl From<Map<String, Value>> for IndexRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<IndexRecord> for Value {
    fn from(record: IndexRecord) -> Self {
        Value::Object(record.0)
    }
}

/// Locale key -> ordered index records / 语言 -> 索引记录
pub type Database = BTreeMap<String, Vec<IndexRecord>>;

/// Database shared between the builder and the dev server / 构建端与开发服务器共享的数据库
pub type SharedDatabase = Arc<RwLock<Database>>;

/// Index adapter kind / 索引适配器类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Local JSON files + built-in fuzzy matcher / 本地 JSON + 内置模糊匹配
    #[default]
    Local,
    /// Hosted Algolia index / 托管 Algolia 索引
    Algolia,
    /// Local JSON files + user-supplied search delegate / 本地 JSON + 自定义搜索
    Custom,
}

impl AdapterKind {
    /// Whether the index is published as local JSON / 是否发布本地 JSON 索引
    pub fn publishes_locally(&self) -> bool {
        matches!(self, AdapterKind::Local | AdapterKind::Custom)
    }
}

/// Search plugin options / 搜索插件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Fields projected into each record / 索引字段
    pub index: Vec<String>,
    pub adapter: AdapterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algolia_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algolia_search_key: Option<String>,
    /// Admin key, build side only / 管理密钥，仅构建端使用
    #[serde(skip_serializing)]
    pub algolia_admin_key: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            index: vec!["title".to_string(), "excerpt".to_string(), "permalink".to_string()],
            adapter: AdapterKind::Local,
            algolia_id: None,
            algolia_search_key: None,
            algolia_admin_key: None,
        }
    }
}

impl SearchOptions {
    /// Options safe to embed in the browser bundle / 可嵌入浏览器包的配置
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            index: self.index.clone(),
            adapter: self.adapter,
            algolia_id: self.algolia_id.clone(),
            algolia_search_key: self.algolia_search_key.clone(),
        }
    }
}

/// Client-side search options (no admin credential) / 客户端搜索配置（不含管理密钥）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    pub index: Vec<String>,
    pub adapter: AdapterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algolia_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algolia_search_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_merge_over_defaults() {
        let options: SearchOptions = serde_json::from_value(json!({ "adapter": "custom" })).unwrap();
        assert_eq!(options.index, vec!["title", "excerpt", "permalink"]);
        assert_eq!(options.adapter, AdapterKind::Custom);
        assert!(options.adapter.publishes_locally());
        assert!(!AdapterKind::Algolia.publishes_locally());
    }

    #[test]
    fn test_admin_key_never_serialized() {
        let options: SearchOptions = serde_json::from_value(json!({
            "adapter": "algolia",
            "algoliaId": "APP",
            "algoliaSearchKey": "public",
            "algoliaAdminKey": "secret"
        }))
        .unwrap();
        assert_eq!(options.algolia_admin_key.as_deref(), Some("secret"));

        let serialized = serde_json::to_string(&options).unwrap();
        assert!(!serialized.contains("secret"));

        let client = serde_json::to_value(options.client_options()).unwrap();
        assert_eq!(
            client,
            json!({
                "index": ["title", "excerpt", "permalink"],
                "adapter": "algolia",
                "algoliaId": "APP",
                "algoliaSearchKey": "public"
            })
        );
    }

    #[test]
    fn test_record_keeps_field_order() {
        let mut record = IndexRecord::new();
        record.insert("title", "Alpha");
        record.insert("permalink", "/a");
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"title":"Alpha","permalink":"/a"}"#);
        assert_eq!(record.get("title"), Some("Alpha"));
        assert!(!record.contains("excerpt"));
    }
}
