//! Query client - answers free-text queries for the active locale / 查询客户端
//!
//! The strategy is chosen once from the client options:
//! - `Fuzzy`: fetch the published locale index once, strip markup, match locally
//! - `Delegate`: fetch once, hand the raw records and query to user code
//! - `Hosted`: forward every query to the hosted index, restricted to the active
//!   locale; failures yield no results

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

use super::algolia::AlgoliaClient;
use super::debounce::Debounced;
use super::engine::FuzzySearch;
use super::error::SearchError;
use super::schema::{AdapterKind, ClientOptions, IndexRecord};
use super::{REMOTE_INDEX, SEARCH_PATH};
use crate::utils::{locale_key, strip_tags};

/// Debounce window of keystroke-driven queries / 按键查询的防抖窗口
pub const DEBOUNCE_WAIT: Duration = Duration::from_millis(50);

/// Fields holding HTML markup / 含 HTML 的字段
const MARKUP_FIELDS: [&str; 2] = ["excerpt", "content"];

/// Result shared by all callers coalesced into one debounced invocation / 防抖调用的共享结果
pub type SearchOutcome = Result<Vec<IndexRecord>, Arc<SearchError>>;

/// User-supplied search implementation / 自定义搜索实现
#[async_trait]
pub trait SearchDelegate: Send + Sync {
    /// Produce results from the raw published records / 基于原始索引记录产生结果
    async fn search(&self, data: &[IndexRecord], query: &str) -> Result<Vec<IndexRecord>, SearchError>;
}

/// Query strategy / 查询策略
#[derive(Clone)]
pub enum SearchStrategy {
    Fuzzy,
    Delegate(Arc<dyn SearchDelegate>),
    Hosted(AlgoliaClient),
}

impl SearchStrategy {
    /// Select the strategy from client options / 根据配置选择策略
    pub fn from_options(
        options: &ClientOptions,
        delegate: Option<Arc<dyn SearchDelegate>>,
    ) -> Result<Self, SearchError> {
        match options.adapter {
            AdapterKind::Local => Ok(SearchStrategy::Fuzzy),
            AdapterKind::Custom => delegate
                .map(SearchStrategy::Delegate)
                .ok_or(SearchError::MissingOption("search delegate")),
            AdapterKind::Algolia => {
                let app_id = options.algolia_id.as_deref().ok_or(SearchError::MissingOption("algoliaId"))?;
                let key = options
                    .algolia_search_key
                    .as_deref()
                    .ok_or(SearchError::MissingOption("algoliaSearchKey"))?;
                Ok(SearchStrategy::Hosted(AlgoliaClient::new(app_id, key)))
            }
        }
    }
}

/// Cached local index / 缓存的本地索引
enum LocalIndex {
    Fuzzy(FuzzySearch),
    /// Raw records handed to the delegate / 交给自定义实现的原始记录
    Delegated {
        data: Vec<IndexRecord>,
        delegate: Arc<dyn SearchDelegate>,
    },
}

/// Search client for one locale / 单语言搜索客户端
pub struct SearchClient {
    strategy: SearchStrategy,
    index_url: Url,
    /// Hosted query filter restricting hits to the active locale / 托管查询的语言过滤条件
    locale_filter: String,
    http: Client,
    /// Filled on the first query, never refreshed / 首次查询时填充，之后不再刷新
    cache: OnceCell<LocalIndex>,
}

impl SearchClient {
    /// `public_url` is the absolute URL the site is served under,
    /// `locale_path` the active locale path ("/" for the default locale).
    pub fn new(
        options: &ClientOptions,
        public_url: &str,
        locale_path: &str,
        delegate: Option<Arc<dyn SearchDelegate>>,
    ) -> Result<Self, SearchError> {
        let strategy = SearchStrategy::from_options(options, delegate)?;
        Self::with_strategy(strategy, public_url, locale_path)
    }

    pub fn with_strategy(
        strategy: SearchStrategy,
        public_url: &str,
        locale_path: &str,
    ) -> Result<Self, SearchError> {
        let index_url = index_url(public_url, locale_path)?;
        Ok(Self {
            strategy,
            index_url,
            locale_filter: format!("locale:\"{}\"", locale_key(locale_path)),
            http: Client::new(),
            cache: OnceCell::new(),
        })
    }

    /// URL of the published locale index / 语言索引的URL
    pub fn index_url(&self) -> &str {
        self.index_url.as_str()
    }

    /// Run a query / 执行查询
    pub async fn search(&self, query: &str) -> Result<Vec<IndexRecord>, SearchError> {
        match &self.strategy {
            SearchStrategy::Hosted(client) => {
                match client.search(REMOTE_INDEX, query, Some(&self.locale_filter)).await {
                    Ok(hits) => Ok(hits),
                    Err(e) => {
                        tracing::error!("Hosted search failed: {}", e);
                        Ok(Vec::new())
                    }
                }
            }
            SearchStrategy::Fuzzy | SearchStrategy::Delegate(_) => {
                match self.local_index().await? {
                    LocalIndex::Fuzzy(engine) => Ok(engine.search(query)),
                    LocalIndex::Delegated { data, delegate } => delegate.search(data, query).await,
                }
            }
        }
    }

    /// Wrap the client in a 50ms leading + trailing debounce / 包装为防抖查询
    pub fn debounced(self: Arc<Self>) -> Debounced<String, SearchOutcome> {
        Debounced::new(DEBOUNCE_WAIT, move |query: String| {
            let client = self.clone();
            async move { client.search(&query).await.map_err(Arc::new) }
        })
    }

    /// Concurrent first queries share a single fetch / 并发的首次查询共享同一次获取
    async fn local_index(&self) -> Result<&LocalIndex, SearchError> {
        self.cache.get_or_try_init(|| self.fetch_index()).await
    }

    async fn fetch_index(&self) -> Result<LocalIndex, SearchError> {
        let response = self.http.get(self.index_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                url: self.index_url.to_string(),
                status: response.status(),
            });
        }
        let data: Vec<IndexRecord> = response.json().await?;
        tracing::debug!("Fetched {} search records from {}", data.len(), self.index_url);

        Ok(match &self.strategy {
            SearchStrategy::Delegate(delegate) => LocalIndex::Delegated {
                data,
                delegate: delegate.clone(),
            },
            _ => {
                let (records, keys) = prepare_records(data);
                LocalIndex::Fuzzy(FuzzySearch::new(records, keys).sorted(true))
            }
        })
    }
}

/// `{public_url}/_saber/search/{locale}.json` / 索引URL
fn index_url(public_url: &str, locale_path: &str) -> Result<Url, SearchError> {
    let mut base = public_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let path = format!("{}/{}.json", SEARCH_PATH, locale_key(locale_path));

    Url::parse(&base)
        .and_then(|base| base.join(&path))
        .map_err(|source| SearchError::InvalidUrl { url: base, source })
}

/// Strip markup and give every record the same key set / 去除标签并统一字段
///
/// Returns the records and the key union in first-seen order.
pub fn prepare_records(data: Vec<IndexRecord>) -> (Vec<IndexRecord>, Vec<String>) {
    let mut keys: Vec<String> = Vec::new();

    let mut records: Vec<IndexRecord> = data
        .into_iter()
        .map(|mut item| {
            for field in MARKUP_FIELDS {
                let stripped = item.get(field).filter(|v| !v.is_empty()).map(strip_tags);
                if let Some(text) = stripped {
                    item.insert(field, text);
                }
            }
            for key in item.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
            item
        })
        .collect();

    for item in &mut records {
        for key in &keys {
            let missing = matches!(item.value(key), None | Some(serde_json::Value::Null));
            if missing {
                item.insert(key.as_str(), "");
            }
        }
    }

    (records, keys)
}
