//! Development search endpoint / 开发模式搜索接口
//!
//! GET /_saber/search/{locale}.json

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::schema::SharedDatabase;
use super::SEARCH_PATH;

/// Routes serving the in-memory database / 提供内存数据库的路由
pub fn routes(db: SharedDatabase) -> Router {
    Router::new()
        .route(&format!("/{}/*file", SEARCH_PATH), get(serve_locale))
        .with_state(db)
}

/// Return the records of one locale, 404 when unknown / 返回某语言的索引记录
async fn serve_locale(State(db): State<SharedDatabase>, Path(file): Path<String>) -> Response {
    let Some(locale) = file.strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // 只在克隆期间持有读锁
    let records = db.read().get(locale).cloned();
    match records {
        Some(records) => Json(records).into_response(),
        None => {
            tracing::debug!("Search index requested for unknown locale: {}", locale);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::{Database, IndexRecord};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use parking_lot::RwLock;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn shared() -> SharedDatabase {
        let mut record = IndexRecord::new();
        record.insert("title", "Alpha");
        record.insert("permalink", "/a");

        let mut db = Database::new();
        db.insert("default".to_string(), vec![record]);
        db.insert("zh/tw".to_string(), Vec::new());
        Arc::new(RwLock::new(db))
    }

    async fn get(db: SharedDatabase, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = routes(db)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_serves_known_locale() {
        let (status, content_type, body) = get(shared(), "/_saber/search/default.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, br#"[{"title":"Alpha","permalink":"/a"}]"#.to_vec());

        let (status, _, body) = get(shared(), "/_saber/search/zh/tw.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]".to_vec());
    }

    #[tokio::test]
    async fn test_unknown_locale_is_404() {
        let (status, _, body) = get(shared(), "/_saber/search/fr.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, _, _) = get(shared(), "/_saber/search/default").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reads_latest_database() {
        let db = shared();
        db.write().insert("ja".to_string(), Vec::new());
        let (status, _, _) = get(db, "/_saber/search/ja.json").await;
        assert_eq!(status, StatusCode::OK);
    }
}
