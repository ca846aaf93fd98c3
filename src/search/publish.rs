//! Publish the built database / 发布搜索数据库
//!
//! - Local: one JSON file per locale under `<out_dir>/_saber/search/`
//! - Hosted: every record pushed to the remote `pages` index

use std::path::{Path, PathBuf};

use super::algolia::AlgoliaClient;
use super::error::SearchError;
use super::schema::Database;
use super::{REMOTE_INDEX, SEARCH_PATH};

/// Directory holding the per-locale artifacts / 索引文件目录
pub fn search_dir(out_dir: &Path) -> PathBuf {
    SEARCH_PATH.split('/').fold(out_dir.to_path_buf(), |dir, part| dir.join(part))
}

/// Artifact path of a locale / 某语言的索引文件路径
pub fn locale_file(out_dir: &Path, locale: &str) -> PathBuf {
    search_dir(out_dir).join(format!("{}.json", locale))
}

/// Write one JSON file per locale / 每个语言写一个 JSON 文件
pub async fn write_local(db: &Database, out_dir: &Path) -> Result<Vec<PathBuf>, SearchError> {
    let mut written = Vec::with_capacity(db.len());

    for (locale, records) in db {
        let path = locale_file(out_dir, locale);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SearchError::Io { path: parent.to_path_buf(), source })?;
        }

        let data = serde_json::to_vec(records)?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|source| SearchError::Io { path: path.clone(), source })?;

        tracing::debug!("Wrote search index {:?} ({} records)", path, records.len());
        written.push(path);
    }

    tracing::info!("Search index written for {} locales", written.len());
    Ok(written)
}

/// Replace the hosted index with the database, tagging each record with its locale / 推送到托管索引
///
/// The remote index is cleared first, then every record is saved under a
/// stable `objectID` (`{locale}:{permalink}`, or `{locale}:{position}` when
/// permalinks are not indexed). Pushing the same database twice yields the same index.
pub async fn push_remote(db: &Database, client: &AlgoliaClient) -> Result<usize, SearchError> {
    let mut objects = Vec::new();
    for (locale, records) in db {
        for (position, record) in records.iter().enumerate() {
            let object_id = match record.get("permalink") {
                Some(permalink) => format!("{}:{}", locale, permalink),
                None => format!("{}:{}", locale, position),
            };
            let mut object = record.clone();
            object.insert("locale", locale.as_str());
            objects.push((object_id, object));
        }
    }

    let count = objects.len();
    client.clear_objects(REMOTE_INDEX).await?;
    client.save_objects(REMOTE_INDEX, objects).await?;
    tracing::info!("Pushed {} records to remote index {}", count, REMOTE_INDEX);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::algolia::tests::{mock_service, REJECTED_KEY};
    use crate::search::schema::IndexRecord;
    use serde_json::json;

    fn record(title: &str, permalink: &str) -> IndexRecord {
        let mut record = IndexRecord::new();
        record.insert("title", title);
        record.insert("permalink", permalink);
        record
    }

    #[tokio::test]
    async fn test_write_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new();
        db.insert("default".to_string(), vec![record("Alpha", "/a")]);
        db.insert("zh".to_string(), vec![record("甲", "/zh/a"), record("乙", "/zh/b")]);
        db.insert("empty".to_string(), Vec::new());

        let written = write_local(&db, dir.path()).await.unwrap();
        assert_eq!(written.len(), 3);

        let default = std::fs::read_to_string(dir.path().join("_saber/search/default.json")).unwrap();
        assert_eq!(default, r#"[{"title":"Alpha","permalink":"/a"}]"#);

        let zh: Vec<IndexRecord> =
            serde_json::from_slice(&std::fs::read(locale_file(dir.path(), "zh")).unwrap()).unwrap();
        assert_eq!(zh, db["zh"]);

        let empty = std::fs::read_to_string(locale_file(dir.path(), "empty")).unwrap();
        assert_eq!(empty, "[]");

        // 重复写入（目录已存在）
        write_local(&db, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // 以文件占据目录位置，创建目录必然失败
        std::fs::write(dir.path().join("_saber"), "not a dir").unwrap();

        let mut db = Database::new();
        db.insert("default".to_string(), vec![record("Alpha", "/a")]);
        let err = write_local(&db, dir.path()).await.unwrap_err();
        assert!(matches!(err, SearchError::Io { .. }));
    }

    fn hosted_db() -> Database {
        let mut untitled = IndexRecord::new();
        untitled.insert("title", "No link");

        let mut db = Database::new();
        db.insert("default".to_string(), vec![record("Alpha", "/a"), untitled]);
        db.insert("zh".to_string(), vec![record("甲", "/zh/a")]);
        db
    }

    #[tokio::test]
    async fn test_push_remote_replaces_index() {
        let (host, requests) = mock_service().await;
        let client = AlgoliaClient::new("APP", "admin").with_host(&host);
        let db = hosted_db();

        assert_eq!(push_remote(&db, &client).await.unwrap(), 3);
        push_remote(&db, &client).await.unwrap();

        let requests = requests.lock();
        let operations: Vec<&str> = requests.iter().map(|(op, _, _)| op.as_str()).collect();
        assert_eq!(operations, vec!["pages/clear", "pages/batch", "pages/clear", "pages/batch"]);

        // 所有语言合并为一个批次，objectID 稳定
        let expected = json!({ "requests": [
            { "action": "updateObject", "body": { "title": "Alpha", "permalink": "/a", "locale": "default", "objectID": "default:/a" } },
            { "action": "updateObject", "body": { "title": "No link", "locale": "default", "objectID": "default:1" } },
            { "action": "updateObject", "body": { "title": "甲", "permalink": "/zh/a", "locale": "zh", "objectID": "zh:/zh/a" } }
        ] });
        assert_eq!(requests[1].2, expected);
        assert_eq!(requests[3].2, expected);
    }

    #[tokio::test]
    async fn test_push_failure_propagates() {
        let (host, requests) = mock_service().await;
        let client = AlgoliaClient::new("APP", REJECTED_KEY).with_host(&host);

        let err = push_remote(&hosted_db(), &client).await.unwrap_err();
        assert!(matches!(err, SearchError::Status { .. }));
        assert!(requests.lock().is_empty());
    }
}
