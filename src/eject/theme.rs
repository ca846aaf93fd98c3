//! Theme lookup, copy and git download / 主题定位、复制与 Git 下载

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

use super::{io_error, EjectError};

pub const THEME_PREFIX: &str = "saber-theme-";

/// Resolve a theme name to its directory / 解析主题所在目录
///
/// Relative (`./theme`) and absolute names are taken as paths. Package names
/// are looked up in `node_modules` of `cwd` and each ancestor, first with the
/// `saber-theme-` prefix applied, then as written.
pub fn resolve_theme(name: &str, cwd: &Path) -> Option<PathBuf> {
    if name.starts_with('.') || Path::new(name).is_absolute() {
        let path = cwd.join(name);
        return path.is_dir().then_some(path);
    }

    let candidates = [prefixed_name(name), name.to_string()];
    for dir in cwd.ancestors() {
        let modules = dir.join("node_modules");
        for candidate in &candidates {
            let path = modules.join(candidate);
            if path.is_dir() {
                return Some(path);
            }
        }
    }
    None
}

/// "minimal" -> "saber-theme-minimal", "@org/x" -> "@org/saber-theme-x"
pub fn prefixed_name(name: &str) -> String {
    match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((scope, pkg)) if !pkg.starts_with(THEME_PREFIX) => format!("@{}/{}{}", scope, THEME_PREFIX, pkg),
        Some(_) => name.to_string(),
        None if name.starts_with(THEME_PREFIX) => name.to_string(),
        None => format!("{}{}", THEME_PREFIX, name),
    }
}

/// Copy a theme directory, skipping `node_modules`; returns copied file count / 复制主题
pub fn copy_theme(src: &Path, dest: &Path) -> Result<usize, EjectError> {
    let mut copied = 0;
    let walker = WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != "node_modules");

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            EjectError::Io { path, source: e.into() }
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            std::fs::copy(entry.path(), &target).map_err(io_error(&target))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Theme repository from package.json / 主题仓库信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub url: String,
    /// Subdirectory inside the repository (monorepos) / 仓库内子目录
    pub directory: Option<String>,
}

impl Repository {
    /// `repository` may be a string or `{ url, directory }` / 解析 repository 字段
    pub fn from_package(package: &Value) -> Option<Self> {
        match package.get("repository")? {
            Value::String(url) if !url.is_empty() => Some(Self {
                url: url.clone(),
                directory: None,
            }),
            Value::Object(repo) => {
                let url = repo.get("url")?.as_str().filter(|u| !u.is_empty())?;
                Some(Self {
                    url: url.to_string(),
                    directory: repo.get("directory").and_then(Value::as_str).map(str::to_string),
                })
            }
            _ => None,
        }
    }

    /// URL suitable for `git clone` / 可直接 clone 的地址
    pub fn clone_url(&self) -> String {
        let url = self.url.trim_start_matches("git+");
        let shorthand = [
            ("github:", "https://github.com/"),
            ("gitlab:", "https://gitlab.com/"),
            ("bitbucket:", "https://bitbucket.org/"),
        ];
        for (prefix, host) in shorthand {
            if let Some(rest) = url.strip_prefix(prefix) {
                return format!("{}{}.git", host, rest.trim_end_matches(".git"));
            }
        }
        if !url.contains(':') && url.split('/').count() == 2 {
            // owner/repo
            return format!("https://github.com/{}.git", url.trim_end_matches(".git"));
        }
        url.to_string()
    }
}

/// Shallow-clone the repository and move it into place / 克隆仓库并移动到目标位置
pub fn download_from_git(repo: &Repository, tmp: &Path, dest: &Path) -> Result<(), EjectError> {
    let url = repo.clone_url();
    if tmp.exists() {
        std::fs::remove_dir_all(tmp).map_err(io_error(tmp))?;
    }
    if let Some(parent) = tmp.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    tracing::debug!("git clone --depth 1 {} {:?}", url, tmp);
    let output = Command::new("git")
        .args(["clone", "--depth", "1", &url])
        .arg(tmp)
        .output()
        .map_err(|e| EjectError::Git {
            url: url.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(EjectError::Git {
            url,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let source = match &repo.directory {
        Some(dir) => tmp.join(dir),
        None => tmp.to_path_buf(),
    };
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    std::fs::rename(&source, dest).map_err(io_error(&source))?;
    if tmp.exists() {
        std::fs::remove_dir_all(tmp).map_err(io_error(tmp))?;
    }
    Ok(())
}
