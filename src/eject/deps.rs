//! Dependency merge and install / 依赖合并与安装

use serde_json::{Map, Value};
use std::path::Path;
use std::process::{Command, Stdio};

use super::{io_error, read_package, EjectError};

const DEPENDENCY_FIELDS: [&str; 2] = ["dependencies", "devDependencies"];

/// Merge the theme's (dev)dependencies into the project package.json / 合并依赖
///
/// Theme entries override project entries; the theme itself is removed.
pub fn merge_dependencies(project_file: &Path, theme_package: &Value) -> Result<(), EjectError> {
    let mut project = read_package(project_file)?;
    let theme_name = theme_package.get("name").and_then(Value::as_str);

    let Some(root) = project.as_object_mut() else {
        return Err(EjectError::Package {
            path: project_file.to_path_buf(),
            source: serde::de::Error::custom("expected an object"),
        });
    };

    for field in DEPENDENCY_FIELDS {
        let mut merged = match root.get(field) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        if let Some(Value::Object(theme_deps)) = theme_package.get(field) {
            for (name, version) in theme_deps {
                merged.insert(name.clone(), version.clone());
            }
        }
        if let Some(name) = theme_name {
            merged.remove(name);
        }
        root.insert(field.to_string(), Value::Object(merged));
    }

    let mut data = serde_json::to_string_pretty(&project).map_err(|source| EjectError::Package {
        path: project_file.to_path_buf(),
        source,
    })?;
    data.push('\n');
    std::fs::write(project_file, data).map_err(io_error(project_file))
}

/// Install with yarn when available, otherwise npm / 安装依赖
pub fn install_dependencies(cwd: &Path) -> Result<(), EjectError> {
    let has_yarn = Command::new("yarn")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    let (program, args): (&str, &[&str]) = if has_yarn { ("yarn", &[]) } else { ("npm", &["install"]) };
    tracing::info!("Installing dependencies with {}", program);

    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .map_err(|e| EjectError::Install(format!("{}: {}", program, e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(EjectError::Install(format!("{} exited with {}", program, status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_and_removes_theme() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        std::fs::write(
            &file,
            r#"{"name":"site","dependencies":{"vue":"^2.5.0","saber-theme-docs":"^0.1.0"},"devDependencies":{"saber-theme-docs":"^0.1.0"}}"#,
        )
        .unwrap();

        let theme = json!({
            "name": "saber-theme-docs",
            "dependencies": { "vue": "^2.6.0", "prismjs": "^1.0.0" },
            "devDependencies": { "eslint": "^6.0.0" }
        });
        merge_dependencies(&file, &theme).unwrap();

        let text = std::fs::read_to_string(&file).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"name\": \"site\""));

        let package: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(package["dependencies"], json!({ "vue": "^2.6.0", "prismjs": "^1.0.0" }));
        assert_eq!(package["devDependencies"], json!({ "eslint": "^6.0.0" }));
    }

    #[test]
    fn test_merge_without_project_package() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        merge_dependencies(&file, &json!({ "name": "t", "dependencies": { "a": "1" } })).unwrap();

        let package: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(package, json!({ "dependencies": { "a": "1" }, "devDependencies": {} }));
    }
}
