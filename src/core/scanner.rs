use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// 本地候选文件
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    /// 基础文件名
    pub name: String,
}

/// 文件扫描器配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 按目录名整体剪枝（子树完全不访问）
    pub exclude_dirs: Vec<String>,
    /// 仅包含的文件名后缀（区分大小写）
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: vec![
                "test".to_string(),
                "test-classes".to_string(),
                "generated-test-resources".to_string(),
            ],
            extensions: vec![".xsd".to_string(), ".dtd".to_string()],
        }
    }
}

/// 文件扫描器
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// 递归扫描本地目录，返回候选文件列表
    ///
    /// 根目录不存在时返回空列表而不是错误；单个条目读取失败
    /// 只跳过该条目，遍历继续。返回顺序确定（按文件名排序）。
    pub async fn scan(&self, root: &Path) -> Result<Vec<LocalFile>> {
        if !root.exists() {
            info!("本地目录不存在，候选文件为空: {}", root.display());
            return Ok(Vec::new());
        }

        // 根目录本身不可访问是致命错误；子条目的读取失败只会被跳过
        std::fs::read_dir(root).with_context(|| format!("无法访问根目录 {}", root.display()))?;

        let root = root.to_path_buf();
        let config = self.config.clone();

        // 使用 spawn_blocking 避免阻塞 async runtime
        let files = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !Self::is_pruned(&config, entry))
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let name = entry.file_name().to_str()?.to_string();
                    if !Self::is_selected(&config, &name) {
                        return None;
                    }
                    debug!("本地候选: {}", entry.path().display());
                    Some(LocalFile {
                        path: entry.path().to_path_buf(),
                        name,
                    })
                })
                .collect::<Vec<_>>()
        })
        .await?;

        info!("扫描完成: {} 个候选文件", files.len());
        Ok(files)
    }

    /// 目录剪枝判定
    fn is_pruned(config: &ScanConfig, entry: &walkdir::DirEntry) -> bool {
        // 只按目录名剪枝，根目录自身同名时同样生效
        if !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| config.exclude_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
    }

    /// 文件选取判定（后缀区分大小写）
    fn is_selected(config: &ScanConfig, name: &str) -> bool {
        config.extensions.iter().any(|ext| name.ends_with(ext))
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"<xs:schema/>").unwrap();
    }

    #[tokio::test]
    async fn selects_only_schema_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.xsd"));
        touch(&dir.path().join("b.dtd"));
        touch(&dir.path().join("a.xsd.bak"));
        touch(&dir.path().join("readme.md"));
        fs::create_dir_all(dir.path().join("c.xsd")).unwrap();

        let files = FileScanner::new().scan(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.xsd", "b.dtd"]);
    }

    #[tokio::test]
    async fn prunes_test_directories_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("keep/a.xsd"));
        touch(&dir.path().join("test/skip.xsd"));
        touch(&dir.path().join("keep/test-classes/skip.dtd"));
        touch(&dir.path().join("deep/nested/generated-test-resources/inner/skip.xsd"));

        let files = FileScanner::new().scan(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.xsd"]);
    }

    #[tokio::test]
    async fn root_named_like_excluded_dir_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("test");
        touch(&root.join("a.xsd"));

        let files = FileScanner::new().scan(&root).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn extension_match_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("upper.XSD"));
        touch(&dir.path().join("lower.xsd"));

        let files = FileScanner::new().scan(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["lower.xsd"]);
    }

    #[tokio::test]
    async fn missing_root_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let files = FileScanner::new().scan(&missing).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn order_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("z.xsd"));
        touch(&dir.path().join("a.xsd"));
        touch(&dir.path().join("m/inner.dtd"));

        let scanner = FileScanner::new();
        let first = scanner.scan(dir.path()).await.unwrap();
        let second = scanner.scan(dir.path()).await.unwrap();
        let names = |v: &[LocalFile]| v.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }
}
