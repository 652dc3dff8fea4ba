pub mod sftp;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use sftp::SftpStore;

/// 远端目录条目
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    /// 基础文件名（不含路径前缀）
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// 传输通道抽象接口
///
/// 对应一条已建立、已认证的文件传输会话。实现方保证 put_file
/// 要么完整写入要么失败，不暴露半写状态。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 列出单层远端目录，返回基础文件名
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// 上传单个本地文件到远端路径
    async fn put_file(&self, local: &Path, remote: &str) -> Result<()>;

    /// 释放会话（成功与失败路径都必须调用）
    async fn close(&self) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 拼接远端路径，统一使用 / 分隔
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::remote_join;

    #[test]
    fn join_keeps_trailing_slash() {
        assert_eq!(remote_join("schema_htdocs/jbossas/", "a.xsd"), "schema_htdocs/jbossas/a.xsd");
    }

    #[test]
    fn join_inserts_separator() {
        assert_eq!(remote_join("schema_htdocs/jbossas", "a.xsd"), "schema_htdocs/jbossas/a.xsd");
    }

    #[test]
    fn join_empty_dir() {
        assert_eq!(remote_join("", "index.html"), "index.html");
    }
}
