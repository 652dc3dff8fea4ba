//! 索引页生成 - 列出远端目录当前所有文件的静态 HTML

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 索引页固定文件名，不会出现在自身的列表里
pub const INDEX_FILE_NAME: &str = "index.html";

/// 索引页生成器
pub struct IndexBuilder;

impl IndexBuilder {
    /// 渲染索引页
    ///
    /// 输入集合相同则输出字节完全一致：BTreeSet 保证按字节序升序，
    /// 每个条目是一个自引用链接（href 与文本都是文件名本身）。
    pub fn render(names: &BTreeSet<String>) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html>\n");
        html.push_str("<head>\n");
        html.push_str("<meta charset=\"utf-8\"/>\n");
        html.push_str("</head>\n");
        html.push_str("<body>\n");
        html.push_str("<ul>\n");
        for name in names {
            if name == INDEX_FILE_NAME {
                continue;
            }
            html.push_str(&format!("<li><a href=\"{}\">{}</a></li>\n", name, name));
        }
        html.push_str("</ul>\n");
        html.push_str("</body>\n");
        html.push_str("</html>\n");
        html
    }

    /// 在本地目录下全量重写 index.html
    ///
    /// 旧文件先删除再写入，不做追加；目录不存在时先创建，
    /// 保证空目录（纯索引）运行也能成功。
    pub async fn write_local(dir: &Path, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;

        let path = dir.join(INDEX_FILE_NAME);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        fs::write(&path, html).await?;
        debug!("本地索引已生成: {}", path.display());

        Ok(path)
    }
}
