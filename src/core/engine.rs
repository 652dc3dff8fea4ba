use crate::config::SyncJob;
use crate::core::index::{IndexBuilder, INDEX_FILE_NAME};
use crate::core::planner::{SyncDecision, SyncPlanner};
use crate::core::scanner::{FileScanner, LocalFile, ScanConfig};
use crate::storage::{remote_join, RemoteStore, SftpStore};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 同步配置
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// 扫描配置
    pub scan: ScanConfig,
}

/// 同步错误，按失败阶段区分
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("扫描本地目录失败: {0:#}")]
    LocalScan(anyhow::Error),
    #[error("建立传输会话失败: {0:#}")]
    Connect(anyhow::Error),
    #[error("列出远端目录 {dir} 失败: {err:#}")]
    RemoteList { dir: String, err: anyhow::Error },
    #[error("上传 {name} 失败: {err:#}")]
    Upload { name: String, err: anyhow::Error },
    #[error("生成本地索引失败: {0:#}")]
    IndexWrite(anyhow::Error),
    #[error("上传索引失败: {0:#}")]
    IndexUpload(anyhow::Error),
}

impl SyncError {
    /// 失败阶段标识（用于退出状态报告）
    pub fn stage(&self) -> &'static str {
        match self {
            SyncError::LocalScan(_) => "local-scan",
            SyncError::Connect(_) => "connect",
            SyncError::RemoteList { .. } => "remote-list",
            SyncError::Upload { .. } => "upload",
            SyncError::IndexWrite(_) => "index-write",
            SyncError::IndexUpload(_) => "index-upload",
        }
    }
}

/// 同步报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: i64,
    pub finished_at: i64,
    pub duration_secs: i64,
    pub files_scanned: usize,
    pub files_uploaded: usize,
    pub files_skipped: usize,
    pub index_entries: usize,
}

/// 同步引擎
///
/// 严格线性编排：扫描本地 -> 建立会话 -> 列出远端 -> 逐个决策并上传
/// -> 重建并上传索引 -> 释放会话。任何阶段失败都会中止剩余步骤，
/// 但会话总是被释放。
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }

    /// 运行一次完整同步
    pub async fn run(&self, job: &SyncJob) -> Result<SyncReport, SyncError> {
        let scanner = FileScanner::with_config(self.config.scan.clone());
        let files = scanner
            .scan(&job.local_dir)
            .await
            .map_err(SyncError::LocalScan)?;

        let store = SftpStore::connect(&job.remote)
            .await
            .map_err(SyncError::Connect)?;

        self.run_with_store(&files, Arc::new(store), &job.local_dir, &job.remote_dir)
            .await
    }

    /// 在已建立的会话上执行同步，并保证会话在所有退出路径上被释放
    pub async fn run_with_store(
        &self,
        files: &[LocalFile],
        remote: Arc<dyn RemoteStore>,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<SyncReport, SyncError> {
        let outcome = self
            .sync_with_remote(files, remote.as_ref(), local_dir, remote_dir)
            .await;

        if let Err(e) = remote.close().await {
            warn!("释放传输会话失败: {:#}", e);
        }

        outcome
    }

    async fn sync_with_remote(
        &self,
        files: &[LocalFile],
        remote: &dyn RemoteStore,
        local_dir: &Path,
        remote_dir: &str,
    ) -> Result<SyncReport, SyncError> {
        let started = chrono::Utc::now();
        info!(
            "开始同步: {} 个本地候选 -> {} {}",
            files.len(),
            remote.name(),
            remote_dir
        );

        let entries = remote
            .list_dir(remote_dir)
            .await
            .map_err(|err| SyncError::RemoteList {
                dir: remote_dir.to_string(),
                err,
            })?;
        let remote_names: HashSet<String> = entries.into_iter().map(|e| e.name).collect();
        debug!("远端现有 {} 个条目", remote_names.len());

        let mut uploaded: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;

        for file in files {
            match SyncPlanner::decide(&file.name, &remote_names, &uploaded) {
                SyncDecision::Upload => {
                    let target = remote_join(remote_dir, &file.name);
                    info!("上传文件: {} -> {}", file.path.display(), target);
                    remote
                        .put_file(&file.path, &target)
                        .await
                        .map_err(|err| SyncError::Upload {
                            name: file.name.clone(),
                            err,
                        })?;
                    // 上传成功立即入集合，后续同名文件据此被抑制
                    uploaded.insert(file.name.clone());
                }
                decision => {
                    debug!("文件已存在，跳过: {} ({:?})", file.name, decision);
                    skipped += 1;
                }
            }
        }

        // 索引内容 = 远端原有 ∪ 本次上传，排除索引自身
        let mut names: BTreeSet<String> = remote_names.iter().cloned().collect();
        names.extend(uploaded.iter().cloned());
        names.remove(INDEX_FILE_NAME);

        let html = IndexBuilder::render(&names);
        let local_index = IndexBuilder::write_local(local_dir, &html)
            .await
            .map_err(SyncError::IndexWrite)?;

        let index_target = remote_join(remote_dir, INDEX_FILE_NAME);
        remote
            .put_file(&local_index, &index_target)
            .await
            .map_err(SyncError::IndexUpload)?;

        let finished = chrono::Utc::now();
        info!(
            "同步完成: 上传 {}, 跳过 {}, 索引 {} 个条目",
            uploaded.len(),
            skipped,
            names.len()
        );

        Ok(SyncReport {
            started_at: started.timestamp(),
            finished_at: finished.timestamp(),
            duration_secs: (finished - started).num_seconds(),
            files_scanned: files.len(),
            files_uploaded: uploaded.len(),
            files_skipped: skipped,
            index_entries: names.len(),
        })
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}
