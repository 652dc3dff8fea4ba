use std::collections::HashSet;

/// 单个文件的同步决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// 远端缺失，需要上传
    Upload,
    /// 远端已存在同名文件
    AlreadyRemote,
    /// 本次运行已上传过同名文件（同名冲突取先遇到的，后续静默跳过）
    AlreadyUploaded,
}

impl SyncDecision {
    pub fn is_upload(&self) -> bool {
        matches!(self, SyncDecision::Upload)
    }
}

/// 同步规划器
///
/// 纯决策函数，不做任何 I/O。uploaded 集合由编排器在每次上传成功后
/// 立刻更新，保证后续同名文件被正确抑制。
pub struct SyncPlanner;

impl SyncPlanner {
    pub fn decide(
        name: &str,
        remote: &HashSet<String>,
        uploaded: &HashSet<String>,
    ) -> SyncDecision {
        if remote.contains(name) {
            SyncDecision::AlreadyRemote
        } else if uploaded.contains(name) {
            SyncDecision::AlreadyUploaded
        } else {
            SyncDecision::Upload
        }
    }
}
