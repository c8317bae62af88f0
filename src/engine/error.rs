// ==========================================
// 屋面工程 KPI 分析引擎 - 引擎错误类型
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("后台计算任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// 是否为输入数据的结构性错误（MalformedRecord / UnmappedStatus）
    pub fn is_structural(&self) -> bool {
        matches!(self, EngineError::Import(e) if e.is_structural())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
