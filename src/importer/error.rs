// ==========================================
// 屋面工程 KPI 分析引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 结构性错误一律致命，不产生部分报表
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 结构性错误（致命） =====
    #[error("工单记录不合法 ({record}): {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("未登记的状态标签 (工单 {record}): {status}")]
    UnmappedStatus { record: String, status: String },

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .json/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("字段映射失败 (行 {row}): {message}")]
    FieldMappingError { row: usize, message: String },

    #[error("时间格式错误 (行 {row}, 字段 {field}): 期望 Unix 秒或 RFC 3339，实际 {value}")]
    TimestampFormatError {
        row: usize,
        field: String,
        value: String,
    },
}

impl ImportError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        ImportError::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// 是否为结构性（数据本身）错误
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportError::MalformedRecord { .. } | ImportError::UnmappedStatus { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
