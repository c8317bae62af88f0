// ==========================================
// 屋面工程 KPI 分析引擎 - 工单导入 Trait
// ==========================================
// 职责: 定义工单导入接口（不包含实现）
// 管道: 解析 → 映射 → 清洗 → 校验 → 标准化
// ==========================================

use crate::domain::job::{JobSnapshot, RawJobRecord};
use crate::domain::types::{Money, Timestamp};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

// ==========================================
// JobImporter Trait
// ==========================================
// 用途: 工单导入主接口
// 实现者: JobImporterImpl
#[async_trait]
pub trait JobImporter: Send + Sync {
    /// 从快照文件导入工单
    ///
    /// # 参数
    /// - file_path: 快照文件路径（.json / .csv）
    ///
    /// # 返回
    /// - Ok(JobSnapshot): 标准化后的工单集合
    /// - Err: 文件错误、映射错误或结构性错误（MalformedRecord / UnmappedStatus）
    async fn import_file(&self, file_path: &Path) -> ImportResult<JobSnapshot>;

    /// 从已映射的原始工单导入（跳过解析与映射阶段）
    fn import_records(&self, records: Vec<RawJobRecord>) -> ImportResult<JobSnapshot>;

    /// 批量导入多个快照文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入相互独立
    /// - 某个文件失败不影响其他文件，结果按入参顺序返回
    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<JobSnapshot>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: JsonSnapshotParser, CsvSnapshotParser
pub trait FileParser: Send + Sync {
    /// 解析文件为 CRM 形态的工单对象列表
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<Value>>;

    /// 解析内存中的文件内容
    fn parse_str(&self, content: &str) -> ImportResult<Vec<Value>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口（阶段 1）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 将 CRM 工单对象映射为 RawJobRecord
    ///
    /// # 参数
    /// - object: 工单对象（jnid / sales_rep_name / status_history ...）
    /// - source_row: 来源序号（从 1 开始，用于错误定位）
    fn map_to_raw_job(&self, object: &Value, source_row: usize) -> ImportResult<RawJobRecord>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 数据清洗接口（阶段 2）
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（TRIM）
    fn clean_text(&self, value: &str) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 解析金额（美元 → 分）
    ///
    /// # 规则
    /// - null / 空字符串 → 0
    /// - 数字按美元解析
    /// - 字符串允许 "$" 与千分位逗号
    fn parse_money(&self, value: &Value, row: usize, field: &str) -> ImportResult<Money>;

    /// 解析时间戳
    ///
    /// # 规则
    /// - Unix 秒（数字或数字字符串）；0 表示"无值" → None
    /// - RFC 3339 字符串
    /// - null / 空字符串 → None
    fn parse_timestamp(&self, value: &Value, row: usize, field: &str)
        -> ImportResult<Option<Timestamp>>;

    /// 清洗整条原始工单（文本 TRIM + NULL 标准化）
    fn clean_record(&self, record: &mut RawJobRecord);
}

// ==========================================
// DqValidator Trait
// ==========================================
// 用途: 数据质量校验接口（阶段 3）
// 实现者: DqValidatorImpl
pub trait DqValidator: Send + Sync {
    /// 严格模式：校验所有状态标签均已登记
    fn validate_labels(&self, records: &[RawJobRecord]) -> ImportResult<()>;
}
