// ==========================================
// 屋面工程 KPI 分析引擎 - 导入层
// ==========================================
// 职责: CRM 快照 → 标准化工单集合
// 支持: JSON（CRM 工单对象）, CSV（状态历史行）
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod job_importer_impl;
pub mod job_importer_trait;
pub mod job_normalizer;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use dq_validator::DqValidator as DqValidatorImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvSnapshotParser, JsonSnapshotParser, UniversalFileParser};
pub use job_importer_impl::JobImporterImpl;
pub use job_normalizer::{normalize_jobs, JobNormalizer};

// 重导出 Trait 接口
pub use job_importer_trait::{DataCleaner, DqValidator, FieldMapper, FileParser, JobImporter};
