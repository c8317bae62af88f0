// ==========================================
// 屋面工程 KPI 分析引擎 - 核心库
// ==========================================
// 技术栈: Rust + tokio + serde
// 系统定位: CRM 快照 → 销售漏斗 KPI + 应收账款报表（只读分析，不回写 CRM）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 漏斗 / 应收 / 报表
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 报表配置
pub mod config;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{JobId, Metric, Money, Timestamp};

// 领域实体
pub use domain::{
    AnalyticsReport, ArBucket, ArEntry, ArLedger, DataQualityWarning, FunnelOutcome,
    FunnelResult, JobRecord, JobSnapshot, MilestonePairStats, RawJobRecord, ReportCell,
    ReportSection, ScopeKey, SettleWindow, StatusEntry,
};

// 配置
pub use config::{
    parse_window_bound, ConfigError, ConfigManager, MilestoneDefinition, ReportConfig, WindowSide,
};

// 导入
pub use importer::{normalize_jobs, ImportError, JobImporter, JobImporterImpl};

// 引擎
pub use engine::{
    assemble_report, compute_ar, compute_funnel, global_and_representative, EngineError,
    EngineResult, ReportOrchestrator, ReportSelection,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "屋面工程 KPI 分析引擎";
