// ==========================================
// 屋面工程 KPI 分析引擎 - 领域模型层
// ==========================================
// 职责: 定义工单、漏斗、应收、报表等不可变值对象
// 红线: 不含导入逻辑,不含引擎逻辑
// ==========================================

pub mod funnel;
pub mod job;
pub mod quality;
pub mod receivable;
pub mod report;
pub mod types;

// 重导出核心类型
pub use funnel::{
    FunnelOutcome, FunnelResult, MilestonePairStats, MilestoneReach, ScopeKey, SettleWindow,
};
pub use job::{latest_timestamp, JobRecord, JobSnapshot, RawJobRecord, StatusEntry};
pub use quality::{DataQualityWarning, WarningKind};
pub use receivable::{ArBucket, ArEntry, ArLedger};
pub use report::{AnalyticsReport, ColumnKind, ReportCell, ReportColumn, ReportRow, ReportSection};
pub use types::{JobId, Metric, Money, Timestamp, SECONDS_PER_DAY};
