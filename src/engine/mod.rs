// ==========================================
// 屋面工程 KPI 分析引擎 - 引擎层
// ==========================================
// 职责: 漏斗计算 / 应收聚合 / 报表组装 / 编排
// 红线: 引擎只读标准化工单，不做 I/O（编排器除外）
// ==========================================

pub mod error;
pub mod funnel;
pub mod milestone_matcher;
pub mod orchestrator;
pub mod receivable;
pub mod report_assembler;
pub mod scope;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use funnel::{compute_funnel, FunnelCalculator, PairOutcome};
pub use milestone_matcher::{Arrival, MilestoneMatcher};
pub use orchestrator::ReportOrchestrator;
pub use receivable::{compute_ar, ArAggregator};
pub use report_assembler::{
    assemble_report, section_keys, ReportAssembler, ReportInput, ReportSelection,
    TOTAL_ROW_LABEL,
};
pub use scope::{global_and_representative, global_only};
