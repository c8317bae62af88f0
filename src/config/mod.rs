// ==========================================
// 屋面工程 KPI 分析引擎 - 配置层
// ==========================================
// 职责: 里程碑/流失标签/结算窗口/应收排序等显式配置的加载与校验
// 存储: JSON 文件 + 内置默认值
// ==========================================

pub mod config_manager;
pub mod error;
pub mod report_config;
pub mod settle_window;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use error::ConfigError;
pub use report_config::{
    default_ar_status_order, default_loss_statuses, default_milestones, MilestoneDefinition,
    ReportConfig,
};
pub use settle_window::{parse_window_bound, WindowSide};
