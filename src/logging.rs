// ==========================================
// 屋面工程 KPI 分析引擎 - 日志系统
// ==========================================
// 输出: stderr（stdout 只写报表）
// 格式: 文本（默认）/ JSON（KPI_LOG_FORMAT=json，便于日志采集）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器
const DEFAULT_FILTER: &str = "info";

/// 测试过滤器（perf 埋点太吵，只留 warn）
const TEST_FILTER: &str = "debug,perf=warn";

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "KPI_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(v) => Self::parse(&v),
            Err(_) => LogFormat::Text,
        }
    }

    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 过滤器（默认: info），例如 RUST_LOG=roofing_kpi=trace,perf=off
/// - KPI_LOG_FORMAT: text | json
///
/// # 示例
/// ```no_run
/// roofing_kpi::logging::init();
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    // 重复初始化时保留已有 subscriber
    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

/// 测试用日志（输出交给测试框架捕获）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(TEST_FILTER))
        .with_test_writer()
        .try_init();
}
