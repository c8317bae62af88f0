// ==========================================
// 屋面工程 KPI 分析引擎 - 命令行入口
// ==========================================
// 用法: roofing-kpi [--config FILE] [--output FILE|-] [--as-of RFC3339] [--from D] [--to D] <report|kpi|ar> <SNAPSHOT>
// 输出: 报表 JSON（日志写 stderr）
// ==========================================

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use roofing_kpi::{
    logging, parse_window_bound, ConfigManager, ReportOrchestrator, ReportSelection, WindowSide,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "roofing-kpi")]
#[command(version, about = "屋面工程销售漏斗 KPI 与应收账款报表")]
struct Cli {
    /// 配置文件路径（缺省: 用户配置目录下的 roofing-kpi/config.json，不存在则用内置默认值）
    #[arg(short, long, env = "ROOFING_KPI_CONFIG")]
    config: Option<PathBuf>,

    /// 报表输出路径（"-" 或缺省为标准输出）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 报表基准时间（RFC 3339），缺省为配置值或当前时间
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<DateTime<Utc>>,

    /// 结算窗口下界: forever / ytd / today / YYYY-MM-DD（缺省取配置值）
    #[arg(long)]
    from: Option<String>,

    /// 结算窗口上界: forever / today / YYYY-MM-DD（缺省取配置值）
    #[arg(long)]
    to: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 完整报表（漏斗 + 应收）
    Report {
        /// 快照文件（.json / .csv）
        snapshot: PathBuf,
    },
    /// 仅销售漏斗 KPI
    Kpi { snapshot: PathBuf },
    /// 仅应收账款
    Ar { snapshot: PathBuf },
}

impl Command {
    fn split(&self) -> (&PathBuf, ReportSelection) {
        match self {
            Command::Report { snapshot } => (snapshot, ReportSelection::ALL),
            Command::Kpi { snapshot } => (snapshot, ReportSelection::FUNNEL_ONLY),
            Command::Ar { snapshot } => (snapshot, ReportSelection::RECEIVABLES_ONLY),
        }
    }
}

fn parse_as_of(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("无效的 RFC 3339 时间 {}: {}", raw, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    info!("==================================================");
    info!("{} v{}", roofing_kpi::APP_NAME, roofing_kpi::VERSION);
    info!("==================================================");

    let manager = ConfigManager::load(cli.config.as_deref()).context("加载配置失败")?;
    let as_of = cli
        .as_of
        .or(manager.config().as_of)
        .unwrap_or_else(Utc::now);
    // today 以报表基准时间为准
    let from = match cli.from.as_deref() {
        Some(raw) => parse_window_bound(raw, WindowSide::From, as_of)?,
        None => manager.config().from,
    };
    let to = match cli.to.as_deref() {
        Some(raw) => parse_window_bound(raw, WindowSide::To, as_of)?,
        None => manager.config().to,
    };
    let manager = manager.with_as_of(as_of).with_settle_window(from, to);
    ConfigManager::validate(manager.config()).context("结算窗口无效")?;
    let orchestrator = ReportOrchestrator::from_manager(manager);

    let (snapshot, selection) = cli.command.split();
    let report = orchestrator
        .run_file(snapshot, selection)
        .await
        .with_context(|| format!("生成报表失败: {}", snapshot.display()))?;

    let rendered = serde_json::to_string_pretty(&report).context("报表序列化失败")?;
    match cli.output.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::write(path, rendered)
                .with_context(|| format!("写入报表失败: {}", path.display()))?;
            info!(path = %path.display(), "报表已写入");
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered).context("写入标准输出失败")?;
        }
    }

    if report.warning_count > 0 {
        tracing::warn!(warnings = report.warning_count, "报表包含数据质量告警");
    }
    Ok(())
}
