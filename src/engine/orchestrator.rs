// ==========================================
// 屋面工程 KPI 分析引擎 - 引擎编排器
// ==========================================
// 用途: 协调 导入 → (漏斗 ∥ 应收) → 报表组装
// 并发: 漏斗与应收在 tokio 阻塞线程池上并行，共享只读 Arc<[JobRecord]>
// 红线: 无锁、无共享可变状态；结构性错误直接返回，不产生部分报表
// ==========================================

use crate::config::{ConfigManager, ReportConfig};
use crate::domain::funnel::FunnelOutcome;
use crate::domain::job::{latest_timestamp, JobRecord, RawJobRecord};
use crate::domain::receivable::ArLedger;
use crate::domain::report::AnalyticsReport;
use crate::domain::types::Timestamp;
use crate::engine::error::EngineResult;
use crate::engine::funnel::FunnelCalculator;
use crate::engine::receivable::ArAggregator;
use crate::engine::report_assembler::{assemble_report, ReportInput, ReportSelection};
use crate::engine::scope::global_and_representative;
use crate::importer::{JobImporter, JobImporterImpl};
use crate::perf::PerfGuard;
use futures::future::try_join;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// ReportOrchestrator - 引擎编排器
// ==========================================
pub struct ReportOrchestrator {
    config: Arc<ReportConfig>,
    importer: JobImporterImpl,
    calculator: Arc<FunnelCalculator>,
}

impl ReportOrchestrator {
    /// 创建编排器（配置先校验）
    pub fn new(config: ReportConfig) -> EngineResult<Self> {
        ConfigManager::validate(&config)?;
        Ok(Self::from_validated(config))
    }

    /// 由已加载的配置管理器创建
    pub fn from_manager(manager: ConfigManager) -> Self {
        Self::from_validated(manager.into_config())
    }

    fn from_validated(config: ReportConfig) -> Self {
        Self {
            importer: JobImporterImpl::from_config(&config),
            calculator: Arc::new(FunnelCalculator::from_config(&config)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// 报表基准时间: 配置优先，否则取快照中最晚的状态时间
    pub fn resolve_as_of(&self, jobs: &[JobRecord]) -> Timestamp {
        self.config
            .as_of
            .or_else(|| latest_timestamp(jobs))
            .unwrap_or_default()
    }

    /// 从快照文件生成报表
    #[instrument(skip(self, file_path))]
    pub async fn run_file(
        &self,
        file_path: &Path,
        selection: ReportSelection,
    ) -> EngineResult<AnalyticsReport> {
        let snapshot = self.importer.import_file(file_path).await?;
        debug!(batch_id = %snapshot.batch_id, "快照导入完成");
        self.run(snapshot.jobs, selection).await
    }

    /// 从原始工单生成报表（先标准化）
    pub async fn run_records(
        &self,
        records: Vec<RawJobRecord>,
        selection: ReportSelection,
    ) -> EngineResult<AnalyticsReport> {
        let snapshot = self.importer.import_records(records)?;
        self.run(snapshot.jobs, selection).await
    }

    /// 从标准化工单生成报表（漏斗与应收并行）
    pub async fn run(
        &self,
        jobs: Vec<JobRecord>,
        selection: ReportSelection,
    ) -> EngineResult<AnalyticsReport> {
        let _perf = PerfGuard::new("run_report");
        let as_of = self.resolve_as_of(&jobs);
        let jobs: Arc<[JobRecord]> = jobs.into();
        let window = self.calculator.window();
        info!(total_jobs = jobs.len(), as_of = %as_of, from = ?window.from, to = ?window.to, ?selection, "开始生成报表");

        let funnel_task = {
            let jobs = Arc::clone(&jobs);
            let calculator = Arc::clone(&self.calculator);
            async move {
                if !selection.funnel {
                    return EngineResult::Ok(None);
                }
                let outcome = tokio::task::spawn_blocking(move || {
                    calculator.compute(&jobs, global_and_representative)
                })
                .await?;
                EngineResult::Ok(Some(outcome))
            }
        };

        let ar_task = {
            let jobs = Arc::clone(&jobs);
            let aggregator = ArAggregator::new(self.config.ar_status_order.clone(), as_of);
            async move {
                if !selection.receivables {
                    return EngineResult::Ok(None);
                }
                let ledger = tokio::task::spawn_blocking(move || aggregator.aggregate(&jobs)).await?;
                EngineResult::Ok(Some(ledger))
            }
        };

        let (funnel, ledger) = try_join(funnel_task, ar_task).await?;
        Ok(self.assemble(as_of, jobs.len(), funnel.as_ref(), ledger.as_ref()))
    }

    /// 同步计算（不经线程池），结果与 run 相同
    pub fn run_blocking(&self, jobs: &[JobRecord], selection: ReportSelection) -> AnalyticsReport {
        let as_of = self.resolve_as_of(jobs);
        let funnel = selection
            .funnel
            .then(|| self.calculator.compute(jobs, global_and_representative));
        let ledger = selection
            .receivables
            .then(|| ArAggregator::new(self.config.ar_status_order.clone(), as_of).aggregate(jobs));
        self.assemble(as_of, jobs.len(), funnel.as_ref(), ledger.as_ref())
    }

    fn assemble(
        &self,
        as_of: Timestamp,
        job_count: usize,
        funnel: Option<&FunnelOutcome>,
        ledger: Option<&ArLedger>,
    ) -> AnalyticsReport {
        let report = assemble_report(ReportInput {
            as_of,
            job_count,
            milestone_names: self.calculator.milestone_names(),
            funnel,
            ledger,
        });
        info!(
            sections = report.sections.len(),
            warnings = report.warning_count,
            "报表生成完成"
        );
        report
    }
}
