// ==========================================
// 屋面工程 KPI 分析引擎 - 里程碑漏斗计算
// ==========================================
// 职责: 按口径统计相邻里程碑 (M_i, M_{i+1}) 的转化率、平均耗时与流失
// 输入: 标准化工单（只读）+ 有序里程碑 + 口径划分函数
// 输出: FunnelOutcome（各口径结果 + 数据质量告警）
// ==========================================
// 规则:
// 1. M_i 首次到达存在 → entered
// 2. M_{i+1} 首次到达不早于 M_i → advanced，耗时 = t(M_{i+1}) − t(M_i) ≥ 0（同刻计 0 天）
// 3. M_{i+1} 首次到达早于 M_i → 顺序异常：不计 advanced，产生一条告警
// 4. M_{i+1} 未到达 → 右删失，只计 entered
// 5. entered == 0 → 转化率 NotApplicable；advanced == 0 → 平均天数 NotApplicable
// 6. 设了结算窗口时，只统计结算时间落在窗口内的工单；告警不受窗口影响
// 7. 流失工单记在其最远到达的里程碑上；流失率分母为首个里程碑到达数
// ==========================================

use crate::config::{MilestoneDefinition, ReportConfig};
use crate::domain::funnel::{
    FunnelOutcome, FunnelResult, MilestonePairStats, MilestoneReach, ScopeKey, SettleWindow,
};
use crate::domain::job::JobRecord;
use crate::domain::quality::DataQualityWarning;
use crate::domain::types::{JobId, Metric, Timestamp, SECONDS_PER_DAY};
use crate::engine::milestone_matcher::{Arrival, MilestoneMatcher};
use crate::perf::PerfGuard;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 单个工单在某一里程碑对上的观测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// 未进入 M_i
    NotEntered,
    /// 进入 M_i，尚未到达 M_{i+1}
    Censored,
    /// 到达 M_{i+1}，耗时（秒，≥ 0）
    Advanced(i64),
    /// M_{i+1} 首次到达早于 M_i，耗时（秒，< 0）
    OutOfOrder(i64),
}

impl PairOutcome {
    /// 按时间先后判定，与来源顺序无关
    pub fn classify(from: Option<Arrival>, to: Option<Arrival>) -> Self {
        let Some(from) = from else {
            return PairOutcome::NotEntered;
        };
        let Some(to) = to else {
            return PairOutcome::Censored;
        };

        let elapsed = (to.timestamp - from.timestamp).num_seconds();
        if elapsed < 0 {
            PairOutcome::OutOfOrder(elapsed)
        } else {
            PairOutcome::Advanced(elapsed)
        }
    }

    pub fn is_entered(self) -> bool {
        !matches!(self, PairOutcome::NotEntered)
    }
}

// ==========================================
// JobProgress - 单个工单的漏斗进度
// ==========================================
#[derive(Debug, Clone)]
struct JobProgress {
    arrivals: Vec<Option<Arrival>>,
    outcomes: Vec<PairOutcome>,
    lost_at: Option<Timestamp>,
}

impl JobProgress {
    /// 最远到达的里程碑下标
    fn furthest(&self) -> Option<usize> {
        self.arrivals.iter().rposition(Option::is_some)
    }

    /// 结算时间: 流失时间，否则末位里程碑首次到达时间
    fn settled_at(&self) -> Option<Timestamp> {
        self.lost_at.or_else(|| {
            self.arrivals
                .last()
                .copied()
                .flatten()
                .map(|arrival| arrival.timestamp)
        })
    }
}

// ==========================================
// 口径累加器
// ==========================================
#[derive(Debug, Clone, Default)]
struct PairTally {
    entered: usize,
    advanced: usize,
    elapsed_seconds: i64,
    advanced_ids: Vec<JobId>,
}

#[derive(Debug, Clone)]
struct ScopeTally {
    job_count: usize,
    lost: usize,
    reached: Vec<usize>,
    lost_here: Vec<usize>,
    pairs: Vec<PairTally>,
}

impl ScopeTally {
    fn new(milestone_count: usize) -> Self {
        Self {
            job_count: 0,
            lost: 0,
            reached: vec![0; milestone_count],
            lost_here: vec![0; milestone_count],
            pairs: vec![PairTally::default(); milestone_count.saturating_sub(1)],
        }
    }

    fn add(&mut self, job_id: &JobId, progress: &JobProgress) {
        self.job_count += 1;
        for (reached, arrival) in self.reached.iter_mut().zip(&progress.arrivals) {
            if arrival.is_some() {
                *reached += 1;
            }
        }
        for (tally, outcome) in self.pairs.iter_mut().zip(&progress.outcomes) {
            if outcome.is_entered() {
                tally.entered += 1;
            }
            if let PairOutcome::Advanced(elapsed) = outcome {
                tally.advanced += 1;
                tally.elapsed_seconds = tally.elapsed_seconds.saturating_add(*elapsed);
                tally.advanced_ids.push(job_id.clone());
            }
        }

        if progress.lost_at.is_some() {
            if let Some(idx) = progress.furthest() {
                self.lost_here[idx] += 1;
            }
            if progress.arrivals.first().is_some_and(Option::is_some) {
                self.lost += 1;
            }
        }
    }

    fn into_result(self, scope: ScopeKey, names: &[String]) -> FunnelResult {
        let entered_first = self.reached.first().copied().unwrap_or(0);
        let milestones = names
            .iter()
            .zip(self.reached.into_iter().zip(self.lost_here))
            .map(|(name, (reached_count, lost_here))| MilestoneReach {
                milestone: name.clone(),
                reached_count,
                lost_here,
            })
            .collect();

        let pairs = names
            .windows(2)
            .zip(self.pairs)
            .map(|(pair, mut tally)| {
                // 结果与输入顺序无关
                tally.advanced_ids.sort();
                MilestonePairStats {
                    from_milestone: pair[0].clone(),
                    to_milestone: pair[1].clone(),
                    entered_count: tally.entered,
                    advanced_count: tally.advanced,
                    conversion_rate: Metric::ratio(tally.advanced as f64, tally.entered),
                    average_days: Metric::ratio(
                        tally.elapsed_seconds as f64 / SECONDS_PER_DAY,
                        tally.advanced,
                    ),
                    advanced_job_ids: tally.advanced_ids,
                }
            })
            .collect();

        FunnelResult {
            scope,
            job_count: self.job_count,
            lost_count: self.lost,
            loss_rate: Metric::ratio(self.lost as f64, entered_first),
            milestones,
            pairs,
        }
    }
}

// ==========================================
// FunnelCalculator - 漏斗计算器
// ==========================================
#[derive(Debug, Clone)]
pub struct FunnelCalculator {
    matcher: MilestoneMatcher,
    window: SettleWindow,
}

impl FunnelCalculator {
    pub fn new(milestones: &[MilestoneDefinition]) -> Self {
        Self {
            matcher: MilestoneMatcher::new(milestones),
            window: SettleWindow::default(),
        }
    }

    /// 由报表配置创建（里程碑 + 流失标签 + 结算窗口）
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.milestones)
            .with_loss_labels(&config.loss_statuses)
            .with_window(config.settle_window())
    }

    pub fn with_loss_labels<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        self.matcher = self.matcher.with_loss_labels(labels);
        self
    }

    pub fn with_window(mut self, window: SettleWindow) -> Self {
        self.window = window;
        self
    }

    pub fn milestone_names(&self) -> &[String] {
        self.matcher.names()
    }

    pub fn window(&self) -> SettleWindow {
        self.window
    }

    fn progress(&self, job: &JobRecord) -> JobProgress {
        let arrivals = self.matcher.first_arrivals(job);
        let outcomes = arrivals
            .windows(2)
            .map(|w| PairOutcome::classify(w[0], w[1]))
            .collect();
        JobProgress {
            arrivals,
            outcomes,
            lost_at: self.matcher.first_loss(job),
        }
    }

    /// 计算各口径漏斗
    ///
    /// # 说明
    /// - 结果按 ScopeKey 排序（Global 在前，销售代表按名称字典序）
    /// - Global 口径始终存在（即便没有工单）
    /// - 告警按 (工单, 里程碑对) 只产生一次，与工单所属口径数量无关
    pub fn compute<F>(&self, jobs: &[JobRecord], scope_fn: F) -> FunnelOutcome
    where
        F: Fn(&JobRecord) -> Vec<ScopeKey>,
    {
        let _perf = PerfGuard::new("compute_funnel");
        let names = self.matcher.names();
        let milestone_count = self.matcher.milestone_count();

        let mut tallies: BTreeMap<ScopeKey, ScopeTally> = BTreeMap::new();
        tallies.insert(ScopeKey::Global, ScopeTally::new(milestone_count));
        let mut warnings = Vec::new();
        let mut outside_window = 0usize;

        for job in jobs {
            let progress = self.progress(job);

            for (idx, outcome) in progress.outcomes.iter().enumerate() {
                if let PairOutcome::OutOfOrder(elapsed) = outcome {
                    let warning = DataQualityWarning::out_of_order(
                        job.id().clone(),
                        job.representative().map(str::to_string),
                        &names[idx],
                        &names[idx + 1],
                        *elapsed,
                    );
                    warn!(job_id = %job.id(), elapsed_seconds = elapsed, "{}", warning.message);
                    warnings.push(warning);
                }
            }

            if !self.window.admits(progress.settled_at()) {
                outside_window += 1;
                continue;
            }

            let mut scopes = scope_fn(job);
            scopes.sort();
            scopes.dedup();
            for scope in scopes {
                tallies
                    .entry(scope)
                    .or_insert_with(|| ScopeTally::new(milestone_count))
                    .add(job.id(), &progress);
            }
        }

        let results: Vec<FunnelResult> = tallies
            .into_iter()
            .map(|(scope, tally)| tally.into_result(scope, names))
            .collect();

        for result in &results {
            debug!(scope = %result.scope, job_count = result.job_count, lost = result.lost_count, "口径漏斗完成");
        }
        info!(
            total_jobs = jobs.len(),
            outside_window,
            scopes = results.len(),
            warnings = warnings.len(),
            "漏斗计算完成"
        );

        FunnelOutcome { results, warnings }
    }
}

/// 计算里程碑漏斗
pub fn compute_funnel<F>(
    jobs: &[JobRecord],
    milestones: &[MilestoneDefinition],
    scope_fn: F,
) -> FunnelOutcome
where
    F: Fn(&JobRecord) -> Vec<ScopeKey>,
{
    FunnelCalculator::new(milestones).compute(jobs, scope_fn)
}
