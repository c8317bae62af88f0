// ==========================================
// 屋面工程 KPI 分析引擎 - 报表组装
// ==========================================
// 职责: 漏斗结果 + 应收账本 → 与渲染器无关的 AnalyticsReport
// 红线: 纯函数，无 I/O，无当前时间；相同输入 → 逐字节相同的序列化结果
// ==========================================
// 分区顺序:
// funnel:global → funnel:rep:<name>... → funnel:reach → funnel:loss → data_quality
// → ar:by_status → ar:entries → ar:zero_amount
// ==========================================

use crate::domain::funnel::{FunnelOutcome, FunnelResult, MilestoneReach, ScopeKey};
use crate::domain::quality::{DataQualityWarning, WarningKind};
use crate::domain::receivable::ArLedger;
use crate::domain::report::{
    AnalyticsReport, ColumnKind, ReportCell, ReportColumn, ReportSection,
};
use crate::domain::types::{Timestamp, SECONDS_PER_DAY};

/// 分区键
pub mod section_keys {
    pub const FUNNEL_PREFIX: &str = "funnel:";
    pub const FUNNEL_GLOBAL: &str = "funnel:global";
    pub const FUNNEL_REACH: &str = "funnel:reach";
    pub const FUNNEL_LOSS: &str = "funnel:loss";
    pub const DATA_QUALITY: &str = "data_quality";
    pub const AR_BY_STATUS: &str = "ar:by_status";
    pub const AR_ENTRIES: &str = "ar:entries";
    pub const AR_ZERO_AMOUNT: &str = "ar:zero_amount";
}

/// 汇总行标签
pub const TOTAL_ROW_LABEL: &str = "TOTAL";

/// 工单号列表分隔符
const JOB_ID_SEPARATOR: &str = ", ";

/// 报表内容选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSelection {
    pub funnel: bool,
    pub receivables: bool,
}

impl ReportSelection {
    pub const ALL: ReportSelection = ReportSelection {
        funnel: true,
        receivables: true,
    };
    pub const FUNNEL_ONLY: ReportSelection = ReportSelection {
        funnel: true,
        receivables: false,
    };
    pub const RECEIVABLES_ONLY: ReportSelection = ReportSelection {
        funnel: false,
        receivables: true,
    };
}

impl Default for ReportSelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// 组装输入
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub as_of: Timestamp,
    pub job_count: usize,
    pub milestone_names: &'a [String],
    pub funnel: Option<&'a FunnelOutcome>,
    pub ledger: Option<&'a ArLedger>,
}

// ==========================================
// ReportAssembler
// ==========================================
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(&self, input: ReportInput<'_>) -> AnalyticsReport {
        let mut sections = Vec::new();
        let mut warnings = Vec::new();

        if let Some(funnel) = input.funnel {
            // 缺少全局口径时补一个空结果，保证 funnel:global 始终存在
            let synthesized;
            let global = match funnel.global() {
                Some(global) => global,
                None => {
                    synthesized = FunnelResult::empty(ScopeKey::Global, input.milestone_names);
                    &synthesized
                }
            };
            sections.push(funnel_section(global));
            for result in funnel.results.iter().filter(|r| r.scope != ScopeKey::Global) {
                sections.push(funnel_section(result));
            }
            sections.push(reach_section(global, funnel, input.milestone_names));
            sections.push(loss_section(global, funnel, input.milestone_names));
            sections.push(data_quality_section(&funnel.warnings));
            warnings = funnel.warnings.clone();
        }

        if let Some(ledger) = input.ledger {
            sections.push(ar_by_status_section(ledger));
            sections.push(ar_entries_section(ledger));
            sections.push(ar_zero_amount_section(ledger));
        }

        AnalyticsReport {
            as_of: input.as_of,
            job_count: input.job_count,
            warning_count: warnings.len(),
            sections,
            warnings,
        }
    }
}

/// 组装分析报表
pub fn assemble_report(input: ReportInput<'_>) -> AnalyticsReport {
    ReportAssembler.assemble(input)
}

// ===== 漏斗分区 =====

fn funnel_section(result: &FunnelResult) -> ReportSection {
    let key = format!("{}{}", section_keys::FUNNEL_PREFIX, result.scope.section_suffix());
    let title = format!("Funnel {} ({} jobs)", result.scope, result.job_count);
    let mut section = ReportSection::new(
        key,
        title,
        vec![
            ReportColumn::new("from_milestone", ColumnKind::Text),
            ReportColumn::new("to_milestone", ColumnKind::Text),
            ReportColumn::new("entered_count", ColumnKind::Integer),
            ReportColumn::new("advanced_count", ColumnKind::Integer),
            ReportColumn::new("conversion_rate", ColumnKind::Decimal),
            ReportColumn::new("average_days", ColumnKind::Decimal),
            ReportColumn::new("advanced_jobs", ColumnKind::Text),
        ],
    );

    for pair in &result.pairs {
        let advanced_jobs: Vec<&str> = pair.advanced_job_ids.iter().map(|id| id.as_str()).collect();
        section.push_row(vec![
            ReportCell::text(pair.from_milestone.as_str()),
            ReportCell::text(pair.to_milestone.as_str()),
            ReportCell::count(pair.entered_count),
            ReportCell::count(pair.advanced_count),
            ReportCell::metric(pair.conversion_rate),
            ReportCell::metric(pair.average_days),
            ReportCell::text(advanced_jobs.join(JOB_ID_SEPARATOR)),
        ]);
    }
    section
}

fn reach_section(
    global: &FunnelResult,
    funnel: &FunnelOutcome,
    milestone_names: &[String],
) -> ReportSection {
    let mut columns = vec![
        ReportColumn::new("scope", ColumnKind::Text),
        ReportColumn::new("job_count", ColumnKind::Integer),
    ];
    columns.extend(
        milestone_names
            .iter()
            .map(|name| ReportColumn::new(name, ColumnKind::Integer)),
    );

    let mut section = ReportSection::new(section_keys::FUNNEL_REACH, "Milestones reached", columns);
    for result in scopes_in_order(global, funnel) {
        let mut cells = vec![
            ReportCell::text(result.scope.section_suffix()),
            ReportCell::count(result.job_count),
        ];
        cells.extend(milestone_names.iter().map(|name| {
            ReportCell::count(milestone_stat(result, name, |m| m.reached_count))
        }));
        section.push_row(cells);
    }
    section
}

/// 流失分区: 每口径一行，末尾为各里程碑上的流失数
fn loss_section(
    global: &FunnelResult,
    funnel: &FunnelOutcome,
    milestone_names: &[String],
) -> ReportSection {
    let mut columns = vec![
        ReportColumn::new("scope", ColumnKind::Text),
        ReportColumn::new("job_count", ColumnKind::Integer),
        ReportColumn::new("entered_count", ColumnKind::Integer),
        ReportColumn::new("lost_count", ColumnKind::Integer),
        ReportColumn::new("loss_rate", ColumnKind::Decimal),
    ];
    columns.extend(
        milestone_names
            .iter()
            .map(|name| ReportColumn::new(name, ColumnKind::Integer)),
    );

    let mut section = ReportSection::new(section_keys::FUNNEL_LOSS, "Jobs lost", columns);
    for result in scopes_in_order(global, funnel) {
        let entered = result.milestones.first().map(|m| m.reached_count).unwrap_or(0);
        let mut cells = vec![
            ReportCell::text(result.scope.section_suffix()),
            ReportCell::count(result.job_count),
            ReportCell::count(entered),
            ReportCell::count(result.lost_count),
            ReportCell::metric(result.loss_rate),
        ];
        cells.extend(milestone_names.iter().map(|name| {
            ReportCell::count(milestone_stat(result, name, |m| m.lost_here))
        }));
        section.push_row(cells);
    }
    section
}

/// 口径顺序: Global 在前，其余按结果顺序
fn scopes_in_order<'a>(
    global: &'a FunnelResult,
    funnel: &'a FunnelOutcome,
) -> impl Iterator<Item = &'a FunnelResult> {
    std::iter::once(global).chain(funnel.results.iter().filter(|r| r.scope != ScopeKey::Global))
}

fn milestone_stat(result: &FunnelResult, name: &str, stat: impl Fn(&MilestoneReach) -> usize) -> usize {
    result
        .milestones
        .iter()
        .find(|m| m.milestone == name)
        .map(stat)
        .unwrap_or(0)
}

/// 数据质量分区：按销售代表分组（名称字典序，未分配在最后），组内保持告警顺序
fn data_quality_section(warnings: &[DataQualityWarning]) -> ReportSection {
    let mut section = ReportSection::new(
        section_keys::DATA_QUALITY,
        format!("Data quality warnings ({})", warnings.len()),
        vec![
            ReportColumn::new("representative", ColumnKind::Text),
            ReportColumn::new("job_id", ColumnKind::Text),
            ReportColumn::new("code", ColumnKind::Text),
            ReportColumn::new("from_milestone", ColumnKind::Text),
            ReportColumn::new("to_milestone", ColumnKind::Text),
            ReportColumn::new("elapsed_days", ColumnKind::Decimal),
            ReportColumn::new("message", ColumnKind::Text),
        ],
    );

    let mut ordered: Vec<&DataQualityWarning> = warnings.iter().collect();
    ordered.sort_by(|a, b| match (&a.representative, &b.representative) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    for warning in ordered {
        let (from, to, elapsed) = match &warning.kind {
            WarningKind::OutOfOrderMilestone {
                from_milestone,
                to_milestone,
                elapsed_seconds,
            } => (
                ReportCell::text(from_milestone.as_str()),
                ReportCell::text(to_milestone.as_str()),
                ReportCell::Decimal(*elapsed_seconds as f64 / SECONDS_PER_DAY),
            ),
        };
        section.push_row(vec![
            ReportCell::optional_text(warning.representative.as_deref()),
            ReportCell::text(warning.job_id.as_str()),
            ReportCell::text(warning.kind.code()),
            from,
            to,
            elapsed,
            ReportCell::text(warning.message.as_str()),
        ]);
    }
    section
}

// ===== 应收分区 =====

fn ar_by_status_section(ledger: &ArLedger) -> ReportSection {
    let mut section = ReportSection::new(
        section_keys::AR_BY_STATUS,
        "Accounts receivable by status",
        vec![
            ReportColumn::new("status", ColumnKind::Text),
            ReportColumn::new("job_count", ColumnKind::Integer),
            ReportColumn::new("zero_amount_count", ColumnKind::Integer),
            ReportColumn::new("total_amount_due", ColumnKind::Money),
        ],
    );

    for bucket in &ledger.buckets {
        section.push_row(vec![
            ReportCell::text(bucket.status.as_str()),
            ReportCell::count(bucket.job_count),
            ReportCell::count(bucket.zero_amount_count),
            ReportCell::Money(bucket.total_amount_due),
        ]);
    }

    let zero_total: usize = ledger.buckets.iter().map(|b| b.zero_amount_count).sum();
    section.push_row(vec![
        ReportCell::text(TOTAL_ROW_LABEL),
        ReportCell::count(ledger.job_count),
        ReportCell::count(zero_total),
        ReportCell::Money(ledger.total_amount_due),
    ]);
    section
}

fn ar_entries_section(ledger: &ArLedger) -> ReportSection {
    let mut section = ReportSection::new(
        section_keys::AR_ENTRIES,
        "Accounts receivable by job",
        vec![
            ReportColumn::new("status", ColumnKind::Text),
            ReportColumn::new("job_id", ColumnKind::Text),
            ReportColumn::new("job_name", ColumnKind::Text),
            ReportColumn::new("job_number", ColumnKind::Text),
            ReportColumn::new("amount_due", ColumnKind::Money),
            ReportColumn::new("days_in_status", ColumnKind::Integer),
        ],
    );

    for bucket in &ledger.buckets {
        for entry in bucket.entries.iter().filter(|e| !e.amount_due.is_zero()) {
            section.push_row(vec![
                ReportCell::text(bucket.status.as_str()),
                ReportCell::text(entry.job_id.as_str()),
                ReportCell::optional_text(entry.job_name.as_deref()),
                ReportCell::optional_text(entry.job_number.as_deref()),
                ReportCell::Money(entry.amount_due),
                ReportCell::Integer(entry.days_in_status),
            ]);
        }
    }
    section
}

fn ar_zero_amount_section(ledger: &ArLedger) -> ReportSection {
    let mut section = ReportSection::new(
        section_keys::AR_ZERO_AMOUNT,
        "Jobs with $0 receivable",
        vec![
            ReportColumn::new("status", ColumnKind::Text),
            ReportColumn::new("job_id", ColumnKind::Text),
            ReportColumn::new("job_name", ColumnKind::Text),
            ReportColumn::new("job_number", ColumnKind::Text),
            ReportColumn::new("days_in_status", ColumnKind::Integer),
        ],
    );

    for bucket in &ledger.buckets {
        for entry in bucket.entries.iter().filter(|e| e.amount_due.is_zero()) {
            section.push_row(vec![
                ReportCell::text(bucket.status.as_str()),
                ReportCell::text(entry.job_id.as_str()),
                ReportCell::optional_text(entry.job_name.as_deref()),
                ReportCell::optional_text(entry.job_number.as_deref()),
                ReportCell::Integer(entry.days_in_status),
            ]);
        }
    }
    section
}
