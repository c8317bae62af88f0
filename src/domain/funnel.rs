// ==========================================
// 屋面工程 KPI 分析引擎 - 决策对象：销售漏斗
// ==========================================
// 职责: 定义统计口径（ScopeKey）、结算时间窗口与漏斗统计结果
// ==========================================

use crate::domain::quality::DataQualityWarning;
use crate::domain::types::{JobId, Metric, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ScopeKey - 统计口径
// ==========================================
// 排序: Global 在前，其后按销售代表名称字典序
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ScopeKey {
    Global,
    Representative(String),
}

impl ScopeKey {
    pub fn representative(name: impl Into<String>) -> Self {
        ScopeKey::Representative(name.into())
    }

    /// 报表分区键: "global" / "rep:<name>"
    pub fn section_suffix(&self) -> String {
        match self {
            ScopeKey::Global => "global".to_string(),
            ScopeKey::Representative(name) => format!("rep:{}", name),
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Global => write!(f, "[Global]"),
            ScopeKey::Representative(name) => write!(f, "{}", name),
        }
    }
}

// ==========================================
// SettleWindow - 结算时间窗口
// ==========================================
// 结算时间: 流失工单取首次流失状态时间，否则取末位里程碑首次到达时间
// 两端闭区间；两端都不设时不过滤（未结算工单也参与统计）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl SettleWindow {
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// 工单是否计入窗口（设了窗口时未结算工单一律排除）
    pub fn admits(&self, settled_at: Option<Timestamp>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(at) = settled_at else {
            return false;
        };
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// 单个里程碑的到达人数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReach {
    pub milestone: String,
    pub reached_count: usize,

    /// 以该里程碑为最远进度的流失工单数
    pub lost_here: usize,
}

/// 相邻里程碑对 (M_i, M_{i+1}) 的转化统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePairStats {
    pub from_milestone: String,
    pub to_milestone: String,

    /// 进入 M_i 的工单数
    pub entered_count: usize,

    /// 其中继续到达 M_{i+1} 的工单数
    pub advanced_count: usize,

    /// advanced / entered；entered == 0 时为 NotApplicable
    pub conversion_rate: Metric,

    /// 平均耗时（天）；advanced == 0 时为 NotApplicable
    pub average_days: Metric,

    /// 完成该转化的工单（按工单号升序）
    pub advanced_job_ids: Vec<JobId>,
}

/// 某一口径下的漏斗结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResult {
    pub scope: ScopeKey,
    pub job_count: usize,

    /// 到达首个里程碑后流失的工单数
    pub lost_count: usize,

    /// lost_count / 首个里程碑到达数；分母为 0 时为 NotApplicable
    pub loss_rate: Metric,

    pub milestones: Vec<MilestoneReach>,
    pub pairs: Vec<MilestonePairStats>,
}

impl FunnelResult {
    /// 无任何工单的空结果（所有比率为 NotApplicable）
    pub fn empty(scope: ScopeKey, milestone_names: &[String]) -> Self {
        let milestones = milestone_names
            .iter()
            .map(|name| MilestoneReach {
                milestone: name.clone(),
                reached_count: 0,
                lost_here: 0,
            })
            .collect();
        let pairs = milestone_names
            .windows(2)
            .map(|w| MilestonePairStats {
                from_milestone: w[0].clone(),
                to_milestone: w[1].clone(),
                entered_count: 0,
                advanced_count: 0,
                conversion_rate: Metric::NotApplicable,
                average_days: Metric::NotApplicable,
                advanced_job_ids: Vec::new(),
            })
            .collect();

        Self {
            scope,
            job_count: 0,
            lost_count: 0,
            loss_rate: Metric::NotApplicable,
            milestones,
            pairs,
        }
    }

    /// 按里程碑名称查找转化统计
    pub fn pair(&self, from: &str, to: &str) -> Option<&MilestonePairStats> {
        self.pairs
            .iter()
            .find(|p| p.from_milestone == from && p.to_milestone == to)
    }
}

/// 漏斗计算输出：各口径结果 + 数据质量告警
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelOutcome {
    pub results: Vec<FunnelResult>,
    pub warnings: Vec<DataQualityWarning>,
}

impl FunnelOutcome {
    pub fn scope(&self, scope: &ScopeKey) -> Option<&FunnelResult> {
        self.results.iter().find(|r| &r.scope == scope)
    }

    pub fn global(&self) -> Option<&FunnelResult> {
        self.scope(&ScopeKey::Global)
    }
}
