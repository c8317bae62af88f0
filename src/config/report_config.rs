// ==========================================
// 屋面工程 KPI 分析引擎 - 报表配置
// ==========================================
// 职责: 里程碑定义（逻辑里程碑 → 原始状态标签集合）、流失标签、结算窗口、应收状态排序、严格模式
// 红线: 配置是显式入参，不是全局状态
// ==========================================

use crate::domain::funnel::SettleWindow;
use crate::domain::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// MilestoneDefinition - 里程碑定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDefinition {
    /// 逻辑里程碑名称
    pub name: String,

    /// 可匹配的原始状态标签（集合语义）
    pub labels: Vec<String>,
}

impl MilestoneDefinition {
    pub fn new<S: Into<String>>(name: &str, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

// ==========================================
// ReportConfig - 报表配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 有序里程碑列表
    pub milestones: Vec<MilestoneDefinition>,

    /// 应收状态的规范排序（None → 按首次出现顺序）
    pub ar_status_order: Option<Vec<String>>,

    /// 严格模式：输入中出现未登记的状态标签即失败
    pub strict_labels: bool,

    /// 严格模式下允许出现、但不参与漏斗的状态标签
    pub ignored_statuses: Vec<String>,

    /// 报表基准时间（计算在状态天数）；None → 取快照中最新的状态时间
    pub as_of: Option<Timestamp>,

    /// 表示工单流失的状态标签（不得与里程碑标签重叠）
    pub loss_statuses: Vec<String>,

    /// 结算窗口下界（含）；None → 不限
    pub from: Option<Timestamp>,

    /// 结算窗口上界（含）；None → 不限
    pub to: Option<Timestamp>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
            ar_status_order: Some(default_ar_status_order()),
            strict_labels: false,
            ignored_statuses: Vec::new(),
            as_of: None,
            loss_statuses: default_loss_statuses(),
            from: None,
            to: None,
        }
    }
}

impl ReportConfig {
    /// 仅指定里程碑的配置（其余取空/默认值）
    pub fn with_milestones(milestones: Vec<MilestoneDefinition>) -> Self {
        Self {
            milestones,
            ar_status_order: None,
            strict_labels: false,
            ignored_statuses: Vec::new(),
            as_of: None,
            loss_statuses: Vec::new(),
            from: None,
            to: None,
        }
    }

    pub fn settle_window(&self) -> SettleWindow {
        SettleWindow::new(self.from, self.to)
    }

    pub fn milestone_names(&self) -> Vec<String> {
        self.milestones.iter().map(|m| m.name.clone()).collect()
    }

    /// 已登记的全部状态标签（里程碑标签 ∪ 流失标签 ∪ 应收排序 ∪ 忽略列表）
    pub fn known_labels(&self) -> BTreeSet<&str> {
        let mut labels: BTreeSet<&str> = self
            .milestones
            .iter()
            .flat_map(|m| m.labels.iter().map(|l| l.trim()))
            .collect();
        if let Some(order) = &self.ar_status_order {
            labels.extend(order.iter().map(|s| s.trim()));
        }
        labels.extend(self.loss_statuses.iter().map(|s| s.trim()));
        labels.extend(self.ignored_statuses.iter().map(|s| s.trim()));
        labels
    }
}

/// 默认销售漏斗: 获客 → 上门 → 意向签约 → 正式签约 → 安装完工
pub fn default_milestones() -> Vec<MilestoneDefinition> {
    vec![
        MilestoneDefinition::new("Lead Acquired", ["Lead", "New Lead"]),
        MilestoneDefinition::new(
            "Appointment Made",
            ["Appointment Scheduled", "Sales Appointment", "Estimating"],
        ),
        MilestoneDefinition::new(
            "Contingency Signed",
            ["Signed Contingency", "Contingency Signed"],
        ),
        MilestoneDefinition::new("Contract Signed", ["Signed Contract", "Contract Signed"]),
        MilestoneDefinition::new("Installed", ["Installed", "Install Complete"]),
    ]
}

/// 默认流失标签
pub fn default_loss_statuses() -> Vec<String> {
    vec!["Lost".to_string(), "Job Lost".to_string()]
}

/// 默认应收状态排序（CRM 工作流顺序）
pub fn default_ar_status_order() -> Vec<String> {
    [
        "Pending Payments",
        "Post Install Supplement Pending",
        "Jobs In Progress",
        "Final Walk Around",
        "Submit COC",
        "Punch List",
        "Job Completed",
        "Collections",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shape() {
        let config = ReportConfig::default();
        assert_eq!(config.milestones.len(), 5);
        assert_eq!(config.milestones[0].name, "Lead Acquired");
        assert!(!config.strict_labels);
        assert_eq!(config.ar_status_order.as_ref().unwrap().len(), 8);
        assert_eq!(config.loss_statuses, vec!["Lost", "Job Lost"]);
        assert!(config.settle_window().is_unbounded());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReportConfig = serde_json::from_str(r#"{"strict_labels": true}"#).unwrap();
        assert!(config.strict_labels);
        assert_eq!(config.milestones, default_milestones());
    }

    #[test]
    fn test_known_labels_union() {
        let mut config =
            ReportConfig::with_milestones(vec![MilestoneDefinition::new("lead", [" Lead "])]);
        config.ar_status_order = Some(vec!["Collections".to_string()]);
        config.ignored_statuses = vec!["Archived".to_string()];
        config.loss_statuses = vec!["Lost".to_string()];

        let labels = config.known_labels();
        assert!(labels.contains("Lead"));
        assert!(labels.contains("Collections"));
        assert!(labels.contains("Archived"));
        assert!(labels.contains("Lost"));
        assert_eq!(labels.len(), 4);
    }
}
