// ==========================================
// 屋面工程 KPI 分析引擎 - 里程碑匹配
// ==========================================
// 职责: 原始状态标签 → 里程碑下标；求每个里程碑的首次到达与首次流失
// 规则: 集合成员匹配；多次命中只取最早一次（首次到达为准）
// ==========================================

use crate::config::MilestoneDefinition;
use crate::domain::job::JobRecord;
use crate::domain::types::Timestamp;
use std::collections::{HashMap, HashSet};

/// 里程碑首次到达
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    /// 在标准化状态历史中的位置
    pub position: usize,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone)]
pub struct MilestoneMatcher {
    names: Vec<String>,
    label_index: HashMap<String, usize>,
    loss_labels: HashSet<String>,
}

impl MilestoneMatcher {
    pub fn new(milestones: &[MilestoneDefinition]) -> Self {
        let mut label_index = HashMap::new();
        for (idx, milestone) in milestones.iter().enumerate() {
            for label in &milestone.labels {
                let label = label.trim();
                if label.is_empty() {
                    continue;
                }
                // 配置校验保证标签唯一；未校验时以靠前的里程碑为准
                label_index.entry(label.to_string()).or_insert(idx);
            }
        }

        Self {
            names: milestones.iter().map(|m| m.name.clone()).collect(),
            label_index,
            loss_labels: HashSet::new(),
        }
    }

    /// 登记流失标签
    pub fn with_loss_labels<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        self.loss_labels = labels
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn milestone_count(&self) -> usize {
        self.names.len()
    }

    /// 标签所属的里程碑下标
    pub fn milestone_of(&self, label: &str) -> Option<usize> {
        self.label_index.get(label.trim()).copied()
    }

    /// 每个里程碑的首次到达（未到达为 None）
    pub fn first_arrivals(&self, job: &JobRecord) -> Vec<Option<Arrival>> {
        let mut arrivals = vec![None; self.names.len()];
        for (position, entry) in job.status_history().iter().enumerate() {
            if let Some(idx) = self.milestone_of(&entry.status) {
                if arrivals[idx].is_none() {
                    arrivals[idx] = Some(Arrival {
                        position,
                        timestamp: entry.timestamp,
                    });
                }
            }
        }
        arrivals
    }

    /// 首次进入流失状态的时间（未流失为 None）
    pub fn first_loss(&self, job: &JobRecord) -> Option<Timestamp> {
        job.status_history()
            .iter()
            .find(|entry| self.loss_labels.contains(entry.status.trim()))
            .map(|entry| entry.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{RawJobRecord, StatusEntry};
    use crate::importer::normalize_jobs;
    use chrono::{Duration, TimeZone, Utc};

    fn milestones() -> Vec<MilestoneDefinition> {
        vec![
            MilestoneDefinition::new("lead", ["Lead", "New Lead"]),
            MilestoneDefinition::new("signed", ["Signed"]),
        ]
    }

    #[test]
    fn test_label_matching_is_set_membership() {
        let matcher = MilestoneMatcher::new(&milestones());
        assert_eq!(matcher.milestone_of("New Lead"), Some(0));
        assert_eq!(matcher.milestone_of(" Signed "), Some(1));
        assert_eq!(matcher.milestone_of("Collections"), None);
        assert_eq!(matcher.milestone_count(), 2);
    }

    #[test]
    fn test_first_arrival_wins() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let raw = RawJobRecord {
            id: Some("J1".to_string()),
            status_history: vec![
                StatusEntry::new("Lead", t0),
                StatusEntry::new("Signed", t0 + Duration::days(2)),
                StatusEntry::new("New Lead", t0 + Duration::days(3)),
                StatusEntry::new("Signed", t0 + Duration::days(4)),
            ],
            ..Default::default()
        };
        let job = normalize_jobs(vec![raw]).unwrap().remove(0);

        let arrivals = MilestoneMatcher::new(&milestones()).first_arrivals(&job);
        assert_eq!(arrivals[0].unwrap().position, 0);
        assert_eq!(arrivals[1].unwrap().timestamp, t0 + Duration::days(2));
    }

    #[test]
    fn test_first_loss() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let raw = RawJobRecord {
            id: Some("J1".to_string()),
            status_history: vec![
                StatusEntry::new("Lead", t0),
                StatusEntry::new("Lost", t0 + Duration::days(1)),
                StatusEntry::new("Job Lost", t0 + Duration::days(5)),
            ],
            ..Default::default()
        };
        let job = normalize_jobs(vec![raw]).unwrap().remove(0);

        let plain = MilestoneMatcher::new(&milestones());
        assert_eq!(plain.first_loss(&job), None);

        let matcher = plain.with_loss_labels(&["Job Lost", " Lost "]);
        assert_eq!(matcher.first_loss(&job), Some(t0 + Duration::days(1)));
        assert_eq!(matcher.milestone_of("Lost"), None);
    }
}
