// ==========================================
// 屋面工程 KPI 分析引擎 - 数据质量校验器实现
// ==========================================
// 职责: 严格模式下的状态标签登记校验（工单号唯一由标准化器负责）
// 红线: 校验失败即整体失败，不产生部分报表
// ==========================================

use crate::config::ReportConfig;
use crate::domain::job::RawJobRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::job_importer_trait::DqValidator as DqValidatorTrait;
use std::collections::BTreeSet;
use tracing::error;

pub struct DqValidator {
    /// 严格模式下的已登记标签；None 表示非严格模式
    known_labels: Option<BTreeSet<String>>,
}

impl DqValidator {
    /// 非严格模式
    pub fn new() -> Self {
        Self { known_labels: None }
    }

    /// 严格模式：仅允许给定标签
    pub fn strict<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_labels: Some(labels.into_iter().map(Into::into).collect()),
        }
    }

    /// 按配置构建（strict_labels 决定是否启用标签校验）
    pub fn from_config(config: &ReportConfig) -> Self {
        if config.strict_labels {
            Self::strict(config.known_labels())
        } else {
            Self::new()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.known_labels.is_some()
    }
}

impl Default for DqValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// 错误定位: 优先工单号，否则来源序号
pub(crate) fn record_label(record: &RawJobRecord) -> String {
    match record.id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => format!("row {}", record.source_row),
    }
}

impl DqValidatorTrait for DqValidator {
    fn validate_labels(&self, records: &[RawJobRecord]) -> ImportResult<()> {
        let Some(known) = &self.known_labels else {
            return Ok(());
        };

        for record in records {
            for entry in &record.status_history {
                let label = entry.status.trim();
                if !known.contains(label) {
                    error!(record = %record_label(record), status = %label, "未登记的状态标签");
                    return Err(ImportError::UnmappedStatus {
                        record: record_label(record),
                        status: label.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::StatusEntry;
    use chrono::{TimeZone, Utc};

    fn raw(id: Option<&str>, statuses: &[&str], row: usize) -> RawJobRecord {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        RawJobRecord {
            id: id.map(str::to_string),
            status_history: statuses.iter().map(|s| StatusEntry::new(*s, ts)).collect(),
            source_row: row,
            ..Default::default()
        }
    }

    #[test]
    fn test_non_strict_accepts_any_label() {
        let validator = DqValidator::new();
        assert!(!validator.is_strict());
        let records = vec![raw(Some("J1"), &["Whatever"], 1)];
        assert!(validator.validate_labels(&records).is_ok());
    }

    #[test]
    fn test_strict_rejects_unmapped_label() {
        let validator = DqValidator::strict(["Lead", "Signed Contract"]);
        let records = vec![
            raw(Some("J1"), &["Lead", "Signed Contract"], 1),
            raw(None, &["Lead", "Mystery"], 2),
        ];
        let err = validator.validate_labels(&records).unwrap_err();
        match err {
            ImportError::UnmappedStatus { record, status } => {
                assert_eq!(record, "row 2");
                assert_eq!(status, "Mystery");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_config_respects_strict_flag() {
        let mut config = ReportConfig::default();
        assert!(!DqValidator::from_config(&config).is_strict());
        config.strict_labels = true;
        assert!(DqValidator::from_config(&config).is_strict());
    }
}
