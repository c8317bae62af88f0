// ==========================================
// 屋面工程 KPI 分析引擎 - 字段映射器实现
// ==========================================
// 职责: CRM 工单对象 → RawJobRecord 映射 + 类型转换
// 来源: JobNimbus 工单 JSON（jnid / sales_rep_name / name / number ...）
// ==========================================

use crate::domain::job::{RawJobRecord, StatusEntry};
use crate::domain::types::Money;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::job_importer_trait::{
    DataCleaner as DataCleanerTrait, FieldMapper as FieldMapperTrait,
};
use serde_json::{Map, Value};
use tracing::debug;

/// CRM 工单对象中的字段名
pub mod crm_keys {
    pub const JNID: &str = "jnid";
    pub const SALES_REP: &str = "sales_rep_name";
    pub const JOB_NAME: &str = "name";
    pub const JOB_NUMBER: &str = "number";
    pub const STATUS_HISTORY: &str = "status_history";
    pub const STATUS: &str = "status";
    pub const TIMESTAMP: &str = "timestamp";

    // 无状态历史时的当前状态字段
    pub const STATUS_NAME: &str = "status_name";
    pub const DATE_STATUS_CHANGE: &str = "date_status_change";

    // 金额字段（按顺序取第一个非空别名）
    pub const AMOUNT_DUE: &[&str] = &["amount_due", "approved_invoice_due"];
    pub const CONTRACT_AMOUNT: &[&str] = &["contract_amount", "approved_estimate_total"];
    pub const AMOUNT_RECEIVED: &[&str] = &["amount_received"];
}

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapperTrait for FieldMapper {
    fn map_to_raw_job(&self, object: &Value, source_row: usize) -> ImportResult<RawJobRecord> {
        let fields = object
            .as_object()
            .ok_or_else(|| ImportError::FieldMappingError {
                row: source_row,
                message: format!("工单必须是 JSON 对象，实际为 {}", value_kind(object)),
            })?;

        Ok(RawJobRecord {
            // 主键
            id: self.get_text(fields, crm_keys::JNID, source_row)?,

            // 基础信息
            representative: self.get_text(fields, crm_keys::SALES_REP, source_row)?,
            job_name: self.get_text(fields, crm_keys::JOB_NAME, source_row)?,
            job_number: self.get_text(fields, crm_keys::JOB_NUMBER, source_row)?,

            // 状态历史（保持来源顺序）
            status_history: self.map_status_history(fields, source_row)?,

            // 金额
            amount_due: self.get_money(fields, crm_keys::AMOUNT_DUE, source_row)?,
            contract_amount: self.get_money(fields, crm_keys::CONTRACT_AMOUNT, source_row)?,
            amount_received: self.get_money(fields, crm_keys::AMOUNT_RECEIVED, source_row)?,

            // 元信息
            source_row,
        })
    }
}

impl FieldMapper {
    /// 提取文本字段（数字按字面转成文本，null/空白 → None）
    fn get_text(
        &self,
        fields: &Map<String, Value>,
        key: &str,
        row: usize,
    ) -> ImportResult<Option<String>> {
        let raw = match fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(ImportError::FieldMappingError {
                    row,
                    message: format!("字段 {} 应为文本，实际为 {}", key, value_kind(other)),
                })
            }
        };
        Ok(self.cleaner.normalize_null(raw))
    }

    /// 提取金额字段，支持别名
    fn get_money(
        &self,
        fields: &Map<String, Value>,
        aliases: &[&str],
        row: usize,
    ) -> ImportResult<Money> {
        for alias in aliases {
            match fields.get(*alias) {
                None | Some(Value::Null) => continue,
                Some(value) => return self.cleaner.parse_money(value, row, alias),
            }
        }
        Ok(Money::ZERO)
    }

    /// 映射状态历史
    ///
    /// # 规则
    /// - 优先读取 status_history 数组
    /// - 缺失时退化为 status_name + date_status_change 单条记录
    /// - 时间为空（或 CRM 的 0）的条目丢弃
    fn map_status_history(
        &self,
        fields: &Map<String, Value>,
        row: usize,
    ) -> ImportResult<Vec<StatusEntry>> {
        match fields.get(crm_keys::STATUS_HISTORY) {
            Some(Value::Array(items)) => {
                let mut history = Vec::with_capacity(items.len());
                for item in items {
                    let entry = item.as_object().ok_or_else(|| ImportError::FieldMappingError {
                        row,
                        message: format!(
                            "status_history 条目必须是对象，实际为 {}",
                            value_kind(item)
                        ),
                    })?;
                    let status = self
                        .get_text(entry, crm_keys::STATUS, row)?
                        .unwrap_or_default();
                    let timestamp = self.cleaner.parse_timestamp(
                        entry.get(crm_keys::TIMESTAMP).unwrap_or(&Value::Null),
                        row,
                        crm_keys::TIMESTAMP,
                    )?;
                    match timestamp {
                        Some(ts) => history.push(StatusEntry::new(status, ts)),
                        None => debug!(row, status = %status, "状态条目无时间，已丢弃"),
                    }
                }
                Ok(history)
            }
            Some(Value::Null) | None => {
                let status = self.get_text(fields, crm_keys::STATUS_NAME, row)?;
                let timestamp = self.cleaner.parse_timestamp(
                    fields.get(crm_keys::DATE_STATUS_CHANGE).unwrap_or(&Value::Null),
                    row,
                    crm_keys::DATE_STATUS_CHANGE,
                )?;
                Ok(match (status, timestamp) {
                    (Some(status), Some(ts)) => vec![StatusEntry::new(status, ts)],
                    _ => Vec::new(),
                })
            }
            Some(other) => Err(ImportError::FieldMappingError {
                row,
                message: format!("status_history 应为数组，实际为 {}", value_kind(other)),
            }),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_full_job() {
        let mapper = FieldMapper::new();
        let object = json!({
            "jnid": "abc123",
            "sales_rep_name": "Dana",
            "name": "Smith Residence",
            "number": 1042,
            "status_history": [
                {"status": "Signed Contract", "timestamp": 1_700_086_400},
                {"status": "Lead", "timestamp": 1_700_000_000}
            ],
            "amount_due": 1250.75,
            "approved_estimate_total": "12,000.00",
            "amount_received": null
        });

        let record = mapper.map_to_raw_job(&object, 3).unwrap();
        assert_eq!(record.id.as_deref(), Some("abc123"));
        assert_eq!(record.representative.as_deref(), Some("Dana"));
        assert_eq!(record.job_number.as_deref(), Some("1042"));
        assert_eq!(record.status_history.len(), 2);
        // 映射阶段不排序
        assert_eq!(record.status_history[0].status, "Signed Contract");
        assert_eq!(record.amount_due.cents(), 125_075);
        assert_eq!(record.contract_amount.cents(), 1_200_000);
        assert_eq!(record.amount_received, Money::ZERO);
        assert_eq!(record.source_row, 3);
    }

    #[test]
    fn test_zero_timestamp_entry_dropped() {
        let mapper = FieldMapper::new();
        let object = json!({
            "jnid": "J1",
            "status_history": [
                {"status": "Lead", "timestamp": 0},
                {"status": "Estimating", "timestamp": 1_700_000_000}
            ]
        });
        let record = mapper.map_to_raw_job(&object, 1).unwrap();
        assert_eq!(record.status_history.len(), 1);
        assert_eq!(record.status_history[0].status, "Estimating");
    }

    #[test]
    fn test_fallback_to_current_status_fields() {
        let mapper = FieldMapper::new();
        let object = json!({
            "jnid": "J2",
            "status_name": "Collections",
            "date_status_change": 1_700_000_000
        });
        let record = mapper.map_to_raw_job(&object, 1).unwrap();
        assert_eq!(record.status_history.len(), 1);
        assert_eq!(record.status_history[0].status, "Collections");
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let mapper = FieldMapper::new();
        let object = json!({"jnid": "J3", "sales_rep_name": "", "name": "  "});
        let record = mapper.map_to_raw_job(&object, 1).unwrap();
        assert_eq!(record.representative, None);
        assert_eq!(record.job_name, None);
        assert!(record.status_history.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        let mapper = FieldMapper::new();
        let err = mapper.map_to_raw_job(&json!([1, 2]), 5).unwrap_err();
        assert!(matches!(err, ImportError::FieldMappingError { row: 5, .. }));
    }

    #[test]
    fn test_bad_history_shape_rejected() {
        let mapper = FieldMapper::new();
        let object = json!({"jnid": "J4", "status_history": "Lead"});
        assert!(mapper.map_to_raw_job(&object, 1).is_err());
    }
}
