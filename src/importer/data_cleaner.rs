// ==========================================
// 屋面工程 KPI 分析引擎 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 金额与时间解析
// ==========================================

use crate::domain::job::RawJobRecord;
use crate::domain::types::{Money, Timestamp};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::job_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_money(&self, value: &Value, row: usize, field: &str) -> ImportResult<Money> {
        match value {
            Value::Null => Ok(Money::ZERO),
            Value::Number(n) => n
                .as_f64()
                .map(Money::from_dollars)
                .ok_or_else(|| money_error(row, field, &n.to_string())),
            Value::String(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| *c != '$' && *c != ',')
                    .collect();
                if cleaned.is_empty() {
                    return Ok(Money::ZERO);
                }
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Money::from_dollars)
                    .ok_or_else(|| money_error(row, field, s))
            }
            other => Err(money_error(row, field, &other.to_string())),
        }
    }

    fn parse_timestamp(
        &self,
        value: &Value,
        row: usize,
        field: &str,
    ) -> ImportResult<Option<Timestamp>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => match n.as_i64() {
                Some(secs) => unix_seconds(secs, row, field),
                None => Err(timestamp_error(row, field, &n.to_string())),
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                if let Ok(secs) = trimmed.parse::<i64>() {
                    return unix_seconds(secs, row, field);
                }
                DateTime::parse_from_rfc3339(trimmed)
                    .map(|dt| Some(dt.with_timezone(&Utc)))
                    .map_err(|_| timestamp_error(row, field, trimmed))
            }
            other => Err(timestamp_error(row, field, &other.to_string())),
        }
    }

    fn clean_record(&self, record: &mut RawJobRecord) {
        record.id = self.normalize_null(record.id.take());
        record.representative = self.normalize_null(record.representative.take());
        record.job_name = self.normalize_null(record.job_name.take());
        record.job_number = self.normalize_null(record.job_number.take());

        for entry in &mut record.status_history {
            entry.status = self.clean_text(&entry.status);
        }
    }
}

/// Unix 秒 → 时间戳（CRM 中 0 表示"无值"）
fn unix_seconds(secs: i64, row: usize, field: &str) -> ImportResult<Option<Timestamp>> {
    if secs == 0 {
        return Ok(None);
    }
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(Some)
        .ok_or_else(|| timestamp_error(row, field, &secs.to_string()))
}

fn timestamp_error(row: usize, field: &str, value: &str) -> ImportError {
    ImportError::TimestampFormatError {
        row,
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn money_error(row: usize, field: &str, value: &str) -> ImportError {
    ImportError::FieldMappingError {
        row,
        message: format!("字段 {} 无法解析为金额: {}", field, value),
    }
}
