// ==========================================
// 屋面工程 KPI 分析引擎 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: JSON (.json，CRM 工单对象) / CSV (.csv，每行一条状态历史)
// 输出: 统一为 CRM 形态的工单对象，交给字段映射器
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::crm_keys;
use crate::importer::job_importer_trait::FileParser;
use csv::ReaderBuilder;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// CSV 快照列名
pub mod csv_columns {
    pub const JOB_ID: &str = "job_id";
    pub const SALES_REP: &str = "sales_rep";
    pub const JOB_NAME: &str = "job_name";
    pub const JOB_NUMBER: &str = "job_number";
    pub const STATUS: &str = "status";
    pub const TIMESTAMP: &str = "timestamp";
    pub const AMOUNT_DUE: &str = "amount_due";
    pub const CONTRACT_AMOUNT: &str = "contract_amount";
    pub const AMOUNT_RECEIVED: &str = "amount_received";
}

/// 检查文件存在与扩展名
fn check_file(path: &Path, expected_ext: &str) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != expected_ext {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 接受两种形态:
// - 工单对象数组
// - CRM 列表响应 { "count": N, "results": [...] }
pub struct JsonSnapshotParser;

impl FileParser for JsonSnapshotParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<Value>> {
        check_file(file_path, "json")?;
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn parse_str(&self, content: &str) -> ImportResult<Vec<Value>> {
        let root: Value = serde_json::from_str(content)?;

        match root {
            Value::Array(items) => Ok(items),
            Value::Object(mut fields) => {
                let declared = fields.get("count").and_then(Value::as_u64);
                match fields.remove("results") {
                    Some(Value::Array(items)) => {
                        if let Some(count) = declared {
                            if count as usize != items.len() {
                                warn!(
                                    declared = count,
                                    actual = items.len(),
                                    "快照声明的工单数与实际不一致"
                                );
                            }
                        }
                        Ok(items)
                    }
                    _ => Err(ImportError::JsonParseError(
                        "快照对象缺少 results 数组".to_string(),
                    )),
                }
            }
            _ => Err(ImportError::JsonParseError(
                "快照必须是工单数组或包含 results 的对象".to_string(),
            )),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 每行一条状态历史；按 job_id 首次出现顺序分组
// 同一工单内的历史保持文件顺序（即同时刻的先后次序）
pub struct CsvSnapshotParser;

impl FileParser for CsvSnapshotParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<Value>> {
        check_file(file_path, "csv")?;
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn parse_str(&self, content: &str) -> ImportResult<Vec<Value>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if !headers.iter().any(|h| h == csv_columns::JOB_ID) {
            return Err(ImportError::CsvParseError(format!(
                "缺少必需列: {}",
                csv_columns::JOB_ID
            )));
        }

        let mut jobs: Vec<Map<String, Value>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            // 表头占第 1 行
            let line = row_idx + 2;

            let mut row: HashMap<&str, &str> = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.as_str(), value.trim());
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            let job_id = row.get(csv_columns::JOB_ID).copied().unwrap_or("");
            if job_id.is_empty() {
                return Err(ImportError::FieldMappingError {
                    row: line,
                    message: format!("{} 为空", csv_columns::JOB_ID),
                });
            }

            let slot = match index.get(job_id) {
                Some(&slot) => slot,
                None => {
                    index.insert(job_id.to_string(), jobs.len());
                    let mut job = Map::new();
                    job.insert(crm_keys::JNID.to_string(), json!(job_id));
                    job.insert(crm_keys::STATUS_HISTORY.to_string(), json!([]));
                    jobs.push(job);
                    jobs.len() - 1
                }
            };
            let job = &mut jobs[slot];

            // 工单级字段: 取第一个非空值
            for (column, key) in [
                (csv_columns::SALES_REP, crm_keys::SALES_REP),
                (csv_columns::JOB_NAME, crm_keys::JOB_NAME),
                (csv_columns::JOB_NUMBER, crm_keys::JOB_NUMBER),
                (csv_columns::AMOUNT_DUE, crm_keys::AMOUNT_DUE[0]),
                (csv_columns::CONTRACT_AMOUNT, crm_keys::CONTRACT_AMOUNT[0]),
                (csv_columns::AMOUNT_RECEIVED, crm_keys::AMOUNT_RECEIVED[0]),
            ] {
                if let Some(value) = row.get(column).filter(|v| !v.is_empty()) {
                    job.entry(key.to_string()).or_insert_with(|| json!(value));
                }
            }

            // 状态历史条目
            let status = row.get(csv_columns::STATUS).copied().unwrap_or("");
            let timestamp = row.get(csv_columns::TIMESTAMP).copied().unwrap_or("");
            if status.is_empty() && timestamp.is_empty() {
                continue;
            }
            let mut entry = Map::new();
            entry.insert(crm_keys::STATUS.to_string(), json!(status));
            entry.insert(crm_keys::TIMESTAMP.to_string(), json!(timestamp));
            if let Some(Value::Array(history)) = job.get_mut(crm_keys::STATUS_HISTORY) {
                history.push(Value::Object(entry));
            }
        }

        Ok(jobs.into_iter().map(Value::Object).collect())
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    fn select(path: &Path) -> ImportResult<Box<dyn FileParser>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => Ok(Box::new(JsonSnapshotParser)),
            "csv" => Ok(Box::new(CsvSnapshotParser)),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<Value>> {
        Self::select(file_path)?.parse_to_raw_records(file_path)
    }

    /// 无扩展名可依据时按 JSON 解析
    fn parse_str(&self, content: &str) -> ImportResult<Vec<Value>> {
        JsonSnapshotParser.parse_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_json_array_snapshot() {
        let items = JsonSnapshotParser
            .parse_str(r#"[{"jnid": "J1"}, {"jnid": "J2"}]"#)
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_json_list_response_snapshot() {
        let items = JsonSnapshotParser
            .parse_str(r#"{"count": 1, "results": [{"jnid": "J1"}]}"#)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["jnid"], "J1");
    }

    #[test]
    fn test_json_invalid_shape() {
        assert!(matches!(
            JsonSnapshotParser.parse_str(r#"{"jobs": []}"#),
            Err(ImportError::JsonParseError(_))
        ));
        assert!(matches!(
            JsonSnapshotParser.parse_str("42"),
            Err(ImportError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_csv_groups_rows_by_job() {
        let content = "\
job_id,sales_rep,job_name,job_number,status,timestamp,amount_due,contract_amount,amount_received
J2,Dana,Smith,1001,Lead,1700000000,,,
J1,,Jones,1002,Lead,1700000000,0,,
J2,,,,Signed Contract,1700432000,250.00,9000,
J1,Eli,,,Estimating,1700100000,,,
";
        let jobs = CsvSnapshotParser.parse_str(content).unwrap();
        assert_eq!(jobs.len(), 2);

        // 首次出现顺序
        assert_eq!(jobs[0]["jnid"], "J2");
        assert_eq!(jobs[1]["jnid"], "J1");

        let j2 = &jobs[0];
        assert_eq!(j2["sales_rep_name"], "Dana");
        assert_eq!(j2["amount_due"], "250.00");
        assert_eq!(j2["status_history"].as_array().unwrap().len(), 2);

        // 工单级字段取第一个非空值
        assert_eq!(jobs[1]["sales_rep_name"], "Eli");
    }

    #[test]
    fn test_csv_missing_job_id_column() {
        let err = CsvSnapshotParser.parse_str("id,status\nJ1,Lead\n").unwrap_err();
        assert!(matches!(err, ImportError::CsvParseError(_)));
    }

    #[test]
    fn test_csv_blank_job_id_names_line() {
        let err = CsvSnapshotParser
            .parse_str("job_id,status,timestamp\nJ1,Lead,1700000000\n,Lead,1700000000\n")
            .unwrap_err();
        assert!(matches!(err, ImportError::FieldMappingError { row: 3, .. }));
    }

    #[test]
    fn test_universal_parser_dispatch() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "job_id,status,timestamp").unwrap();
        writeln!(file, "J1,Lead,1700000000").unwrap();
        let jobs = UniversalFileParser.parse_to_raw_records(file.path()).unwrap();
        assert_eq!(jobs.len(), 1);

        let other = Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(matches!(
            UniversalFileParser.parse_to_raw_records(other.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_file_not_found() {
        let result = JsonSnapshotParser.parse_to_raw_records(Path::new("non_existent.json"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
