// ==========================================
// 屋面工程 KPI 分析引擎 - 工单标准化
// ==========================================
// 职责: RawJobRecord → JobRecord
// 规则:
// 1. 状态历史按时间稳定排序（同时刻保持来源顺序，绝不按标签排序）
// 2. 工单号缺失 / 状态历史为空 / 状态为空 / 金额为负 → MalformedRecord
// 3. 同一批次内工单号重复 → MalformedRecord
// 4. 当前状态 = 排序后最后一条历史的状态
// ==========================================

use crate::domain::job::{JobRecord, RawJobRecord};
use crate::domain::types::JobId;
use crate::importer::dq_validator::record_label;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;
use tracing::{debug, error};

pub struct JobNormalizer;

impl JobNormalizer {
    /// 标准化单条工单
    pub fn normalize(&self, raw: RawJobRecord) -> ImportResult<JobRecord> {
        let label = record_label(&raw);

        let id = match raw.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => JobId::new(id),
            _ => return Err(reject(label, "缺少工单号 (jnid)")),
        };

        if raw.status_history.is_empty() {
            return Err(reject(label, "状态历史为空"));
        }

        if let Some(pos) = raw
            .status_history
            .iter()
            .position(|e| e.status.trim().is_empty())
        {
            return Err(reject(label, format!("第 {} 条状态历史的状态为空", pos + 1)));
        }

        for (field, amount) in [
            ("amount_due", raw.amount_due),
            ("contract_amount", raw.contract_amount),
            ("amount_received", raw.amount_received),
        ] {
            if amount.is_negative() {
                return Err(reject(label, format!("{} 不能为负数: {}", field, amount)));
            }
        }

        let mut history = raw.status_history;
        for entry in &mut history {
            let trimmed = entry.status.trim();
            if trimmed.len() != entry.status.len() {
                entry.status = trimmed.to_string();
            }
        }
        // sort_by_key 为稳定排序
        history.sort_by_key(|e| e.timestamp);

        Ok(JobRecord::from_normalized(
            id,
            raw.representative,
            raw.job_name,
            raw.job_number,
            history,
            (raw.amount_due, raw.contract_amount, raw.amount_received),
        ))
    }

    /// 标准化整个快照（任一工单不合法或工单号重复则整体失败）
    pub fn normalize_all(&self, records: Vec<RawJobRecord>) -> ImportResult<Vec<JobRecord>> {
        let total = records.len();
        let mut first_row: HashMap<JobId, usize> = HashMap::with_capacity(total);
        let mut jobs = Vec::with_capacity(total);

        for raw in records {
            let row = raw.source_row;
            let job = self.normalize(raw)?;
            if let Some(prev) = first_row.insert(job.id().clone(), row) {
                return Err(reject(
                    job.id().to_string(),
                    format!("工单号在快照中重复出现 (来源序号 {} 与 {})", prev, row),
                ));
            }
            jobs.push(job);
        }

        debug!(total, "工单标准化完成");
        Ok(jobs)
    }
}

/// 标准化一组原始工单（与导入管道相同的结构校验，含工单号唯一）
pub fn normalize_jobs(records: Vec<RawJobRecord>) -> ImportResult<Vec<JobRecord>> {
    JobNormalizer.normalize_all(records)
}

fn reject(record: String, reason: impl Into<String>) -> ImportError {
    let reason = reason.into();
    error!(record = %record, reason = %reason, "工单记录不合法");
    ImportError::MalformedRecord { record, reason }
}
