// ==========================================
// 屋面工程 KPI 分析引擎 - 工单实体
// ==========================================
// 职责: 定义原始工单（导入中间产物）与标准化工单
// 红线: JobRecord 构造后不可变；current_status 只能由状态历史派生
// ==========================================

use crate::domain::types::{JobId, Money, Timestamp};
use serde::{Deserialize, Serialize};

// ==========================================
// StatusEntry - 状态历史条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: String,       // 原始状态标签
    pub timestamp: Timestamp, // 进入该状态的时间
}

impl StatusEntry {
    pub fn new(status: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            status: status.into(),
            timestamp,
        }
    }
}

// ==========================================
// RawJobRecord - 导入中间结构体
// ==========================================
// 用途: 字段映射之后、标准化之前的工单
// 生命周期: 仅在导入流程内
// 注意: status_history 保持来源顺序，尚未排序
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJobRecord {
    pub id: Option<String>,
    pub representative: Option<String>,
    pub job_name: Option<String>,
    pub job_number: Option<String>,
    pub status_history: Vec<StatusEntry>,
    pub amount_due: Money,
    pub contract_amount: Money,
    pub amount_received: Money,

    // 元信息
    pub source_row: usize, // 来源行号/序号（用于错误定位）
}

// ==========================================
// JobRecord - 标准化工单
// ==========================================
// 不变量:
// - status_history 非空，且按时间升序（同时间按来源顺序）
// - current_status == status_history.last().status
// - 所有金额 >= 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    id: JobId,
    representative: Option<String>,
    job_name: Option<String>,
    job_number: Option<String>,
    status_history: Vec<StatusEntry>,
    amount_due: Money,
    contract_amount: Money,
    amount_received: Money,
}

impl JobRecord {
    /// 仅供标准化器调用：调用方保证 history 已排序且非空
    pub(crate) fn from_normalized(
        id: JobId,
        representative: Option<String>,
        job_name: Option<String>,
        job_number: Option<String>,
        status_history: Vec<StatusEntry>,
        amounts: (Money, Money, Money),
    ) -> Self {
        debug_assert!(!status_history.is_empty());
        let (amount_due, contract_amount, amount_received) = amounts;
        Self {
            id,
            representative,
            job_name,
            job_number,
            status_history,
            amount_due,
            contract_amount,
            amount_received,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// 所属销售代表（None 表示未分配）
    pub fn representative(&self) -> Option<&str> {
        self.representative.as_deref()
    }

    pub fn job_name(&self) -> Option<&str> {
        self.job_name.as_deref()
    }

    pub fn job_number(&self) -> Option<&str> {
        self.job_number.as_deref()
    }

    pub fn status_history(&self) -> &[StatusEntry] {
        &self.status_history
    }

    /// 最近一条状态历史
    pub fn latest_entry(&self) -> Option<&StatusEntry> {
        self.status_history.last()
    }

    /// 当前状态（由最后一条历史派生）
    pub fn current_status(&self) -> &str {
        self.latest_entry().map(|e| e.status.as_str()).unwrap_or_default()
    }

    /// 进入当前状态的时间
    pub fn status_since(&self) -> Option<Timestamp> {
        self.latest_entry().map(|e| e.timestamp)
    }

    pub fn amount_due(&self) -> Money {
        self.amount_due
    }

    pub fn contract_amount(&self) -> Money {
        self.contract_amount
    }

    pub fn amount_received(&self) -> Money {
        self.amount_received
    }
}

// ==========================================
// JobSnapshot - 一次导入的标准化工单集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    /// 导入批次号（仅用于日志关联，不进入报表）
    pub batch_id: String,

    /// 标准化工单（保持来源顺序）
    pub jobs: Vec<JobRecord>,
}

impl JobSnapshot {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 快照中最晚的状态时间（作为默认报表基准时间）
    pub fn latest_timestamp(&self) -> Option<Timestamp> {
        latest_timestamp(&self.jobs)
    }
}

/// 一组工单中最晚的状态时间
pub fn latest_timestamp(jobs: &[JobRecord]) -> Option<Timestamp> {
    jobs.iter().filter_map(|job| job.status_since()).max()
}
