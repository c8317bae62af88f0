// ==========================================
// 屋面工程 KPI 分析引擎 - 决策对象：应收账款桶
// ==========================================
// 职责: 按当前状态分桶统计应收金额
// 红线: 零金额工单必须计入 job_count（按状态过滤，不按金额过滤）
// ==========================================

use crate::domain::types::{JobId, Money};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 应收明细行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArEntry {
    pub job_id: JobId,
    pub job_name: Option<String>,
    pub job_number: Option<String>,
    pub amount_due: Money,
    pub days_in_status: i64,
}

/// 应收账款桶 (ArBucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArBucket {
    /// 当前状态
    pub status: String,

    /// 工单数量（含零金额）
    pub job_count: usize,

    /// 应收合计
    pub total_amount_due: Money,

    /// 零金额工单数量
    pub zero_amount_count: usize,

    /// 明细（输入顺序）
    pub entries: Vec<ArEntry>,
}

impl ArBucket {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            job_count: 0,
            total_amount_due: Money::ZERO,
            zero_amount_count: 0,
            entries: Vec::new(),
        }
    }

    /// 添加工单到桶中
    pub fn add_entry(&mut self, entry: ArEntry) {
        self.job_count += 1;
        self.total_amount_due = self.total_amount_due + entry.amount_due;
        if entry.amount_due.is_zero() {
            self.zero_amount_count += 1;
        }
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.job_count == 0
    }
}

impl fmt::Display for ArBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (jobs: {}, total: {})",
            self.status, self.job_count, self.total_amount_due
        )
    }
}

/// 应收账本：有序桶 + 汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArLedger {
    pub buckets: Vec<ArBucket>,
    pub job_count: usize,
    pub total_amount_due: Money,
}

impl ArLedger {
    pub fn from_buckets(buckets: Vec<ArBucket>) -> Self {
        let job_count = buckets.iter().map(|b| b.job_count).sum();
        let total_amount_due = buckets.iter().map(|b| b.total_amount_due).sum();
        Self {
            buckets,
            job_count,
            total_amount_due,
        }
    }

    pub fn bucket(&self, status: &str) -> Option<&ArBucket> {
        self.buckets.iter().find(|b| b.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, cents: i64) -> ArEntry {
        ArEntry {
            job_id: JobId::new(id),
            job_name: None,
            job_number: None,
            amount_due: Money::from_cents(cents),
            days_in_status: 0,
        }
    }

    #[test]
    fn test_add_entry_counts_zero_amount() {
        let mut bucket = ArBucket::new("Pending Payments");
        bucket.add_entry(entry("J1", 0));
        bucket.add_entry(entry("J2", 12_500));

        assert_eq!(bucket.job_count, 2);
        assert_eq!(bucket.zero_amount_count, 1);
        assert_eq!(bucket.total_amount_due, Money::from_cents(12_500));
        assert_eq!(bucket.entries.len(), 2);
    }

    #[test]
    fn test_ledger_totals() {
        let mut a = ArBucket::new("A");
        a.add_entry(entry("J1", 100));
        let mut b = ArBucket::new("B");
        b.add_entry(entry("J2", 0));
        b.add_entry(entry("J3", 250));

        let ledger = ArLedger::from_buckets(vec![a, b]);
        assert_eq!(ledger.job_count, 3);
        assert_eq!(ledger.total_amount_due, Money::from_cents(350));
        assert_eq!(ledger.bucket("B").unwrap().job_count, 2);
        assert!(ledger.bucket("C").is_none());
    }
}
