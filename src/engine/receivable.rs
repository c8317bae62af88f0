// ==========================================
// 屋面工程 KPI 分析引擎 - 应收账款聚合
// ==========================================
// 职责: 按当前状态分桶汇总应收
// 规则:
// 1. 每个出现过的当前状态恰好一个桶（合计为 0 也保留）
// 2. 零金额工单计入 job_count
// 3. 排序: 配置了规范顺序时，先按规范顺序（仅已出现的状态），其余按首次出现顺序
//    未配置时完全按首次出现顺序；绝不依赖哈希顺序
// 4. sum(job_count) == len(jobs)
// ==========================================

use crate::domain::job::{latest_timestamp, JobRecord};
use crate::domain::receivable::{ArBucket, ArEntry, ArLedger};
use crate::domain::types::Timestamp;
use crate::perf::PerfGuard;
use std::collections::HashMap;
use tracing::{debug, info};

// ==========================================
// ArAggregator - 应收聚合器
// ==========================================
#[derive(Debug, Clone)]
pub struct ArAggregator {
    canonical_order: Option<Vec<String>>,
    as_of: Timestamp,
}

impl ArAggregator {
    /// # 参数
    /// - canonical_order: 状态规范顺序（None → 首次出现顺序）
    /// - as_of: 计算在状态天数的基准时间
    pub fn new(canonical_order: Option<Vec<String>>, as_of: Timestamp) -> Self {
        Self {
            canonical_order,
            as_of,
        }
    }

    /// 聚合为应收账本
    pub fn aggregate(&self, jobs: &[JobRecord]) -> ArLedger {
        let _perf = PerfGuard::new("compute_ar");

        let mut buckets: Vec<ArBucket> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for job in jobs {
            let status = job.current_status();
            let slot = *index.entry(status).or_insert_with(|| {
                buckets.push(ArBucket::new(status));
                buckets.len() - 1
            });
            buckets[slot].add_entry(self.entry_for(job));
        }

        if let Some(order) = &self.canonical_order {
            // 稳定排序：未列出的状态保持首次出现顺序
            buckets.sort_by_key(|bucket| {
                order
                    .iter()
                    .position(|s| s.trim() == bucket.status)
                    .unwrap_or(usize::MAX)
            });
        }

        for bucket in &buckets {
            debug!(status = %bucket.status, jobs = bucket.job_count, total = %bucket.total_amount_due, "应收分桶");
        }

        let ledger = ArLedger::from_buckets(buckets);
        info!(
            total_jobs = ledger.job_count,
            buckets = ledger.buckets.len(),
            total_amount_due = %ledger.total_amount_due,
            "应收聚合完成"
        );
        ledger
    }

    fn entry_for(&self, job: &JobRecord) -> ArEntry {
        let days_in_status = job
            .status_since()
            .map(|since| (self.as_of - since).num_days().max(0))
            .unwrap_or(0);

        ArEntry {
            job_id: job.id().clone(),
            job_name: job.job_name().map(str::to_string),
            job_number: job.job_number().map(str::to_string),
            amount_due: job.amount_due(),
            days_in_status,
        }
    }
}

/// 按当前状态汇总应收
///
/// 在状态天数以输入中最晚的状态时间为基准
pub fn compute_ar(jobs: &[JobRecord], canonical_order: Option<&[String]>) -> Vec<ArBucket> {
    let as_of = latest_timestamp(jobs).unwrap_or_default();
    ArAggregator::new(canonical_order.map(<[String]>::to_vec), as_of)
        .aggregate(jobs)
        .buckets
}
