// ==========================================
// 屋面工程 KPI 分析引擎 - 统计口径划分
// ==========================================
// 职责: 工单 → 所属口径（纯划分，不做聚合）
// ==========================================

use crate::domain::funnel::ScopeKey;
use crate::domain::job::JobRecord;

/// 全局 + 所属销售代表（未分配工单仅计入全局）
pub fn global_and_representative(job: &JobRecord) -> Vec<ScopeKey> {
    match job.representative() {
        Some(rep) => vec![ScopeKey::Global, ScopeKey::representative(rep)],
        None => vec![ScopeKey::Global],
    }
}

/// 仅全局口径
pub fn global_only(_job: &JobRecord) -> Vec<ScopeKey> {
    vec![ScopeKey::Global]
}
