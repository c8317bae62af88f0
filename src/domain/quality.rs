// ==========================================
// 屋面工程 KPI 分析引擎 - 数据质量告警
// ==========================================
// 职责: 非致命数据异常（收集后随结果返回，不中断计算）
// ==========================================

use crate::domain::types::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// WarningKind - 告警类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// 后一里程碑的首次到达早于前一里程碑（耗时为负）
    OutOfOrderMilestone {
        from_milestone: String,
        to_milestone: String,
        elapsed_seconds: i64,
    },
}

impl WarningKind {
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::OutOfOrderMilestone { .. } => "OUT_OF_ORDER_MILESTONE",
        }
    }
}

// ==========================================
// DataQualityWarning - 数据质量告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub job_id: JobId,
    pub representative: Option<String>,
    pub kind: WarningKind,
    pub message: String,
}

impl DataQualityWarning {
    pub fn out_of_order(
        job_id: JobId,
        representative: Option<String>,
        from_milestone: &str,
        to_milestone: &str,
        elapsed_seconds: i64,
    ) -> Self {
        let message = format!(
            "{} 的首次到达时间早于 {}（耗时 {} 秒），已从转化统计中剔除",
            to_milestone, from_milestone, elapsed_seconds
        );
        Self {
            job_id,
            representative,
            kind: WarningKind::OutOfOrderMilestone {
                from_milestone: from_milestone.to_string(),
                to_milestone: to_milestone.to_string(),
                elapsed_seconds,
            },
            message,
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] job {}: {}", self.kind.code(), self.job_id, self.message)
    }
}
