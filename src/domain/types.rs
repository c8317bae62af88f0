// ==========================================
// 屋面工程 KPI 分析引擎 - 领域类型定义
// ==========================================
// 职责: 工单号 / 金额 / 时间戳 / 统计指标等基础值类型
// 红线: 金额一律以"分"为单位的整数存储，禁止浮点累加
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// 时间戳（统一 UTC）
pub type Timestamp = DateTime<Utc>;

/// 一天的秒数
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ==========================================
// 工单号 (JobId)
// ==========================================
// 来源: CRM 的 jnid 字段，不透明字符串
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==========================================
// 金额 (Money)
// ==========================================
// 单位: 分（cent）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// 由美元金额换算（四舍五入到分）
    pub fn from_dollars(dollars: f64) -> Self {
        Self((dollars * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

// ==========================================
// 统计指标 (Metric)
// ==========================================
// 红线: 分母为 0 时必须输出 NotApplicable，不得输出 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Metric {
    Value(f64),
    NotApplicable,
}

impl Metric {
    /// 安全除法：分母为 0 → NotApplicable
    pub fn ratio(numerator: f64, denominator: usize) -> Self {
        if denominator == 0 {
            Metric::NotApplicable
        } else {
            Metric::Value(numerator / denominator as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotApplicable => None,
        }
    }

    pub fn is_not_applicable(self) -> bool {
        matches!(self, Metric::NotApplicable)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.4}", v),
            Metric::NotApplicable => write!(f, "N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_dollars_rounds_to_cents() {
        assert_eq!(Money::from_dollars(12.345).cents(), 1235);
        assert_eq!(Money::from_dollars(0.0), Money::ZERO);
        assert_eq!(Money::from_dollars(100.0).cents(), 10_000);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(123_456).to_string(), "$1234.56");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_cents(100), Money::ZERO, Money::from_cents(50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(150));
    }

    #[test]
    fn test_metric_ratio_zero_denominator() {
        assert_eq!(Metric::ratio(0.0, 0), Metric::NotApplicable);
        assert_eq!(Metric::ratio(1.0, 2), Metric::Value(0.5));
        assert!(Metric::ratio(3.0, 0).is_not_applicable());
    }

    #[test]
    fn test_metric_serialization_is_distinguishable() {
        let na = serde_json::to_string(&Metric::NotApplicable).unwrap();
        let zero = serde_json::to_string(&Metric::Value(0.0)).unwrap();
        assert_ne!(na, zero);
        assert_eq!(na, r#"{"kind":"not_applicable"}"#);
    }
}
