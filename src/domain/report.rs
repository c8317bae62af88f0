// ==========================================
// 屋面工程 KPI 分析引擎 - 报表结构
// ==========================================
// 职责: 与渲染器无关的报表结构（分区 → 有序表格）
// 红线: 只用 Vec 保序，禁止 HashMap，保证序列化结果逐字节稳定
// ==========================================

use crate::domain::quality::DataQualityWarning;
use crate::domain::types::{Metric, Money, Timestamp};
use serde::{Deserialize, Serialize};

/// 列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Decimal,
    Money,
}

/// 列定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl ReportColumn {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// 单元格
///
/// NotApplicable 为独立变体，渲染器必须能与 0 区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReportCell {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Money(Money),
    NotApplicable,
    Empty,
}

impl ReportCell {
    pub fn text(value: impl Into<String>) -> Self {
        ReportCell::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) => ReportCell::Text(v.to_string()),
            None => ReportCell::Empty,
        }
    }

    pub fn count(value: usize) -> Self {
        ReportCell::Integer(value as i64)
    }

    pub fn metric(value: Metric) -> Self {
        match value {
            Metric::Value(v) => ReportCell::Decimal(v),
            Metric::NotApplicable => ReportCell::NotApplicable,
        }
    }
}

/// 数据行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub cells: Vec<ReportCell>,
}

/// 报表分区
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// 分区键，例如 "funnel:global" / "funnel:rep:<name>" / "ar:by_status"
    pub key: String,
    pub title: String,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

impl ReportSection {
    pub fn new(key: impl Into<String>, title: impl Into<String>, columns: Vec<ReportColumn>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<ReportCell>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push(ReportRow { cells });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// 按列名读取单元格
    pub fn cell(&self, row: usize, column: &str) -> Option<&ReportCell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.cells.get(idx))
    }
}

/// 分析报表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub as_of: Timestamp,
    pub job_count: usize,
    pub warning_count: usize,
    pub sections: Vec<ReportSection>,
    pub warnings: Vec<DataQualityWarning>,
}

impl AnalyticsReport {
    pub fn section(&self, key: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn section_keys(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.key.as_str()).collect()
    }
}
