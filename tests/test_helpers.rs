// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供集成测试所需的工单构建器、快照文件生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use roofing_kpi::config::{MilestoneDefinition, ReportConfig};
use roofing_kpi::{normalize_jobs, JobRecord, Money, RawJobRecord, StatusEntry};
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// 测试基准时间 (2023-11-14T22:13:20Z)
pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// t0 之后第 n 天
pub fn day(n: i64) -> DateTime<Utc> {
    t0() + Duration::days(n)
}

/// 三里程碑测试配置: lead → appt → signed
pub fn three_step_config() -> ReportConfig {
    ReportConfig::with_milestones(three_step_milestones())
}

pub fn three_step_milestones() -> Vec<MilestoneDefinition> {
    vec![
        MilestoneDefinition::new("lead", ["Lead"]),
        MilestoneDefinition::new("appt", ["Appointment"]),
        MilestoneDefinition::new("signed", ["Signed"]),
    ]
}

// ==========================================
// RawJobRecord 构建器
// ==========================================

pub struct JobBuilder {
    record: RawJobRecord,
}

impl JobBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            record: RawJobRecord {
                id: Some(id.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn rep(mut self, name: &str) -> Self {
        self.record.representative = Some(name.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.job_name = Some(name.to_string());
        self
    }

    pub fn number(mut self, number: &str) -> Self {
        self.record.job_number = Some(number.to_string());
        self
    }

    /// 追加一条状态历史（t0 之后第 n 天）
    pub fn status(mut self, status: &str, day_offset: i64) -> Self {
        self.record
            .status_history
            .push(StatusEntry::new(status, day(day_offset)));
        self
    }

    /// 追加一条状态历史（精确时间）
    pub fn status_at(mut self, status: &str, timestamp: DateTime<Utc>) -> Self {
        self.record
            .status_history
            .push(StatusEntry::new(status, timestamp));
        self
    }

    pub fn amount_due_cents(mut self, cents: i64) -> Self {
        self.record.amount_due = Money::from_cents(cents);
        self
    }

    pub fn build(self) -> RawJobRecord {
        self.record
    }
}

/// 标准化一组原始工单（测试数据必须合法）
pub fn normalized(records: Vec<RawJobRecord>) -> Vec<JobRecord> {
    normalize_jobs(records).expect("测试工单应能通过标准化")
}

// ==========================================
// 快照文件
// ==========================================

/// 写入指定扩展名的临时快照文件（需要保持存活）
pub fn write_snapshot(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("创建临时文件失败");
    file.write_all(content.as_bytes()).expect("写入临时文件失败");
    file.flush().expect("刷新临时文件失败");
    file
}

/// CRM 形态的 JSON 快照
pub fn sample_json_snapshot() -> String {
    r#"{
        "count": 3,
        "results": [
            {
                "jnid": "J1",
                "sales_rep_name": "Dana",
                "name": "Smith Residence",
                "number": "1001",
                "amount_due": "$1,250.50",
                "status_history": [
                    {"status": "Lead", "timestamp": 1700000000},
                    {"status": "Appointment", "timestamp": 1700172800},
                    {"status": "Signed", "timestamp": 1700432000}
                ]
            },
            {
                "jnid": "J2",
                "sales_rep_name": "Eli",
                "name": "Jones Barn",
                "amount_due": 0,
                "status_history": [
                    {"status": "Lead", "timestamp": 1700000000},
                    {"status": "Appointment", "timestamp": 1700086400}
                ]
            },
            {
                "jnid": "J3",
                "name": "Walk-in",
                "amount_due": null,
                "status_history": [
                    {"status": "Lead", "timestamp": "2023-11-20T00:00:00Z"}
                ]
            }
        ]
    }"#
    .to_string()
}

/// 与 sample_json_snapshot 等价的 CSV 快照（每行一条状态历史）
pub fn sample_csv_snapshot() -> String {
    [
        "job_id,sales_rep,job_name,job_number,status,timestamp,amount_due",
        "J1,Dana,Smith Residence,1001,Lead,1700000000,\"$1,250.50\"",
        "J1,,,,Appointment,1700172800,",
        "J1,,,,Signed,1700432000,",
        "J2,Eli,Jones Barn,,Lead,1700000000,0",
        "J2,,,,Appointment,1700086400,",
        "J3,,Walk-in,,Lead,2023-11-20T00:00:00Z,",
    ]
    .join("\n")
}
