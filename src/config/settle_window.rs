// ==========================================
// 屋面工程 KPI 分析引擎 - 结算窗口边界解析
// ==========================================
// 取值: forever | today | ytd（仅下界）| YYYY-MM-DD（当日 00:00 UTC）
// today 取报表基准时间，而不是读取系统时钟
// ==========================================

use crate::config::config_manager::config_keys;
use crate::config::error::ConfigError;
use crate::domain::types::Timestamp;
use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// 窗口边界的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSide {
    From,
    To,
}

impl WindowSide {
    fn key(self) -> &'static str {
        match self {
            WindowSide::From => config_keys::FROM,
            WindowSide::To => config_keys::TO,
        }
    }
}

/// 解析结算窗口边界（None 表示该侧不限）
pub fn parse_window_bound(
    raw: &str,
    side: WindowSide,
    today: Timestamp,
) -> Result<Option<Timestamp>, ConfigError> {
    match raw.trim() {
        "forever" => Ok(None),
        "today" => Ok(Some(today)),
        "ytd" if side == WindowSide::From => {
            Ok(NaiveDate::from_ymd_opt(today.year(), 1, 1).map(midnight))
        }
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map(|date| Some(midnight(date)))
            .map_err(|_| {
                let accepted = match side {
                    WindowSide::From => "forever / ytd / today / YYYY-MM-DD",
                    WindowSide::To => "forever / today / YYYY-MM-DD",
                };
                ConfigError::invalid(
                    side.key(),
                    format!("无法识别的日期 {}，可选: {}", other, accepted),
                )
            }),
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
