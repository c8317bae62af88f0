// ==========================================
// 屋面工程 KPI 分析引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、校验、快照
// 存储: JSON 文件（可选）+ 内置默认值
// 红线: 启动时一次性加载并校验（fail fast），之后只读
// ==========================================

use crate::config::error::ConfigError;
use crate::config::report_config::ReportConfig;
use crate::domain::types::Timestamp;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置文件中的键名
pub mod config_keys {
    pub const MILESTONES: &str = "milestones";
    pub const AR_STATUS_ORDER: &str = "ar_status_order";
    pub const STRICT_LABELS: &str = "strict_labels";
    pub const IGNORED_STATUSES: &str = "ignored_statuses";
    pub const AS_OF: &str = "as_of";
    pub const LOSS_STATUSES: &str = "loss_statuses";
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
}

/// 默认配置文件名（位于用户配置目录下）
const DEFAULT_CONFIG_DIR: &str = "roofing-kpi";
const DEFAULT_CONFIG_FILE: &str = "config.json";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ReportConfig,
}

impl ConfigManager {
    /// 由已有配置创建（会先校验）
    pub fn new(config: ReportConfig) -> Result<Self, ConfigError> {
        Self::validate(&config)?;
        Ok(Self { config })
    }

    /// 内置默认配置
    pub fn with_defaults() -> Self {
        Self {
            config: ReportConfig::default(),
        }
    }

    /// 内置默认配置（屋面工程标准销售流程）
    pub fn default_config() -> ReportConfig {
        ReportConfig::default()
    }

    /// 从 JSON 字符串加载（缺省字段取默认值）
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = serde_json::from_str(raw)?;
        Self::new(config)
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let manager = Self::from_json_str(&raw)?;
        info!(path = %path.display(), milestones = manager.config.milestones.len(), "配置加载完成");
        Ok(manager)
    }

    /// 加载顺序: 显式路径 → 用户配置目录 → 内置默认值
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Some(default_path) if default_path.exists() => Self::from_file(&default_path),
            _ => {
                debug!("未找到配置文件，使用内置默认配置");
                Ok(Self::with_defaults())
            }
        }
    }

    /// 用户配置目录下的默认配置路径
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// 覆写报表基准时间
    pub fn with_as_of(mut self, as_of: Timestamp) -> Self {
        self.config.as_of = Some(as_of);
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn into_config(self) -> ReportConfig {
        self.config
    }

    /// 覆写结算窗口
    pub fn with_settle_window(mut self, from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        self.config.from = from;
        self.config.to = to;
        self
    }

    /// 配置快照（JSON），用于随报表留档
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.config)?)
    }

    /// 校验配置
    ///
    /// # 规则
    /// 1. 至少一个里程碑
    /// 2. 里程碑名称非空且唯一
    /// 3. 每个里程碑至少一个非空标签
    /// 4. 同一标签只能归属一个里程碑
    /// 5. 应收排序中的状态非空
    /// 6. 流失标签非空，且不与里程碑标签重叠
    /// 7. 结算窗口 from <= to
    pub fn validate(config: &ReportConfig) -> Result<(), ConfigError> {
        if config.milestones.is_empty() {
            return Err(ConfigError::invalid(
                config_keys::MILESTONES,
                "至少需要配置一个里程碑",
            ));
        }

        let mut names: HashMap<&str, usize> = HashMap::new();
        let mut label_owner: HashMap<&str, &str> = HashMap::new();

        for (idx, milestone) in config.milestones.iter().enumerate() {
            let name = milestone.name.trim();
            if name.is_empty() {
                return Err(ConfigError::invalid(
                    config_keys::MILESTONES,
                    format!("第 {} 个里程碑名称为空", idx + 1),
                ));
            }
            if names.insert(name, idx).is_some() {
                return Err(ConfigError::invalid(
                    config_keys::MILESTONES,
                    format!("里程碑名称重复: {}", name),
                ));
            }

            if milestone.labels.iter().all(|l| l.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    config_keys::MILESTONES,
                    format!("里程碑 {} 未配置任何状态标签", name),
                ));
            }

            for label in milestone.labels.iter().map(|l| l.trim()) {
                if label.is_empty() {
                    continue;
                }
                if let Some(owner) = label_owner.insert(label, name) {
                    if owner != name {
                        return Err(ConfigError::invalid(
                            config_keys::MILESTONES,
                            format!("状态标签 {} 同时映射到 {} 与 {}", label, owner, name),
                        ));
                    }
                }
            }
        }

        if let Some(order) = &config.ar_status_order {
            if order.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    config_keys::AR_STATUS_ORDER,
                    "应收状态排序中存在空状态",
                ));
            }
        }

        if config.ignored_statuses.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::invalid(
                config_keys::IGNORED_STATUSES,
                "忽略状态列表中存在空状态",
            ));
        }

        for status in config.loss_statuses.iter().map(|s| s.trim()) {
            if status.is_empty() {
                return Err(ConfigError::invalid(
                    config_keys::LOSS_STATUSES,
                    "流失标签中存在空状态",
                ));
            }
            if let Some(owner) = label_owner.get(status) {
                return Err(ConfigError::invalid(
                    config_keys::LOSS_STATUSES,
                    format!("流失标签 {} 已映射到里程碑 {}", status, owner),
                ));
            }
        }

        if let (Some(from), Some(to)) = (config.from, config.to) {
            if from > to {
                return Err(ConfigError::invalid(
                    config_keys::FROM,
                    format!("结算窗口下界 {} 晚于上界 {}", from, to),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::report_config::MilestoneDefinition;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigManager::validate(&ReportConfig::default()).is_ok());
    }

    #[test]
    fn test_reject_empty_milestones() {
        let config = ReportConfig::with_milestones(vec![]);
        let err = ConfigManager::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "milestones"));
    }

    #[test]
    fn test_reject_duplicate_milestone_name() {
        let config = ReportConfig::with_milestones(vec![
            MilestoneDefinition::new("lead", ["Lead"]),
            MilestoneDefinition::new("lead", ["New Lead"]),
        ]);
        assert!(ConfigManager::new(config).is_err());
    }

    #[test]
    fn test_reject_label_mapped_twice() {
        let config = ReportConfig::with_milestones(vec![
            MilestoneDefinition::new("lead", ["Lead"]),
            MilestoneDefinition::new("estimate", ["Estimate", "Lead"]),
        ]);
        let err = ConfigManager::new(config).unwrap_err();
        assert!(err.to_string().contains("Lead"));
    }

    #[test]
    fn test_reject_milestone_without_labels() {
        let config = ReportConfig::with_milestones(vec![MilestoneDefinition::new(
            "lead",
            Vec::<String>::new(),
        )]);
        assert!(ConfigManager::new(config).is_err());
    }

    #[test]
    fn test_reject_loss_label_shared_with_milestone() {
        let mut config = ReportConfig::with_milestones(vec![MilestoneDefinition::new("lead", ["Lead"])]);
        config.loss_statuses = vec![" Lead ".to_string()];
        let err = ConfigManager::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "loss_statuses"));
    }

    #[test]
    fn test_reject_inverted_settle_window() {
        use chrono::{Duration, TimeZone, Utc};
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut config = ReportConfig::default();
        config.from = Some(t0);
        config.to = Some(t0 - Duration::days(1));
        let err = ConfigManager::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "from"));

        let manager = ConfigManager::with_defaults().with_settle_window(Some(t0), Some(t0));
        assert!(ConfigManager::validate(manager.config()).is_ok());
    }

    #[test]
    fn test_from_json_str() {
        let raw = r#"{
            "milestones": [
                {"name": "lead", "labels": ["Lead"]},
                {"name": "signed", "labels": ["Signed", "Contract Signed"]}
            ],
            "ar_status_order": null,
            "as_of": "2024-03-01T00:00:00Z"
        }"#;
        let manager = ConfigManager::from_json_str(raw).unwrap();
        let config = manager.config();
        assert_eq!(config.milestone_names(), vec!["lead", "signed"]);
        assert!(config.ar_status_order.is_none());
        assert!(config.as_of.is_some());
    }

    #[test]
    fn test_from_json_str_parse_error() {
        let err = ConfigManager::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ConfigManager::from_file(Path::new("/definitely/missing/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_config_snapshot_round_trips() {
        let manager = ConfigManager::with_defaults();
        let snapshot = manager.get_config_snapshot().unwrap();
        let restored = ConfigManager::from_json_str(&snapshot).unwrap();
        assert_eq!(restored.config(), manager.config());
    }
}
