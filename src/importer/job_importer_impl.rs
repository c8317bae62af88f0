// ==========================================
// 屋面工程 KPI 分析引擎 - 工单导入器实现
// ==========================================
// 职责: 整合导入流程，从快照文件到标准化工单集合
// 流程: 解析 → 映射 → 清洗 → 校验 → 标准化
// 红线: 任一阶段的结构性错误均使整批失败，不返回部分结果
// ==========================================

use crate::config::ReportConfig;
use crate::domain::job::{JobSnapshot, RawJobRecord};
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::dq_validator::DqValidator as DqValidatorImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::job_importer_trait::{
    DataCleaner, DqValidator, FieldMapper, FileParser, JobImporter,
};
use crate::importer::job_normalizer::JobNormalizer;
use crate::perf::PerfGuard;
use futures::future::join_all;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

// ==========================================
// JobImporterImpl - 工单导入器实现
// ==========================================
pub struct JobImporterImpl {
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    data_cleaner: Box<dyn DataCleaner>,
    dq_validator: Box<dyn DqValidator>,
    normalizer: JobNormalizer,
}

impl JobImporterImpl {
    /// 创建导入器实例
    ///
    /// # 参数
    /// - file_parser: 文件解析器
    /// - field_mapper: 字段映射器
    /// - data_cleaner: 数据清洗器
    /// - dq_validator: DQ 校验器
    pub fn new(
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        data_cleaner: Box<dyn DataCleaner>,
        dq_validator: Box<dyn DqValidator>,
    ) -> Self {
        Self {
            file_parser,
            field_mapper,
            data_cleaner,
            dq_validator,
            normalizer: JobNormalizer,
        }
    }

    /// 按报表配置装配默认组件
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(
            Box::new(UniversalFileParser),
            Box::new(FieldMapperImpl::new()),
            Box::new(DataCleanerImpl),
            Box::new(DqValidatorImpl::from_config(config)),
        )
    }

    /// 从内存中的 JSON 快照导入
    pub fn import_json_str(&self, content: &str) -> ImportResult<JobSnapshot> {
        let objects = self.file_parser.parse_str(content)?;
        let records = self.map_objects(objects)?;
        self.import_records(records)
    }

    /// 阶段 1: 字段映射（任一对象映射失败即整体失败）
    fn map_objects(&self, objects: Vec<Value>) -> ImportResult<Vec<RawJobRecord>> {
        let total = objects.len();
        let records = objects
            .iter()
            .enumerate()
            .map(|(idx, object)| self.field_mapper.map_to_raw_job(object, idx + 1))
            .collect::<ImportResult<Vec<_>>>()
            .map_err(|e| {
                error!(error = %e, "字段映射失败");
                e
            })?;
        debug!(total, "字段映射完成");
        Ok(records)
    }

    fn run_pipeline(
        &self,
        batch_id: String,
        mut records: Vec<RawJobRecord>,
    ) -> ImportResult<JobSnapshot> {
        let _perf = PerfGuard::new("import_records");

        // === 步骤 2: 数据清洗 ===
        debug!("步骤 2: 数据清洗");
        for record in &mut records {
            self.data_cleaner.clean_record(record);
        }

        // === 步骤 3: DQ 校验 ===
        debug!("步骤 3: DQ 校验");
        self.dq_validator.validate_labels(&records)?;

        // === 步骤 4: 标准化（含工单号唯一校验） ===
        debug!("步骤 4: 标准化");
        let jobs = self.normalizer.normalize_all(records)?;

        info!(batch_id = %batch_id, total_jobs = jobs.len(), "工单导入完成");
        Ok(JobSnapshot { batch_id, jobs })
    }
}

#[async_trait::async_trait]
impl JobImporter for JobImporterImpl {
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(&self, file_path: &Path) -> ImportResult<JobSnapshot> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(file_path = %file_path.display(), "开始导入工单快照");

        // === 步骤 0: 读取文件 ===
        if !tokio::fs::try_exists(file_path).await.unwrap_or(false) {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // === 步骤 1: 解析 + 映射 ===
        debug!("步骤 1: 解析文件");
        let objects = self.file_parser.parse_to_raw_records(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(total_objects = objects.len(), "文件解析完成");
        let records = self.map_objects(objects)?;

        self.run_pipeline(batch_id, records)
    }

    fn import_records(&self, records: Vec<RawJobRecord>) -> ImportResult<JobSnapshot> {
        let batch_id = Uuid::new_v4().to_string();
        debug!(batch_id = %batch_id, total = records.len(), "开始导入原始工单");
        self.run_pipeline(batch_id, records)
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<JobSnapshot>> {
        info!(files = file_paths.len(), "开始批量导入");
        let tasks = file_paths.iter().map(|path| self.import_file(path));
        join_all(tasks).await
    }
}
