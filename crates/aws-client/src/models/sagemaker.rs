//! SageMaker request and response shapes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tag;

// Models

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub container_hostname: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub image: Option<String>,
    pub mode: Option<String>,
    pub model_data_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcConfig {
    pub security_group_ids: Vec<String>,
    pub subnets: Vec<String>,
}

/// Model as returned by DescribeModel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub model_name: String,
    pub model_arn: String,
    pub execution_role_arn: Option<String>,
    pub primary_container: Option<ContainerDefinition>,
    pub containers: Vec<ContainerDefinition>,
    pub enable_network_isolation: Option<bool>,
    pub vpc_config: Option<VpcConfig>,
    pub creation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateModelInput {
    pub model_name: String,
    pub execution_role_arn: String,
    pub primary_container: Option<ContainerDefinition>,
    pub containers: Vec<ContainerDefinition>,
    pub enable_network_isolation: Option<bool>,
    pub vpc_config: Option<VpcConfig>,
    pub tags: Vec<Tag>,
}

// Labeling jobs

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelingJobInputConfig {
    pub manifest_s3_uri: String,
    pub content_classifiers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelingJobOutputConfig {
    pub s3_output_path: String,
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanTaskConfig {
    pub workteam_arn: String,
    pub ui_template_s3_uri: Option<String>,
    pub human_task_ui_arn: Option<String>,
    pub pre_human_task_lambda_arn: String,
    pub annotation_consolidation_lambda_arn: String,
    pub task_title: String,
    pub task_description: String,
    pub task_keywords: Vec<String>,
    pub number_of_human_workers_per_data_object: i32,
    pub task_time_limit_in_seconds: i32,
    pub task_availability_lifetime_in_seconds: Option<i32>,
    pub max_concurrent_task_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelingJobStoppingConditions {
    pub max_human_labeled_object_count: Option<i32>,
    pub max_percentage_of_input_dataset_labeled: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounters {
    pub total_labeled: i32,
    pub human_labeled: i32,
    pub machine_labeled: i32,
    pub failed_non_retryable_error: i32,
    pub unlabeled: i32,
}

/// Labeling job as returned by DescribeLabelingJob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelingJob {
    pub labeling_job_name: String,
    pub labeling_job_arn: String,
    /// `Initializing`, `InProgress`, `Completed`, `Failed`, `Stopping` or `Stopped`
    pub labeling_job_status: Option<String>,
    pub failure_reason: Option<String>,
    pub label_attribute_name: Option<String>,
    pub role_arn: Option<String>,
    pub input_config: Option<LabelingJobInputConfig>,
    pub output_config: Option<LabelingJobOutputConfig>,
    pub human_task_config: Option<HumanTaskConfig>,
    pub label_category_config_s3_uri: Option<String>,
    pub stopping_conditions: Option<LabelingJobStoppingConditions>,
    pub label_counters: Option<LabelCounters>,
    pub output_dataset_s3_uri: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateLabelingJobInput {
    pub labeling_job_name: String,
    pub label_attribute_name: String,
    pub role_arn: String,
    pub input_config: LabelingJobInputConfig,
    pub output_config: LabelingJobOutputConfig,
    pub human_task_config: HumanTaskConfig,
    pub label_category_config_s3_uri: Option<String>,
    pub stopping_conditions: Option<LabelingJobStoppingConditions>,
    pub tags: Vec<Tag>,
}
