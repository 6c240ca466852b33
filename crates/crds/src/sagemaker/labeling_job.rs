//! LabelingJob Custom Resource Definition
//!
//! A Ground Truth labeling job. Jobs run to completion and cannot be changed
//! after they start; deleting the record stops a job that is still running.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};

/// LabelingJobSpec defines the desired state of a labeling job
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sagemaker.aws.microscaler.io",
    version = "v1alpha1",
    kind = "LabelingJob",
    namespaced,
    status = "LabelingJobStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobSpec {
    pub for_provider: LabelingJobParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// LabelingJobParameters are the configurable fields of a labeling job
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobParameters {
    pub region: String,

    /// Attribute name of the labels in the output manifest
    pub label_attribute_name: String,

    pub role_arn: String,

    pub input_config: LabelingJobInputConfig,

    pub output_config: LabelingJobOutputConfig,

    pub human_task_config: HumanTaskConfig,

    /// S3 URI of the label category configuration file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_category_config_s3_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopping_conditions: Option<LabelingJobStoppingConditions>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobInputConfig {
    /// S3 URI of the input manifest
    pub manifest_s3_uri: String,

    /// Content classifiers declaring the data free of PII or adult content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_classifiers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobOutputConfig {
    pub s3_output_path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HumanTaskConfig {
    pub workteam_arn: String,

    /// S3 URI of the worker task template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_template_s3_uri: Option<String>,

    /// ARN of a built-in worker task template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_task_ui_arn: Option<String>,

    pub pre_human_task_lambda_arn: String,

    pub annotation_consolidation_lambda_arn: String,

    pub task_title: String,

    pub task_description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_keywords: Vec<String>,

    pub number_of_human_workers_per_data_object: i32,

    pub task_time_limit_in_seconds: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_availability_lifetime_in_seconds: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_task_count: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobStoppingConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_human_labeled_object_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_percentage_of_input_dataset_labeled: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelCounters {
    #[serde(default)]
    pub total_labeled: i32,

    #[serde(default)]
    pub human_labeled: i32,

    #[serde(default)]
    pub machine_labeled: i32,

    #[serde(default)]
    pub failed_non_retryable_error: i32,

    #[serde(default)]
    pub unlabeled: i32,
}

/// LabelingJobObservation is the observed state of a labeling job
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labeling_job_arn: Option<String>,

    /// `Initializing`, `InProgress`, `Completed`, `Failed`, `Stopping` or `Stopped`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labeling_job_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_counters: Option<LabelCounters>,

    /// Location of the output manifest once the job completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dataset_s3_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelingJobStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<LabelingJobObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(LabelingJob, LabelingJobParameters, LabelingJobObservation);
