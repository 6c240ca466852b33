//! SageMaker client backed by `aws-sdk-sagemaker`

use aws_sdk_sagemaker::Client;
use aws_sdk_sagemaker::types::{self, ContainerMode, ContentClassifier};
use tracing::debug;

use super::convert::{Built, Scalar, StrField, list, non_empty, sdk_error, string_map, strings, timestamp, to_hash_map, try_list};
use crate::aws_trait::SageMakerApi;
use crate::error::AwsError;
use crate::models::Tag;
use crate::models::sagemaker::*;

/// SageMaker client for one region
#[derive(Debug, Clone)]
pub struct SageMakerClient {
    client: Client,
}

impl SageMakerClient {
    /// Create a client from a loaded SDK configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self { client: Client::new(config) }
    }
}

fn sdk_tags(tags: &[Tag]) -> Result<Option<Vec<types::Tag>>, AwsError> {
    try_list(tags, |t| types::Tag::builder().key(&t.key).value(&t.value).build().built())
}

fn container_definition(c: &types::ContainerDefinition) -> ContainerDefinition {
    ContainerDefinition {
        container_hostname: c.container_hostname().owned(),
        environment: string_map(c.environment()),
        image: c.image().owned(),
        mode: c.mode().owned(),
        model_data_url: c.model_data_url().owned(),
    }
}

fn sdk_container_definition(c: &ContainerDefinition) -> types::ContainerDefinition {
    types::ContainerDefinition::builder()
        .set_container_hostname(c.container_hostname.clone())
        .set_environment(to_hash_map(&c.environment))
        .set_image(c.image.clone())
        .set_mode(c.mode.as_deref().map(ContainerMode::from))
        .set_model_data_url(c.model_data_url.clone())
        .build()
}

fn sdk_vpc_config(v: &VpcConfig) -> Result<types::VpcConfig, AwsError> {
    types::VpcConfig::builder()
        .set_security_group_ids(Some(v.security_group_ids.clone()))
        .set_subnets(Some(v.subnets.clone()))
        .build()
        .built()
}

fn sdk_human_task_config(h: &HumanTaskConfig) -> Result<types::HumanTaskConfig, AwsError> {
    let consolidation = types::AnnotationConsolidationConfig::builder()
        .annotation_consolidation_lambda_arn(&h.annotation_consolidation_lambda_arn)
        .build()
        .built()?;
    let ui = types::UiConfig::builder()
        .set_ui_template_s3_uri(h.ui_template_s3_uri.clone())
        .set_human_task_ui_arn(h.human_task_ui_arn.clone())
        .build();
    types::HumanTaskConfig::builder()
        .workteam_arn(&h.workteam_arn)
        .ui_config(ui)
        .pre_human_task_lambda_arn(&h.pre_human_task_lambda_arn)
        .set_task_keywords(non_empty(&h.task_keywords))
        .task_title(&h.task_title)
        .task_description(&h.task_description)
        .number_of_human_workers_per_data_object(h.number_of_human_workers_per_data_object)
        .task_time_limit_in_seconds(h.task_time_limit_in_seconds)
        .set_task_availability_lifetime_in_seconds(h.task_availability_lifetime_in_seconds)
        .set_max_concurrent_task_count(h.max_concurrent_task_count)
        .annotation_consolidation_config(consolidation)
        .build()
        .built()
}

fn human_task_config(h: &types::HumanTaskConfig) -> HumanTaskConfig {
    HumanTaskConfig {
        workteam_arn: h.workteam_arn().owned().unwrap_or_default(),
        ui_template_s3_uri: h.ui_config().and_then(|u| u.ui_template_s3_uri().owned()),
        human_task_ui_arn: h.ui_config().and_then(|u| u.human_task_ui_arn().owned()),
        pre_human_task_lambda_arn: h.pre_human_task_lambda_arn().owned().unwrap_or_default(),
        annotation_consolidation_lambda_arn: h
            .annotation_consolidation_config()
            .and_then(|a| a.annotation_consolidation_lambda_arn().owned())
            .unwrap_or_default(),
        task_title: h.task_title().owned().unwrap_or_default(),
        task_description: h.task_description().owned().unwrap_or_default(),
        task_keywords: strings(h.task_keywords()),
        number_of_human_workers_per_data_object: h.number_of_human_workers_per_data_object().value().unwrap_or_default(),
        task_time_limit_in_seconds: h.task_time_limit_in_seconds().value().unwrap_or_default(),
        task_availability_lifetime_in_seconds: h.task_availability_lifetime_in_seconds().value(),
        max_concurrent_task_count: h.max_concurrent_task_count().value(),
    }
}

#[async_trait::async_trait]
impl SageMakerApi for SageMakerClient {
    async fn describe_model(&self, model_name: &str) -> Result<Model, AwsError> {
        debug!(model_name, "DescribeModel");
        let out = self.client.describe_model().model_name(model_name).send().await.map_err(sdk_error)?;
        Ok(Model {
            model_name: out.model_name().owned().unwrap_or_default(),
            model_arn: out.model_arn().owned().unwrap_or_default(),
            execution_role_arn: out.execution_role_arn().owned(),
            primary_container: out.primary_container().map(container_definition),
            containers: list(out.containers(), container_definition),
            enable_network_isolation: out.enable_network_isolation(),
            vpc_config: out.vpc_config().map(|v| VpcConfig {
                security_group_ids: strings(v.security_group_ids()),
                subnets: strings(v.subnets()),
            }),
            creation_time: timestamp(out.creation_time()),
        })
    }

    async fn create_model(&self, input: CreateModelInput) -> Result<String, AwsError> {
        debug!(model_name = %input.model_name, "CreateModel");
        let vpc_config = input.vpc_config.as_ref().map(sdk_vpc_config).transpose()?;
        let out = self
            .client
            .create_model()
            .model_name(&input.model_name)
            .execution_role_arn(&input.execution_role_arn)
            .set_primary_container(input.primary_container.as_ref().map(sdk_container_definition))
            .set_containers(non_empty(&input.containers).map(|c| c.iter().map(sdk_container_definition).collect()))
            .set_enable_network_isolation(input.enable_network_isolation)
            .set_vpc_config(vpc_config)
            .set_tags(sdk_tags(&input.tags)?)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(out.model_arn().owned().unwrap_or_default())
    }

    async fn delete_model(&self, model_name: &str) -> Result<(), AwsError> {
        debug!(model_name, "DeleteModel");
        self.client.delete_model().model_name(model_name).send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn describe_labeling_job(&self, labeling_job_name: &str) -> Result<LabelingJob, AwsError> {
        debug!(labeling_job_name, "DescribeLabelingJob");
        let out = self
            .client
            .describe_labeling_job()
            .labeling_job_name(labeling_job_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(LabelingJob {
            labeling_job_name: out.labeling_job_name().owned().unwrap_or_default(),
            labeling_job_arn: out.labeling_job_arn().owned().unwrap_or_default(),
            labeling_job_status: out.labeling_job_status().owned(),
            failure_reason: out.failure_reason().owned(),
            label_attribute_name: out.label_attribute_name().owned(),
            role_arn: out.role_arn().owned(),
            input_config: out.input_config().map(|i| LabelingJobInputConfig {
                manifest_s3_uri: i
                    .data_source()
                    .and_then(|d| d.s3_data_source())
                    .and_then(|s| s.manifest_s3_uri().owned())
                    .unwrap_or_default(),
                content_classifiers: i
                    .data_attributes()
                    .map(|a| list(a.content_classifiers(), |c| c.as_str().to_string()))
                    .unwrap_or_default(),
            }),
            output_config: out.output_config().map(|o| LabelingJobOutputConfig {
                s3_output_path: o.s3_output_path().owned().unwrap_or_default(),
                kms_key_id: o.kms_key_id().owned(),
            }),
            human_task_config: out.human_task_config().map(human_task_config),
            label_category_config_s3_uri: out.label_category_config_s3_uri().owned(),
            stopping_conditions: out.stopping_conditions().map(|s| LabelingJobStoppingConditions {
                max_human_labeled_object_count: s.max_human_labeled_object_count().value(),
                max_percentage_of_input_dataset_labeled: s.max_percentage_of_input_dataset_labeled().value(),
            }),
            label_counters: out.label_counters().map(|c| LabelCounters {
                total_labeled: c.total_labeled().value().unwrap_or_default(),
                human_labeled: c.human_labeled().value().unwrap_or_default(),
                machine_labeled: c.machine_labeled().value().unwrap_or_default(),
                failed_non_retryable_error: c.failed_non_retryable_error().value().unwrap_or_default(),
                unlabeled: c.unlabeled().value().unwrap_or_default(),
            }),
            output_dataset_s3_uri: out.labeling_job_output().and_then(|o| o.output_dataset_s3_uri().owned()),
            creation_time: timestamp(out.creation_time()),
            last_modified_time: timestamp(out.last_modified_time()),
            tags: list(out.tags(), |t| {
                Tag::new(t.key().owned().unwrap_or_default(), t.value().owned().unwrap_or_default())
            }),
        })
    }

    async fn create_labeling_job(&self, input: CreateLabelingJobInput) -> Result<String, AwsError> {
        debug!(labeling_job_name = %input.labeling_job_name, "CreateLabelingJob");
        let s3_source = types::LabelingJobS3DataSource::builder()
            .manifest_s3_uri(&input.input_config.manifest_s3_uri)
            .build()
            .built()?;
        let attributes = non_empty(&input.input_config.content_classifiers).map(|classifiers| {
            types::LabelingJobDataAttributes::builder()
                .set_content_classifiers(Some(
                    classifiers.iter().map(|c| ContentClassifier::from(c.as_str())).collect(),
                ))
                .build()
        });
        let input_config = types::LabelingJobInputConfig::builder()
            .data_source(types::LabelingJobDataSource::builder().s3_data_source(s3_source).build())
            .set_data_attributes(attributes)
            .build()
            .built()?;
        let output_config = types::LabelingJobOutputConfig::builder()
            .s3_output_path(&input.output_config.s3_output_path)
            .set_kms_key_id(input.output_config.kms_key_id.clone())
            .build()
            .built()?;
        let out = self
            .client
            .create_labeling_job()
            .labeling_job_name(&input.labeling_job_name)
            .label_attribute_name(&input.label_attribute_name)
            .role_arn(&input.role_arn)
            .input_config(input_config)
            .output_config(output_config)
            .human_task_config(sdk_human_task_config(&input.human_task_config)?)
            .set_label_category_config_s3_uri(input.label_category_config_s3_uri.clone())
            .set_stopping_conditions(input.stopping_conditions.as_ref().map(|s| {
                types::LabelingJobStoppingConditions::builder()
                    .set_max_human_labeled_object_count(s.max_human_labeled_object_count)
                    .set_max_percentage_of_input_dataset_labeled(s.max_percentage_of_input_dataset_labeled)
                    .build()
            }))
            .set_tags(sdk_tags(&input.tags)?)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(out.labeling_job_arn().owned().unwrap_or_default())
    }

    async fn stop_labeling_job(&self, labeling_job_name: &str) -> Result<(), AwsError> {
        debug!(labeling_job_name, "StopLabelingJob");
        self.client
            .stop_labeling_job()
            .labeling_job_name(labeling_job_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
