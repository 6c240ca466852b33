//! SageMaker LabelingJob reconciler
//!
//! Jobs are never compared against the record. Deleting the record stops a
//! job that is still running; SageMaker keeps finished jobs forever, so the
//! record is released as soon as the stop was issued or found unnecessary.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::sagemaker as wire;
use aws_client::{AwsError, SageMakerApi};
use crds::Managed;
use crds::sagemaker::{
    HumanTaskConfig, LabelCounters, LabelingJob, LabelingJobInputConfig, LabelingJobObservation,
    LabelingJobOutputConfig, LabelingJobStoppingConditions,
};
use tracing::debug;

use super::{not_updatable, tags_to_wire};
use crate::error::ControllerError;
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ServiceClients};

/// Statuses of a job that still consumes workforce time
const RUNNING: &[&str] = &["Initializing", "InProgress"];

/// Capability set of the SageMaker LabelingJob kind
pub struct LabelingJobExternal {
    client: Arc<dyn SageMakerApi>,
}

fn input_config_to_wire(c: &LabelingJobInputConfig) -> wire::LabelingJobInputConfig {
    wire::LabelingJobInputConfig {
        manifest_s3_uri: c.manifest_s3_uri.clone(),
        content_classifiers: c.content_classifiers.clone(),
    }
}

fn output_config_to_wire(c: &LabelingJobOutputConfig) -> wire::LabelingJobOutputConfig {
    wire::LabelingJobOutputConfig {
        s3_output_path: c.s3_output_path.clone(),
        kms_key_id: c.kms_key_id.clone(),
    }
}

fn human_task_config_to_wire(c: &HumanTaskConfig) -> wire::HumanTaskConfig {
    wire::HumanTaskConfig {
        workteam_arn: c.workteam_arn.clone(),
        ui_template_s3_uri: c.ui_template_s3_uri.clone(),
        human_task_ui_arn: c.human_task_ui_arn.clone(),
        pre_human_task_lambda_arn: c.pre_human_task_lambda_arn.clone(),
        annotation_consolidation_lambda_arn: c.annotation_consolidation_lambda_arn.clone(),
        task_title: c.task_title.clone(),
        task_description: c.task_description.clone(),
        task_keywords: c.task_keywords.clone(),
        number_of_human_workers_per_data_object: c.number_of_human_workers_per_data_object,
        task_time_limit_in_seconds: c.task_time_limit_in_seconds,
        task_availability_lifetime_in_seconds: c.task_availability_lifetime_in_seconds,
        max_concurrent_task_count: c.max_concurrent_task_count,
    }
}

fn stopping_conditions_to_wire(c: &LabelingJobStoppingConditions) -> wire::LabelingJobStoppingConditions {
    wire::LabelingJobStoppingConditions {
        max_human_labeled_object_count: c.max_human_labeled_object_count,
        max_percentage_of_input_dataset_labeled: c.max_percentage_of_input_dataset_labeled,
    }
}

#[async_trait]
impl ExternalResource for LabelingJobExternal {
    type Resource = LabelingJob;
    type Response = wire::LabelingJob;
    type Observed = wire::LabelingJob;
    type CreateInput = wire::CreateLabelingJobInput;
    type Created = String;
    type UpdateInput = ();
    type Updated = ();
    type DeleteInput = String;

    const KIND: &'static str = "LabelingJob";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("Initializing", LifecycleState::Creating),
        ("InProgress", LifecycleState::Available),
        ("Completed", LifecycleState::Available),
        ("Stopping", LifecycleState::Deleting),
        ("Stopped", LifecycleState::Unavailable),
        ("Failed", LifecycleState::Unavailable),
    ];
    const RELEASE_ON_DELETE: bool = true;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.sagemaker),
        }
    }

    async fn describe(&self, _cr: &LabelingJob, external_name: &str) -> Result<wire::LabelingJob, AwsError> {
        self.client.describe_labeling_job(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code("ResourceNotFound")
    }

    fn filter_list(&self, external_name: &str, response: wire::LabelingJob) -> Option<wire::LabelingJob> {
        (response.labeling_job_name == external_name).then_some(response)
    }

    fn generate_observation(&self, observed: &wire::LabelingJob) -> LabelingJobObservation {
        LabelingJobObservation {
            labeling_job_arn: Some(observed.labeling_job_arn.clone()),
            labeling_job_status: observed.labeling_job_status.clone(),
            failure_reason: observed.failure_reason.clone(),
            label_counters: observed.label_counters.as_ref().map(|c| LabelCounters {
                total_labeled: c.total_labeled,
                human_labeled: c.human_labeled,
                machine_labeled: c.machine_labeled,
                failed_non_retryable_error: c.failed_non_retryable_error,
                unlabeled: c.unlabeled,
            }),
            output_dataset_s3_uri: observed.output_dataset_s3_uri.clone(),
            creation_time: observed.creation_time,
            last_modified_time: observed.last_modified_time,
        }
    }

    fn observed_status<'a>(&self, observed: &'a wire::LabelingJob) -> Option<&'a str> {
        observed.labeling_job_status.as_deref()
    }

    fn create_input(&self, cr: &LabelingJob, external_name: &str) -> Result<wire::CreateLabelingJobInput, ControllerError> {
        let params = cr.for_provider();
        Ok(wire::CreateLabelingJobInput {
            labeling_job_name: external_name.to_string(),
            label_attribute_name: params.label_attribute_name.clone(),
            role_arn: params.role_arn.clone(),
            input_config: input_config_to_wire(&params.input_config),
            output_config: output_config_to_wire(&params.output_config),
            human_task_config: human_task_config_to_wire(&params.human_task_config),
            label_category_config_s3_uri: params.label_category_config_s3_uri.clone(),
            stopping_conditions: params.stopping_conditions.as_ref().map(stopping_conditions_to_wire),
            tags: tags_to_wire(&params.tags),
        })
    }

    async fn create(&self, input: wire::CreateLabelingJobInput) -> Result<String, AwsError> {
        self.client.create_labeling_job(input).await
    }

    fn update_input(&self, _cr: &LabelingJob, _external_name: &str) -> Result<(), ControllerError> {
        Err(not_updatable(Self::KIND))
    }

    async fn update(&self, _input: ()) -> Result<(), AwsError> {
        Ok(())
    }

    /// Only a running job is stopped
    fn delete_input(&self, cr: &LabelingJob, external_name: &str) -> Result<Option<String>, ControllerError> {
        let status = cr.at_provider().and_then(|o| o.labeling_job_status.as_deref());
        if status.is_some_and(|s| RUNNING.contains(&s)) {
            return Ok(Some(external_name.to_string()));
        }
        debug!(labeling_job = external_name, status = ?status, "Job is not running, nothing to stop");
        Ok(None)
    }

    async fn delete(&self, name: String) -> Result<(), AwsError> {
        self.client.stop_labeling_job(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::sagemaker::{LabelingJobParameters, LabelingJobSpec};
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, find_condition};

    fn labeling_job() -> LabelingJob {
        let spec = LabelingJobSpec {
            for_provider: LabelingJobParameters {
                region: REGION.to_string(),
                label_attribute_name: "category".to_string(),
                role_arn: "arn:aws:iam::123456789012:role/ground-truth".to_string(),
                input_config: LabelingJobInputConfig {
                    manifest_s3_uri: "s3://datasets/images/manifest.json".to_string(),
                    content_classifiers: vec!["FreeOfPersonallyIdentifiableInformation".to_string()],
                },
                output_config: LabelingJobOutputConfig {
                    s3_output_path: "s3://datasets/labels/".to_string(),
                    kms_key_id: None,
                },
                human_task_config: HumanTaskConfig {
                    workteam_arn: "arn:aws:sagemaker:us-east-1:123456789012:workteam/private-crowd/labelers".to_string(),
                    task_title: "Classify images".to_string(),
                    task_description: "Pick the category of each image".to_string(),
                    number_of_human_workers_per_data_object: 3,
                    task_time_limit_in_seconds: 300,
                    ..Default::default()
                },
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(LabelingJob::new("images", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_then_always_up_to_date() {
        let mock = MockAwsClient::new();
        let client = external::<LabelingJobExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = labeling_job();

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);

        // A changed spec is not drift for a job
        cr.spec.for_provider.human_task_config.task_title = "Renamed".to_string();
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(
            cr.at_provider().unwrap().labeling_job_status.as_deref(),
            Some("InProgress")
        );
    }

    #[tokio::test]
    async fn test_failed_job_is_unavailable() {
        let mock = MockAwsClient::new();
        let client = external::<LabelingJobExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = labeling_job();
        tick(&client, &reader, &mut cr, false).await.unwrap();
        mock.set_labeling_job_status("images", "Failed");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        let ready = find_condition(cr.conditions(), CONDITION_TYPE_READY).unwrap();
        assert_eq!(ready.reason, ConditionReason::Unavailable);
    }

    #[tokio::test]
    async fn test_delete_stops_running_job() {
        let mock = MockAwsClient::new();
        let client = external::<LabelingJobExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = labeling_job();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
        assert_eq!(mock.call_count("StopLabelingJob"), 1);
        assert_eq!(
            mock.labeling_job("images").unwrap().labeling_job_status.as_deref(),
            Some("Stopping")
        );
    }

    #[tokio::test]
    async fn test_delete_completed_job_skips_stop() {
        let mock = MockAwsClient::new();
        let client = external::<LabelingJobExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = labeling_job();
        tick(&client, &reader, &mut cr, false).await.unwrap();
        mock.set_labeling_job_status("images", "Completed");

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
        assert_eq!(mock.call_count("StopLabelingJob"), 0);
    }
}
