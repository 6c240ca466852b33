//! SageMaker operations for MockAwsClient

use chrono::Utc;

use super::{MockAwsClient, arn, not_found};
use crate::aws_trait::SageMakerApi;
use crate::error::AwsError;
use crate::models::sagemaker::*;

impl MockAwsClient {
    /// Add a model to the mock store (for test setup)
    pub fn add_model(&self, model: Model) {
        self.lock().models.insert(model.model_name.clone(), model);
    }

    /// Stored model
    pub fn model(&self, model_name: &str) -> Option<Model> {
        self.lock().models.get(model_name).cloned()
    }

    /// Add a labeling job to the mock store (for test setup)
    pub fn add_labeling_job(&self, job: LabelingJob) {
        self.lock().labeling_jobs.insert(job.labeling_job_name.clone(), job);
    }

    /// Stored labeling job
    pub fn labeling_job(&self, labeling_job_name: &str) -> Option<LabelingJob> {
        self.lock().labeling_jobs.get(labeling_job_name).cloned()
    }

    /// Set the status of a stored labeling job
    pub fn set_labeling_job_status(&self, labeling_job_name: &str, status: &str) {
        if let Some(job) = self.lock().labeling_jobs.get_mut(labeling_job_name) {
            job.labeling_job_status = Some(status.to_string());
        }
    }
}

#[async_trait::async_trait]
impl SageMakerApi for MockAwsClient {
    async fn describe_model(&self, model_name: &str) -> Result<Model, AwsError> {
        let s = self.record("DescribeModel")?;
        s.models.get(model_name).cloned().ok_or_else(|| {
            not_found(
                "ValidationException",
                format!("Could not find model \"{}\".", arn("sagemaker", &format!("model/{model_name}"))),
            )
        })
    }

    async fn create_model(&self, input: CreateModelInput) -> Result<String, AwsError> {
        let mut s = self.record("CreateModel")?;
        if s.models.contains_key(&input.model_name) {
            return Err(AwsError::service(
                "ValidationException",
                format!("Cannot create already existing model \"{}\".", input.model_name),
            ));
        }
        let model_arn = arn("sagemaker", &format!("model/{}", input.model_name));
        let model = Model {
            model_name: input.model_name.clone(),
            model_arn: model_arn.clone(),
            execution_role_arn: Some(input.execution_role_arn),
            primary_container: input.primary_container,
            containers: input.containers,
            enable_network_isolation: Some(input.enable_network_isolation.unwrap_or_default()),
            vpc_config: input.vpc_config,
            creation_time: Some(Utc::now()),
        };
        s.models.insert(input.model_name, model);
        Ok(model_arn)
    }

    async fn delete_model(&self, model_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteModel")?;
        s.models.remove(model_name).map(|_| ()).ok_or_else(|| {
            not_found(
                "ValidationException",
                format!("Could not find model \"{}\".", arn("sagemaker", &format!("model/{model_name}"))),
            )
        })
    }

    async fn describe_labeling_job(&self, labeling_job_name: &str) -> Result<LabelingJob, AwsError> {
        let s = self.record("DescribeLabelingJob")?;
        s.labeling_jobs
            .get(labeling_job_name)
            .cloned()
            .ok_or_else(|| not_found("ResourceNotFound", format!("Could not find labeling job \"{labeling_job_name}\".")))
    }

    async fn create_labeling_job(&self, input: CreateLabelingJobInput) -> Result<String, AwsError> {
        let mut s = self.record("CreateLabelingJob")?;
        if s.labeling_jobs.contains_key(&input.labeling_job_name) {
            return Err(AwsError::service(
                "ResourceInUse",
                format!("Labeling job \"{}\" already exists.", input.labeling_job_name),
            ));
        }
        let job_arn = arn("sagemaker", &format!("labeling-job/{}", input.labeling_job_name));
        let now = Utc::now();
        let job = LabelingJob {
            labeling_job_name: input.labeling_job_name.clone(),
            labeling_job_arn: job_arn.clone(),
            labeling_job_status: Some("InProgress".to_string()),
            failure_reason: None,
            label_attribute_name: Some(input.label_attribute_name),
            role_arn: Some(input.role_arn),
            input_config: Some(input.input_config),
            output_config: Some(input.output_config),
            human_task_config: Some(input.human_task_config),
            label_category_config_s3_uri: input.label_category_config_s3_uri,
            stopping_conditions: input.stopping_conditions,
            label_counters: Some(LabelCounters::default()),
            output_dataset_s3_uri: None,
            creation_time: Some(now),
            last_modified_time: Some(now),
            tags: input.tags,
        };
        s.labeling_jobs.insert(input.labeling_job_name, job);
        Ok(job_arn)
    }

    async fn stop_labeling_job(&self, labeling_job_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("StopLabelingJob")?;
        let job = s
            .labeling_jobs
            .get_mut(labeling_job_name)
            .ok_or_else(|| not_found("ResourceNotFound", format!("Could not find labeling job \"{labeling_job_name}\".")))?;
        job.labeling_job_status = Some("Stopping".to_string());
        job.last_modified_time = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_uses_validation_exception() {
        let mock = MockAwsClient::new();
        let err = mock.describe_model("absent").await.unwrap_err();
        assert!(err.is_code_with_message("ValidationException", "Could not find model"));
    }

    #[tokio::test]
    async fn test_stop_labeling_job() {
        let mock = MockAwsClient::new();
        let input = CreateLabelingJobInput { labeling_job_name: "job".into(), ..Default::default() };
        mock.create_labeling_job(input).await.unwrap();
        assert_eq!(mock.labeling_job("job").unwrap().labeling_job_status.as_deref(), Some("InProgress"));
        mock.stop_labeling_job("job").await.unwrap();
        assert_eq!(mock.labeling_job("job").unwrap().labeling_job_status.as_deref(), Some("Stopping"));
    }
}
