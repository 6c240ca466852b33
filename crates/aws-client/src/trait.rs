//! AWS service traits for mocking
//!
//! One trait per service. The SDK-backed clients in [`crate::client`] implement
//! them, and tests use [`crate::mock::MockAwsClient`] which implements all four.
//! All async methods must be `Send` to work with Tokio's work-stealing runtime.

use std::collections::BTreeMap;

use crate::error::AwsError;
use crate::models::Tag;
use crate::models::apigatewayv2::*;
use crate::models::dax::{self, ParameterGroup, ParameterNameValue, SubnetGroup, SubnetGroupInput};
use crate::models::ecs::{
    self, DescribeClustersOutput, DescribeServicesOutput, DescribeTaskDefinitionOutput,
    PutClusterCapacityProvidersInput, RegisterTaskDefinitionInput,
};
use crate::models::sagemaker::{CreateLabelingJobInput, CreateModelInput, LabelingJob, Model};

/// API Gateway v2 operations
#[async_trait::async_trait]
pub trait ApiGatewayV2Api: Send + Sync {
    // APIs
    async fn get_api(&self, api_id: &str) -> Result<Api, AwsError>;
    async fn create_api(&self, input: CreateApiInput) -> Result<Api, AwsError>;
    async fn update_api(&self, input: UpdateApiInput) -> Result<Api, AwsError>;
    async fn delete_api(&self, api_id: &str) -> Result<(), AwsError>;

    // Stages
    async fn get_stages(&self, api_id: &str) -> Result<Vec<Stage>, AwsError>;
    async fn create_stage(&self, input: CreateStageInput) -> Result<Stage, AwsError>;
    async fn update_stage(&self, input: UpdateStageInput) -> Result<Stage, AwsError>;
    async fn delete_stage(&self, api_id: &str, stage_name: &str) -> Result<(), AwsError>;

    // Routes
    async fn get_routes(&self, api_id: &str) -> Result<Vec<Route>, AwsError>;
    async fn create_route(&self, input: CreateRouteInput) -> Result<Route, AwsError>;
    async fn update_route(&self, input: UpdateRouteInput) -> Result<Route, AwsError>;
    async fn delete_route(&self, api_id: &str, route_id: &str) -> Result<(), AwsError>;

    // Route responses
    async fn get_route_responses(&self, api_id: &str, route_id: &str) -> Result<Vec<RouteResponse>, AwsError>;
    async fn create_route_response(&self, input: CreateRouteResponseInput) -> Result<RouteResponse, AwsError>;
    async fn update_route_response(&self, input: UpdateRouteResponseInput) -> Result<RouteResponse, AwsError>;
    async fn delete_route_response(&self, api_id: &str, route_id: &str, route_response_id: &str) -> Result<(), AwsError>;

    // Integrations
    async fn get_integration(&self, api_id: &str, integration_id: &str) -> Result<Integration, AwsError>;
    async fn create_integration(&self, input: CreateIntegrationInput) -> Result<Integration, AwsError>;
    async fn update_integration(&self, input: UpdateIntegrationInput) -> Result<Integration, AwsError>;
    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> Result<(), AwsError>;

    // Integration responses
    async fn get_integration_responses(&self, api_id: &str, integration_id: &str) -> Result<Vec<IntegrationResponse>, AwsError>;
    async fn create_integration_response(&self, input: CreateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError>;
    async fn update_integration_response(&self, input: UpdateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError>;
    async fn delete_integration_response(&self, api_id: &str, integration_id: &str, integration_response_id: &str) -> Result<(), AwsError>;

    // Deployments
    async fn get_deployments(&self, api_id: &str) -> Result<Vec<Deployment>, AwsError>;
    async fn create_deployment(&self, input: CreateDeploymentInput) -> Result<Deployment, AwsError>;
    async fn update_deployment(&self, input: UpdateDeploymentInput) -> Result<Deployment, AwsError>;
    async fn delete_deployment(&self, api_id: &str, deployment_id: &str) -> Result<(), AwsError>;

    // VPC links
    async fn get_vpc_link(&self, vpc_link_id: &str) -> Result<VpcLink, AwsError>;
    async fn create_vpc_link(&self, input: CreateVpcLinkInput) -> Result<VpcLink, AwsError>;
    async fn update_vpc_link(&self, input: UpdateVpcLinkInput) -> Result<VpcLink, AwsError>;
    async fn delete_vpc_link(&self, vpc_link_id: &str) -> Result<(), AwsError>;

    // API mappings
    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, AwsError>;
    async fn create_api_mapping(&self, input: CreateApiMappingInput) -> Result<ApiMapping, AwsError>;
    async fn update_api_mapping(&self, input: UpdateApiMappingInput) -> Result<ApiMapping, AwsError>;
    async fn delete_api_mapping(&self, domain_name: &str, api_mapping_id: &str) -> Result<(), AwsError>;

    // Authorizers
    async fn get_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<Authorizer, AwsError>;
    async fn create_authorizer(&self, input: CreateAuthorizerInput) -> Result<Authorizer, AwsError>;
    async fn update_authorizer(&self, input: UpdateAuthorizerInput) -> Result<Authorizer, AwsError>;
    async fn delete_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<(), AwsError>;

    // Domain names
    async fn get_domain_name(&self, domain_name: &str) -> Result<DomainName, AwsError>;
    async fn create_domain_name(&self, input: CreateDomainNameInput) -> Result<DomainName, AwsError>;
    async fn update_domain_name(&self, input: UpdateDomainNameInput) -> Result<DomainName, AwsError>;
    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), AwsError>;

    // Tags
    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<(), AwsError>;
    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError>;
}

/// ECS operations
#[async_trait::async_trait]
pub trait EcsApi: Send + Sync {
    // Clusters
    async fn describe_clusters(&self, clusters: &[String]) -> Result<DescribeClustersOutput, AwsError>;
    async fn create_cluster(&self, input: ecs::CreateClusterInput) -> Result<ecs::Cluster, AwsError>;
    async fn update_cluster(&self, input: ecs::UpdateClusterInput) -> Result<ecs::Cluster, AwsError>;
    async fn put_cluster_capacity_providers(&self, input: PutClusterCapacityProvidersInput) -> Result<ecs::Cluster, AwsError>;
    async fn delete_cluster(&self, cluster_name: &str) -> Result<ecs::Cluster, AwsError>;

    // Services
    async fn describe_services(&self, cluster: Option<&str>, services: &[String]) -> Result<DescribeServicesOutput, AwsError>;
    async fn create_service(&self, input: ecs::CreateServiceInput) -> Result<ecs::Service, AwsError>;
    async fn update_service(&self, input: ecs::UpdateServiceInput) -> Result<ecs::Service, AwsError>;
    async fn delete_service(&self, cluster: Option<&str>, service_name: &str, force: bool) -> Result<ecs::Service, AwsError>;

    // Task definitions
    async fn describe_task_definition(&self, task_definition_arn: &str) -> Result<DescribeTaskDefinitionOutput, AwsError>;
    async fn register_task_definition(&self, input: RegisterTaskDefinitionInput) -> Result<DescribeTaskDefinitionOutput, AwsError>;
    async fn deregister_task_definition(&self, task_definition_arn: &str) -> Result<ecs::TaskDefinition, AwsError>;

    // Tags
    async fn tag_resource(&self, resource_arn: &str, tags: Vec<Tag>) -> Result<(), AwsError>;
    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError>;
}

/// DAX operations
#[async_trait::async_trait]
pub trait DaxApi: Send + Sync {
    // Clusters
    async fn describe_clusters(&self, cluster_names: &[String]) -> Result<Vec<dax::Cluster>, AwsError>;
    async fn create_cluster(&self, input: dax::CreateClusterInput) -> Result<dax::Cluster, AwsError>;
    async fn update_cluster(&self, input: dax::UpdateClusterInput) -> Result<dax::Cluster, AwsError>;
    async fn increase_replication_factor(&self, cluster_name: &str, new_replication_factor: i32, availability_zones: Vec<String>) -> Result<dax::Cluster, AwsError>;
    async fn decrease_replication_factor(&self, cluster_name: &str, new_replication_factor: i32) -> Result<dax::Cluster, AwsError>;
    async fn delete_cluster(&self, cluster_name: &str) -> Result<dax::Cluster, AwsError>;

    // Parameter groups
    async fn describe_parameter_groups(&self, names: &[String]) -> Result<Vec<ParameterGroup>, AwsError>;
    async fn describe_parameters(&self, parameter_group_name: &str) -> Result<Vec<ParameterNameValue>, AwsError>;
    async fn create_parameter_group(&self, parameter_group_name: &str, description: Option<String>) -> Result<ParameterGroup, AwsError>;
    async fn update_parameter_group(&self, parameter_group_name: &str, parameter_name_values: Vec<ParameterNameValue>) -> Result<ParameterGroup, AwsError>;
    async fn delete_parameter_group(&self, parameter_group_name: &str) -> Result<(), AwsError>;

    // Subnet groups
    async fn describe_subnet_groups(&self, names: &[String]) -> Result<Vec<SubnetGroup>, AwsError>;
    async fn create_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError>;
    async fn update_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError>;
    async fn delete_subnet_group(&self, subnet_group_name: &str) -> Result<(), AwsError>;
}

/// SageMaker operations
#[async_trait::async_trait]
pub trait SageMakerApi: Send + Sync {
    // Models
    async fn describe_model(&self, model_name: &str) -> Result<Model, AwsError>;
    /// Returns the model ARN
    async fn create_model(&self, input: CreateModelInput) -> Result<String, AwsError>;
    async fn delete_model(&self, model_name: &str) -> Result<(), AwsError>;

    // Labeling jobs
    async fn describe_labeling_job(&self, labeling_job_name: &str) -> Result<LabelingJob, AwsError>;
    /// Returns the labeling job ARN
    async fn create_labeling_job(&self, input: CreateLabelingJobInput) -> Result<String, AwsError>;
    async fn stop_labeling_job(&self, labeling_job_name: &str) -> Result<(), AwsError>;
}
