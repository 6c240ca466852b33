//! Integration tests for the AWS clients
//!
//! These tests call real AWS endpoints and create billable resources.
//! Set AWS credentials and AWS_REGION to run them.

use aws_client::models::apigatewayv2::{CreateApiInput, UpdateApiInput};
use aws_client::{ApiGatewayV2Api, AwsClients, DaxApi, EcsApi, SageMakerApi};

async fn clients() -> AwsClients {
    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    AwsClients::for_region(&region).await
}

#[tokio::test]
#[ignore] // Requires AWS credentials
async fn test_missing_api_is_not_found() {
    let clients = clients().await;

    let err = clients
        .apigatewayv2
        .get_api("doesnotexist")
        .await
        .expect_err("API should not exist");
    assert!(err.is_code("NotFoundException"), "unexpected error: {err}");
}

#[tokio::test]
#[ignore]
async fn test_api_lifecycle() {
    let clients = clients().await;

    let api = clients
        .apigatewayv2
        .create_api(CreateApiInput {
            name: "aws-client-integration-test".to_string(),
            protocol_type: "HTTP".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create API");
    println!("Created API {}", api.api_id);

    let updated = clients
        .apigatewayv2
        .update_api(UpdateApiInput {
            api_id: api.api_id.clone(),
            description: Some("updated by integration test".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to update API");
    assert_eq!(updated.description.as_deref(), Some("updated by integration test"));

    clients.apigatewayv2.delete_api(&api.api_id).await.expect("Failed to delete API");
}

#[tokio::test]
#[ignore]
async fn test_missing_ecs_cluster_reported_as_failure() {
    let clients = clients().await;

    let out = clients
        .ecs
        .describe_clusters(&["aws-client-missing-cluster".to_string()])
        .await
        .expect("Failed to describe clusters");
    assert!(out.clusters.is_empty());
    assert_eq!(out.failures[0].reason.as_deref(), Some("MISSING"));
}

#[tokio::test]
#[ignore]
async fn test_missing_dax_cluster_is_fault() {
    let clients = clients().await;

    let err = clients
        .dax
        .describe_clusters(&["aws-client-missing".to_string()])
        .await
        .expect_err("cluster should not exist");
    assert!(err.is_code("ClusterNotFoundFault"), "unexpected error: {err}");
}

#[tokio::test]
#[ignore]
async fn test_missing_model_is_validation_exception() {
    let clients = clients().await;

    let err = clients
        .sagemaker
        .describe_model("aws-client-missing-model")
        .await
        .expect_err("model should not exist");
    assert!(err.is_code_with_message("ValidationException", "Could not find model"));
}
