//! Print every CRD of the AWS controllers as a multi-document YAML stream
//!
//! `cargo run -p crds --bin crdgen > config/crds.yaml`

use crds::{apigatewayv2, dax, ecs, sagemaker};
use kube::CustomResourceExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        apigatewayv2::Api::crd(),
        apigatewayv2::ApiMapping::crd(),
        apigatewayv2::Authorizer::crd(),
        apigatewayv2::Deployment::crd(),
        apigatewayv2::DomainName::crd(),
        apigatewayv2::Integration::crd(),
        apigatewayv2::IntegrationResponse::crd(),
        apigatewayv2::Route::crd(),
        apigatewayv2::RouteResponse::crd(),
        apigatewayv2::Stage::crd(),
        apigatewayv2::VpcLink::crd(),
        ecs::Cluster::crd(),
        ecs::Service::crd(),
        ecs::TaskDefinition::crd(),
        dax::Cluster::crd(),
        dax::ParameterGroup::crd(),
        dax::SubnetGroup::crd(),
        sagemaker::LabelingJob::crd(),
        sagemaker::Model::crd(),
    ]
}

fn main() -> Result<(), serde_yaml::Error> {
    for crd in all_crds() {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
