//! API Gateway v2 operations for MockAwsClient

use std::collections::BTreeMap;

use chrono::Utc;

use super::{MOCK_REGION, MockAwsClient, MockState, not_found};
use crate::aws_trait::ApiGatewayV2Api;
use crate::error::AwsError;
use crate::models::apigatewayv2::*;

const NOT_FOUND: &str = "NotFoundException";

fn missing(what: &str, id: &str) -> AwsError {
    not_found(NOT_FOUND, format!("Invalid {what} identifier specified {id}"))
}

fn key(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

fn key3(a: &str, b: &str, c: &str) -> (String, String, String) {
    (a.to_string(), b.to_string(), c.to_string())
}

fn set<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

impl MockState {
    /// Tags of the API, stage, VPC link or domain name addressed by a tagging ARN
    fn resource_tags_mut(&mut self, resource_arn: &str) -> Option<&mut BTreeMap<String, String>> {
        let (_, path) = resource_arn.split_once("::/")?;
        if let Some((api, stage_name)) = path.strip_prefix("apis/").and_then(|p| p.split_once("/stages/")) {
            return self.stages.get_mut(&key(api, stage_name)).map(|s| &mut s.tags);
        }
        match path.split_once('/')? {
            ("apis", id) => self.apis.get_mut(id).map(|a| &mut a.tags),
            ("vpclinks", id) => self.vpc_links.get_mut(id).map(|v| &mut v.tags),
            ("domainnames", name) => self.domain_names.get_mut(name).map(|d| &mut d.tags),
            _ => None,
        }
    }
}

impl MockAwsClient {
    /// Add an API to the mock store (for test setup)
    pub fn add_api(&self, api: Api) {
        self.lock().apis.insert(api.api_id.clone(), api);
    }

    /// Stored API
    pub fn api(&self, api_id: &str) -> Option<Api> {
        self.lock().apis.get(api_id).cloned()
    }

    /// Add a stage to the mock store (for test setup)
    pub fn add_stage(&self, api_id: &str, stage: Stage) {
        self.lock().stages.insert(key(api_id, &stage.stage_name), stage);
    }

    /// Stored stage
    pub fn stage(&self, api_id: &str, stage_name: &str) -> Option<Stage> {
        self.lock().stages.get(&key(api_id, stage_name)).cloned()
    }

    /// Add a route to the mock store (for test setup)
    pub fn add_route(&self, api_id: &str, route: Route) {
        self.lock().routes.insert(key(api_id, &route.route_id), route);
    }

    /// Stored route
    pub fn route(&self, api_id: &str, route_id: &str) -> Option<Route> {
        self.lock().routes.get(&key(api_id, route_id)).cloned()
    }

    /// Add a route response to the mock store (for test setup)
    pub fn add_route_response(&self, api_id: &str, route_id: &str, response: RouteResponse) {
        self.lock()
            .route_responses
            .insert(key3(api_id, route_id, &response.route_response_id), response);
    }

    /// Add an integration to the mock store (for test setup)
    pub fn add_integration(&self, api_id: &str, integration: Integration) {
        self.lock().integrations.insert(key(api_id, &integration.integration_id), integration);
    }

    /// Stored integration
    pub fn integration(&self, api_id: &str, integration_id: &str) -> Option<Integration> {
        self.lock().integrations.get(&key(api_id, integration_id)).cloned()
    }

    /// Add an integration response to the mock store (for test setup)
    pub fn add_integration_response(&self, api_id: &str, integration_id: &str, response: IntegrationResponse) {
        self.lock()
            .integration_responses
            .insert(key3(api_id, integration_id, &response.integration_response_id), response);
    }

    /// Add a deployment to the mock store (for test setup)
    pub fn add_deployment(&self, api_id: &str, deployment: Deployment) {
        self.lock().deployments.insert(key(api_id, &deployment.deployment_id), deployment);
    }

    /// Add a VPC link to the mock store (for test setup)
    pub fn add_vpc_link(&self, vpc_link: VpcLink) {
        self.lock().vpc_links.insert(vpc_link.vpc_link_id.clone(), vpc_link);
    }

    /// Stored VPC link
    pub fn vpc_link(&self, vpc_link_id: &str) -> Option<VpcLink> {
        self.lock().vpc_links.get(vpc_link_id).cloned()
    }

    /// Add an API mapping to the mock store (for test setup)
    pub fn add_api_mapping(&self, domain_name: &str, mapping: ApiMapping) {
        self.lock().api_mappings.insert(key(domain_name, &mapping.api_mapping_id), mapping);
    }

    /// Add an authorizer to the mock store (for test setup)
    pub fn add_authorizer(&self, api_id: &str, authorizer: Authorizer) {
        self.lock().authorizers.insert(key(api_id, &authorizer.authorizer_id), authorizer);
    }

    /// Add a domain name to the mock store (for test setup)
    pub fn add_domain_name(&self, domain_name: DomainName) {
        self.lock().domain_names.insert(domain_name.domain_name.clone(), domain_name);
    }

    /// Stored domain name
    pub fn domain_name(&self, domain_name: &str) -> Option<DomainName> {
        self.lock().domain_names.get(domain_name).cloned()
    }

    /// Tags recorded by TagResource/UntagResource for an ARN
    pub fn apigw_tags(&self, resource_arn: &str) -> BTreeMap<String, String> {
        self.lock().apigw_tags.get(resource_arn).cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ApiGatewayV2Api for MockAwsClient {
    async fn get_api(&self, api_id: &str) -> Result<Api, AwsError> {
        let s = self.record("GetApi")?;
        s.apis.get(api_id).cloned().ok_or_else(|| missing("API", api_id))
    }

    async fn create_api(&self, input: CreateApiInput) -> Result<Api, AwsError> {
        let mut s = self.record("CreateApi")?;
        let api_id = s.next_id();
        let api = Api {
            api_endpoint: Some(format!("https://{api_id}.execute-api.{MOCK_REGION}.amazonaws.com")),
            api_id: api_id.clone(),
            name: input.name,
            route_selection_expression: input
                .route_selection_expression
                .or_else(|| Some("$request.method $request.path".to_string())),
            api_key_selection_expression: input
                .api_key_selection_expression
                .or_else(|| Some("$request.header.x-api-key".to_string())),
            disable_execute_api_endpoint: input.disable_execute_api_endpoint.or(Some(false)),
            protocol_type: input.protocol_type,
            cors_configuration: input.cors_configuration,
            description: input.description,
            version: input.version,
            created_date: Some(Utc::now()),
            tags: input.tags,
            ..Api::default()
        };
        s.apis.insert(api_id, api.clone());
        Ok(api)
    }

    async fn update_api(&self, input: UpdateApiInput) -> Result<Api, AwsError> {
        let mut s = self.record("UpdateApi")?;
        let api = s.apis.get_mut(&input.api_id).ok_or_else(|| missing("API", &input.api_id))?;
        if let Some(name) = input.name {
            api.name = name;
        }
        set(&mut api.api_key_selection_expression, input.api_key_selection_expression);
        set(&mut api.cors_configuration, input.cors_configuration);
        set(&mut api.description, input.description);
        set(&mut api.disable_execute_api_endpoint, input.disable_execute_api_endpoint);
        set(&mut api.route_selection_expression, input.route_selection_expression);
        set(&mut api.version, input.version);
        Ok(api.clone())
    }

    async fn delete_api(&self, api_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteApi")?;
        s.apis.remove(api_id).map(|_| ()).ok_or_else(|| missing("API", api_id))
    }

    async fn get_stages(&self, api_id: &str) -> Result<Vec<Stage>, AwsError> {
        let s = self.record("GetStages")?;
        Ok(s.stages.iter().filter(|((a, _), _)| a == api_id).map(|(_, v)| v.clone()).collect())
    }

    async fn create_stage(&self, input: CreateStageInput) -> Result<Stage, AwsError> {
        let mut s = self.record("CreateStage")?;
        let k = key(&input.api_id, &input.stage_name);
        if s.stages.contains_key(&k) {
            return Err(AwsError::service("ConflictException", format!("Stage already exists: {}", input.stage_name)));
        }
        let stage = Stage {
            stage_name: input.stage_name,
            access_log_settings: input.access_log_settings,
            auto_deploy: input.auto_deploy,
            client_certificate_id: input.client_certificate_id,
            created_date: Some(Utc::now()),
            default_route_settings: input.default_route_settings,
            deployment_id: input.deployment_id,
            description: input.description,
            route_settings: input.route_settings,
            stage_variables: input.stage_variables,
            tags: input.tags,
            ..Stage::default()
        };
        s.stages.insert(k, stage.clone());
        Ok(stage)
    }

    async fn update_stage(&self, input: UpdateStageInput) -> Result<Stage, AwsError> {
        let mut s = self.record("UpdateStage")?;
        let stage = s
            .stages
            .get_mut(&key(&input.api_id, &input.stage_name))
            .ok_or_else(|| missing("Stage", &input.stage_name))?;
        set(&mut stage.access_log_settings, input.access_log_settings);
        set(&mut stage.auto_deploy, input.auto_deploy);
        set(&mut stage.client_certificate_id, input.client_certificate_id);
        set(&mut stage.default_route_settings, input.default_route_settings);
        set(&mut stage.deployment_id, input.deployment_id);
        set(&mut stage.description, input.description);
        stage.route_settings = input.route_settings;
        stage.stage_variables = input.stage_variables;
        stage.last_updated_date = Some(Utc::now());
        Ok(stage.clone())
    }

    async fn delete_stage(&self, api_id: &str, stage_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteStage")?;
        s.stages.remove(&key(api_id, stage_name)).map(|_| ()).ok_or_else(|| missing("Stage", stage_name))
    }

    async fn get_routes(&self, api_id: &str) -> Result<Vec<Route>, AwsError> {
        let s = self.record("GetRoutes")?;
        Ok(s.routes.iter().filter(|((a, _), _)| a == api_id).map(|(_, v)| v.clone()).collect())
    }

    async fn create_route(&self, input: CreateRouteInput) -> Result<Route, AwsError> {
        let mut s = self.record("CreateRoute")?;
        let route_id = s.next_id();
        let route = Route {
            route_id: route_id.clone(),
            route_key: input.route_key,
            api_key_required: input.api_key_required.or(Some(false)),
            authorization_scopes: input.authorization_scopes,
            authorization_type: input.authorization_type.or_else(|| Some("NONE".to_string())),
            authorizer_id: input.authorizer_id,
            model_selection_expression: input.model_selection_expression,
            operation_name: input.operation_name,
            request_models: input.request_models,
            request_parameters: input.request_parameters,
            route_response_selection_expression: input.route_response_selection_expression,
            target: input.target,
            ..Route::default()
        };
        s.routes.insert(key(&input.api_id, &route_id), route.clone());
        Ok(route)
    }

    async fn update_route(&self, input: UpdateRouteInput) -> Result<Route, AwsError> {
        let mut s = self.record("UpdateRoute")?;
        let route = s
            .routes
            .get_mut(&key(&input.api_id, &input.route_id))
            .ok_or_else(|| missing("Route", &input.route_id))?;
        if let Some(route_key) = input.route_key {
            route.route_key = route_key;
        }
        set(&mut route.api_key_required, input.api_key_required);
        route.authorization_scopes = input.authorization_scopes;
        set(&mut route.authorization_type, input.authorization_type);
        set(&mut route.authorizer_id, input.authorizer_id);
        set(&mut route.model_selection_expression, input.model_selection_expression);
        set(&mut route.operation_name, input.operation_name);
        route.request_models = input.request_models;
        route.request_parameters = input.request_parameters;
        set(&mut route.route_response_selection_expression, input.route_response_selection_expression);
        set(&mut route.target, input.target);
        Ok(route.clone())
    }

    async fn delete_route(&self, api_id: &str, route_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteRoute")?;
        s.routes.remove(&key(api_id, route_id)).map(|_| ()).ok_or_else(|| missing("Route", route_id))
    }

    async fn get_route_responses(&self, api_id: &str, route_id: &str) -> Result<Vec<RouteResponse>, AwsError> {
        let s = self.record("GetRouteResponses")?;
        Ok(s.route_responses
            .iter()
            .filter(|((a, r, _), _)| a == api_id && r == route_id)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn create_route_response(&self, input: CreateRouteResponseInput) -> Result<RouteResponse, AwsError> {
        let mut s = self.record("CreateRouteResponse")?;
        let id = s.next_id();
        let response = RouteResponse {
            route_response_id: id.clone(),
            route_response_key: input.route_response_key,
            model_selection_expression: input.model_selection_expression,
            response_models: input.response_models,
            response_parameters: input.response_parameters,
        };
        s.route_responses.insert(key3(&input.api_id, &input.route_id, &id), response.clone());
        Ok(response)
    }

    async fn update_route_response(&self, input: UpdateRouteResponseInput) -> Result<RouteResponse, AwsError> {
        let mut s = self.record("UpdateRouteResponse")?;
        let response = s
            .route_responses
            .get_mut(&key3(&input.api_id, &input.route_id, &input.route_response_id))
            .ok_or_else(|| missing("RouteResponse", &input.route_response_id))?;
        if let Some(k) = input.route_response_key {
            response.route_response_key = k;
        }
        set(&mut response.model_selection_expression, input.model_selection_expression);
        response.response_models = input.response_models;
        response.response_parameters = input.response_parameters;
        Ok(response.clone())
    }

    async fn delete_route_response(&self, api_id: &str, route_id: &str, route_response_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteRouteResponse")?;
        s.route_responses
            .remove(&key3(api_id, route_id, route_response_id))
            .map(|_| ())
            .ok_or_else(|| missing("RouteResponse", route_response_id))
    }

    async fn get_integration(&self, api_id: &str, integration_id: &str) -> Result<Integration, AwsError> {
        let s = self.record("GetIntegration")?;
        s.integrations
            .get(&key(api_id, integration_id))
            .cloned()
            .ok_or_else(|| missing("Integration", integration_id))
    }

    async fn create_integration(&self, input: CreateIntegrationInput) -> Result<Integration, AwsError> {
        let mut s = self.record("CreateIntegration")?;
        let id = s.next_id();
        let integration = Integration {
            integration_id: id.clone(),
            integration_type: Some(input.integration_type),
            connection_id: input.connection_id,
            connection_type: input.connection_type.or_else(|| Some("INTERNET".to_string())),
            content_handling_strategy: input.content_handling_strategy,
            credentials_arn: input.credentials_arn,
            description: input.description,
            integration_method: input.integration_method,
            integration_subtype: input.integration_subtype,
            integration_uri: input.integration_uri,
            passthrough_behavior: input.passthrough_behavior,
            payload_format_version: input.payload_format_version.or_else(|| Some("1.0".to_string())),
            request_parameters: input.request_parameters,
            request_templates: input.request_templates,
            response_parameters: input.response_parameters,
            template_selection_expression: input.template_selection_expression,
            timeout_in_millis: input.timeout_in_millis.or(Some(30000)),
            tls_config: input.tls_config,
            ..Integration::default()
        };
        s.integrations.insert(key(&input.api_id, &id), integration.clone());
        Ok(integration)
    }

    async fn update_integration(&self, input: UpdateIntegrationInput) -> Result<Integration, AwsError> {
        let mut s = self.record("UpdateIntegration")?;
        let integration = s
            .integrations
            .get_mut(&key(&input.api_id, &input.integration_id))
            .ok_or_else(|| missing("Integration", &input.integration_id))?;
        set(&mut integration.integration_type, input.integration_type);
        set(&mut integration.connection_id, input.connection_id);
        set(&mut integration.connection_type, input.connection_type);
        set(&mut integration.content_handling_strategy, input.content_handling_strategy);
        set(&mut integration.credentials_arn, input.credentials_arn);
        set(&mut integration.description, input.description);
        set(&mut integration.integration_method, input.integration_method);
        set(&mut integration.integration_subtype, input.integration_subtype);
        set(&mut integration.integration_uri, input.integration_uri);
        set(&mut integration.passthrough_behavior, input.passthrough_behavior);
        set(&mut integration.payload_format_version, input.payload_format_version);
        integration.request_parameters = input.request_parameters;
        integration.request_templates = input.request_templates;
        integration.response_parameters = input.response_parameters;
        set(&mut integration.template_selection_expression, input.template_selection_expression);
        set(&mut integration.timeout_in_millis, input.timeout_in_millis);
        set(&mut integration.tls_config, input.tls_config);
        Ok(integration.clone())
    }

    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteIntegration")?;
        s.integrations
            .remove(&key(api_id, integration_id))
            .map(|_| ())
            .ok_or_else(|| missing("Integration", integration_id))
    }

    async fn get_integration_responses(&self, api_id: &str, integration_id: &str) -> Result<Vec<IntegrationResponse>, AwsError> {
        let s = self.record("GetIntegrationResponses")?;
        Ok(s.integration_responses
            .iter()
            .filter(|((a, i, _), _)| a == api_id && i == integration_id)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn create_integration_response(&self, input: CreateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError> {
        let mut s = self.record("CreateIntegrationResponse")?;
        let id = s.next_id();
        let response = IntegrationResponse {
            integration_response_id: id.clone(),
            integration_response_key: input.integration_response_key,
            content_handling_strategy: input.content_handling_strategy,
            response_parameters: input.response_parameters,
            response_templates: input.response_templates,
            template_selection_expression: input.template_selection_expression,
        };
        s.integration_responses.insert(key3(&input.api_id, &input.integration_id, &id), response.clone());
        Ok(response)
    }

    async fn update_integration_response(&self, input: UpdateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError> {
        let mut s = self.record("UpdateIntegrationResponse")?;
        let response = s
            .integration_responses
            .get_mut(&key3(&input.api_id, &input.integration_id, &input.integration_response_id))
            .ok_or_else(|| missing("IntegrationResponse", &input.integration_response_id))?;
        if let Some(k) = input.integration_response_key {
            response.integration_response_key = k;
        }
        set(&mut response.content_handling_strategy, input.content_handling_strategy);
        response.response_parameters = input.response_parameters;
        response.response_templates = input.response_templates;
        set(&mut response.template_selection_expression, input.template_selection_expression);
        Ok(response.clone())
    }

    async fn delete_integration_response(&self, api_id: &str, integration_id: &str, integration_response_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteIntegrationResponse")?;
        s.integration_responses
            .remove(&key3(api_id, integration_id, integration_response_id))
            .map(|_| ())
            .ok_or_else(|| missing("IntegrationResponse", integration_response_id))
    }

    async fn get_deployments(&self, api_id: &str) -> Result<Vec<Deployment>, AwsError> {
        let s = self.record("GetDeployments")?;
        Ok(s.deployments.iter().filter(|((a, _), _)| a == api_id).map(|(_, v)| v.clone()).collect())
    }

    async fn create_deployment(&self, input: CreateDeploymentInput) -> Result<Deployment, AwsError> {
        let mut s = self.record("CreateDeployment")?;
        let id = s.next_id();
        let deployment = Deployment {
            deployment_id: id.clone(),
            auto_deployed: Some(false),
            created_date: Some(Utc::now()),
            deployment_status: Some("DEPLOYED".to_string()),
            deployment_status_message: None,
            description: input.description,
        };
        s.deployments.insert(key(&input.api_id, &id), deployment.clone());
        if let Some(stage_name) = input.stage_name {
            if let Some(stage) = s.stages.get_mut(&key(&input.api_id, &stage_name)) {
                stage.deployment_id = Some(id);
            }
        }
        Ok(deployment)
    }

    async fn update_deployment(&self, input: UpdateDeploymentInput) -> Result<Deployment, AwsError> {
        let mut s = self.record("UpdateDeployment")?;
        let deployment = s
            .deployments
            .get_mut(&key(&input.api_id, &input.deployment_id))
            .ok_or_else(|| missing("Deployment", &input.deployment_id))?;
        set(&mut deployment.description, input.description);
        Ok(deployment.clone())
    }

    async fn delete_deployment(&self, api_id: &str, deployment_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteDeployment")?;
        s.deployments
            .remove(&key(api_id, deployment_id))
            .map(|_| ())
            .ok_or_else(|| missing("Deployment", deployment_id))
    }

    async fn get_vpc_link(&self, vpc_link_id: &str) -> Result<VpcLink, AwsError> {
        let s = self.record("GetVpcLink")?;
        s.vpc_links.get(vpc_link_id).cloned().ok_or_else(|| missing("VpcLink", vpc_link_id))
    }

    async fn create_vpc_link(&self, input: CreateVpcLinkInput) -> Result<VpcLink, AwsError> {
        let mut s = self.record("CreateVpcLink")?;
        let id = s.next_id();
        let link = VpcLink {
            vpc_link_id: id.clone(),
            name: input.name,
            security_group_ids: input.security_group_ids,
            subnet_ids: input.subnet_ids,
            created_date: Some(Utc::now()),
            vpc_link_status: Some("PENDING".to_string()),
            vpc_link_status_message: None,
            vpc_link_version: Some("V2".to_string()),
            tags: input.tags,
        };
        s.vpc_links.insert(id, link.clone());
        Ok(link)
    }

    async fn update_vpc_link(&self, input: UpdateVpcLinkInput) -> Result<VpcLink, AwsError> {
        let mut s = self.record("UpdateVpcLink")?;
        let link = s.vpc_links.get_mut(&input.vpc_link_id).ok_or_else(|| missing("VpcLink", &input.vpc_link_id))?;
        if let Some(name) = input.name {
            link.name = name;
        }
        Ok(link.clone())
    }

    async fn delete_vpc_link(&self, vpc_link_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteVpcLink")?;
        let link = s.vpc_links.get_mut(vpc_link_id).ok_or_else(|| missing("VpcLink", vpc_link_id))?;
        link.vpc_link_status = Some("DELETING".to_string());
        Ok(())
    }

    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, AwsError> {
        let s = self.record("GetApiMappings")?;
        Ok(s.api_mappings.iter().filter(|((d, _), _)| d == domain_name).map(|(_, v)| v.clone()).collect())
    }

    async fn create_api_mapping(&self, input: CreateApiMappingInput) -> Result<ApiMapping, AwsError> {
        let mut s = self.record("CreateApiMapping")?;
        let id = s.next_id();
        let mapping = ApiMapping {
            api_mapping_id: id.clone(),
            api_id: Some(input.api_id),
            api_mapping_key: input.api_mapping_key,
            stage: Some(input.stage),
        };
        s.api_mappings.insert(key(&input.domain_name, &id), mapping.clone());
        Ok(mapping)
    }

    async fn update_api_mapping(&self, input: UpdateApiMappingInput) -> Result<ApiMapping, AwsError> {
        let mut s = self.record("UpdateApiMapping")?;
        let mapping = s
            .api_mappings
            .get_mut(&key(&input.domain_name, &input.api_mapping_id))
            .ok_or_else(|| missing("ApiMapping", &input.api_mapping_id))?;
        mapping.api_id = Some(input.api_id);
        set(&mut mapping.stage, input.stage);
        set(&mut mapping.api_mapping_key, input.api_mapping_key);
        Ok(mapping.clone())
    }

    async fn delete_api_mapping(&self, domain_name: &str, api_mapping_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteApiMapping")?;
        s.api_mappings
            .remove(&key(domain_name, api_mapping_id))
            .map(|_| ())
            .ok_or_else(|| missing("ApiMapping", api_mapping_id))
    }

    async fn get_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<Authorizer, AwsError> {
        let s = self.record("GetAuthorizer")?;
        s.authorizers
            .get(&key(api_id, authorizer_id))
            .cloned()
            .ok_or_else(|| missing("Authorizer", authorizer_id))
    }

    async fn create_authorizer(&self, input: CreateAuthorizerInput) -> Result<Authorizer, AwsError> {
        let mut s = self.record("CreateAuthorizer")?;
        let id = s.next_id();
        let authorizer = Authorizer {
            authorizer_id: id.clone(),
            name: input.name,
            authorizer_type: Some(input.authorizer_type),
            authorizer_credentials_arn: input.authorizer_credentials_arn,
            authorizer_payload_format_version: input.authorizer_payload_format_version,
            authorizer_result_ttl_in_seconds: input.authorizer_result_ttl_in_seconds.or(Some(0)),
            authorizer_uri: input.authorizer_uri,
            enable_simple_responses: input.enable_simple_responses,
            identity_source: input.identity_source,
            identity_validation_expression: input.identity_validation_expression,
            jwt_configuration: input.jwt_configuration,
        };
        s.authorizers.insert(key(&input.api_id, &id), authorizer.clone());
        Ok(authorizer)
    }

    async fn update_authorizer(&self, input: UpdateAuthorizerInput) -> Result<Authorizer, AwsError> {
        let mut s = self.record("UpdateAuthorizer")?;
        let authorizer = s
            .authorizers
            .get_mut(&key(&input.api_id, &input.authorizer_id))
            .ok_or_else(|| missing("Authorizer", &input.authorizer_id))?;
        if let Some(name) = input.name {
            authorizer.name = name;
        }
        set(&mut authorizer.authorizer_type, input.authorizer_type);
        set(&mut authorizer.authorizer_credentials_arn, input.authorizer_credentials_arn);
        set(&mut authorizer.authorizer_payload_format_version, input.authorizer_payload_format_version);
        set(&mut authorizer.authorizer_result_ttl_in_seconds, input.authorizer_result_ttl_in_seconds);
        set(&mut authorizer.authorizer_uri, input.authorizer_uri);
        set(&mut authorizer.enable_simple_responses, input.enable_simple_responses);
        authorizer.identity_source = input.identity_source;
        set(&mut authorizer.identity_validation_expression, input.identity_validation_expression);
        set(&mut authorizer.jwt_configuration, input.jwt_configuration);
        Ok(authorizer.clone())
    }

    async fn delete_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteAuthorizer")?;
        s.authorizers
            .remove(&key(api_id, authorizer_id))
            .map(|_| ())
            .ok_or_else(|| missing("Authorizer", authorizer_id))
    }

    async fn get_domain_name(&self, domain_name: &str) -> Result<DomainName, AwsError> {
        let s = self.record("GetDomainName")?;
        s.domain_names.get(domain_name).cloned().ok_or_else(|| missing("DomainName", domain_name))
    }

    async fn create_domain_name(&self, input: CreateDomainNameInput) -> Result<DomainName, AwsError> {
        let mut s = self.record("CreateDomainName")?;
        if s.domain_names.contains_key(&input.domain_name) {
            return Err(AwsError::service("ConflictException", format!("The domain name {} already exists", input.domain_name)));
        }
        let domain = DomainName {
            api_mapping_selection_expression: Some("$request.basepath".to_string()),
            domain_name_configurations: input
                .domain_name_configurations
                .into_iter()
                .map(|c| DomainNameConfiguration {
                    api_gateway_domain_name: Some(format!("d-{}.execute-api.{MOCK_REGION}.amazonaws.com", input.domain_name)),
                    domain_name_status: Some("AVAILABLE".to_string()),
                    hosted_zone_id: Some("Z1UJRXOUMOOFQ8".to_string()),
                    ..c
                })
                .collect(),
            mutual_tls_authentication: input.mutual_tls_authentication,
            tags: input.tags,
            domain_name: input.domain_name.clone(),
        };
        s.domain_names.insert(input.domain_name, domain.clone());
        Ok(domain)
    }

    async fn update_domain_name(&self, input: UpdateDomainNameInput) -> Result<DomainName, AwsError> {
        let mut s = self.record("UpdateDomainName")?;
        let domain = s
            .domain_names
            .get_mut(&input.domain_name)
            .ok_or_else(|| missing("DomainName", &input.domain_name))?;
        domain.domain_name_configurations = input.domain_name_configurations;
        set(&mut domain.mutual_tls_authentication, input.mutual_tls_authentication);
        Ok(domain.clone())
    }

    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteDomainName")?;
        s.domain_names.remove(domain_name).map(|_| ()).ok_or_else(|| missing("DomainName", domain_name))
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<(), AwsError> {
        let mut s = self.record("TagResource")?;
        if let Some(resource_tags) = s.resource_tags_mut(resource_arn) {
            resource_tags.extend(tags.clone());
        }
        s.apigw_tags.entry(resource_arn.to_string()).or_default().extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError> {
        let mut s = self.record("UntagResource")?;
        if let Some(resource_tags) = s.resource_tags_mut(resource_arn) {
            resource_tags.retain(|k, _| !tag_keys.contains(k));
        }
        if let Some(tags) = s.apigw_tags.get_mut(resource_arn) {
            tags.retain(|k, _| !tag_keys.contains(k));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get_api() {
        let mock = MockAwsClient::new();
        mock.push_next_id("abc123");
        let api = mock
            .create_api(CreateApiInput { name: "demo".into(), protocol_type: "HTTP".into(), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(api.api_id, "abc123");
        let fetched = mock.get_api("abc123").await.unwrap();
        assert_eq!(fetched.name, "demo");
        assert!(fetched.route_selection_expression.is_some());
    }

    #[tokio::test]
    async fn test_missing_api_is_not_found() {
        let mock = MockAwsClient::new();
        let err = mock.get_api("nope").await.unwrap_err();
        assert!(err.is_code("NotFoundException"));
    }

    #[tokio::test]
    async fn test_stages_are_scoped_to_api() {
        let mock = MockAwsClient::new();
        mock.add_stage("a1", Stage { stage_name: "prod".into(), ..Default::default() });
        mock.add_stage("a2", Stage { stage_name: "dev".into(), ..Default::default() });
        let stages = mock.get_stages("a1").await.unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].stage_name, "prod");
    }
}
