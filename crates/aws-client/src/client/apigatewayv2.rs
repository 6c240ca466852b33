//! API Gateway v2 client backed by `aws-sdk-apigatewayv2`

use std::collections::BTreeMap;

use aws_sdk_apigatewayv2::Client;
use aws_sdk_apigatewayv2::types::{
    self, AuthorizationType, AuthorizerType, ConnectionType, ContentHandlingStrategy, EndpointType,
    IntegrationType, LoggingLevel, PassthroughBehavior, ProtocolType, SecurityPolicy,
};
use tracing::debug;

use super::convert::{
    MapField, StrField, list, map_values, sdk_error, string_map, strings, timestamp, to_hash_map,
};
use crate::aws_trait::ApiGatewayV2Api;
use crate::error::AwsError;
use crate::models::apigatewayv2::*;

/// API Gateway v2 client for one region
#[derive(Debug, Clone)]
pub struct ApiGatewayV2Client {
    client: Client,
}

impl ApiGatewayV2Client {
    /// Create a client from a loaded SDK configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self { client: Client::new(config) }
    }
}

fn cors(c: &types::Cors) -> Cors {
    Cors {
        allow_credentials: c.allow_credentials(),
        allow_headers: strings(c.allow_headers()),
        allow_methods: strings(c.allow_methods()),
        allow_origins: strings(c.allow_origins()),
        expose_headers: strings(c.expose_headers()),
        max_age: c.max_age(),
    }
}

fn sdk_cors(c: &Cors) -> types::Cors {
    types::Cors::builder()
        .set_allow_credentials(c.allow_credentials)
        .set_allow_headers(Some(c.allow_headers.clone()))
        .set_allow_methods(Some(c.allow_methods.clone()))
        .set_allow_origins(Some(c.allow_origins.clone()))
        .set_expose_headers(Some(c.expose_headers.clone()))
        .set_max_age(c.max_age)
        .build()
}

fn access_log_settings(a: &types::AccessLogSettings) -> AccessLogSettings {
    AccessLogSettings { destination_arn: a.destination_arn().owned(), format: a.format().owned() }
}

fn sdk_access_log_settings(a: &AccessLogSettings) -> types::AccessLogSettings {
    types::AccessLogSettings::builder()
        .set_destination_arn(a.destination_arn.clone())
        .set_format(a.format.clone())
        .build()
}

fn route_settings(r: &types::RouteSettings) -> RouteSettings {
    RouteSettings {
        data_trace_enabled: r.data_trace_enabled(),
        detailed_metrics_enabled: r.detailed_metrics_enabled(),
        logging_level: r.logging_level().owned(),
        throttling_burst_limit: r.throttling_burst_limit(),
        throttling_rate_limit: r.throttling_rate_limit(),
    }
}

fn sdk_route_settings(r: &RouteSettings) -> types::RouteSettings {
    types::RouteSettings::builder()
        .set_data_trace_enabled(r.data_trace_enabled)
        .set_detailed_metrics_enabled(r.detailed_metrics_enabled)
        .set_logging_level(r.logging_level.as_deref().map(LoggingLevel::from))
        .set_throttling_burst_limit(r.throttling_burst_limit)
        .set_throttling_rate_limit(r.throttling_rate_limit)
        .build()
}

fn sdk_route_settings_map(
    m: &BTreeMap<String, RouteSettings>,
) -> Option<std::collections::HashMap<String, types::RouteSettings>> {
    (!m.is_empty()).then(|| m.iter().map(|(k, v)| (k.clone(), sdk_route_settings(v))).collect())
}

fn parameter_constraints(p: &types::ParameterConstraints) -> ParameterConstraints {
    ParameterConstraints { required: p.required() }
}

fn sdk_parameter_constraints(
    m: &BTreeMap<String, ParameterConstraints>,
) -> Option<std::collections::HashMap<String, types::ParameterConstraints>> {
    (!m.is_empty()).then(|| {
        m.iter()
            .map(|(k, v)| {
                (k.clone(), types::ParameterConstraints::builder().set_required(v.required).build())
            })
            .collect()
    })
}

fn nested_string_map<'a, M>(map: M) -> BTreeMap<String, BTreeMap<String, String>>
where
    M: MapField<'a, std::collections::HashMap<String, String>>,
{
    map_values(map, |inner| inner.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn sdk_nested_string_map(
    m: &BTreeMap<String, BTreeMap<String, String>>,
) -> Option<std::collections::HashMap<String, std::collections::HashMap<String, String>>> {
    (!m.is_empty()).then(|| {
        m.iter()
            .map(|(k, v)| (k.clone(), v.iter().map(|(a, b)| (a.clone(), b.clone())).collect()))
            .collect()
    })
}

fn jwt_configuration(j: &types::JwtConfiguration) -> JwtConfiguration {
    JwtConfiguration { audience: strings(j.audience()), issuer: j.issuer().owned() }
}

fn sdk_jwt_configuration(j: &JwtConfiguration) -> types::JwtConfiguration {
    types::JwtConfiguration::builder()
        .set_audience(Some(j.audience.clone()))
        .set_issuer(j.issuer.clone())
        .build()
}

fn domain_name_configuration(d: &types::DomainNameConfiguration) -> DomainNameConfiguration {
    DomainNameConfiguration {
        api_gateway_domain_name: d.api_gateway_domain_name().owned(),
        certificate_arn: d.certificate_arn().owned(),
        certificate_name: d.certificate_name().owned(),
        domain_name_status: d.domain_name_status().owned(),
        domain_name_status_message: d.domain_name_status_message().owned(),
        endpoint_type: d.endpoint_type().owned(),
        hosted_zone_id: d.hosted_zone_id().owned(),
        ownership_verification_certificate_arn: d.ownership_verification_certificate_arn().owned(),
        security_policy: d.security_policy().owned(),
    }
}

fn sdk_domain_name_configuration(d: &DomainNameConfiguration) -> types::DomainNameConfiguration {
    types::DomainNameConfiguration::builder()
        .set_certificate_arn(d.certificate_arn.clone())
        .set_certificate_name(d.certificate_name.clone())
        .set_endpoint_type(d.endpoint_type.as_deref().map(EndpointType::from))
        .set_ownership_verification_certificate_arn(d.ownership_verification_certificate_arn.clone())
        .set_security_policy(d.security_policy.as_deref().map(SecurityPolicy::from))
        .build()
}

fn sdk_mutual_tls(m: &MutualTlsAuthentication) -> types::MutualTlsAuthenticationInput {
    types::MutualTlsAuthenticationInput::builder()
        .set_truststore_uri(m.truststore_uri.clone())
        .set_truststore_version(m.truststore_version.clone())
        .build()
}

// Create*/Get*/Update* outputs carry identical getters but are distinct types, so
// the shape conversions are macros.

macro_rules! api_from {
    ($o:expr) => {{
        let o = $o;
        Api {
            api_id: o.api_id().owned().unwrap_or_default(),
            name: o.name().owned().unwrap_or_default(),
            protocol_type: o.protocol_type().owned().unwrap_or_default(),
            api_endpoint: o.api_endpoint().owned(),
            api_gateway_managed: o.api_gateway_managed(),
            api_key_selection_expression: o.api_key_selection_expression().owned(),
            cors_configuration: o.cors_configuration().map(cors),
            created_date: timestamp(o.created_date()),
            description: o.description().owned(),
            disable_execute_api_endpoint: o.disable_execute_api_endpoint(),
            route_selection_expression: o.route_selection_expression().owned(),
            version: o.version().owned(),
            warnings: strings(o.warnings()),
            tags: string_map(o.tags()),
        }
    }};
}

macro_rules! stage_from {
    ($o:expr) => {{
        let o = $o;
        Stage {
            stage_name: o.stage_name().owned().unwrap_or_default(),
            access_log_settings: o.access_log_settings().map(access_log_settings),
            api_gateway_managed: o.api_gateway_managed(),
            auto_deploy: o.auto_deploy(),
            client_certificate_id: o.client_certificate_id().owned(),
            created_date: timestamp(o.created_date()),
            default_route_settings: o.default_route_settings().map(route_settings),
            deployment_id: o.deployment_id().owned(),
            description: o.description().owned(),
            last_deployment_status_message: o.last_deployment_status_message().owned(),
            last_updated_date: timestamp(o.last_updated_date()),
            route_settings: map_values(o.route_settings(), route_settings),
            stage_variables: string_map(o.stage_variables()),
            tags: string_map(o.tags()),
        }
    }};
}

macro_rules! route_from {
    ($o:expr) => {{
        let o = $o;
        Route {
            route_id: o.route_id().owned().unwrap_or_default(),
            route_key: o.route_key().owned().unwrap_or_default(),
            api_gateway_managed: o.api_gateway_managed(),
            api_key_required: o.api_key_required(),
            authorization_scopes: strings(o.authorization_scopes()),
            authorization_type: o.authorization_type().owned(),
            authorizer_id: o.authorizer_id().owned(),
            model_selection_expression: o.model_selection_expression().owned(),
            operation_name: o.operation_name().owned(),
            request_models: string_map(o.request_models()),
            request_parameters: map_values(o.request_parameters(), parameter_constraints),
            route_response_selection_expression: o.route_response_selection_expression().owned(),
            target: o.target().owned(),
        }
    }};
}

macro_rules! route_response_from {
    ($o:expr) => {{
        let o = $o;
        RouteResponse {
            route_response_id: o.route_response_id().owned().unwrap_or_default(),
            route_response_key: o.route_response_key().owned().unwrap_or_default(),
            model_selection_expression: o.model_selection_expression().owned(),
            response_models: string_map(o.response_models()),
            response_parameters: map_values(o.response_parameters(), parameter_constraints),
        }
    }};
}

macro_rules! integration_from {
    ($o:expr) => {{
        let o = $o;
        Integration {
            integration_id: o.integration_id().owned().unwrap_or_default(),
            integration_type: o.integration_type().owned(),
            api_gateway_managed: o.api_gateway_managed(),
            connection_id: o.connection_id().owned(),
            connection_type: o.connection_type().owned(),
            content_handling_strategy: o.content_handling_strategy().owned(),
            credentials_arn: o.credentials_arn().owned(),
            description: o.description().owned(),
            integration_method: o.integration_method().owned(),
            integration_response_selection_expression: o
                .integration_response_selection_expression()
                .owned(),
            integration_subtype: o.integration_subtype().owned(),
            integration_uri: o.integration_uri().owned(),
            passthrough_behavior: o.passthrough_behavior().owned(),
            payload_format_version: o.payload_format_version().owned(),
            request_parameters: string_map(o.request_parameters()),
            request_templates: string_map(o.request_templates()),
            response_parameters: nested_string_map(o.response_parameters()),
            template_selection_expression: o.template_selection_expression().owned(),
            timeout_in_millis: o.timeout_in_millis(),
            tls_config: o
                .tls_config()
                .map(|t| TlsConfig { server_name_to_verify: t.server_name_to_verify().owned() }),
        }
    }};
}

macro_rules! integration_response_from {
    ($o:expr) => {{
        let o = $o;
        IntegrationResponse {
            integration_response_id: o.integration_response_id().owned().unwrap_or_default(),
            integration_response_key: o.integration_response_key().owned().unwrap_or_default(),
            content_handling_strategy: o.content_handling_strategy().owned(),
            response_parameters: string_map(o.response_parameters()),
            response_templates: string_map(o.response_templates()),
            template_selection_expression: o.template_selection_expression().owned(),
        }
    }};
}

macro_rules! deployment_from {
    ($o:expr) => {{
        let o = $o;
        Deployment {
            deployment_id: o.deployment_id().owned().unwrap_or_default(),
            auto_deployed: o.auto_deployed(),
            created_date: timestamp(o.created_date()),
            deployment_status: o.deployment_status().owned(),
            deployment_status_message: o.deployment_status_message().owned(),
            description: o.description().owned(),
        }
    }};
}

macro_rules! vpc_link_from {
    ($o:expr) => {{
        let o = $o;
        VpcLink {
            vpc_link_id: o.vpc_link_id().owned().unwrap_or_default(),
            name: o.name().owned().unwrap_or_default(),
            security_group_ids: strings(o.security_group_ids()),
            subnet_ids: strings(o.subnet_ids()),
            created_date: timestamp(o.created_date()),
            vpc_link_status: o.vpc_link_status().owned(),
            vpc_link_status_message: o.vpc_link_status_message().owned(),
            vpc_link_version: o.vpc_link_version().owned(),
            tags: string_map(o.tags()),
        }
    }};
}

macro_rules! api_mapping_from {
    ($o:expr) => {{
        let o = $o;
        ApiMapping {
            api_mapping_id: o.api_mapping_id().owned().unwrap_or_default(),
            api_id: o.api_id().owned(),
            api_mapping_key: o.api_mapping_key().owned(),
            stage: o.stage().owned(),
        }
    }};
}

macro_rules! authorizer_from {
    ($o:expr) => {{
        let o = $o;
        Authorizer {
            authorizer_id: o.authorizer_id().owned().unwrap_or_default(),
            name: o.name().owned().unwrap_or_default(),
            authorizer_type: o.authorizer_type().owned(),
            authorizer_credentials_arn: o.authorizer_credentials_arn().owned(),
            authorizer_payload_format_version: o.authorizer_payload_format_version().owned(),
            authorizer_result_ttl_in_seconds: o.authorizer_result_ttl_in_seconds(),
            authorizer_uri: o.authorizer_uri().owned(),
            enable_simple_responses: o.enable_simple_responses(),
            identity_source: strings(o.identity_source()),
            identity_validation_expression: o.identity_validation_expression().owned(),
            jwt_configuration: o.jwt_configuration().map(jwt_configuration),
        }
    }};
}

macro_rules! domain_name_from {
    ($o:expr) => {{
        let o = $o;
        DomainName {
            domain_name: o.domain_name().owned().unwrap_or_default(),
            api_mapping_selection_expression: o.api_mapping_selection_expression().owned(),
            domain_name_configurations: list(
                o.domain_name_configurations(),
                domain_name_configuration,
            ),
            mutual_tls_authentication: o.mutual_tls_authentication().map(|m| {
                MutualTlsAuthentication {
                    truststore_uri: m.truststore_uri().owned(),
                    truststore_version: m.truststore_version().owned(),
                }
            }),
            tags: string_map(o.tags()),
        }
    }};
}

#[async_trait::async_trait]
impl ApiGatewayV2Api for ApiGatewayV2Client {
    async fn get_api(&self, api_id: &str) -> Result<Api, AwsError> {
        debug!(api_id, "GetApi");
        let out = self.client.get_api().api_id(api_id).send().await.map_err(sdk_error)?;
        Ok(api_from!(&out))
    }

    async fn create_api(&self, input: CreateApiInput) -> Result<Api, AwsError> {
        debug!(name = %input.name, "CreateApi");
        let out = self
            .client
            .create_api()
            .name(input.name)
            .protocol_type(ProtocolType::from(input.protocol_type.as_str()))
            .set_api_key_selection_expression(input.api_key_selection_expression)
            .set_cors_configuration(input.cors_configuration.as_ref().map(sdk_cors))
            .set_description(input.description)
            .set_disable_execute_api_endpoint(input.disable_execute_api_endpoint)
            .set_route_selection_expression(input.route_selection_expression)
            .set_version(input.version)
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(api_from!(&out))
    }

    async fn update_api(&self, input: UpdateApiInput) -> Result<Api, AwsError> {
        debug!(api_id = %input.api_id, "UpdateApi");
        let out = self
            .client
            .update_api()
            .api_id(input.api_id)
            .set_name(input.name)
            .set_api_key_selection_expression(input.api_key_selection_expression)
            .set_cors_configuration(input.cors_configuration.as_ref().map(sdk_cors))
            .set_description(input.description)
            .set_disable_execute_api_endpoint(input.disable_execute_api_endpoint)
            .set_route_selection_expression(input.route_selection_expression)
            .set_version(input.version)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(api_from!(&out))
    }

    async fn delete_api(&self, api_id: &str) -> Result<(), AwsError> {
        debug!(api_id, "DeleteApi");
        self.client.delete_api().api_id(api_id).send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn get_stages(&self, api_id: &str) -> Result<Vec<Stage>, AwsError> {
        let mut stages = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_stages()
                .api_id(api_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            stages.extend(list(out.items(), |s| stage_from!(s)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        debug!(api_id, count = stages.len(), "GetStages");
        Ok(stages)
    }

    async fn create_stage(&self, input: CreateStageInput) -> Result<Stage, AwsError> {
        debug!(api_id = %input.api_id, stage_name = %input.stage_name, "CreateStage");
        let out = self
            .client
            .create_stage()
            .api_id(input.api_id)
            .stage_name(input.stage_name)
            .set_access_log_settings(input.access_log_settings.as_ref().map(sdk_access_log_settings))
            .set_auto_deploy(input.auto_deploy)
            .set_client_certificate_id(input.client_certificate_id)
            .set_default_route_settings(input.default_route_settings.as_ref().map(sdk_route_settings))
            .set_deployment_id(input.deployment_id)
            .set_description(input.description)
            .set_route_settings(sdk_route_settings_map(&input.route_settings))
            .set_stage_variables(to_hash_map(&input.stage_variables))
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(stage_from!(&out))
    }

    async fn update_stage(&self, input: UpdateStageInput) -> Result<Stage, AwsError> {
        debug!(api_id = %input.api_id, stage_name = %input.stage_name, "UpdateStage");
        let out = self
            .client
            .update_stage()
            .api_id(input.api_id)
            .stage_name(input.stage_name)
            .set_access_log_settings(input.access_log_settings.as_ref().map(sdk_access_log_settings))
            .set_auto_deploy(input.auto_deploy)
            .set_client_certificate_id(input.client_certificate_id)
            .set_default_route_settings(input.default_route_settings.as_ref().map(sdk_route_settings))
            .set_deployment_id(input.deployment_id)
            .set_description(input.description)
            .set_route_settings(sdk_route_settings_map(&input.route_settings))
            .set_stage_variables(to_hash_map(&input.stage_variables))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(stage_from!(&out))
    }

    async fn delete_stage(&self, api_id: &str, stage_name: &str) -> Result<(), AwsError> {
        debug!(api_id, stage_name, "DeleteStage");
        self.client
            .delete_stage()
            .api_id(api_id)
            .stage_name(stage_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_routes(&self, api_id: &str) -> Result<Vec<Route>, AwsError> {
        let mut routes = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_routes()
                .api_id(api_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            routes.extend(list(out.items(), |r| route_from!(r)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        debug!(api_id, count = routes.len(), "GetRoutes");
        Ok(routes)
    }

    async fn create_route(&self, input: CreateRouteInput) -> Result<Route, AwsError> {
        debug!(api_id = %input.api_id, route_key = %input.route_key, "CreateRoute");
        let out = self
            .client
            .create_route()
            .api_id(input.api_id)
            .route_key(input.route_key)
            .set_api_key_required(input.api_key_required)
            .set_authorization_scopes(Some(input.authorization_scopes))
            .set_authorization_type(input.authorization_type.as_deref().map(AuthorizationType::from))
            .set_authorizer_id(input.authorizer_id)
            .set_model_selection_expression(input.model_selection_expression)
            .set_operation_name(input.operation_name)
            .set_request_models(to_hash_map(&input.request_models))
            .set_request_parameters(sdk_parameter_constraints(&input.request_parameters))
            .set_route_response_selection_expression(input.route_response_selection_expression)
            .set_target(input.target)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(route_from!(&out))
    }

    async fn update_route(&self, input: UpdateRouteInput) -> Result<Route, AwsError> {
        debug!(api_id = %input.api_id, route_id = %input.route_id, "UpdateRoute");
        let out = self
            .client
            .update_route()
            .api_id(input.api_id)
            .route_id(input.route_id)
            .set_route_key(input.route_key)
            .set_api_key_required(input.api_key_required)
            .set_authorization_scopes(Some(input.authorization_scopes))
            .set_authorization_type(input.authorization_type.as_deref().map(AuthorizationType::from))
            .set_authorizer_id(input.authorizer_id)
            .set_model_selection_expression(input.model_selection_expression)
            .set_operation_name(input.operation_name)
            .set_request_models(to_hash_map(&input.request_models))
            .set_request_parameters(sdk_parameter_constraints(&input.request_parameters))
            .set_route_response_selection_expression(input.route_response_selection_expression)
            .set_target(input.target)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(route_from!(&out))
    }

    async fn delete_route(&self, api_id: &str, route_id: &str) -> Result<(), AwsError> {
        debug!(api_id, route_id, "DeleteRoute");
        self.client
            .delete_route()
            .api_id(api_id)
            .route_id(route_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_route_responses(&self, api_id: &str, route_id: &str) -> Result<Vec<RouteResponse>, AwsError> {
        let mut responses = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_route_responses()
                .api_id(api_id)
                .route_id(route_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            responses.extend(list(out.items(), |r| route_response_from!(r)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        Ok(responses)
    }

    async fn create_route_response(&self, input: CreateRouteResponseInput) -> Result<RouteResponse, AwsError> {
        debug!(api_id = %input.api_id, route_id = %input.route_id, "CreateRouteResponse");
        let out = self
            .client
            .create_route_response()
            .api_id(input.api_id)
            .route_id(input.route_id)
            .route_response_key(input.route_response_key)
            .set_model_selection_expression(input.model_selection_expression)
            .set_response_models(to_hash_map(&input.response_models))
            .set_response_parameters(sdk_parameter_constraints(&input.response_parameters))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(route_response_from!(&out))
    }

    async fn update_route_response(&self, input: UpdateRouteResponseInput) -> Result<RouteResponse, AwsError> {
        debug!(route_response_id = %input.route_response_id, "UpdateRouteResponse");
        let out = self
            .client
            .update_route_response()
            .api_id(input.api_id)
            .route_id(input.route_id)
            .route_response_id(input.route_response_id)
            .set_route_response_key(input.route_response_key)
            .set_model_selection_expression(input.model_selection_expression)
            .set_response_models(to_hash_map(&input.response_models))
            .set_response_parameters(sdk_parameter_constraints(&input.response_parameters))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(route_response_from!(&out))
    }

    async fn delete_route_response(&self, api_id: &str, route_id: &str, route_response_id: &str) -> Result<(), AwsError> {
        debug!(api_id, route_id, route_response_id, "DeleteRouteResponse");
        self.client
            .delete_route_response()
            .api_id(api_id)
            .route_id(route_id)
            .route_response_id(route_response_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_integration(&self, api_id: &str, integration_id: &str) -> Result<Integration, AwsError> {
        debug!(api_id, integration_id, "GetIntegration");
        let out = self
            .client
            .get_integration()
            .api_id(api_id)
            .integration_id(integration_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(integration_from!(&out))
    }

    async fn create_integration(&self, input: CreateIntegrationInput) -> Result<Integration, AwsError> {
        debug!(api_id = %input.api_id, integration_type = %input.integration_type, "CreateIntegration");
        let out = self
            .client
            .create_integration()
            .api_id(input.api_id)
            .integration_type(IntegrationType::from(input.integration_type.as_str()))
            .set_connection_id(input.connection_id)
            .set_connection_type(input.connection_type.as_deref().map(ConnectionType::from))
            .set_content_handling_strategy(
                input.content_handling_strategy.as_deref().map(ContentHandlingStrategy::from),
            )
            .set_credentials_arn(input.credentials_arn)
            .set_description(input.description)
            .set_integration_method(input.integration_method)
            .set_integration_subtype(input.integration_subtype)
            .set_integration_uri(input.integration_uri)
            .set_passthrough_behavior(input.passthrough_behavior.as_deref().map(PassthroughBehavior::from))
            .set_payload_format_version(input.payload_format_version)
            .set_request_parameters(to_hash_map(&input.request_parameters))
            .set_request_templates(to_hash_map(&input.request_templates))
            .set_response_parameters(sdk_nested_string_map(&input.response_parameters))
            .set_template_selection_expression(input.template_selection_expression)
            .set_timeout_in_millis(input.timeout_in_millis)
            .set_tls_config(input.tls_config.map(|t| {
                types::TlsConfigInput::builder().set_server_name_to_verify(t.server_name_to_verify).build()
            }))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(integration_from!(&out))
    }

    async fn update_integration(&self, input: UpdateIntegrationInput) -> Result<Integration, AwsError> {
        debug!(api_id = %input.api_id, integration_id = %input.integration_id, "UpdateIntegration");
        let out = self
            .client
            .update_integration()
            .api_id(input.api_id)
            .integration_id(input.integration_id)
            .set_integration_type(input.integration_type.as_deref().map(IntegrationType::from))
            .set_connection_id(input.connection_id)
            .set_connection_type(input.connection_type.as_deref().map(ConnectionType::from))
            .set_content_handling_strategy(
                input.content_handling_strategy.as_deref().map(ContentHandlingStrategy::from),
            )
            .set_credentials_arn(input.credentials_arn)
            .set_description(input.description)
            .set_integration_method(input.integration_method)
            .set_integration_subtype(input.integration_subtype)
            .set_integration_uri(input.integration_uri)
            .set_passthrough_behavior(input.passthrough_behavior.as_deref().map(PassthroughBehavior::from))
            .set_payload_format_version(input.payload_format_version)
            .set_request_parameters(to_hash_map(&input.request_parameters))
            .set_request_templates(to_hash_map(&input.request_templates))
            .set_response_parameters(sdk_nested_string_map(&input.response_parameters))
            .set_template_selection_expression(input.template_selection_expression)
            .set_timeout_in_millis(input.timeout_in_millis)
            .set_tls_config(input.tls_config.map(|t| {
                types::TlsConfigInput::builder().set_server_name_to_verify(t.server_name_to_verify).build()
            }))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(integration_from!(&out))
    }

    async fn delete_integration(&self, api_id: &str, integration_id: &str) -> Result<(), AwsError> {
        debug!(api_id, integration_id, "DeleteIntegration");
        self.client
            .delete_integration()
            .api_id(api_id)
            .integration_id(integration_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_integration_responses(&self, api_id: &str, integration_id: &str) -> Result<Vec<IntegrationResponse>, AwsError> {
        let mut responses = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_integration_responses()
                .api_id(api_id)
                .integration_id(integration_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            responses.extend(list(out.items(), |r| integration_response_from!(r)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        Ok(responses)
    }

    async fn create_integration_response(&self, input: CreateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError> {
        debug!(integration_id = %input.integration_id, "CreateIntegrationResponse");
        let out = self
            .client
            .create_integration_response()
            .api_id(input.api_id)
            .integration_id(input.integration_id)
            .integration_response_key(input.integration_response_key)
            .set_content_handling_strategy(
                input.content_handling_strategy.as_deref().map(ContentHandlingStrategy::from),
            )
            .set_response_parameters(to_hash_map(&input.response_parameters))
            .set_response_templates(to_hash_map(&input.response_templates))
            .set_template_selection_expression(input.template_selection_expression)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(integration_response_from!(&out))
    }

    async fn update_integration_response(&self, input: UpdateIntegrationResponseInput) -> Result<IntegrationResponse, AwsError> {
        debug!(integration_response_id = %input.integration_response_id, "UpdateIntegrationResponse");
        let out = self
            .client
            .update_integration_response()
            .api_id(input.api_id)
            .integration_id(input.integration_id)
            .integration_response_id(input.integration_response_id)
            .set_integration_response_key(input.integration_response_key)
            .set_content_handling_strategy(
                input.content_handling_strategy.as_deref().map(ContentHandlingStrategy::from),
            )
            .set_response_parameters(to_hash_map(&input.response_parameters))
            .set_response_templates(to_hash_map(&input.response_templates))
            .set_template_selection_expression(input.template_selection_expression)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(integration_response_from!(&out))
    }

    async fn delete_integration_response(&self, api_id: &str, integration_id: &str, integration_response_id: &str) -> Result<(), AwsError> {
        debug!(api_id, integration_id, integration_response_id, "DeleteIntegrationResponse");
        self.client
            .delete_integration_response()
            .api_id(api_id)
            .integration_id(integration_id)
            .integration_response_id(integration_response_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_deployments(&self, api_id: &str) -> Result<Vec<Deployment>, AwsError> {
        let mut deployments = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_deployments()
                .api_id(api_id)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            deployments.extend(list(out.items(), |d| deployment_from!(d)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        Ok(deployments)
    }

    async fn create_deployment(&self, input: CreateDeploymentInput) -> Result<Deployment, AwsError> {
        debug!(api_id = %input.api_id, "CreateDeployment");
        let out = self
            .client
            .create_deployment()
            .api_id(input.api_id)
            .set_description(input.description)
            .set_stage_name(input.stage_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(deployment_from!(&out))
    }

    async fn update_deployment(&self, input: UpdateDeploymentInput) -> Result<Deployment, AwsError> {
        debug!(deployment_id = %input.deployment_id, "UpdateDeployment");
        let out = self
            .client
            .update_deployment()
            .api_id(input.api_id)
            .deployment_id(input.deployment_id)
            .set_description(input.description)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(deployment_from!(&out))
    }

    async fn delete_deployment(&self, api_id: &str, deployment_id: &str) -> Result<(), AwsError> {
        debug!(api_id, deployment_id, "DeleteDeployment");
        self.client
            .delete_deployment()
            .api_id(api_id)
            .deployment_id(deployment_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_vpc_link(&self, vpc_link_id: &str) -> Result<VpcLink, AwsError> {
        debug!(vpc_link_id, "GetVpcLink");
        let out = self.client.get_vpc_link().vpc_link_id(vpc_link_id).send().await.map_err(sdk_error)?;
        Ok(vpc_link_from!(&out))
    }

    async fn create_vpc_link(&self, input: CreateVpcLinkInput) -> Result<VpcLink, AwsError> {
        debug!(name = %input.name, "CreateVpcLink");
        let out = self
            .client
            .create_vpc_link()
            .name(input.name)
            .set_security_group_ids(Some(input.security_group_ids))
            .set_subnet_ids(Some(input.subnet_ids))
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(vpc_link_from!(&out))
    }

    async fn update_vpc_link(&self, input: UpdateVpcLinkInput) -> Result<VpcLink, AwsError> {
        debug!(vpc_link_id = %input.vpc_link_id, "UpdateVpcLink");
        let out = self
            .client
            .update_vpc_link()
            .vpc_link_id(input.vpc_link_id)
            .set_name(input.name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(vpc_link_from!(&out))
    }

    async fn delete_vpc_link(&self, vpc_link_id: &str) -> Result<(), AwsError> {
        debug!(vpc_link_id, "DeleteVpcLink");
        self.client.delete_vpc_link().vpc_link_id(vpc_link_id).send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn get_api_mappings(&self, domain_name: &str) -> Result<Vec<ApiMapping>, AwsError> {
        let mut mappings = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .get_api_mappings()
                .domain_name(domain_name)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            mappings.extend(list(out.items(), |m| api_mapping_from!(m)));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        Ok(mappings)
    }

    async fn create_api_mapping(&self, input: CreateApiMappingInput) -> Result<ApiMapping, AwsError> {
        debug!(domain_name = %input.domain_name, api_id = %input.api_id, "CreateApiMapping");
        let out = self
            .client
            .create_api_mapping()
            .domain_name(input.domain_name)
            .api_id(input.api_id)
            .stage(input.stage)
            .set_api_mapping_key(input.api_mapping_key)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(api_mapping_from!(&out))
    }

    async fn update_api_mapping(&self, input: UpdateApiMappingInput) -> Result<ApiMapping, AwsError> {
        debug!(api_mapping_id = %input.api_mapping_id, "UpdateApiMapping");
        let out = self
            .client
            .update_api_mapping()
            .domain_name(input.domain_name)
            .api_mapping_id(input.api_mapping_id)
            .api_id(input.api_id)
            .set_stage(input.stage)
            .set_api_mapping_key(input.api_mapping_key)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(api_mapping_from!(&out))
    }

    async fn delete_api_mapping(&self, domain_name: &str, api_mapping_id: &str) -> Result<(), AwsError> {
        debug!(domain_name, api_mapping_id, "DeleteApiMapping");
        self.client
            .delete_api_mapping()
            .domain_name(domain_name)
            .api_mapping_id(api_mapping_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<Authorizer, AwsError> {
        debug!(api_id, authorizer_id, "GetAuthorizer");
        let out = self
            .client
            .get_authorizer()
            .api_id(api_id)
            .authorizer_id(authorizer_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(authorizer_from!(&out))
    }

    async fn create_authorizer(&self, input: CreateAuthorizerInput) -> Result<Authorizer, AwsError> {
        debug!(api_id = %input.api_id, name = %input.name, "CreateAuthorizer");
        let out = self
            .client
            .create_authorizer()
            .api_id(input.api_id)
            .name(input.name)
            .authorizer_type(AuthorizerType::from(input.authorizer_type.as_str()))
            .set_authorizer_credentials_arn(input.authorizer_credentials_arn)
            .set_authorizer_payload_format_version(input.authorizer_payload_format_version)
            .set_authorizer_result_ttl_in_seconds(input.authorizer_result_ttl_in_seconds)
            .set_authorizer_uri(input.authorizer_uri)
            .set_enable_simple_responses(input.enable_simple_responses)
            .set_identity_source(Some(input.identity_source))
            .set_identity_validation_expression(input.identity_validation_expression)
            .set_jwt_configuration(input.jwt_configuration.as_ref().map(sdk_jwt_configuration))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(authorizer_from!(&out))
    }

    async fn update_authorizer(&self, input: UpdateAuthorizerInput) -> Result<Authorizer, AwsError> {
        debug!(authorizer_id = %input.authorizer_id, "UpdateAuthorizer");
        let out = self
            .client
            .update_authorizer()
            .api_id(input.api_id)
            .authorizer_id(input.authorizer_id)
            .set_name(input.name)
            .set_authorizer_type(input.authorizer_type.as_deref().map(AuthorizerType::from))
            .set_authorizer_credentials_arn(input.authorizer_credentials_arn)
            .set_authorizer_payload_format_version(input.authorizer_payload_format_version)
            .set_authorizer_result_ttl_in_seconds(input.authorizer_result_ttl_in_seconds)
            .set_authorizer_uri(input.authorizer_uri)
            .set_enable_simple_responses(input.enable_simple_responses)
            .set_identity_source(Some(input.identity_source))
            .set_identity_validation_expression(input.identity_validation_expression)
            .set_jwt_configuration(input.jwt_configuration.as_ref().map(sdk_jwt_configuration))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(authorizer_from!(&out))
    }

    async fn delete_authorizer(&self, api_id: &str, authorizer_id: &str) -> Result<(), AwsError> {
        debug!(api_id, authorizer_id, "DeleteAuthorizer");
        self.client
            .delete_authorizer()
            .api_id(api_id)
            .authorizer_id(authorizer_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_domain_name(&self, domain_name: &str) -> Result<DomainName, AwsError> {
        debug!(domain_name, "GetDomainName");
        let out = self.client.get_domain_name().domain_name(domain_name).send().await.map_err(sdk_error)?;
        Ok(domain_name_from!(&out))
    }

    async fn create_domain_name(&self, input: CreateDomainNameInput) -> Result<DomainName, AwsError> {
        debug!(domain_name = %input.domain_name, "CreateDomainName");
        let out = self
            .client
            .create_domain_name()
            .domain_name(input.domain_name)
            .set_domain_name_configurations(Some(
                input.domain_name_configurations.iter().map(sdk_domain_name_configuration).collect(),
            ))
            .set_mutual_tls_authentication(input.mutual_tls_authentication.as_ref().map(sdk_mutual_tls))
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(domain_name_from!(&out))
    }

    async fn update_domain_name(&self, input: UpdateDomainNameInput) -> Result<DomainName, AwsError> {
        debug!(domain_name = %input.domain_name, "UpdateDomainName");
        let out = self
            .client
            .update_domain_name()
            .domain_name(input.domain_name)
            .set_domain_name_configurations(Some(
                input.domain_name_configurations.iter().map(sdk_domain_name_configuration).collect(),
            ))
            .set_mutual_tls_authentication(input.mutual_tls_authentication.as_ref().map(sdk_mutual_tls))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(domain_name_from!(&out))
    }

    async fn delete_domain_name(&self, domain_name: &str) -> Result<(), AwsError> {
        debug!(domain_name, "DeleteDomainName");
        self.client.delete_domain_name().domain_name(domain_name).send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn tag_resource(&self, resource_arn: &str, tags: BTreeMap<String, String>) -> Result<(), AwsError> {
        debug!(resource_arn, count = tags.len(), "TagResource");
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(to_hash_map(&tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError> {
        debug!(resource_arn, count = tag_keys.len(), "UntagResource");
        self.client
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
