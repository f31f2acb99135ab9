//! `tfplugin6.Provider` gRPC service
//!
//! Decodes requests, dispatches to the provider or to a resource from the
//! registry, and reports every failure as a diagnostic. RPCs only return a
//! gRPC error status for transport-level problems, never for provider errors.

use super::diagnostics::Diagnostics;
use super::proto::tfplugin6::{
    apply_resource_change, configure_provider, get_functions, get_metadata, get_provider_schema,
    import_resource_state, plan_resource_change, provider_server::{Provider, ProviderServer},
    read_resource, stop_provider, upgrade_resource_state, validate_provider_config,
    validate_resource_config, DynamicValue, ServerCapabilities,
};
use super::value::{self, ObjectValue};
use crate::errors::ProviderError;
use crate::provider::{Operation, ProviderData, Resource, SupabaseVaultProvider};
use crate::rpc_span;
use std::collections::HashMap;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info, Instrument};

/// A failed RPC step: diagnostic summary plus cause
#[derive(Debug)]
struct Failure {
    summary: String,
    error: ProviderError,
}

impl Failure {
    fn new<S: Into<String>>(summary: S, error: ProviderError) -> Self {
        Self { summary: summary.into(), error }
    }

    fn record(self, diagnostics: &mut Diagnostics) {
        diagnostics.from_error(self.summary, &self.error);
    }
}

type Step<T> = std::result::Result<T, Failure>;

/// gRPC front of a [`SupabaseVaultProvider`].
#[derive(Debug, Clone)]
pub struct ProviderService {
    provider: Arc<SupabaseVaultProvider>,
}

impl ProviderService {
    pub fn new(provider: Arc<SupabaseVaultProvider>) -> Self {
        Self { provider }
    }

    pub fn into_server(self) -> ProviderServer<Self> {
        ProviderServer::new(self)
    }

    fn capabilities() -> ServerCapabilities {
        ServerCapabilities {
            plan_destroy: true,
            get_provider_schema_optional: true,
            move_resource_state: false,
        }
    }

    fn resource(&self, type_name: &str) -> Step<Box<dyn Resource>> {
        self.provider.registry().get(type_name).ok_or_else(|| {
            Failure::new(
                "Unknown resource type",
                ProviderError::config(format!(
                    "The provider does not support resource type \"{}\"",
                    type_name
                )),
            )
        })
    }

    async fn data(&self) -> Step<ProviderData> {
        self.provider.data().await.map_err(|e| Failure::new("Provider not configured", e))
    }

    fn decode(
        resource: &dyn Resource,
        value: Option<&DynamicValue>,
        what: &str,
    ) -> Step<Option<ObjectValue>> {
        value::decode(value, &resource.schema())
            .map_err(|e| Failure::new(format!("Invalid {}", what), e))
    }

    fn encode(resource: &dyn Resource, object: Option<&ObjectValue>) -> Step<DynamicValue> {
        value::encode(object, &resource.schema())
            .map_err(|e| Failure::new("Unable to encode resource state", e))
    }

    fn metadata(&self) -> get_metadata::Response {
        get_metadata::Response {
            server_capabilities: Some(Self::capabilities()),
            diagnostics: Vec::new(),
            data_sources: Vec::new(),
            resources: self
                .provider
                .registry()
                .type_names()
                .into_iter()
                .map(|type_name| get_metadata::ResourceMetadata { type_name: type_name.to_string() })
                .collect(),
            functions: Vec::new(),
        }
    }

    fn provider_schema(&self) -> get_provider_schema::Response {
        let resource_schemas = self
            .provider
            .registry()
            .resources()
            .map(|resource| (resource.type_name().to_string(), resource.schema().to_proto()))
            .collect();

        get_provider_schema::Response {
            provider: Some(SupabaseVaultProvider::schema().to_proto()),
            resource_schemas,
            data_source_schemas: HashMap::new(),
            diagnostics: Vec::new(),
            provider_meta: None,
            server_capabilities: Some(Self::capabilities()),
            functions: HashMap::new(),
        }
    }

    fn validate_provider(&self, request: validate_provider_config::Request) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match value::decode(request.config.as_ref(), &SupabaseVaultProvider::schema()) {
            Ok(Some(config)) => self.provider.validate_config(&config, &mut diagnostics),
            Ok(None) => {}
            Err(e) => diagnostics.from_error("Invalid provider configuration", &e),
        }
        diagnostics
    }

    fn validate_resource(&self, request: validate_resource_config::Request) -> Step<Diagnostics> {
        let resource = self.resource(&request.type_name)?;
        let mut diagnostics = Diagnostics::new();
        if let Some(config) = Self::decode(&*resource, request.config.as_ref(), "resource configuration")? {
            resource.validate(&config, &mut diagnostics);
        }
        Ok(diagnostics)
    }

    fn upgrade(&self, request: upgrade_resource_state::Request) -> Step<DynamicValue> {
        let resource = self.resource(&request.type_name)?;
        let raw_state = request.raw_state.unwrap_or_default();

        if raw_state.json.is_empty() {
            if !raw_state.flatmap.is_empty() {
                return Err(Failure::new(
                    "Unable to upgrade resource state",
                    ProviderError::codec("flatmap state is not supported"),
                ));
            }
            return Self::encode(&*resource, None);
        }

        debug!(from_version = request.version, "Upgrading stored state");
        let state = value::upgrade_json_state(&raw_state.json, &resource.schema())
            .map_err(|e| Failure::new("Unable to upgrade resource state", e))?;
        Self::encode(&*resource, state.as_ref())
    }

    async fn configure(&self, request: configure_provider::Request) -> Step<()> {
        info!(terraform_version = %request.terraform_version, "Configuring provider");

        let config = value::decode(request.config.as_ref(), &SupabaseVaultProvider::schema())
            .map_err(|e| Failure::new("Invalid provider configuration", e))?;

        self.provider.configure(config.as_ref()).await.map_err(|e| {
            let summary = match e {
                ProviderError::Connection { .. } | ProviderError::ConnectionTimeout { .. } => {
                    "Unable to connect to PostgreSQL"
                }
                _ => "Invalid provider configuration",
            };
            Failure::new(summary, e)
        })
    }

    async fn read(&self, request: &read_resource::Request) -> Step<DynamicValue> {
        let resource = self.resource(&request.type_name)?;
        let Some(current) = Self::decode(&*resource, request.current_state.as_ref(), "resource state")? else {
            return Self::encode(&*resource, None);
        };
        let data = self.data().await?;

        let new_state = resource
            .read(&data, &current)
            .await
            .map_err(|e| Failure::new(resource.error_summary(Operation::Read, &e), e))?;

        Self::encode(&*resource, new_state.as_ref())
    }

    fn plan(&self, request: plan_resource_change::Request) -> Step<DynamicValue> {
        let resource = self.resource(&request.type_name)?;
        let prior = Self::decode(&*resource, request.prior_state.as_ref(), "prior state")?;
        let proposed = Self::decode(&*resource, request.proposed_new_state.as_ref(), "proposed state")?;
        let config = Self::decode(&*resource, request.config.as_ref(), "resource configuration")?;

        let planned = resource
            .plan(prior.as_ref(), proposed, config.as_ref())
            .map_err(|e| Failure::new("Unable to plan resource change", e))?;

        Self::encode(&*resource, planned.as_ref())
    }

    async fn apply(&self, request: &apply_resource_change::Request) -> Step<DynamicValue> {
        let resource = self.resource(&request.type_name)?;
        let prior = Self::decode(&*resource, request.prior_state.as_ref(), "prior state")?;
        let planned = Self::decode(&*resource, request.planned_state.as_ref(), "planned state")?;
        let data = self.data().await?;

        let summary = |operation, e: &ProviderError| resource.error_summary(operation, e);

        let new_state = match (prior, planned) {
            (Some(prior), None) => {
                resource
                    .delete(&data, &prior)
                    .await
                    .map_err(|e| Failure::new(summary(Operation::Delete, &e), e))?;
                None
            }
            (None, Some(planned)) => Some(
                resource
                    .create(&data, &planned)
                    .await
                    .map_err(|e| Failure::new(summary(Operation::Create, &e), e))?,
            ),
            (Some(prior), Some(planned)) => Some(
                resource
                    .update(&data, &prior, &planned)
                    .await
                    .map_err(|e| Failure::new(summary(Operation::Update, &e), e))?,
            ),
            (None, None) => None,
        };

        Self::encode(&*resource, new_state.as_ref())
    }

    async fn import(&self, request: &import_resource_state::Request) -> Step<DynamicValue> {
        let resource = self.resource(&request.type_name)?;
        let data = self.data().await?;

        let state = resource
            .import(&data, &request.id)
            .await
            .map_err(|e| Failure::new(resource.error_summary(Operation::Import, &e), e))?;

        Self::encode(&*resource, Some(&state))
    }
}

#[tonic::async_trait]
impl Provider for ProviderService {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> Result<Response<get_metadata::Response>, Status> {
        let _span = rpc_span!("GetMetadata").entered();
        Ok(Response::new(self.metadata()))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        let _span = rpc_span!("GetProviderSchema").entered();
        Ok(Response::new(self.provider_schema()))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        let _span = rpc_span!("ValidateProviderConfig").entered();
        let diagnostics = self.validate_provider(request.into_inner());
        Ok(Response::new(validate_provider_config::Response { diagnostics: diagnostics.into_inner() }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        let request = request.into_inner();
        let _span = rpc_span!("ValidateResourceConfig", request.type_name).entered();

        let diagnostics = self.validate_resource(request).unwrap_or_else(|failure| {
            let mut diagnostics = Diagnostics::new();
            failure.record(&mut diagnostics);
            diagnostics
        });
        Ok(Response::new(validate_resource_config::Response { diagnostics: diagnostics.into_inner() }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        let request = request.into_inner();
        let _span = rpc_span!("UpgradeResourceState", request.type_name).entered();

        let mut diagnostics = Diagnostics::new();
        let upgraded_state = self.upgrade(request).map_err(|f| f.record(&mut diagnostics)).ok();
        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state,
            diagnostics: diagnostics.into_inner(),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        let span = rpc_span!("ConfigureProvider");

        let mut diagnostics = Diagnostics::new();
        if let Err(failure) = self.configure(request.into_inner()).instrument(span).await {
            failure.record(&mut diagnostics);
        }
        Ok(Response::new(configure_provider::Response { diagnostics: diagnostics.into_inner() }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let request = request.into_inner();
        let span = rpc_span!("ReadResource", request.type_name);

        let mut diagnostics = Diagnostics::new();
        let new_state = match self.read(&request).instrument(span).await {
            Ok(state) => Some(state),
            Err(failure) => {
                failure.record(&mut diagnostics);
                request.current_state
            }
        };

        Ok(Response::new(read_resource::Response {
            new_state,
            diagnostics: diagnostics.into_inner(),
            private: request.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let request = request.into_inner();
        let _span = rpc_span!("PlanResourceChange", request.type_name).entered();

        let planned_private = request.prior_private.clone();
        let mut diagnostics = Diagnostics::new();
        let planned_state = self.plan(request).map_err(|f| f.record(&mut diagnostics)).ok();

        Ok(Response::new(plan_resource_change::Response {
            planned_state,
            requires_replace: Vec::new(),
            planned_private,
            diagnostics: diagnostics.into_inner(),
            legacy_type_system: false,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let request = request.into_inner();
        let span = rpc_span!("ApplyResourceChange", request.type_name);

        let mut diagnostics = Diagnostics::new();
        let new_state = match self.apply(&request).instrument(span).await {
            Ok(state) => Some(state),
            Err(failure) => {
                failure.record(&mut diagnostics);
                // Failed creates leave nothing behind; failed updates and deletes keep the prior object
                request.prior_state
            }
        };

        Ok(Response::new(apply_resource_change::Response {
            new_state,
            private: request.planned_private,
            diagnostics: diagnostics.into_inner(),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let request = request.into_inner();
        let span = rpc_span!("ImportResourceState", request.type_name);

        let mut diagnostics = Diagnostics::new();
        let imported_resources = match self.import(&request).instrument(span).await {
            Ok(state) => vec![import_resource_state::ImportedResource {
                type_name: request.type_name,
                state: Some(state),
                private: Vec::new(),
            }],
            Err(failure) => {
                failure.record(&mut diagnostics);
                Vec::new()
            }
        };

        Ok(Response::new(import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics.into_inner(),
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<get_functions::Request>,
    ) -> Result<Response<get_functions::Response>, Status> {
        Ok(Response::new(get_functions::Response { functions: HashMap::new(), diagnostics: Vec::new() }))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        info!("Terraform requested provider stop");
        Ok(Response::new(stop_provider::Response { error: String::new() }))
    }
}
