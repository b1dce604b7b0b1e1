// provider/src/server.rs

use std::collections::HashMap;

use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use crate::framework::codec;
use crate::framework::diagnostics::{Diagnostic, Diagnostics};
use crate::framework::lifecycle;
use crate::framework::record::Record;
use crate::framework::schema::Schema;
use crate::framework::traits::Resource;
use crate::provider::{self, PROVIDER_TYPE_NAME};
use crate::resources::RevealerResource;

pub mod tfplugin6 {
    tonic::include_proto!("tfplugin6");
}

use tfplugin6::provider_server::Provider;
use tfplugin6::{
    apply_resource_change, configure_provider, get_metadata, get_provider_schema,
    import_resource_state, plan_resource_change, read_data_source, read_resource, stop_provider,
    upgrade_resource_state, validate_data_resource_config, validate_provider_config,
    validate_resource_config, DynamicValue, ServerCapabilities,
};

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        plan_destroy: true,
        get_provider_schema_optional: true,
        move_resource_state: false,
    }
}

fn encode(record: &Record, schema: &Schema) -> Result<DynamicValue, Diagnostics> {
    codec::encode(record, schema).map_err(Diagnostics::from)
}

fn decode(value: Option<&DynamicValue>) -> Result<Record, Diagnostics> {
    codec::decode(value).map_err(Diagnostics::from)
}

fn decode_config(value: &mut Option<DynamicValue>) -> Result<Record, Diagnostics> {
    codec::decode_and_scrub(value).map_err(Diagnostics::from)
}

fn data_source_not_found(type_name: &str) -> Diagnostics {
    Diagnostic::error(
        "Data Source Type Not Found",
        format!("The data source type {:?} is not supported by this provider.", type_name),
    )
    .into()
}

/// Splits a lifecycle outcome into the (value, diagnostics) pair every
/// tfplugin6 response carries.
fn split<T>(result: Result<T, Diagnostics>) -> (Option<T>, Vec<tfplugin6::Diagnostic>) {
    match result {
        Ok(value) => (Some(value), Vec::new()),
        Err(diags) => {
            warn!(%diags, "call failed");
            (None, diags.into_proto())
        }
    }
}

pub struct EphemeralUtilsProvider {
    version: String,
    revealer: RevealerResource,
}

impl EphemeralUtilsProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            revealer: RevealerResource,
        }
    }

    fn revealer_type_name(&self) -> String {
        self.revealer.metadata(PROVIDER_TYPE_NAME)
    }

    fn resource(&self, type_name: &str) -> Result<&RevealerResource, Diagnostics> {
        if type_name == self.revealer_type_name() {
            return Ok(&self.revealer);
        }
        Err(Diagnostic::error(
            "Resource Type Not Found",
            format!("The resource type {:?} is not supported by this provider.", type_name),
        )
        .into())
    }
}

#[tonic::async_trait]
impl Provider for EphemeralUtilsProvider {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> Result<Response<get_metadata::Response>, Status> {
        Ok(Response::new(get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: Vec::new(),
            data_sources: Vec::new(),
            resources: vec![get_metadata::ResourceMetadata {
                type_name: self.revealer_type_name(),
            }],
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        let resource_schemas = HashMap::from([(
            self.revealer_type_name(),
            self.revealer.schema().to_proto(),
        )]);

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(provider::schema().to_proto()),
            resource_schemas,
            server_capabilities: Some(server_capabilities()),
            ..Default::default()
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        let mut req = request.into_inner();
        let result = decode_config(&mut req.config).and_then(|config| {
            lifecycle::validate_config(&provider::schema(), &config, false)
        });

        let (_, diagnostics) = split(result);
        Ok(Response::new(validate_provider_config::Response { diagnostics }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        let mut req = request.into_inner();
        let write_only_allowed = req
            .client_capabilities
            .as_ref()
            .is_some_and(|caps| caps.write_only_attributes_allowed);

        let result = self.resource(&req.type_name).and_then(|resource| {
            let config = decode_config(&mut req.config)?;
            lifecycle::validate_config(&resource.schema(), &config, write_only_allowed)
        });

        let (_, diagnostics) = split(result);
        Ok(Response::new(validate_resource_config::Response { diagnostics }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<validate_data_resource_config::Request>,
    ) -> Result<Response<validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: data_source_not_found(&req.type_name).into_proto(),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, version = req.version, "upgrading resource state");

        let result = self.resource(&req.type_name).and_then(|resource| {
            let schema = resource.schema();
            let raw = req.raw_state.unwrap_or_default();
            let upgraded = lifecycle::upgrade(&schema, req.version, &raw.json, &raw.flatmap)?;
            encode(&upgraded, &schema)
        });

        let (upgraded_state, diagnostics) = split(result);
        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state,
            diagnostics,
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        let mut req = request.into_inner();
        let result = decode_config(&mut req.config).and_then(|config| provider::configure(&config));

        if let Ok(model) = &result {
            info!(
                terraform_version = %req.terraform_version,
                provider_version = %self.version,
                endpoint = ?model.endpoint,
                "provider configured"
            );
        }

        let (_, diagnostics) = split(result);
        Ok(Response::new(configure_provider::Response { diagnostics }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, "reading resource");

        let result = self.resource(&req.type_name).and_then(|resource| {
            let state = decode(req.current_state.as_ref())?;
            let new_state = lifecycle::read(resource, &state)?;
            encode(&new_state, &resource.schema())
        });

        let (new_state, diagnostics) = split(result);
        Ok(Response::new(read_resource::Response {
            new_state,
            diagnostics,
            private: req.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let mut req = request.into_inner();
        debug!(type_name = %req.type_name, "planning resource change");

        let result = self.resource(&req.type_name).and_then(|resource| {
            let prior = decode(req.prior_state.as_ref())?;
            let proposed = decode(req.proposed_new_state.as_ref())?;
            let config = decode_config(&mut req.config)?;
            // 🛡️ The proposal echoes configuration, write-only value included.
            if let Some(dv) = req.proposed_new_state.as_mut() {
                zeroize::Zeroize::zeroize(&mut dv.msgpack);
            }

            let planned = lifecycle::plan(resource, &prior, &proposed, &config)?;
            encode(&planned, &resource.schema())
        });

        let (planned_state, diagnostics) = split(result);
        Ok(Response::new(plan_resource_change::Response {
            planned_state,
            diagnostics,
            planned_private: req.prior_private,
            ..Default::default()
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let mut req = request.into_inner();
        debug!(type_name = %req.type_name, "applying resource change");

        let result = self.resource(&req.type_name).and_then(|resource| {
            let prior = decode(req.prior_state.as_ref())?;
            let planned = decode(req.planned_state.as_ref())?;
            let config = decode_config(&mut req.config)?;

            let new_state = lifecycle::apply(resource, &prior, &planned, &config)?;
            encode(&new_state, &resource.schema())
        });

        let (new_state, diagnostics) = split(result);
        Ok(Response::new(apply_resource_change::Response {
            new_state,
            diagnostics,
            private: req.planned_private,
            ..Default::default()
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, "importing resource");

        let result = self.resource(&req.type_name).and_then(|resource| {
            let state = lifecycle::import(resource, &req.id)?;
            encode(&state, &resource.schema())
        });

        let (state, diagnostics) = split(result);
        let imported_resources = state
            .map(|state| import_resource_state::ImportedResource {
                type_name: req.type_name,
                state: Some(state),
                private: Vec::new(),
            })
            .into_iter()
            .collect();

        Ok(Response::new(import_resource_state::Response {
            imported_resources,
            diagnostics,
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<read_data_source::Request>,
    ) -> Result<Response<read_data_source::Response>, Status> {
        let req = request.into_inner();
        Ok(Response::new(read_data_source::Response {
            state: None,
            diagnostics: data_source_not_found(&req.type_name).into_proto(),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        // No call runs long enough to need cancelling.
        info!("stop requested by Terraform");
        Ok(Response::new(stop_provider::Response::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::value::Value;

    const TYPE_NAME: &str = "ephemeral-utils_revealer";

    fn provider() -> EphemeralUtilsProvider {
        EphemeralUtilsProvider::new("test")
    }

    fn schema() -> Schema {
        RevealerResource.schema()
    }

    fn dynamic(pairs: &[(&str, Value<String>)]) -> Option<DynamicValue> {
        let mut record = Record::null();
        for (name, value) in pairs {
            record.set_attribute(name, value.clone());
        }
        Some(codec::encode(&record, &schema()).unwrap())
    }

    fn null_dynamic() -> Option<DynamicValue> {
        Some(codec::encode(&Record::null(), &schema()).unwrap())
    }

    fn decoded(value: Option<DynamicValue>) -> Record {
        codec::decode(value.as_ref()).unwrap()
    }

    fn config(data_wo: &str) -> Option<DynamicValue> {
        dynamic(&[("data_wo", Value::known(data_wo))])
    }

    async fn plan(
        p: &EphemeralUtilsProvider,
        prior: Option<DynamicValue>,
        proposed: Option<DynamicValue>,
        config: Option<DynamicValue>,
    ) -> plan_resource_change::Response {
        p.plan_resource_change(Request::new(plan_resource_change::Request {
            type_name: TYPE_NAME.into(),
            prior_state: prior,
            proposed_new_state: proposed,
            config,
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner()
    }

    async fn apply(
        p: &EphemeralUtilsProvider,
        prior: Option<DynamicValue>,
        planned: Option<DynamicValue>,
        config: Option<DynamicValue>,
    ) -> apply_resource_change::Response {
        p.apply_resource_change(Request::new(apply_resource_change::Request {
            type_name: TYPE_NAME.into(),
            prior_state: prior,
            planned_state: planned,
            config,
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner()
    }

    #[tokio::test]
    async fn schema_declares_write_only_input() {
        let resp = provider()
            .get_provider_schema(Request::new(get_provider_schema::Request {}))
            .await
            .unwrap()
            .into_inner();

        let block = resp.resource_schemas[TYPE_NAME].block.clone().unwrap();
        let data_wo = block.attributes.iter().find(|a| a.name == "data_wo").unwrap();
        assert!(data_wo.write_only && data_wo.required);
        assert!(resp.server_capabilities.unwrap().plan_destroy);
        assert!(resp.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn metadata_lists_the_revealer() {
        let resp = provider()
            .get_metadata(Request::new(get_metadata::Request {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(resp.resources[0].type_name, TYPE_NAME);
    }

    #[tokio::test]
    async fn create_then_update_then_destroy() {
        let p = provider();

        // Create: plan leaves id and data unknown, apply reveals "hello".
        let planned = plan(&p, null_dynamic(), config("hello"), config("hello")).await;
        assert!(planned.diagnostics.is_empty());
        let planned_record = decoded(planned.planned_state.clone());
        assert!(planned_record.attribute("id").is_unknown());
        assert!(planned_record.attribute("data_wo").is_null());

        let created = apply(&p, null_dynamic(), planned.planned_state, config("hello")).await;
        assert!(created.diagnostics.is_empty());
        let state = decoded(created.new_state.clone());
        assert_eq!(state.attribute("data"), Value::known("hello"));
        assert!(matches!(state.attribute("id"), Value::Known(ref id) if !id.is_empty()));
        assert!(state.attribute("data_wo").is_null());

        // Update: Terraform proposes the prior computed values; the projection
        // still surfaces the new input.
        let proposed = dynamic(&[
            ("data_wo", Value::known("world")),
            ("data", state.attribute("data")),
            ("id", state.attribute("id")),
        ]);
        let planned = plan(&p, created.new_state.clone(), proposed, config("world")).await;
        let planned_record = decoded(planned.planned_state.clone());
        assert_eq!(planned_record.attribute("data"), Value::known("world"));
        assert_eq!(planned_record.attribute("id"), state.attribute("id"));

        let updated = apply(&p, created.new_state.clone(), planned.planned_state, config("world")).await;
        let new_state = decoded(updated.new_state.clone());
        assert_eq!(new_state.attribute("data"), Value::known("world"));
        assert_eq!(new_state.attribute("id"), state.attribute("id"));

        // Destroy.
        let planned = plan(&p, updated.new_state.clone(), null_dynamic(), null_dynamic()).await;
        assert!(decoded(planned.planned_state.clone()).is_null());
        let destroyed = apply(&p, updated.new_state, planned.planned_state, null_dynamic()).await;
        assert!(destroyed.diagnostics.is_empty());
        assert!(decoded(destroyed.new_state).is_null());
    }

    #[tokio::test]
    async fn unknown_input_is_not_projected() {
        let p = provider();
        let prior = dynamic(&[("data", Value::known("hello")), ("id", Value::known("X"))]);
        let proposed = dynamic(&[
            ("data_wo", Value::Unknown),
            ("data", Value::known("hello")),
            ("id", Value::known("X")),
        ]);
        let config = dynamic(&[("data_wo", Value::Unknown)]);

        let planned = decoded(plan(&p, prior, proposed, config).await.planned_state);
        assert_eq!(planned.attribute("data"), Value::known("hello"));
    }

    #[tokio::test]
    async fn import_seeds_state_from_the_identifier() {
        let resp = provider()
            .import_resource_state(Request::new(import_resource_state::Request {
                type_name: TYPE_NAME.into(),
                id: "hello".into(),
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(resp.imported_resources.len(), 1);
        let state = decoded(resp.imported_resources[0].state.clone());
        assert_eq!(state.attribute("id"), Value::known("hello"));
        assert_eq!(state.attribute("data"), Value::known("hello"));
    }

    #[tokio::test]
    async fn read_returns_state_unchanged() {
        let current = dynamic(&[("data", Value::known("hello")), ("id", Value::known("X"))]);
        let resp = provider()
            .read_resource(Request::new(read_resource::Request {
                type_name: TYPE_NAME.into(),
                current_state: current.clone(),
                private: b"opaque".to_vec(),
                ..Default::default()
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(resp.new_state, current);
        assert_eq!(resp.private, b"opaque");
    }

    #[tokio::test]
    async fn unknown_type_and_bad_payloads_surface_as_diagnostics() {
        let p = provider();

        let resp = p
            .read_resource(Request::new(read_resource::Request {
                type_name: "ephemeral-utils_nope".into(),
                ..Default::default()
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(resp.new_state.is_none());
        assert_eq!(resp.diagnostics[0].summary, "Resource Type Not Found");

        let garbage = Some(DynamicValue {
            msgpack: vec![0x81],
            json: Vec::new(),
        });
        let resp = plan(&p, garbage, config("x"), config("x")).await;
        assert!(resp.planned_state.is_none());
        assert_eq!(resp.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn validate_requires_write_only_support() {
        let p = provider();
        let request = |allowed: bool| {
            Request::new(validate_resource_config::Request {
                type_name: TYPE_NAME.into(),
                config: config("hello"),
                client_capabilities: Some(tfplugin6::ClientCapabilities {
                    deferral_allowed: false,
                    write_only_attributes_allowed: allowed,
                }),
            })
        };

        let ok = p.validate_resource_config(request(true)).await.unwrap().into_inner();
        assert!(ok.diagnostics.is_empty());

        let rejected = p.validate_resource_config(request(false)).await.unwrap().into_inner();
        assert_eq!(rejected.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn upgrade_re_encodes_stored_json() {
        let resp = provider()
            .upgrade_resource_state(Request::new(upgrade_resource_state::Request {
                type_name: TYPE_NAME.into(),
                version: 0,
                raw_state: Some(tfplugin6::RawState {
                    json: br#"{"id":"X","data":"hello","data_wo":null}"#.to_vec(),
                    flatmap: HashMap::new(),
                }),
            }))
            .await
            .unwrap()
            .into_inner();

        let state = decoded(resp.upgraded_state);
        assert_eq!(state.attribute("data"), Value::known("hello"));
    }

    #[tokio::test]
    async fn data_sources_are_not_offered() {
        let resp = provider()
            .read_data_source(Request::new(read_data_source::Request {
                type_name: "ephemeral-utils_anything".into(),
                ..Default::default()
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(resp.diagnostics[0].summary, "Data Source Type Not Found");
    }

    #[tokio::test]
    async fn configure_accepts_an_empty_provider_block() {
        let resp = provider()
            .configure_provider(Request::new(configure_provider::Request {
                terraform_version: "1.11.0".into(),
                config: None,
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(resp.diagnostics.is_empty());
    }
}
