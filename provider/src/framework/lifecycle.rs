// provider/src/framework/lifecycle.rs
//
// Drivers between the protocol calls and the resource traits. They carry the
// host framework's defaults: computed-attribute unknown marking, plan
// modifiers, write-only nulling and schema checks.

use std::collections::HashMap;

use tracing::debug;

use crate::framework::codec;
use crate::framework::diagnostics::{Diagnostic, Diagnostics};
use crate::framework::record::{Attributes, Record};
use crate::framework::schema::{PlanModifier, Schema};
use crate::framework::traits::{Resource, ResourceWithImportState, ResourceWithModifyPlan};
use crate::framework::value::Value;

/// Checks a configuration against the schema before any planning happens.
pub fn validate_config(
    schema: &Schema,
    config: &Record,
    write_only_allowed: bool,
) -> Result<(), Diagnostics> {
    let Some(attrs) = config.attributes() else {
        return Ok(());
    };

    let mut diags = Diagnostics::new();
    for name in attrs.keys().filter(|name| schema.get(name).is_none()) {
        diags.push(
            Diagnostic::error(
                "Unsupported argument",
                format!("An argument named {:?} is not expected here.", name),
            )
            .with_attribute(name.clone()),
        );
    }

    for attr in &schema.attributes {
        let value = config.attribute(attr.name);
        if attr.required && value.is_null() {
            diags.push(
                Diagnostic::error(
                    "Missing Configuration for Required Attribute",
                    format!("Must set a configuration value for the {} attribute.", attr.name),
                )
                .with_attribute(attr.name),
            );
        }
        if attr.computed && !attr.optional && !attr.required && !value.is_null() {
            diags.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("Cannot set value for the {} attribute as it is computed only.", attr.name),
                )
                .with_attribute(attr.name),
            );
        }
        // 🛡️ Terraform releases without write-only support would persist the value.
        if attr.write_only && !write_only_allowed && !value.is_null() {
            diags.push(
                Diagnostic::error(
                    "WriteOnly Attribute Not Allowed",
                    format!(
                        "The resource contains a non-null value for WriteOnly attribute {}. \
                         Write-only attributes are only supported in Terraform 1.11 and later.",
                        attr.name
                    ),
                )
                .with_attribute(attr.name),
            );
        }
    }

    if diags.has_error() {
        return Err(diags);
    }
    Ok(())
}

/// Computes the planned state for a resource change.
///
/// A null `proposed` is a destroy and stays null. Otherwise the proposal is
/// adjusted the way the host framework would before the resource's own
/// `modify_plan` gets the final say.
pub fn plan<R: ResourceWithModifyPlan>(
    resource: &R,
    prior: &Record,
    proposed: &Record,
    config: &Record,
) -> Result<Record, Diagnostics> {
    let schema = resource.schema();
    let mut planned = proposed.clone();
    planned.null_attributes(schema.write_only_attributes());

    if !planned.is_null() {
        let mut comparable_prior = prior.clone();
        comparable_prior.null_attributes(schema.write_only_attributes());

        if prior.is_null() || planned != comparable_prior {
            mark_computed_nulls_unknown(&schema, config, &mut planned);
        }
        apply_plan_modifiers(&schema, prior, config, &mut planned);
    }

    let amendment = resource.modify_plan(prior, &planned, config)?;
    if !amendment.is_empty() {
        debug!(?amendment, "resource amended the plan");
    }
    amendment.apply_to(&mut planned);

    Ok(planned)
}

/// Computed attributes the configuration leaves null will be set by the
/// provider during apply, so their planned value is unknown.
fn mark_computed_nulls_unknown(schema: &Schema, config: &Record, planned: &mut Record) {
    for attr in schema.attributes.iter().filter(|a| a.computed) {
        if planned.attribute(attr.name).is_null() && config.attribute(attr.name).is_null() {
            planned.set_attribute(attr.name, Value::Unknown);
        }
    }
}

fn apply_plan_modifiers(schema: &Schema, prior: &Record, config: &Record, planned: &mut Record) {
    for attr in &schema.attributes {
        for modifier in &attr.plan_modifiers {
            match modifier {
                PlanModifier::UseStateForUnknown => {
                    let state_value = prior.attribute(attr.name);
                    if state_value.is_null()
                        || !planned.attribute(attr.name).is_unknown()
                        || config.attribute(attr.name).is_unknown()
                    {
                        continue;
                    }
                    planned.set_attribute(attr.name, state_value);
                }
            }
        }
    }
}

/// Applies a planned change: destroy, create or update depending on which
/// sides are null. The returned record is what Terraform persists.
pub fn apply<R: Resource>(
    resource: &R,
    prior: &Record,
    planned: &Record,
    config: &Record,
) -> Result<Record, Diagnostics> {
    if planned.is_null() {
        if !prior.is_null() {
            resource.delete(prior)?;
        }
        return Ok(Record::null());
    }

    let mut new_state = if prior.is_null() {
        resource.create(planned, config)?
    } else {
        resource.update(planned, config)?
    };

    // 🛡️ Write-only values must never reach persisted state.
    new_state.null_attributes(resource.schema().write_only_attributes());
    Ok(new_state)
}

pub fn read<R: Resource>(resource: &R, state: &Record) -> Result<Record, Diagnostics> {
    let mut new_state = resource.read(state)?;
    new_state.null_attributes(resource.schema().write_only_attributes());
    Ok(new_state)
}

pub fn import<R: ResourceWithImportState>(resource: &R, id: &str) -> Result<Record, Diagnostics> {
    if id.is_empty() {
        return Err(Diagnostic::error(
            "Missing Resource Import Identifier",
            "An import identifier is required to import this resource.",
        )
        .into());
    }

    let mut state = resource.import_state(id)?;
    state.null_attributes(resource.schema().write_only_attributes());
    Ok(state)
}

/// Re-reads stored state written by an earlier provider release.
///
/// Only the current schema version is understood; stored state is either
/// JSON or, for state written by very old SDKs, a flatmap.
pub fn upgrade(
    schema: &Schema,
    version: i64,
    json: &[u8],
    flatmap: &HashMap<String, String>,
) -> Result<Record, Diagnostics> {
    if version != schema.version {
        return Err(Diagnostic::error(
            "Unable to Upgrade Resource State",
            format!(
                "Stored state is at schema version {}, this provider only reads version {}.",
                version, schema.version
            ),
        )
        .into());
    }

    let mut record = if !json.is_empty() {
        codec::decode_json(json)?
    } else if !flatmap.is_empty() {
        let attributes: Attributes = schema
            .attributes
            .iter()
            .filter_map(|attr| {
                flatmap
                    .get(attr.name)
                    .map(|v| (attr.name.to_string(), Value::known(v.as_str())))
            })
            .collect();
        Record::object(attributes)
    } else {
        Record::null()
    };

    if let Some(stray) = record
        .attributes()
        .and_then(|attrs| attrs.keys().find(|name| schema.get(name).is_none()))
    {
        return Err(Diagnostic::error(
            "Unable to Read Previously Saved State for UpgradeResourceState",
            format!("Stored state contains attribute {:?}, which is not in the schema.", stray),
        )
        .with_attribute(stray.clone())
        .into());
    }

    record.null_attributes(schema.write_only_attributes());
    Ok(record)
}
