// provider/src/resources/revealer.rs
//
// The revealer copies a write-only input into a persisted, non-sensitive
// attribute so other resources can reference it.

use tracing::debug;

use crate::framework::diagnostics::Diagnostics;
use crate::framework::record::{self, Attributes, FromRecord, IntoRecord, Record};
use crate::framework::schema::{Attribute, PlanModifier, Schema};
use crate::framework::secrets::WriteOnlyString;
use crate::framework::traits::{
    PlanAmendment, Resource, ResourceWithImportState, ResourceWithModifyPlan,
};
use crate::framework::value::Value;

const DATA_WO: &str = "data_wo";
const DATA: &str = "data";
const ID: &str = "id";

pub struct RevealerResource;

/// Plan, state and configuration all share this shape. `data_wo` is only
/// ever populated from configuration.
#[derive(Debug, Default)]
pub struct RevealerModel {
    pub data_wo: Value<WriteOnlyString>,
    pub data: Value<String>,
    pub id: Value<String>,
}

impl FromRecord for RevealerModel {
    fn from_record(attributes: &Attributes) -> Result<Self, Diagnostics> {
        record::expect_attributes(attributes, &[DATA_WO, DATA, ID])?;

        let get = |name: &str| attributes.get(name).cloned().unwrap_or_default();
        Ok(Self {
            data_wo: get(DATA_WO).map(WriteOnlyString::new),
            data: get(DATA),
            id: get(ID),
        })
    }
}

impl IntoRecord for RevealerModel {
    fn into_record(self, attributes: &mut Attributes) {
        // 🛡️ The write-only value is never written back, whatever the model holds.
        attributes.insert(DATA_WO.to_string(), Value::Null);
        attributes.insert(DATA.to_string(), self.data);
        attributes.insert(ID.to_string(), self.id);
    }
}

impl Resource for RevealerResource {
    fn metadata(&self, provider_type_name: &str) -> String {
        format!("{}_revealer", provider_type_name)
    }

    fn schema(&self) -> Schema {
        Schema::new("Revealer resource")
            .attribute(
                Attribute::string(DATA_WO)
                    .description("A non sensitive attribute from an ephemeral resource")
                    .write_only()
                    .required(),
            )
            .attribute(
                Attribute::string(DATA)
                    .description("A persisted attribute from an ephemeral resource that is not sensitive.")
                    .computed(),
            )
            .attribute(
                Attribute::string(ID)
                    .description("identifier")
                    .computed()
                    .plan_modifier(PlanModifier::UseStateForUnknown),
            )
    }

    fn create(&self, plan: &Record, config: &Record) -> Result<Record, Diagnostics> {
        let (mut data, config) =
            Diagnostics::join(plan.get::<RevealerModel>(), config.get::<RevealerModel>())?;

        let revealed = config.data_wo.map(|wo| wo.reveal());
        data.id = revealed.clone();
        data.data = revealed;

        debug!(id = ?data.id, "revealer created");
        Ok(Record::from_model(data))
    }

    fn read(&self, state: &Record) -> Result<Record, Diagnostics> {
        let data = state.get::<RevealerModel>()?;
        Ok(Record::from_model(data))
    }

    fn update(&self, plan: &Record, config: &Record) -> Result<Record, Diagnostics> {
        let (mut data, config) =
            Diagnostics::join(plan.get::<RevealerModel>(), config.get::<RevealerModel>())?;

        // The identifier is whatever the plan carried over from state.
        data.data = config.data_wo.map(|wo| wo.reveal());

        debug!(id = ?data.id, "revealer updated");
        Ok(Record::from_model(data))
    }

    fn delete(&self, state: &Record) -> Result<(), Diagnostics> {
        // Nothing exists outside of Terraform state; removal is the whole job.
        let data = state.get::<RevealerModel>()?;
        debug!(id = ?data.id, "revealer deleted");
        Ok(())
    }
}

impl ResourceWithImportState for RevealerResource {
    fn import_state(&self, id: &str) -> Result<Record, Diagnostics> {
        let mut state = Record::null();
        state.set_attribute(ID, Value::known(id));
        state.set_attribute(DATA, Value::known(id));
        Ok(state)
    }
}

impl ResourceWithModifyPlan for RevealerResource {
    /// Makes a changed `data_wo` visible as a planned change of `data`.
    ///
    /// `data_wo` is never stored, so the default plan has no prior value to
    /// diff it against and would report no change at all.
    fn modify_plan(
        &self,
        state: &Record,
        plan: &Record,
        config: &Record,
    ) -> Result<PlanAmendment, Diagnostics> {
        let mut amendment = PlanAmendment::default();

        // Creating (no prior state) or destroying (no plan): the default plan is fine.
        if state.is_null() || plan.is_null() {
            return Ok(amendment);
        }

        let config = config.get::<RevealerModel>()?;
        if let Value::Known(wo) = &config.data_wo {
            amendment.set_attribute(DATA, Value::Known(wo.reveal()));
        }

        Ok(amendment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(data_wo: Value<String>) -> Record {
        let mut r = Record::null();
        r.set_attribute(DATA_WO, data_wo);
        r.set_attribute(DATA, Value::Null);
        r.set_attribute(ID, Value::Null);
        r
    }

    fn state(id: &str, data: &str) -> Record {
        let mut r = Record::null();
        r.set_attribute(DATA_WO, Value::Null);
        r.set_attribute(DATA, Value::known(data));
        r.set_attribute(ID, Value::known(id));
        r
    }

    fn unknown_plan() -> Record {
        let mut r = Record::null();
        r.set_attribute(DATA_WO, Value::Null);
        r.set_attribute(DATA, Value::Unknown);
        r.set_attribute(ID, Value::Unknown);
        r
    }

    #[test]
    fn create_reveals_input_into_id_and_data() {
        for input in ["hello", "", "with spaces and ünïcode"] {
            let created = RevealerResource
                .create(&unknown_plan(), &config(Value::known(input)))
                .unwrap();

            assert_eq!(created.attribute(ID), Value::known(input));
            assert_eq!(created.attribute(DATA), Value::known(input));
            assert!(created.attribute(DATA_WO).is_null());
        }
    }

    #[test]
    fn read_round_trips_state() {
        let s = state("X", "hello");
        let read = RevealerResource.read(&s).unwrap();
        assert_eq!(read, s);
        assert_eq!(RevealerResource.read(&read).unwrap(), s);
    }

    #[test]
    fn update_replaces_data_and_keeps_id() {
        let plan = state("X", "hello");
        let updated = RevealerResource
            .update(&plan, &config(Value::known("world")))
            .unwrap();

        assert_eq!(updated, state("X", "world"));
    }

    #[test]
    fn import_seeds_both_fields_from_the_token() {
        let imported = RevealerResource.import_state("hello").unwrap();
        assert_eq!(imported.attribute(ID), Value::known("hello"));
        assert_eq!(imported.attribute(DATA), Value::known("hello"));
    }

    #[test]
    fn delete_only_needs_a_readable_state() {
        assert!(RevealerResource.delete(&state("X", "hello")).is_ok());
        assert!(RevealerResource.delete(&Record::null()).is_err());
    }

    #[test]
    fn modify_plan_is_skipped_on_create_and_destroy() {
        let cfg = config(Value::known("world"));

        let on_create = RevealerResource
            .modify_plan(&Record::null(), &unknown_plan(), &cfg)
            .unwrap();
        assert!(on_create.is_empty());

        let on_destroy = RevealerResource
            .modify_plan(&state("X", "hello"), &Record::null(), &cfg)
            .unwrap();
        assert!(on_destroy.is_empty());

        // Skipped before config extraction, so even a null config is fine.
        let no_config = RevealerResource
            .modify_plan(&Record::null(), &Record::null(), &Record::null())
            .unwrap();
        assert!(no_config.is_empty());
    }

    #[test]
    fn modify_plan_projects_known_input_onto_data() {
        let prior = state("X", "hello");
        let amendment = RevealerResource
            .modify_plan(&prior, &prior, &config(Value::known("world")))
            .unwrap();

        let mut planned = prior.clone();
        amendment.apply_to(&mut planned);
        assert_eq!(planned, state("X", "world"));
    }

    #[test]
    fn modify_plan_leaves_unknown_and_null_input_alone() {
        let prior = state("X", "hello");
        for input in [Value::Unknown, Value::Null] {
            let amendment = RevealerResource
                .modify_plan(&prior, &prior, &config(input))
                .unwrap();
            assert!(amendment.is_empty());
        }
    }

    #[test]
    fn extraction_failures_from_plan_and_config_are_reported_together() {
        let mut bad_plan = unknown_plan();
        bad_plan.set_attribute("surprise", Value::known("x"));
        let mut bad_config = config(Value::known("v"));
        bad_config.set_attribute("other", Value::known("y"));

        let diags = RevealerResource.create(&bad_plan, &bad_config).unwrap_err();
        let attrs: Vec<_> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, ["surprise", "other"]);
    }

    #[test]
    fn model_debug_output_hides_the_write_only_value() {
        let model: RevealerModel = config(Value::known("hunter2")).get().unwrap();
        assert!(!format!("{:?}", model).contains("hunter2"));
    }
}
