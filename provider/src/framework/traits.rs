use std::collections::BTreeMap;

use crate::framework::diagnostics::Diagnostics;
use crate::framework::record::Record;
use crate::framework::schema::Schema;
use crate::framework::value::Value;

// ==============================================================================
// 1. Managed Resource Lifecycle
// ==============================================================================

/// The fixed set of operations a managed resource implements.
///
/// Every operation is a pure function of its inputs: records are decoded
/// before the call and whatever is returned is what Terraform persists. An
/// `Err` means the call failed as a whole and nothing is persisted.
pub trait Resource: Send + Sync {
    /// Full resource type name, e.g. `ephemeral-utils_revealer`.
    fn metadata(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    fn create(&self, plan: &Record, config: &Record) -> Result<Record, Diagnostics>;

    /// Refreshes prior state.
    fn read(&self, state: &Record) -> Result<Record, Diagnostics>;

    fn update(&self, plan: &Record, config: &Record) -> Result<Record, Diagnostics>;

    fn delete(&self, state: &Record) -> Result<(), Diagnostics>;
}

// ==============================================================================
// 2. Import
// ==============================================================================

pub trait ResourceWithImportState: Resource {
    /// Seeds state from an operator-supplied import identifier. There is no
    /// configuration during import.
    fn import_state(&self, id: &str) -> Result<Record, Diagnostics>;
}

// ==============================================================================
// 3. Plan Modification
// ==============================================================================

pub trait ResourceWithModifyPlan: Resource {
    /// Runs after the default plan has been computed and may force planned
    /// attribute values. `state` is null on create, `plan` is null on destroy.
    fn modify_plan(
        &self,
        state: &Record,
        plan: &Record,
        config: &Record,
    ) -> Result<PlanAmendment, Diagnostics>;
}

/// Attribute values a resource forces onto the planned state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanAmendment {
    changes: BTreeMap<String, Value<String>>,
}

impl PlanAmendment {
    pub fn set_attribute(&mut self, name: &str, value: Value<String>) {
        self.changes.insert(name.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Writes the forced values into `plan`. A null plan stays null: there is
    /// nothing to amend when the resource is being destroyed.
    pub fn apply_to(self, plan: &mut Record) {
        if plan.is_null() {
            return;
        }
        for (name, value) in self.changes {
            plan.set_attribute(&name, value);
        }
    }
}
