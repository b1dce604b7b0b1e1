// provider/src/provider.rs

use crate::framework::diagnostics::Diagnostics;
use crate::framework::record::{self, Attributes, FromRecord, Record};
use crate::framework::schema::{Attribute, Schema};
use crate::framework::value::Value;

/// Prefix of every resource type name, e.g. `ephemeral-utils_revealer`.
pub const PROVIDER_TYPE_NAME: &str = "ephemeral-utils";

/// The `provider "ephemeral-utils" {}` block.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProviderModel {
    pub endpoint: Value<String>,
}

impl FromRecord for ProviderModel {
    fn from_record(attributes: &Attributes) -> Result<Self, Diagnostics> {
        record::expect_attributes(attributes, &["endpoint"])?;
        Ok(Self {
            endpoint: attributes.get("endpoint").cloned().unwrap_or_default(),
        })
    }
}

pub fn schema() -> Schema {
    Schema::new("Utilities for working with ephemeral and write-only values.")
        .attribute(
            Attribute::string("endpoint")
                .description("Example provider attribute")
                .optional(),
        )
}

/// Reads the provider block. An omitted block arrives as a null record and
/// is treated as an empty configuration.
pub fn configure(config: &Record) -> Result<ProviderModel, Diagnostics> {
    if config.is_null() {
        return Ok(ProviderModel::default());
    }
    config.get::<ProviderModel>()
}
