// provider/src/framework/schema.rs

use crate::server::tfplugin6;

/// cty type JSON for `string`. Every attribute this provider declares is a string.
const STRING_TYPE: &[u8] = b"\"string\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanModifier {
    /// Keep the prior state value when the planned value would otherwise be
    /// unknown. Used for identifiers that never change after creation.
    UseStateForUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub write_only: bool,
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            write_only: false,
            plan_modifiers: Vec::new(),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    fn to_proto(&self) -> tfplugin6::schema::Attribute {
        tfplugin6::schema::Attribute {
            name: self.name.to_string(),
            r#type: STRING_TYPE.to_vec(),
            description: self.description.to_string(),
            required: self.required,
            optional: self.optional,
            computed: self.computed,
            sensitive: self.sensitive,
            description_kind: tfplugin6::StringKind::Markdown as i32,
            deprecated: false,
            write_only: self.write_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub version: i64,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: &'static str) -> Self {
        Self {
            version: 0,
            description,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn write_only_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().filter(|a| a.write_only).map(|a| a.name)
    }

    pub fn to_proto(&self) -> tfplugin6::Schema {
        tfplugin6::Schema {
            version: self.version,
            block: Some(tfplugin6::schema::Block {
                version: self.version,
                attributes: self.attributes.iter().map(Attribute::to_proto).collect(),
                description: self.description.to_string(),
                description_kind: tfplugin6::StringKind::Markdown as i32,
                deprecated: false,
            }),
        }
    }
}
