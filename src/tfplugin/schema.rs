//! Schema declarations rendered into `tfplugin6.Schema` messages.

use super::proto::tfplugin6::{self, StringKind};

/// Primitive attribute types understood by the value codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
}

impl AttributeType {
    /// cty type constraint as JSON, the wire form of `Schema.Attribute.type`
    pub fn cty_json(&self) -> &'static [u8] {
        match self {
            AttributeType::String => b"\"string\"",
            AttributeType::Number => b"\"number\"",
            AttributeType::Bool => b"\"bool\"",
        }
    }
}

/// A single top-level attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
}

impl Attribute {
    fn new(name: &'static str, ty: AttributeType) -> Self {
        Self {
            name,
            ty,
            description: "",
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
        }
    }

    pub fn required(name: &'static str, ty: AttributeType) -> Self {
        Self { required: true, ..Self::new(name, ty) }
    }

    pub fn optional(name: &'static str, ty: AttributeType) -> Self {
        Self { optional: true, ..Self::new(name, ty) }
    }

    pub fn computed(name: &'static str, ty: AttributeType) -> Self {
        Self { computed: true, ..Self::new(name, ty) }
    }

    /// Optional in configuration, filled in by the provider when unset
    pub fn optional_computed(name: &'static str, ty: AttributeType) -> Self {
        Self { optional: true, computed: true, ..Self::new(name, ty) }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn to_proto(&self) -> tfplugin6::schema::Attribute {
        tfplugin6::schema::Attribute {
            name: self.name.to_string(),
            r#type: self.ty.cty_json().to_vec(),
            description: self.description.to_string(),
            required: self.required,
            optional: self.optional,
            computed: self.computed,
            sensitive: self.sensitive,
            description_kind: StringKind::Markdown as i32,
            deprecated: false,
            write_only: false,
        }
    }
}

/// Flat attribute block with a schema version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub version: i64,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Block {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { version: 0, description: "", attributes }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn to_proto(&self) -> tfplugin6::Schema {
        tfplugin6::Schema {
            version: self.version,
            block: Some(tfplugin6::schema::Block {
                version: self.version,
                attributes: self.attributes.iter().map(Attribute::to_proto).collect(),
                block_types: Vec::new(),
                description: self.description.to_string(),
                description_kind: StringKind::Markdown as i32,
                deprecated: false,
            }),
        }
    }
}
