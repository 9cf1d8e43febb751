//! Conversion of tool descriptors into the model's function-calling schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::ToolDescriptor;

/// A tool in the shape function-calling models expect:
/// `{"type": "function", "function": {name, description, parameters}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for FunctionSpec {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: descriptor.name.clone(),
                description: descriptor.description.clone().unwrap_or_default(),
                parameters: descriptor
                    .parameter_schema
                    .clone()
                    .unwrap_or_else(|| Value::Object(Default::default())),
            },
        }
    }
}

/// Format descriptors into function specs, preserving order.
pub fn format_tools(descriptors: &[ToolDescriptor]) -> Vec<FunctionSpec> {
    descriptors.iter().map(FunctionSpec::from).collect()
}
