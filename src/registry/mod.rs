use serde_json::Value;
use std::collections::HashMap;

pub mod args;
pub mod dispatch;
pub mod failure;
pub mod schema;
pub mod validate;

use args::ToolArgs;
use failure::Failure;
use schema::ToolSchema;

pub type Handler = fn(&ToolArgs) -> Result<Value, Failure>;

/// Static metadata describing one invocable tool. Built once at registry
/// construction and immutable thereafter.
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ToolSchema,
    pub handler: Handler,
}

impl ToolDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: ToolSchema,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            description,
            schema,
            handler,
        }
    }
}

/// Name-indexed catalog of every available operation. Descriptors are
/// appended in batches (one per adapter group) at startup; lookups are O(1)
/// and `list` preserves registration order.
#[derive(Default)]
pub struct Registry {
    entries: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one adapter group's descriptors. Name uniqueness across the
    /// whole registry is a hard invariant; a collision aborts startup.
    pub fn register(&mut self, group: Vec<ToolDescriptor>) {
        for descriptor in group {
            if self.index.contains_key(descriptor.name) {
                panic!("duplicate tool name registered: {}", descriptor.name);
            }
            self.index.insert(descriptor.name, self.entries.len());
            self.entries.push(descriptor);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
