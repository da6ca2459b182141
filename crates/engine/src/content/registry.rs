use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::warn;

use super::types::{record_type_tag, BuildError};
use crate::behaviors::{self, Behavior};
use crate::components::{self, Component};

pub type BuildFn<T> = fn(&Value) -> Result<Box<T>, BuildError>;

/// Maps a record's `type` tag to the function that validates and builds it.
pub struct BuilderRegistry<T: ?Sized> {
    kind: &'static str,
    builders: HashMap<String, BuildFn<T>>,
}

pub type ComponentRegistry = BuilderRegistry<dyn Component>;
pub type BehaviorRegistry = BuilderRegistry<dyn Behavior>;

impl<T: ?Sized> BuilderRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            builders: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Later registrations for the same tag replace earlier ones.
    pub fn register(&mut self, type_tag: impl Into<String>, builder: BuildFn<T>) {
        let type_tag = type_tag.into();
        if self.builders.insert(type_tag.clone(), builder).is_some() {
            warn!(kind = self.kind, type_tag = %type_tag, "builder_replaced");
        }
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.builders.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn build(&self, record: &Value) -> Result<Box<T>, BuildError> {
        let type_tag = record_type_tag(record).ok_or(BuildError::MissingType { kind: self.kind })?;
        let builder =
            self.builders
                .get(type_tag)
                .ok_or_else(|| BuildError::UnregisteredBuilder {
                    kind: self.kind,
                    type_tag: type_tag.to_string(),
                })?;
        builder(record)
    }
}

impl<T: ?Sized> fmt::Debug for BuilderRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("kind", &self.kind)
            .field("type_tags", &self.type_tags())
            .finish()
    }
}

/// Both registries a level needs to turn records into runtime objects.
#[derive(Debug)]
pub struct Builders {
    pub components: ComponentRegistry,
    pub behaviors: BehaviorRegistry,
}

impl Default for Builders {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl Builders {
    pub fn empty() -> Self {
        Self {
            components: BuilderRegistry::new("component"),
            behaviors: BuilderRegistry::new("behavior"),
        }
    }

    pub fn with_builtin() -> Self {
        let mut builders = Self::empty();
        components::register_builtin(&mut builders.components);
        behaviors::register_builtin(&mut builders.behaviors);
        builders
    }
}
