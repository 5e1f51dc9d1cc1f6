//! Namespace-searched type registry.
//!
//! The server constructs client-side objects by string type name. Each
//! namespace is one constructor table; the registry searches its
//! namespaces in configuration order and the first one containing the
//! name wins. Constructors validate their own argument shapes.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::FactoryError;
use crate::hive::Hive;
use crate::object::{ObjectId, ObjectRc};
use crate::value::Resolved;

/// Builds one object from its server-assigned id and resolved
/// constructor arguments.
pub type Constructor =
    Box<dyn Fn(&Rc<Hive>, ObjectId, &[Resolved]) -> Result<ObjectRc, FactoryError>>;

/// One named constructor table.
pub struct Namespace {
    name: String,
    types: HashMap<String, Constructor>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register<F>(&mut self, type_name: &str, constructor: F)
    where
        F: Fn(&Rc<Hive>, ObjectId, &[Resolved]) -> Result<ObjectRc, FactoryError> + 'static,
    {
        self.types.insert(type_name.to_string(), Box::new(constructor));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn get(&self, type_name: &str) -> Option<&Constructor> {
        self.types.get(type_name)
    }
}

/// Ordered list of namespaces searched per construction callback.
#[derive(Default)]
pub struct TypeRegistry {
    namespaces: Vec<Namespace>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(&mut self, namespace: Namespace) {
        self.namespaces.push(namespace);
    }

    /// Resolve `type_name` and run its constructor.
    ///
    /// `TypeNotFound` when no namespace knows the name; constructor
    /// failures come back as `Construction`.
    pub fn create(
        &self,
        hive: &Rc<Hive>,
        type_name: &str,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        for namespace in &self.namespaces {
            if let Some(constructor) = namespace.get(type_name) {
                debug!("constructing {type_name} (id {id}) from namespace {}", namespace.name);
                return constructor(hive, id, args);
            }
        }
        Err(FactoryError::TypeNotFound {
            type_name: type_name.to_string(),
            searched: self.namespaces.iter().map(|n| n.name.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, scripted_hive};
    use crate::value::Resolved;

    fn probe_namespace(name: &str) -> Namespace {
        let mut ns = Namespace::new(name);
        ns.register("Probe", Probe::construct);
        ns
    }

    #[test]
    fn unknown_type_lists_searched_namespaces() {
        let (hive, _transport) = scripted_hive();
        let mut registry = TypeRegistry::new();
        registry.add_namespace(probe_namespace("widgets"));
        registry.add_namespace(probe_namespace("dialogs"));

        let err = registry
            .create(&hive, "Gauge", ObjectId(1), &[])
            .err()
            .unwrap();
        match err {
            FactoryError::TypeNotFound { type_name, searched } => {
                assert_eq!(type_name, "Gauge");
                assert_eq!(searched, vec!["widgets".to_string(), "dialogs".to_string()]);
            }
            other => panic!("expected TypeNotFound, got {other}"),
        }
    }

    #[test]
    fn first_matching_namespace_wins() {
        let (hive, _transport) = scripted_hive();
        let mut first = Namespace::new("first");
        first.register("Probe", |hive, id, _args| {
            Probe::construct(hive, id, &[Resolved::Str("from-first".into())])
        });
        let mut registry = TypeRegistry::new();
        registry.add_namespace(first);
        registry.add_namespace(probe_namespace("second"));

        let object = registry
            .create(&hive, "Probe", ObjectId(1), &[])
            .unwrap();
        let object = object.borrow();
        let probe = object.as_any().downcast_ref::<Probe>().unwrap();
        assert_eq!(probe.label, "from-first");
    }

    #[test]
    fn constructor_failure_is_not_type_not_found() {
        let (hive, _transport) = scripted_hive();
        let mut registry = TypeRegistry::new();
        registry.add_namespace(probe_namespace("widgets"));

        // Probe's constructor wants its first argument to be a string.
        let err = registry
            .create(&hive, "Probe", ObjectId(1), &[Resolved::Int(9)])
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::Construction { .. }));
    }
}
