use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use thiserror::Error;

/// Validation failures surfaced by [`SchemaRegistry::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// The document carries no `@context`, or no schema was declared for it.
    #[error("no schema declared for this document")]
    NotDeclared,
    /// The declared schema rejected the document.
    #[error("schema violation: {detail}")]
    Violation { detail: Value },
}

/// A schema check: returns the violation detail when the document is invalid.
pub type SchemaCheck = Box<dyn Fn(&Value) -> Result<(), Value> + Send + Sync>;

/// Schemas keyed by dialect URI, the string a document's `@context` names.
#[derive(Default)]
pub struct SchemaRegistry {
    checks: Mutex<HashMap<String, Arc<dyn Fn(&Value) -> Result<(), Value> + Send + Sync>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `check` as the schema for `context_uri`, replacing any prior one.
    pub fn declare<F>(&self, context_uri: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.lock().insert(context_uri.into(), Arc::new(check));
    }

    /// Look up the document's `@context` and run the declared check.
    pub fn validate(&self, document: &Value) -> Result<(), SchemaError> {
        let context = document
            .get("@context")
            .and_then(Value::as_str)
            .ok_or(SchemaError::NotDeclared)?;
        let check = self
            .lock()
            .get(context)
            .cloned()
            .ok_or(SchemaError::NotDeclared)?;
        check(document).map_err(|detail| SchemaError::Violation { detail })
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn Fn(&Value) -> Result<(), Value> + Send + Sync>>>
    {
        match self.checks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const DIALECT: &str = "http://remotestorage.io/spec/modules/demo/config";

    fn registry_requiring_host() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.declare(DIALECT, |document| {
            if document.get("host").is_some() {
                Ok(())
            } else {
                Err(json!({ "missing": "host" }))
            }
        });
        registry
    }

    #[test]
    fn accepts_a_conforming_document() {
        let registry = registry_requiring_host();
        let document = json!({ "@context": DIALECT, "host": "irc.libera.chat" });
        assert_eq!(registry.validate(&document), Ok(()));
    }

    #[test]
    fn reports_the_violation_detail() {
        let registry = registry_requiring_host();
        let document = json!({ "@context": DIALECT, "port": 6667 });
        assert_eq!(
            registry.validate(&document),
            Err(SchemaError::Violation {
                detail: json!({ "missing": "host" })
            })
        );
    }

    #[test]
    fn undeclared_dialect_is_not_declared() {
        let registry = registry_requiring_host();
        let document = json!({ "@context": "http://example.com/other", "host": "h" });
        assert_eq!(registry.validate(&document), Err(SchemaError::NotDeclared));
    }

    #[test]
    fn missing_context_is_not_declared() {
        let registry = registry_requiring_host();
        assert_eq!(
            registry.validate(&json!({ "host": "h" })),
            Err(SchemaError::NotDeclared)
        );
    }

    #[test]
    fn redeclaring_replaces_the_check() {
        let registry = registry_requiring_host();
        registry.declare(DIALECT, |_| Ok(()));
        assert_eq!(registry.validate(&json!({ "@context": DIALECT })), Ok(()));
    }
}
