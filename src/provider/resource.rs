//! Managed resource trait and types
//!
//! Defines the interface every managed resource type implements. Connection
//! state is never stored on a resource: each operation receives the
//! [`ProviderData`] published by a successful configure.

use crate::errors::{ProviderError, Result};
use crate::secrets::VaultStore;
use crate::tfplugin::{Block, Diagnostics, ObjectValue, Value};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Handles published to resources once the provider is configured.
#[derive(Debug, Clone)]
pub struct ProviderData {
    pub vault: Arc<dyn VaultStore>,
    /// Provider version, embedded in the managed-by footer
    pub version: String,
}

/// Lifecycle operation, used to pick diagnostic summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A managed resource type.
///
/// Implementations must be Send + Sync: Terraform drives instances of the
/// same type concurrently.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name, e.g. `supabase-vault_secret`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Block;

    /// Extra configuration checks beyond type conformance
    fn validate(&self, _config: &ObjectValue, _diagnostics: &mut Diagnostics) {}

    /// Compute the planned state.
    ///
    /// `proposed` is `None` for a destroy plan and is passed through. Computed
    /// attributes left unset in configuration become unknown on create and
    /// keep their prior value on update.
    fn plan(
        &self,
        prior: Option<&ObjectValue>,
        proposed: Option<ObjectValue>,
        config: Option<&ObjectValue>,
    ) -> Result<Option<ObjectValue>> {
        let Some(mut planned) = proposed else {
            return Ok(None);
        };

        for attribute in self.schema().attributes.iter().filter(|a| a.computed) {
            if config.is_some_and(|c| !c.get(attribute.name).is_null()) {
                continue;
            }

            let value = match prior {
                Some(prior) => prior.get(attribute.name).clone(),
                None => Value::Unknown,
            };
            planned.set(attribute.name, value);
        }

        Ok(Some(planned))
    }

    /// Create the remote object; the returned state must be fully known
    async fn create(&self, data: &ProviderData, planned: &ObjectValue) -> Result<ObjectValue>;

    /// Refresh state; `Ok(None)` removes the instance from state
    async fn read(&self, data: &ProviderData, current: &ObjectValue) -> Result<Option<ObjectValue>>;

    async fn update(
        &self,
        data: &ProviderData,
        prior: &ObjectValue,
        planned: &ObjectValue,
    ) -> Result<ObjectValue>;

    async fn delete(&self, data: &ProviderData, prior: &ObjectValue) -> Result<()>;

    /// Seed state from a user-supplied import identifier
    async fn import(&self, data: &ProviderData, id: &str) -> Result<ObjectValue>;

    /// Diagnostic summary for a failed operation
    fn error_summary(&self, operation: Operation, _error: &ProviderError) -> String {
        format!("Unable to {} {}", operation, self.type_name())
    }
}

/// Known, non-null string attribute or an error naming it
pub(crate) fn required_string<'a>(object: &'a ObjectValue, name: &str) -> Result<&'a str> {
    match object.get(name) {
        Value::String(s) => Ok(s),
        Value::Unknown => Err(ProviderError::codec(format!(
            "attribute \"{}\" is unknown; it must be known before apply",
            name
        ))),
        _ => Err(ProviderError::codec(format!("attribute \"{}\" is required", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfplugin::{Attribute, AttributeType};

    struct Widget;

    #[async_trait]
    impl Resource for Widget {
        fn type_name(&self) -> &'static str {
            "test_widget"
        }

        fn schema(&self) -> Block {
            Block::new(vec![
                Attribute::computed("id", AttributeType::String),
                Attribute::required("name", AttributeType::String),
                Attribute::optional_computed("zone", AttributeType::String),
            ])
        }

        async fn create(&self, _: &ProviderData, planned: &ObjectValue) -> Result<ObjectValue> {
            Ok(planned.clone())
        }

        async fn read(&self, _: &ProviderData, current: &ObjectValue) -> Result<Option<ObjectValue>> {
            Ok(Some(current.clone()))
        }

        async fn update(&self, _: &ProviderData, _: &ObjectValue, planned: &ObjectValue) -> Result<ObjectValue> {
            Ok(planned.clone())
        }

        async fn delete(&self, _: &ProviderData, _: &ObjectValue) -> Result<()> {
            Ok(())
        }

        async fn import(&self, _: &ProviderData, id: &str) -> Result<ObjectValue> {
            Ok(ObjectValue::new().with("id", Value::string(id)))
        }
    }

    #[test]
    fn test_create_plan_marks_unset_computed_unknown() {
        let config = ObjectValue::new().with("name", Value::string("a"));
        let planned = Widget.plan(None, Some(config.clone()), Some(&config)).unwrap().unwrap();

        assert!(planned.get("id").is_unknown());
        assert!(planned.get("zone").is_unknown());
        assert_eq!(planned.string("name"), Some("a"));
    }

    #[test]
    fn test_create_plan_keeps_configured_computed() {
        let config = ObjectValue::new().with("name", Value::string("a")).with("zone", Value::string("z1"));
        let planned = Widget.plan(None, Some(config.clone()), Some(&config)).unwrap().unwrap();

        assert!(planned.get("id").is_unknown());
        assert_eq!(planned.string("zone"), Some("z1"));
    }

    #[test]
    fn test_update_plan_carries_prior_computed() {
        let prior = ObjectValue::new()
            .with("id", Value::string("1"))
            .with("name", Value::string("a"))
            .with("zone", Value::string("z1"));
        let config = ObjectValue::new().with("name", Value::string("b"));

        let planned = Widget.plan(Some(&prior), Some(config.clone()), Some(&config)).unwrap().unwrap();
        assert_eq!(planned.string("id"), Some("1"));
        assert_eq!(planned.string("zone"), Some("z1"));
        assert_eq!(planned.string("name"), Some("b"));
    }

    #[test]
    fn test_destroy_plan_passes_through() {
        let prior = ObjectValue::new().with("id", Value::string("1"));
        assert_eq!(Widget.plan(Some(&prior), None, None).unwrap(), None);
    }

    #[test]
    fn test_default_error_summary() {
        let error = ProviderError::internal("boom");
        assert_eq!(Widget.error_summary(Operation::Delete, &error), "Unable to delete test_widget");
    }

    #[test]
    fn test_required_string() {
        let object = ObjectValue::new().with("name", Value::string("a")).with("id", Value::Unknown);
        assert_eq!(required_string(&object, "name").unwrap(), "a");
        assert!(required_string(&object, "id").is_err());
        assert!(required_string(&object, "missing").is_err());
    }
}
