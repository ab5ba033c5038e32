use crate::crd::Finding;
use crate::profile::Profile;
use crate::view::ClusterView;

/// A single opaque probe against the cluster. Validators are pure functions of the
/// cluster view and the resolved profile; they never mutate cluster state.
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
    async fn validate(
        &self,
        view: &dyn ClusterView,
        profile: &Profile,
    ) -> Result<Vec<Finding>, String>;
}

/// Name-keyed set of validators. Constructed explicitly at startup and passed by
/// reference to whatever needs it — never a process-wide singleton, so tests can build
/// their own registries in isolation.
#[derive(Default)]
pub struct Registry {
    validators: Vec<Box<dyn Validator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validator. Duplicate names overwrite the earlier registration
    /// (last-wins), matching the plug-in contract.
    pub fn register(&mut self, validator: Box<dyn Validator>) {
        if let Some(existing) = self
            .validators
            .iter()
            .position(|v| v.name() == validator.name())
        {
            self.validators[existing] = validator;
        } else {
            self.validators.push(validator);
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Validator> {
        self.validators
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    /// All registered validators, sorted lexicographically by name — the deterministic
    /// execution order used when a request does not impose its own.
    pub fn all_sorted(&self) -> Vec<&dyn Validator> {
        let mut refs: Vec<&dyn Validator> = self.validators.iter().map(|v| v.as_ref()).collect();
        refs.sort_by(|a, b| a.name().cmp(b.name()));
        refs
    }

    /// The default registry: every built-in validator shipped with the engine.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::validators::register_builtins(&mut registry);
        registry
    }
}
