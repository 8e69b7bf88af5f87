//! Introspection and injection of `Injectable` types.
//!
//! An [`Injector`] is built once per type from its
//! [`describe`](crate::Injectable::describe) output. It knows the type's
//! injectable fields, its constructors in selection order, and the union of
//! keys the type depends on. The container uses it both to feed the
//! dependency graph and to build and inject instances.

use std::any::{type_name, Any};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::{DependencyKey, TypeKey};
use crate::traits::Injectable;

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    Arg, Args, ConstructorArgs, ConstructorShape, Inject, InjectableConstructor, InjectableField,
    TypeDescriptor,
};
pub use registry::InjectorRegistry;

/// What introspection does with a constructor declaring an injected
/// parameter after a non-injected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum ConstructorPolicy {
    /// Fail introspection with a configuration error
    #[default]
    Reject,
    /// Leave the constructor out
    Skip,
}

impl fmt::Display for ConstructorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorPolicy::Reject => f.write_str("reject"),
            ConstructorPolicy::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for ConstructorPolicy {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ConstructorPolicy::Reject),
            "skip" => Ok(ConstructorPolicy::Skip),
            other => Err(DiError::configuration(format!(
                "unknown constructor policy '{}', expected 'reject' or 'skip'",
                other
            ))),
        }
    }
}

/// Per-type injection plan.
///
/// Constructors are kept sorted by number of injected parameters
/// (descending), then number of non-injected parameters (descending);
/// ties keep declaration order.
pub struct Injector<T> {
    fields: Vec<InjectableField<T>>,
    constructors: Vec<InjectableConstructor<T>>,
    depends_on: BTreeSet<DependencyKey>,
}

impl<T: Injectable> Injector<T> {
    /// Builds the plan for `T` from its description.
    pub fn introspect(policy: ConstructorPolicy) -> DiResult<Self> {
        let mut descriptor = TypeDescriptor::new();
        T::describe(&mut descriptor);
        let (fields, declared) = descriptor.into_parts();

        let mut constructors = Vec::with_capacity(declared.len());
        for constructor in declared {
            if let Some(key) = constructor.shape().misplaced() {
                match policy {
                    ConstructorPolicy::Reject => {
                        return Err(DiError::configuration(format!(
                            "constructor of {} declares injected parameter {} after a non-injected parameter",
                            type_name::<T>(),
                            key
                        )));
                    }
                    ConstructorPolicy::Skip => {
                        debug!(
                            target_type = type_name::<T>(),
                            parameter = %key,
                            "skipping constructor with injected parameter after a non-injected one"
                        );
                        continue;
                    }
                }
            }
            constructors.push(constructor);
        }

        // stable: equal shapes keep declaration order
        constructors.sort_by(|a, b| {
            b.injected_keys()
                .len()
                .cmp(&a.injected_keys().len())
                .then_with(|| b.non_injected_types().len().cmp(&a.non_injected_types().len()))
        });

        let depends_on: BTreeSet<DependencyKey> = fields
            .iter()
            .map(|field| field.key().clone())
            .chain(
                constructors
                    .iter()
                    .flat_map(|c| c.injected_keys().iter().cloned()),
            )
            .collect();

        trace!(
            target_type = type_name::<T>(),
            fields = fields.len(),
            constructors = constructors.len(),
            dependencies = depends_on.len(),
            "introspected type"
        );

        Ok(Injector {
            fields,
            constructors,
            depends_on,
        })
    }

    /// Name of the described type.
    pub fn target(&self) -> &'static str {
        type_name::<T>()
    }

    pub fn fields(&self) -> &[InjectableField<T>] {
        &self.fields
    }

    pub fn constructors(&self) -> &[InjectableConstructor<T>] {
        &self.constructors
    }

    /// Keys of all injectable fields and injected constructor parameters.
    pub fn depends_on(&self) -> &BTreeSet<DependencyKey> {
        &self.depends_on
    }

    /// Writes the container's resolved values into every injectable field.
    ///
    /// Only values the container (or an ancestor) has already resolved are
    /// used; this never triggers a resolve pass.
    pub fn inject_fields(&self, instance: &T, container: &Container<'_>) -> DiResult<()> {
        for field in &self.fields {
            let value = container
                .lookup_resolved(field.key())?
                .ok_or_else(|| self.missing(field.key()))?;
            if !field.assign(instance, &value) {
                return Err(self.missing(field.key()));
            }
        }
        Ok(())
    }

    /// Builds an instance with the first constructor whose non-injected
    /// parameters match `args`, injecting the rest from the container.
    pub fn create_instance(&self, container: &Container<'_>, args: Args) -> DiResult<T> {
        let supplied = args.into_vec();
        let supplied_types: Vec<TypeKey> = supplied.iter().map(Arg::type_key).collect();

        let constructor = self
            .constructors
            .iter()
            .find(|c| c.shape().accepts(&supplied_types))
            .ok_or_else(|| DiError::NoMatchingConstructor {
                target: self.target(),
                supplied: supplied_types.iter().map(TypeKey::name).collect(),
            })?;

        let mut injected = VecDeque::with_capacity(constructor.injected_keys().len());
        for key in constructor.injected_keys() {
            let value = container
                .lookup_resolved(key)?
                .ok_or_else(|| self.missing(key))?;
            injected.push_back((key.clone(), value));
        }

        let mut args = ConstructorArgs::new(self.target(), injected, supplied.into());
        constructor.invoke(&mut args)
    }

    fn missing(&self, key: &DependencyKey) -> DiError {
        DiError::MissingDependency {
            target: self.target(),
            key: key.clone(),
        }
    }
}

impl<T> fmt::Debug for Injector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("target", &type_name::<T>())
            .field("fields", &self.fields)
            .field("constructors", &self.constructors)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// Field injection over an erased instance.
pub(crate) trait ErasedInjector {
    fn inject_any(&self, instance: &dyn Any, container: &Container<'_>) -> DiResult<()>;
}

impl<T: Injectable> ErasedInjector for Injector<T> {
    fn inject_any(&self, instance: &dyn Any, container: &Container<'_>) -> DiResult<()> {
        match instance.downcast_ref::<T>() {
            Some(instance) => self.inject_fields(instance, container),
            None => Err(DiError::configuration(format!(
                "injector for {} applied to an instance of another type",
                type_name::<T>()
            ))),
        }
    }
}
