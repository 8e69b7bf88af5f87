//! Installing and removing bindings.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use tracing::debug;

use super::{Binding, CastFn, Container};
use crate::error::{DiError, DiResult};
use crate::internal::DisposeBag;
use crate::key::DependencyKey;
use crate::lifetime::{Phase, Sharing};
use crate::resolver::Resolver;
use crate::traits::Injectable;

/// Everything one bind request installs.
pub(crate) struct BindingPlan {
    pub(crate) keys: Vec<DependencyKey>,
    pub(crate) casts: Vec<CastFn>,
    pub(crate) implementation: DependencyKey,
    pub(crate) depends_on: BTreeSet<DependencyKey>,
    pub(crate) resolver: Resolver,
    pub(crate) sharing: Sharing,
    pub(crate) factory: Option<FactoryPlan>,
}

/// The companion binding of a factory-backed bind request.
pub(crate) struct FactoryPlan {
    pub(crate) key: DependencyKey,
    pub(crate) implementation: DependencyKey,
    pub(crate) depends_on: BTreeSet<DependencyKey>,
    pub(crate) resolver: Resolver,
    pub(crate) cast: CastFn,
}

impl<'p> Container<'p> {
    /// Binds `instance` under its own type.
    pub fn bind_instance<T: Injectable>(&self, instance: T) -> DiResult<&Self> {
        self.bind::<T>().to_instance(instance)
    }

    /// Binds `instance` under its own type with a qualifier.
    pub fn bind_named_instance<T: Injectable>(
        &self,
        instance: T,
        name: impl Into<Cow<'static, str>>,
    ) -> DiResult<&Self> {
        self.bind::<T>().with_id(name).to_instance(instance)
    }

    /// Installs a bind request atomically: either every key is bound and
    /// every graph edge added, or nothing changes.
    pub(crate) fn install_binding(&self, plan: BindingPlan) -> DiResult<()> {
        self.ensure_live("bind to")?;
        self.check_unbound(&plan)?;

        {
            let mut graph = self.graph.borrow_mut();
            let mut tx = graph.transaction();
            if let Some(factory) = &plan.factory {
                tx.add_dependency(factory.key.clone(), factory.implementation.clone(), true)?;
                for dependency in &factory.depends_on {
                    tx.add_dependency(factory.implementation.clone(), dependency.clone(), false)?;
                }
            }
            for key in &plan.keys {
                tx.add_dependency(key.clone(), plan.implementation.clone(), true)?;
                if let Some(factory) = &plan.factory {
                    tx.add_dependency(key.clone(), factory.key.clone(), true)?;
                }
            }
            for dependency in &plan.depends_on {
                tx.add_dependency(plan.implementation.clone(), dependency.clone(), false)?;
            }
            tx.commit();
        }

        let BindingPlan {
            keys,
            casts,
            implementation,
            resolver,
            sharing,
            factory,
            ..
        } = plan;

        let companion = factory.as_ref().map(|factory| factory.key.clone());
        {
            let mut bindings = self.bindings.borrow_mut();
            if let Some(factory) = factory {
                bindings.insert(
                    factory.key,
                    Binding {
                        resolver: Rc::new(RefCell::new(factory.resolver)),
                        cast: factory.cast,
                        implementation: factory.implementation,
                        sharing: Sharing::Unshared,
                        companion: None,
                    },
                );
            }
            let resolver = Rc::new(RefCell::new(resolver));
            for (key, cast) in keys.iter().zip(casts) {
                bindings.insert(
                    key.clone(),
                    Binding {
                        resolver: resolver.clone(),
                        cast,
                        implementation: implementation.clone(),
                        sharing,
                        companion: companion.clone(),
                    },
                );
            }
        }

        self.phase.set(Phase::Binding);
        self.generation.set(self.generation.get().wrapping_add(1));
        debug!(
            container = %self,
            keys = ?keys.iter().map(ToString::to_string).collect::<Vec<_>>(),
            implementation = %implementation,
            "bound"
        );
        self.observers().bound(&keys);
        Ok(())
    }

    fn check_unbound(&self, plan: &BindingPlan) -> DiResult<()> {
        let bindings = self.bindings.borrow();
        let mut requested = HashSet::new();
        let mut duplicates = Vec::new();
        let factory_key = plan.factory.as_ref().map(|factory| &factory.key);
        for key in plan.keys.iter().chain(factory_key) {
            if bindings.contains_key(key) || !requested.insert(key) {
                duplicates.push(key.clone());
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(DiError::DuplicateBinding(duplicates))
        }
    }

    /// Removes the unqualified binding of `T`. Returns whether one existed.
    pub fn unbind<T: ?Sized + 'static>(&self) -> DiResult<bool> {
        self.unbind_key(&DependencyKey::of::<T>())
    }

    pub fn unbind_named<T: ?Sized + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> DiResult<bool> {
        self.unbind_key(&DependencyKey::named::<T>(name))
    }

    /// Removes the binding of `key` and its resolved value.
    ///
    /// A resolved shared instance loses the reference this key held. When
    /// the last key of a bind request goes, its resolver is disposed and a
    /// companion factory binding is removed with it.
    ///
    /// Unbinding a key whose resolver is running (from inside that
    /// resolver) is a configuration error and changes nothing.
    pub fn unbind_key(&self, key: &DependencyKey) -> DiResult<bool> {
        self.ensure_live("unbind from")?;
        let busy = self
            .bindings
            .borrow()
            .get(key)
            .map_or(false, |binding| binding.resolver.try_borrow_mut().is_err());
        if busy {
            return Err(DiError::configuration(format!(
                "cannot unbind {} while its resolver is running; resolver re-entered",
                key
            )));
        }
        let removed = self.bindings.borrow_mut().remove(key);
        let binding = match removed {
            Some(binding) => binding,
            None => return Ok(false),
        };

        let was_resolved = self.resolved.borrow_mut().remove(key).is_some();
        self.resolution_order.borrow_mut().retain(|k| k != key);
        if was_resolved {
            if let Ok(mut resolver) = binding.resolver.try_borrow_mut() {
                resolver.release(self);
            }
        }

        {
            let mut graph = self.graph.borrow_mut();
            graph.unmark_root(key);
            graph.remove_dependency(key, &binding.implementation);
            if let Some(companion) = &binding.companion {
                graph.remove_dependency(key, companion);
            }
        }

        debug!(container = %self, %key, "unbound");

        if Rc::strong_count(&binding.resolver) == 1 {
            let mut bag = DisposeBag::default();
            if let Ok(mut resolver) = binding.resolver.try_borrow_mut() {
                resolver.dispose(&mut bag);
            }
            bag.dispose_all();
            if let Some(companion) = &binding.companion {
                self.unbind_key(companion)?;
            }
        }

        Ok(true)
    }
}
