//! Per-type injector cache.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{ConstructorPolicy, Injector};
use crate::error::{DiError, DiResult};
use crate::traits::Injectable;

/// Cache of introspected injectors, keyed by type.
///
/// A root container owns one registry and shares it with its children.
/// `clear` only drops the cache; injectors already handed out stay valid.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{InjectorRegistry, Injectable};
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Plain;
/// impl Injectable for Plain {}
///
/// let registry = InjectorRegistry::default();
/// let first = registry.get_or_create::<Plain>().unwrap();
/// let second = registry.get_or_create::<Plain>().unwrap();
/// assert!(Rc::ptr_eq(&first, &second));
///
/// registry.clear();
/// assert!(registry.is_empty());
/// assert!(first.fields().is_empty());
/// ```
pub struct InjectorRegistry {
    policy: ConstructorPolicy,
    cache: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl InjectorRegistry {
    pub fn new(policy: ConstructorPolicy) -> Self {
        InjectorRegistry {
            policy,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> ConstructorPolicy {
        self.policy
    }

    /// Cached injector for `T`, introspecting it on first use.
    pub fn get_or_create<T: Injectable>(&self) -> DiResult<Rc<Injector<T>>> {
        let id = TypeId::of::<T>();
        let cached = self.cache.borrow().get(&id).cloned();
        if let Some(cached) = cached {
            return cached.downcast::<Injector<T>>().map_err(|_| {
                DiError::configuration(format!(
                    "cached injector for {} has the wrong type",
                    type_name::<T>()
                ))
            });
        }

        let injector = Rc::new(Injector::<T>::introspect(self.policy)?);
        self.cache.borrow_mut().insert(id, injector.clone());
        Ok(injector)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.cache.borrow().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Drops every cached injector.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Default for InjectorRegistry {
    fn default() -> Self {
        InjectorRegistry::new(ConstructorPolicy::default())
    }
}

impl fmt::Debug for InjectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorRegistry")
            .field("policy", &self.policy)
            .field("cached", &self.len())
            .finish()
    }
}
