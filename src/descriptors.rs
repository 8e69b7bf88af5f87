//! Binding descriptors for introspection and diagnostics.

use crate::container::Container;
use crate::key::{DependencyKey, TypeKey};
use crate::lifetime::Sharing;
use crate::resolver::ResolverKind;

/// Snapshot of one binding of a container.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{Container, ResolverKind, Sharing};
///
/// let container = Container::new();
/// container.bind_instance(8080u16).unwrap();
/// container.bind_named_instance(String::from("db"), "host").unwrap();
///
/// let descriptors = container.binding_descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let host = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(host.service_name(), Some("host"));
/// assert_eq!(host.resolver, ResolverKind::Instance);
/// assert_eq!(host.sharing, Sharing::Unshared);
/// assert!(!host.resolved);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// The bound key
    pub key: DependencyKey,
    /// Concrete type the key resolves to
    pub implementation: TypeKey,
    /// Strategy producing the instance
    pub resolver: ResolverKind,
    /// Whether the instance comes from the shared cache
    pub sharing: Sharing,
    /// Whether the key currently has a resolved value
    pub resolved: bool,
}

impl BindingDescriptor {
    /// The bound type's name.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn implementation_name(&self) -> &'static str {
        self.implementation.name()
    }

    /// The binding qualifier, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.key.qualifier()
    }

    pub fn is_named(&self) -> bool {
        self.key.is_named()
    }
}

impl Container<'_> {
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("=== {} ===\n", self));
        s.push_str(&format!("Phase: {:?}\n", self.phase()));
        s.push_str("Bindings:\n");
        for d in self.binding_descriptors() {
            s.push_str(&format!(
                "  {} -> {} [{}, {}{}]\n",
                d.key,
                d.implementation_name(),
                d.resolver,
                d.sharing,
                if d.resolved { ", resolved" } else { "" }
            ));
        }
        s
    }
}
