//! Dependency key types for the binding table and the dependency graph.

use std::any::TypeId;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a Rust type, trait objects included.
///
/// Equality and hashing use only the `TypeId`; the type name is carried
/// for ordering and diagnostics.
///
/// # Examples
///
/// ```rust
/// use bindgraph::TypeKey;
///
/// trait Logger {}
///
/// let a = TypeKey::of::<dyn Logger>();
/// let b = TypeKey::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert!(a.name().contains("Logger"));
/// assert_ne!(a, TypeKey::of::<String>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`, which may be unsized (`dyn Trait`, `str`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The `std::any::type_name` of the type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Key for binding and lookup: a type plus an optional qualifier.
///
/// Two keys are equal iff their types are identical and their qualifiers
/// are equal, where "no qualifier" only equals "no qualifier". Keys order
/// by type name first, then by qualifier with unqualified keys first.
///
/// # Examples
///
/// ```rust
/// use bindgraph::DependencyKey;
///
/// trait Store {}
///
/// let plain = DependencyKey::of::<dyn Store>();
/// let primary = DependencyKey::named::<dyn Store>("primary");
///
/// assert_ne!(plain, primary);
/// assert!(plain < primary);
/// assert_eq!(primary.qualifier(), Some("primary"));
/// assert_eq!(primary.to_string(), format!("primary:{}", plain));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    ty: TypeKey,
    qualifier: Option<Cow<'static, str>>,
}

impl DependencyKey {
    /// Creates a key from its parts.
    pub fn new(ty: TypeKey, qualifier: Option<Cow<'static, str>>) -> Self {
        DependencyKey { ty, qualifier }
    }

    /// Unqualified key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        DependencyKey {
            ty: TypeKey::of::<T>(),
            qualifier: None,
        }
    }

    /// Qualified key for `T`.
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<Cow<'static, str>>) -> Self {
        DependencyKey {
            ty: TypeKey::of::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    #[inline]
    pub fn type_key(&self) -> TypeKey {
        self.ty
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// The type name, for diagnostics.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.ty.name()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Same type, qualifier dropped.
    pub fn unqualified(&self) -> DependencyKey {
        DependencyKey {
            ty: self.ty,
            qualifier: None,
        }
    }
}

impl PartialOrd for DependencyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DependencyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ty
            .cmp(&other.ty)
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}:{}", qualifier, self.ty.name()),
            None => f.write_str(self.ty.name()),
        }
    }
}

/// Unqualified key for `T`.
#[inline]
pub fn key_of<T: ?Sized + 'static>() -> DependencyKey {
    DependencyKey::of::<T>()
}
