//! Type descriptions: injectable fields, constructor shapes and arguments.

use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::{DiError, DiResult};
use crate::key::{DependencyKey, TypeKey};

/// Field slot populated by field injection.
///
/// The slot can be written after construction, which is what lets a
/// container inject into instances it already shares.
///
/// # Examples
///
/// ```rust
/// use bindgraph::Inject;
///
/// trait Sink {}
///
/// let slot: Inject<dyn Sink> = Inject::new();
/// assert!(!slot.is_injected());
/// assert!(slot.get().is_none());
/// ```
pub struct Inject<T: ?Sized> {
    slot: RefCell<Option<Rc<T>>>,
}

impl<T: ?Sized> Inject<T> {
    pub fn new() -> Self {
        Inject {
            slot: RefCell::new(None),
        }
    }

    /// The injected value, if any.
    pub fn get(&self) -> Option<Rc<T>> {
        self.slot.borrow().clone()
    }

    pub fn is_injected(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub(crate) fn set(&self, value: Rc<T>) {
        *self.slot.borrow_mut() = Some(value);
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Inject::new()
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}

/// A single non-injected constructor argument.
pub struct Arg {
    value: Box<dyn Any>,
    ty: TypeKey,
}

impl Arg {
    pub fn new<A: 'static>(value: A) -> Self {
        Arg {
            value: Box::new(value),
            ty: TypeKey::of::<A>(),
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.ty
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Arg").field(&self.ty.name()).finish()
    }
}

/// Ordered non-injected arguments for constructor selection.
///
/// ```rust
/// use bindgraph::Args;
///
/// let args = Args::new().with(8080u16).with(String::from("localhost"));
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Args {
    args: Vec<Arg>,
}

impl Args {
    pub fn new() -> Self {
        Args::default()
    }

    /// Appends `value`; its static type is what constructors match on.
    pub fn with<A: 'static>(mut self, value: A) -> Self {
        self.push(value);
        self
    }

    pub fn push<A: 'static>(&mut self, value: A) {
        self.args.push(Arg::new(value));
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn types(&self) -> Vec<TypeKey> {
        self.args.iter().map(Arg::type_key).collect()
    }

    pub(crate) fn into_vec(self) -> Vec<Arg> {
        self.args
    }
}

/// Parameter list of a constructor: injected keys first, then the types
/// of the caller-supplied arguments.
///
/// Declaring an injected parameter after a non-injected one is recorded
/// and handled at introspection according to the
/// [`ConstructorPolicy`](crate::ConstructorPolicy).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorShape {
    injected: Vec<DependencyKey>,
    non_injected: Vec<TypeKey>,
    misplaced: Option<DependencyKey>,
}

impl ConstructorShape {
    pub fn new() -> Self {
        ConstructorShape::default()
    }

    /// Adds an injected parameter for the unqualified key of `I`.
    pub fn inject<I: ?Sized + 'static>(self) -> Self {
        self.push_injected(DependencyKey::of::<I>())
    }

    /// Adds an injected parameter for the qualified key of `I`.
    pub fn inject_named<I: ?Sized + 'static>(self, qualifier: impl Into<Cow<'static, str>>) -> Self {
        self.push_injected(DependencyKey::named::<I>(qualifier))
    }

    /// Adds a caller-supplied parameter of type `A`.
    pub fn arg<A: 'static>(mut self) -> Self {
        self.non_injected.push(TypeKey::of::<A>());
        self
    }

    fn push_injected(mut self, key: DependencyKey) -> Self {
        if !self.non_injected.is_empty() && self.misplaced.is_none() {
            self.misplaced = Some(key.clone());
        }
        self.injected.push(key);
        self
    }

    pub fn injected(&self) -> &[DependencyKey] {
        &self.injected
    }

    pub fn non_injected(&self) -> &[TypeKey] {
        &self.non_injected
    }

    /// The first injected parameter declared after a non-injected one.
    pub fn misplaced(&self) -> Option<&DependencyKey> {
        self.misplaced.as_ref()
    }

    /// Whether the supplied argument types match the non-injected
    /// parameters exactly, count and order included.
    pub fn accepts(&self, supplied: &[TypeKey]) -> bool {
        self.non_injected.as_slice() == supplied
    }
}

/// Arguments handed to a constructor's build closure, consumed in
/// declaration order.
pub struct ConstructorArgs {
    target: &'static str,
    injected: VecDeque<(DependencyKey, Rc<dyn Any>)>,
    supplied: VecDeque<Arg>,
}

impl ConstructorArgs {
    pub(crate) fn new(
        target: &'static str,
        injected: VecDeque<(DependencyKey, Rc<dyn Any>)>,
        supplied: VecDeque<Arg>,
    ) -> Self {
        ConstructorArgs {
            target,
            injected,
            supplied,
        }
    }

    /// Next injected value.
    pub fn inject<I: ?Sized + 'static>(&mut self) -> DiResult<Rc<I>> {
        let target = self.target;
        let (key, value) = self
            .injected
            .pop_front()
            .ok_or_else(|| DiError::MissingDependency {
                target,
                key: DependencyKey::of::<I>(),
            })?;
        value
            .downcast_ref::<Rc<I>>()
            .cloned()
            .ok_or(DiError::MissingDependency { target, key })
    }

    /// Next caller-supplied argument.
    pub fn arg<A: 'static>(&mut self) -> DiResult<A> {
        let target = self.target;
        let Arg { value, ty } = self.supplied.pop_front().ok_or_else(|| {
            DiError::NoMatchingConstructor {
                target,
                supplied: Vec::new(),
            }
        })?;
        value
            .downcast::<A>()
            .map(|boxed| *boxed)
            .map_err(|_| DiError::NoMatchingConstructor {
                target,
                supplied: vec![ty.name()],
            })
    }

    pub fn remaining_injected(&self) -> usize {
        self.injected.len()
    }

    pub fn remaining_args(&self) -> usize {
        self.supplied.len()
    }
}

impl fmt::Debug for ConstructorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorArgs")
            .field("target", &self.target)
            .field("injected", &self.injected.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("supplied", &self.supplied)
            .finish()
    }
}

/// An injectable field: its key and how to write into it.
pub struct InjectableField<T> {
    key: DependencyKey,
    assign: Box<dyn Fn(&T, &Rc<dyn Any>) -> bool>,
}

impl<T> InjectableField<T> {
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// Writes `value` into the field; false when it holds another type.
    pub(crate) fn assign(&self, target: &T, value: &Rc<dyn Any>) -> bool {
        (self.assign)(target, value)
    }
}

impl<T> fmt::Debug for InjectableField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableField").field("key", &self.key).finish()
    }
}

/// A constructor: its shape and its build closure.
pub struct InjectableConstructor<T> {
    shape: ConstructorShape,
    build: Box<dyn Fn(&mut ConstructorArgs) -> DiResult<T>>,
}

impl<T> InjectableConstructor<T> {
    pub fn shape(&self) -> &ConstructorShape {
        &self.shape
    }

    pub fn injected_keys(&self) -> &[DependencyKey] {
        self.shape.injected()
    }

    pub fn non_injected_types(&self) -> &[TypeKey] {
        self.shape.non_injected()
    }

    pub(crate) fn invoke(&self, args: &mut ConstructorArgs) -> DiResult<T> {
        (self.build)(args)
    }
}

impl<T> fmt::Debug for InjectableConstructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableConstructor")
            .field("shape", &self.shape)
            .finish()
    }
}

/// Builder handed to [`Injectable::describe`](crate::Injectable::describe).
pub struct TypeDescriptor<T> {
    fields: Vec<InjectableField<T>>,
    constructors: Vec<InjectableConstructor<T>>,
}

impl<T: 'static> TypeDescriptor<T> {
    pub(crate) fn new() -> Self {
        TypeDescriptor {
            fields: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Declares an injectable field for the unqualified key of `F`.
    pub fn field<F: ?Sized + 'static>(
        &mut self,
        accessor: impl Fn(&T) -> &Inject<F> + 'static,
    ) -> &mut Self {
        self.push_field(DependencyKey::of::<F>(), accessor)
    }

    /// Declares an injectable field for the qualified key of `F`.
    pub fn named_field<F: ?Sized + 'static>(
        &mut self,
        qualifier: impl Into<Cow<'static, str>>,
        accessor: impl Fn(&T) -> &Inject<F> + 'static,
    ) -> &mut Self {
        self.push_field(DependencyKey::named::<F>(qualifier), accessor)
    }

    fn push_field<F: ?Sized + 'static>(
        &mut self,
        key: DependencyKey,
        accessor: impl Fn(&T) -> &Inject<F> + 'static,
    ) -> &mut Self {
        self.fields.push(InjectableField {
            key,
            assign: Box::new(move |target: &T, value: &Rc<dyn Any>| {
                match value.downcast_ref::<Rc<F>>() {
                    Some(value) => {
                        accessor(target).set(value.clone());
                        true
                    }
                    None => false,
                }
            }),
        });
        self
    }

    /// Declares a constructor.
    pub fn constructor<C>(&mut self, shape: ConstructorShape, build: C) -> &mut Self
    where
        C: Fn(&mut ConstructorArgs) -> DiResult<T> + 'static,
    {
        self.constructors.push(InjectableConstructor {
            shape,
            build: Box::new(build),
        });
        self
    }

    /// Declares a parameterless constructor backed by `Default`.
    pub fn default_constructor(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor(ConstructorShape::new(), |_| Ok(T::default()))
    }

    pub(crate) fn into_parts(self) -> (Vec<InjectableField<T>>, Vec<InjectableConstructor<T>>) {
        (self.fields, self.constructors)
    }
}
