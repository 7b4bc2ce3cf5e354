//! # Class Catalog
//!
//! Registration-based class model for factory discovery.
//!
//! ## Overview
//!
//! Discovery works on names found in resource files, so something has to map
//! a name back to runnable code. A [`FactoryClass`] describes one
//! implementation: the factory type it produces, and the constructors it
//! declares (visibility, parameter types, and an invoke capability). A
//! [`LoadingContext`] is the scope those descriptions live in: it owns the
//! class catalog and the ordered resource roots searched for mapping files,
//! optionally delegating to a parent context.
//!
//! ## Key Features
//!
//! - **Named capability types** via [`FactoryType`], implementable for
//!   `dyn Trait` objects
//! - **Thread-safe class registration** using `RwLock` for concurrent access
//! - **Parent delegation** for both class lookup and resource enumeration
//! - **Process-wide default context** with settings-driven resource roots
//!
//! ## Usage
//!
//! ```rust
//! use forge_core::{FactoryClass, FactoryType, LoadingContext, Visibility};
//!
//! trait Greeter: Send {
//!     fn greet(&self) -> String;
//! }
//!
//! impl FactoryType for dyn Greeter {
//!     const NAME: &'static str = "demo.Greeter";
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! # fn main() -> forge_core::Result<()> {
//! let context = LoadingContext::isolated(["fixtures"]);
//! context.register(
//!     FactoryClass::of::<dyn Greeter>("demo.English")
//!         .with_nullary(Visibility::Public, || Ok(Box::new(English)))
//!         .build(),
//! )?;
//!
//! assert!(context.lookup_class("demo.English").is_some());
//! # Ok(())
//! # }
//! ```

use crate::config::LoaderSettings;
use crate::error::{ForgeError, Result};
use crate::registry::resolver::BoxedValue;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Type-erased factory instance as produced by a constructor invocation.
pub(crate) type BoxedInstance = Box<dyn Any + Send>;

/// Error type implementation constructors may fail with.
pub type ConstructError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one constructor invocation for factory type `T`.
pub type Constructed<T> = std::result::Result<Box<T>, ConstructError>;

/// An abstract capability whose implementations are discovered through
/// factory resource files.
///
/// `NAME` is the key implementations are registered under in mapping files;
/// the implementing type itself is the assignability token. Typically
/// implemented for a trait object:
///
/// ```rust
/// use forge_core::FactoryType;
///
/// trait Codec: Send {}
///
/// impl FactoryType for dyn Codec {
///     const NAME: &'static str = "demo.Codec";
/// }
/// ```
pub trait FactoryType: Send + 'static {
    /// Name under which implementations of this capability are registered
    /// in factory resource files.
    const NAME: &'static str;
}

/// Declared visibility of a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Crate,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A formal constructor parameter: the exact type requested from the
/// argument resolver.
pub(crate) struct Parameter {
    type_id: TypeId,
    type_name: &'static str,
}

impl Parameter {
    fn of<A: Any>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            type_name: std::any::type_name::<A>(),
        }
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

type InvokeFn = Box<dyn Fn(Vec<BoxedValue>) -> Result<BoxedInstance> + Send + Sync>;

/// One declared constructor of an implementation class.
pub struct Constructor {
    visibility: Visibility,
    parameters: Vec<Parameter>,
    invoke: InvokeFn,
}

impl Constructor {
    pub(crate) fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub(crate) fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, arguments: Vec<BoxedValue>) -> Result<BoxedInstance> {
        (self.invoke)(arguments)
    }
}

/// Description of one factory implementation: its registered name, the
/// factory type it produces, and its declared constructors.
pub struct FactoryClass {
    name: String,
    factory_type_id: TypeId,
    factory_type_name: &'static str,
    constructors: Vec<Constructor>,
    /// Constructor selection is resolved once per class and reused.
    selected: OnceLock<Option<usize>>,
}

impl FactoryClass {
    /// Start describing an implementation of factory type `T` registered
    /// under `name`.
    pub fn of<T>(name: impl Into<String>) -> FactoryClassBuilder<T>
    where
        T: FactoryType + ?Sized,
    {
        FactoryClassBuilder {
            class: FactoryClass {
                name: name.into(),
                factory_type_id: TypeId::of::<T>(),
                factory_type_name: T::NAME,
                constructors: Vec::new(),
                selected: OnceLock::new(),
            },
            _produces: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factory_type_name(&self) -> &'static str {
        self.factory_type_name
    }

    /// Whether instances of this class are assignable to factory type `T`.
    pub fn produces<T>(&self) -> bool
    where
        T: FactoryType + ?Sized,
    {
        self.factory_type_id == TypeId::of::<T>()
    }

    pub(crate) fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Index of the unique usable constructor, if any. Selection: a single
    /// declared constructor of any visibility, otherwise a single public
    /// one.
    pub(crate) fn selected_constructor(&self) -> Option<usize> {
        *self.selected.get_or_init(|| {
            if self.constructors.len() == 1 {
                return Some(0);
            }
            let mut public = self
                .constructors
                .iter()
                .enumerate()
                .filter(|(_, constructor)| constructor.visibility().is_public());
            match (public.next(), public.next()) {
                (Some((index, _)), None) => Some(index),
                _ => None,
            }
        })
    }
}

impl fmt::Debug for FactoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryClass")
            .field("name", &self.name)
            .field("factory_type", &self.factory_type_name)
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Builder for [`FactoryClass`], adding constructors by shape.
pub struct FactoryClassBuilder<T: FactoryType + ?Sized> {
    class: FactoryClass,
    _produces: PhantomData<fn() -> Box<T>>,
}

impl<T: FactoryType + ?Sized> FactoryClassBuilder<T> {
    /// Declare a zero-parameter constructor.
    pub fn with_nullary<F>(mut self, visibility: Visibility, construct: F) -> Self
    where
        F: Fn() -> Constructed<T> + Send + Sync + 'static,
    {
        let class_name = self.class.name.clone();
        self.class.constructors.push(Constructor {
            visibility,
            parameters: Vec::new(),
            invoke: Box::new(move |_arguments| {
                construct()
                    .map(erase::<T>)
                    .map_err(|source| ForgeError::constructor_failed(class_name.clone(), source))
            }),
        });
        self
    }

    /// Declare a single-parameter constructor.
    pub fn with_unary<A, F>(mut self, visibility: Visibility, construct: F) -> Self
    where
        A: Any + Send,
        F: Fn(A) -> Constructed<T> + Send + Sync + 'static,
    {
        let class_name = self.class.name.clone();
        self.class.constructors.push(Constructor {
            visibility,
            parameters: vec![Parameter::of::<A>()],
            invoke: Box::new(move |arguments| {
                let mut arguments = arguments.into_iter();
                let first = take_argument::<A>(&mut arguments, &class_name)?;
                construct(first)
                    .map(erase::<T>)
                    .map_err(|source| ForgeError::constructor_failed(class_name.clone(), source))
            }),
        });
        self
    }

    /// Declare a two-parameter constructor.
    pub fn with_binary<A, B, F>(mut self, visibility: Visibility, construct: F) -> Self
    where
        A: Any + Send,
        B: Any + Send,
        F: Fn(A, B) -> Constructed<T> + Send + Sync + 'static,
    {
        let class_name = self.class.name.clone();
        self.class.constructors.push(Constructor {
            visibility,
            parameters: vec![Parameter::of::<A>(), Parameter::of::<B>()],
            invoke: Box::new(move |arguments| {
                let mut arguments = arguments.into_iter();
                let first = take_argument::<A>(&mut arguments, &class_name)?;
                let second = take_argument::<B>(&mut arguments, &class_name)?;
                construct(first, second)
                    .map(erase::<T>)
                    .map_err(|source| ForgeError::constructor_failed(class_name.clone(), source))
            }),
        });
        self
    }

    pub fn build(self) -> FactoryClass {
        self.class
    }
}

fn erase<T: FactoryType + ?Sized>(instance: Box<T>) -> BoxedInstance {
    Box::new(instance)
}

fn take_argument<A: Any + Send>(
    arguments: &mut impl Iterator<Item = BoxedValue>,
    class_name: &str,
) -> Result<A> {
    arguments
        .next()
        .and_then(|value| value.downcast::<A>().ok())
        .map(|boxed| *boxed)
        .ok_or_else(|| {
            ForgeError::internal(format!(
                "resolved argument does not match declared parameter [{}] of class [{class_name}]",
                std::any::type_name::<A>()
            ))
        })
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static PLATFORM_DEFAULT: OnceLock<Arc<LoadingContext>> = OnceLock::new();

/// Class-loading scope: the catalog of registered implementation classes
/// plus the ordered resource roots searched for factory mapping files.
///
/// Two callers passing "no context" and the explicit platform default are
/// normalized to the same instance, so both hit the same cache entries.
pub struct LoadingContext {
    id: u64,
    parent: Option<Arc<LoadingContext>>,
    resource_roots: Vec<PathBuf>,
    classes: RwLock<HashMap<String, Arc<FactoryClass>>>,
}

impl LoadingContext {
    /// The process-wide default context. Resource roots come from
    /// [`LoaderSettings`]; classes are registered at runtime.
    pub fn platform_default() -> Arc<LoadingContext> {
        Arc::clone(PLATFORM_DEFAULT.get_or_init(|| {
            let settings = LoaderSettings::load().unwrap_or_else(|error| {
                warn!(%error, "falling back to default loader settings");
                LoaderSettings::default()
            });
            Arc::new(LoadingContext {
                id: next_context_id(),
                parent: None,
                resource_roots: settings.resource_roots,
                classes: RwLock::new(HashMap::new()),
            })
        }))
    }

    /// A context with its own resource roots that delegates class lookup
    /// and resource enumeration to the platform default.
    pub fn with_resource_roots<I, P>(resource_roots: I) -> Arc<LoadingContext>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Arc::new(LoadingContext {
            id: next_context_id(),
            parent: Some(Self::platform_default()),
            resource_roots: resource_roots.into_iter().map(Into::into).collect(),
            classes: RwLock::new(HashMap::new()),
        })
    }

    /// A fully isolated context with no parent. Nothing registered elsewhere
    /// is visible; useful for tests and embedded scopes.
    pub fn isolated<I, P>(resource_roots: I) -> Arc<LoadingContext>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Arc::new(LoadingContext {
            id: next_context_id(),
            parent: None,
            resource_roots: resource_roots.into_iter().map(Into::into).collect(),
            classes: RwLock::new(HashMap::new()),
        })
    }

    /// Stable identity used for cache keying.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_platform_default(self: &Arc<Self>) -> bool {
        Arc::ptr_eq(self, &Self::platform_default())
    }

    /// Register an implementation class with this context.
    pub fn register(&self, class: FactoryClass) -> Result<Arc<FactoryClass>> {
        let mut classes = self.classes.write();
        if classes.contains_key(class.name()) {
            return Err(ForgeError::already_registered(class.name()));
        }
        let class = Arc::new(class);
        classes.insert(class.name().to_string(), Arc::clone(&class));
        debug!(
            class = class.name(),
            factory_type = class.factory_type_name(),
            context = self.id,
            "registered factory class"
        );
        Ok(class)
    }

    /// Look up a registered class by name, consulting the parent first.
    pub fn lookup_class(&self, name: &str) -> Option<Arc<FactoryClass>> {
        if let Some(parent) = &self.parent {
            if let Some(found) = parent.lookup_class(name) {
                return Some(found);
            }
        }
        self.classes.read().get(name).cloned()
    }

    /// Names of the classes registered directly with this context.
    pub fn registered_classes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All visible resource roots: parent roots first, then own roots, in
    /// registration order.
    pub(crate) fn enumerate_roots(&self) -> Vec<PathBuf> {
        let mut roots = match &self.parent {
            Some(parent) => parent.enumerate_roots(),
            None => Vec::new(),
        };
        roots.extend(self.resource_roots.iter().cloned());
        roots
    }

    /// Normalize an optional context to the platform default.
    pub(crate) fn normalize(context: Option<Arc<LoadingContext>>) -> Arc<LoadingContext> {
        context.unwrap_or_else(Self::platform_default)
    }
}

fn next_context_id() -> u64 {
    NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
}

impl fmt::Debug for LoadingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingContext")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|parent| parent.id))
            .field("resource_roots", &self.resource_roots)
            .field("classes", &self.classes.read().len())
            .finish()
    }
}
