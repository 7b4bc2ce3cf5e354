//! # Argument Resolver
//!
//! Composable constructor-argument resolution keyed by requested type.
//!
//! ## Overview
//!
//! An [`ArgumentResolver`] answers one question: "given a requested type,
//! produce a value or nothing". Resolvers compose into left-biased chains
//! where the first positive match wins, so a value bound early can never be
//! shadowed by a later binding for the same type.
//!
//! Resolution is by exact type only. Requesting `String` will not match a
//! value bound as `&'static str`, and vice versa.
//!
//! ## Usage
//!
//! ```rust
//! use forge_core::ArgumentResolver;
//!
//! let resolver = ArgumentResolver::of::<String>("injected".to_string())
//!     .and::<i64>(123);
//!
//! assert_eq!(resolver.resolve::<String>(), Some("injected".to_string()));
//! assert_eq!(resolver.resolve::<i64>(), Some(123));
//! assert_eq!(resolver.resolve::<i32>(), None);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erased value produced by a resolver and consumed by a constructor.
pub type BoxedValue = Box<dyn Any + Send>;

type ProduceFn = Arc<dyn Fn() -> BoxedValue + Send + Sync>;
type ResolveFn = Arc<dyn Fn(TypeId) -> Option<BoxedValue> + Send + Sync>;

/// Composable `requested type -> value | absent` capability used to supply
/// constructor arguments during factory instantiation.
#[derive(Clone)]
pub struct ArgumentResolver {
    strategy: Strategy,
}

#[derive(Clone)]
enum Strategy {
    /// Resolves nothing; the default for `load` calls without a resolver.
    None,
    /// A fixed value for exactly one type, cloned per resolution.
    Single(TypedSlot),
    /// A supplier for exactly one type, invoked on every resolution.
    Supplied(TypedSlot),
    /// An arbitrary resolution function.
    Function(ResolveFn),
    /// Left-biased chain: `first` is consulted before `second`.
    Composite {
        first: Box<Strategy>,
        second: Box<Strategy>,
    },
}

#[derive(Clone)]
struct TypedSlot {
    type_id: TypeId,
    type_name: &'static str,
    produce: ProduceFn,
}

impl Strategy {
    fn resolve_by_id(&self, requested: TypeId) -> Option<BoxedValue> {
        match self {
            Strategy::None => None,
            Strategy::Single(slot) | Strategy::Supplied(slot) => {
                (slot.type_id == requested).then(|| (slot.produce)())
            }
            Strategy::Function(resolve) => resolve(requested),
            Strategy::Composite { first, second } => first
                .resolve_by_id(requested)
                .or_else(|| second.resolve_by_id(requested)),
        }
    }
}

impl ArgumentResolver {
    /// A resolver that resolves nothing.
    pub fn none() -> Self {
        Self {
            strategy: Strategy::None,
        }
    }

    /// Resolve exactly `T` to a fixed value, cloned on each resolution.
    pub fn of<T>(value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self {
            strategy: Strategy::Single(TypedSlot::single(value)),
        }
    }

    /// Resolve exactly `T` to a value computed by `supplier` on each
    /// resolution.
    pub fn of_supplied<T, F>(supplier: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            strategy: Strategy::Supplied(TypedSlot::supplied(supplier)),
        }
    }

    /// Resolve via an arbitrary function. The function must return a value
    /// whose concrete type matches the requested [`TypeId`], or `None`.
    pub fn from<F>(resolve: F) -> Self
    where
        F: Fn(TypeId) -> Option<BoxedValue> + Send + Sync + 'static,
    {
        Self {
            strategy: Strategy::Function(Arc::new(resolve)),
        }
    }

    /// Chain a fixed value for `T` after this resolver. On a type collision
    /// the receiver wins.
    pub fn and<T>(self, value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        self.chain(Strategy::Single(TypedSlot::single(value)))
    }

    /// Chain a supplied value for `T` after this resolver.
    pub fn and_supplied<T, F>(self, supplier: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.chain(Strategy::Supplied(TypedSlot::supplied(supplier)))
    }

    /// Chain another resolver after this one.
    pub fn and_resolver(self, other: ArgumentResolver) -> Self {
        self.chain(other.strategy)
    }

    /// Resolve a value of type `T`, or `None` when this resolver has no
    /// binding for exactly `T`.
    pub fn resolve<T: Any>(&self) -> Option<T> {
        self.resolve_by_id(TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub(crate) fn resolve_by_id(&self, requested: TypeId) -> Option<BoxedValue> {
        self.strategy.resolve_by_id(requested)
    }

    fn chain(self, next: Strategy) -> Self {
        Self {
            strategy: Strategy::Composite {
                first: Box::new(self.strategy),
                second: Box::new(next),
            },
        }
    }
}

impl Default for ArgumentResolver {
    fn default() -> Self {
        Self::none()
    }
}

impl TypedSlot {
    fn single<T>(value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            produce: Arc::new(move || Box::new(value.clone())),
        }
    }

    fn supplied<T, F>(supplier: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            produce: Arc::new(move || Box::new(supplier())),
        }
    }
}

impl fmt::Debug for ArgumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgumentResolver({:?})", self.strategy)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::None => write!(f, "None"),
            Strategy::Single(slot) => write!(f, "Single<{}>", slot.type_name),
            Strategy::Supplied(slot) => write!(f, "Supplied<{}>", slot.type_name),
            Strategy::Function(_) => write!(f, "Function"),
            Strategy::Composite { first, second } => write!(f, "{first:?} -> {second:?}"),
        }
    }
}
