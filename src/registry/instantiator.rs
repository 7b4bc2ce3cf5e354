//! # Factory Instantiator
//!
//! Constructor selection and invocation for one implementation class.
//!
//! Selection happens eagerly when the instantiator is built: a class with a
//! single declared constructor uses it regardless of visibility; a class
//! with several uses its unique public constructor; anything else has no
//! suitable constructor. The chosen constructor is remembered on the class,
//! so repeated loads skip re-selection.

use crate::error::{ForgeError, Result};
use crate::registry::catalog::{BoxedInstance, FactoryClass};
use crate::registry::resolver::ArgumentResolver;
use std::sync::Arc;

/// Instantiates one implementation class through its selected constructor.
#[derive(Debug)]
pub struct FactoryInstantiator {
    class: Arc<FactoryClass>,
    constructor: usize,
}

impl FactoryInstantiator {
    /// Select the usable constructor for `class`, failing when none or more
    /// than one candidate qualifies.
    pub fn for_class(class: &Arc<FactoryClass>) -> Result<Self> {
        match class.selected_constructor() {
            Some(index) => Ok(Self {
                class: Arc::clone(class),
                constructor: index,
            }),
            None => Err(ForgeError::no_suitable_constructor(class.name())),
        }
    }

    /// Build an instance, resolving each formal parameter through
    /// `resolver`. A zero-parameter constructor never consults the resolver.
    pub fn instantiate(&self, resolver: &ArgumentResolver) -> Result<BoxedInstance> {
        let constructor = &self.class.constructors()[self.constructor];
        if constructor.parameters().is_empty() {
            return constructor.invoke(Vec::new());
        }

        let mut arguments = Vec::with_capacity(constructor.parameters().len());
        for parameter in constructor.parameters() {
            let value = resolver.resolve_by_id(parameter.type_id()).ok_or_else(|| {
                ForgeError::no_matching_argument(self.class.name(), parameter.type_name())
            })?;
            arguments.push(value);
        }
        constructor.invoke(arguments)
    }
}
