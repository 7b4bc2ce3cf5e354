//! # Failure Handler
//!
//! Per-candidate instantiation failure policy: throw, log-and-drop, or
//! hand the failure to caller code.

use crate::error::{ForgeError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type ExceptionFactory = Arc<dyn Fn(String, ForgeError) -> ForgeError + Send + Sync>;
type MessageConsumer = Arc<dyn Fn(&str, &ForgeError) + Send + Sync>;

/// Policy applied when one factory candidate fails to instantiate.
///
/// A handler that returns `Err` aborts the whole load call; a handler that
/// returns `Ok` causes the failed entry to be dropped while the remaining
/// candidates continue to load.
#[derive(Clone)]
pub struct FailureHandler {
    policy: Policy,
}

#[derive(Clone)]
enum Policy {
    Throwing,
    ThrowingWith(ExceptionFactory),
    Logging,
    Message(MessageConsumer),
}

impl FailureHandler {
    /// Wrap the cause in the standard unable-to-instantiate error and abort
    /// the load.
    pub fn throwing() -> Self {
        Self {
            policy: Policy::Throwing,
        }
    }

    /// Abort the load with an error produced by `factory` from the formatted
    /// failure message and the cause.
    pub fn throwing_with<F>(factory: F) -> Self
    where
        F: Fn(String, ForgeError) -> ForgeError + Send + Sync + 'static,
    {
        Self {
            policy: Policy::ThrowingWith(Arc::new(factory)),
        }
    }

    /// Record a trace-level diagnostic and drop the failed entry.
    pub fn logging() -> Self {
        Self {
            policy: Policy::Logging,
        }
    }

    /// Pass the formatted failure message and the cause to `consumer`, then
    /// drop the failed entry.
    pub fn handle_message<F>(consumer: F) -> Self
    where
        F: Fn(&str, &ForgeError) + Send + Sync + 'static,
    {
        Self {
            policy: Policy::Message(Arc::new(consumer)),
        }
    }

    /// Apply this policy to one failed candidate.
    pub fn handle_failure(
        &self,
        factory_type: &str,
        class_name: &str,
        cause: ForgeError,
    ) -> Result<()> {
        match &self.policy {
            Policy::Throwing => Err(ForgeError::unable_to_instantiate(
                class_name,
                factory_type,
                cause,
            )),
            Policy::ThrowingWith(factory) => {
                Err(factory(failure_message(factory_type, class_name), cause))
            }
            Policy::Logging => {
                trace!(
                    factory_type,
                    class_name,
                    cause = %cause,
                    "{}",
                    failure_message(factory_type, class_name)
                );
                Ok(())
            }
            Policy::Message(consumer) => {
                consumer(&failure_message(factory_type, class_name), &cause);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for FailureHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = match &self.policy {
            Policy::Throwing => "Throwing",
            Policy::ThrowingWith(_) => "ThrowingWith",
            Policy::Logging => "Logging",
            Policy::Message(_) => "Message",
        };
        write!(f, "FailureHandler({policy})")
    }
}

pub(crate) fn failure_message(factory_type: &str, class_name: &str) -> String {
    format!("Unable to instantiate factory class [{class_name}] for factory type [{factory_type}]")
}
