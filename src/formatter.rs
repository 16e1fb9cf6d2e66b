//! Pluggable record formatters.
//!
//! A formatter replaces the built-in form/JSON serialisers. It receives the
//! record and returns the complete [`Payload`], which the dispatcher sends
//! untouched. Formatters are registered by name in a [`FormatterRegistry`] so
//! configuration can refer to them with the `format` key.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::http_output::{Payload, SerialisationError};
use crate::record::Record;

/// Trait for turning a record into a request payload.
///
/// Implementors must be thread-safe (`Send + Sync`) so a dispatcher holding
/// them can be shared across threads.
pub trait RecordFormatter: Send + Sync {
    /// Format a record into a request body and content type.
    fn format(&self, record: &Record) -> Result<Payload, SerialisationError>;
}

impl<F> RecordFormatter for F
where
    F: Fn(&Record) -> Result<Payload, SerialisationError> + Send + Sync,
{
    fn format(&self, record: &Record) -> Result<Payload, SerialisationError> {
        self(record)
    }
}

/// Shared formatter trait object used by dispatchers.
#[derive(Clone)]
pub struct SharedFormatter {
    name: String,
    inner: Arc<dyn RecordFormatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(name: impl Into<String>, formatter: F) -> Self
    where
        F: RecordFormatter + 'static,
    {
        Self {
            name: name.into(),
            inner: Arc::new(formatter),
        }
    }

    /// Name the formatter was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format a record using the wrapped formatter instance.
    pub fn format(&self, record: &Record) -> Result<Payload, SerialisationError> {
        self.inner.format(record)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedFormatter({:?})", self.name)
    }
}

/// Named formatters available to configuration.
#[derive(Clone, Debug, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, SharedFormatter>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `formatter` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F) -> &mut Self
    where
        F: RecordFormatter + 'static,
    {
        let name = name.into();
        self.formatters
            .insert(name.clone(), SharedFormatter::new(name, formatter));
        self
    }

    /// Look up a formatter by name.
    pub fn get(&self, name: &str) -> Option<SharedFormatter> {
        self.formatters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }
}
