//! Named option storage with case-insensitive lookup.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::OptionError;
use crate::option::{OptionSpec, UciOption};

/// Options keyed by name, ignoring ASCII case.
///
/// Lookups fold case; rendering and iteration follow registration order.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    options: BTreeMap<String, UciOption>,
    next_index: usize,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl OptionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option. Fails if a name differing only in case is present.
    pub fn register(&mut self, name: &str, spec: OptionSpec) -> Result<(), OptionError> {
        let k = key(name);
        if self.options.contains_key(&k) {
            return Err(OptionError::Duplicate {
                name: name.to_string(),
            });
        }
        self.options
            .insert(k, UciOption::new(name, spec, self.next_index));
        self.next_index += 1;
        Ok(())
    }

    /// Look an option up by name.
    pub fn get(&self, name: &str) -> Option<&UciOption> {
        self.options.get(&key(name))
    }

    /// Whether an option with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(&key(name))
    }

    /// Number of registered options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether no option is registered.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Write `value` to the named option, running its callback on success.
    pub fn try_set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let option = self
            .options
            .get_mut(&key(name))
            .ok_or_else(|| OptionError::Unknown {
                name: name.to_string(),
            })?;
        option.write(value)?;
        debug!(option = option.name(), value = %option.current_value(), "option set");
        Ok(())
    }

    /// Protocol-facing write: rejections are logged and otherwise ignored.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Err(e) = self.try_set(name, value) {
            debug!(error = %e, "option write ignored");
        }
    }

    /// Options in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &UciOption> {
        let mut ordered: Vec<&UciOption> = self.options.values().collect();
        ordered.sort_by_key(|o| o.index());
        ordered.into_iter()
    }

    /// Every option line, in registration order.
    pub fn render(&self) -> Vec<String> {
        self.iter().map(UciOption::render).collect()
    }

    /// Current value of a check option.
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// Current value of a spin option.
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    /// Current value of a spin option, truncated.
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    /// Current value of a string or combo option.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }
}

impl fmt::Display for OptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.render() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
