//! A single named engine option and the rules for writing to it.

use std::fmt;

use crate::error::OptionError;

/// Callback fired after an option accepts a write.
pub type OnChange = Box<dyn Fn(&UciOption) + Send>;

/// Kind of an option, carrying its default and current value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    /// Free text.
    String { default: String, current: String },
    /// Boolean, written as `true` or `false`.
    Check { default: bool, current: bool },
    /// Number bounded by `min..=max`.
    ///
    /// Values are kept as `f64` so fractional writes survive; rendering
    /// truncates the default to an integer.
    Spin {
        default: f64,
        current: f64,
        min: i64,
        max: i64,
    },
    /// One of a list of named choices.
    Combo {
        default: String,
        current: String,
        choices: Vec<String>,
    },
    /// Stateless trigger.
    Button,
}

impl OptionKind {
    /// The protocol type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionKind::String { .. } => "string",
            OptionKind::Check { .. } => "check",
            OptionKind::Spin { .. } => "spin",
            OptionKind::Combo { .. } => "combo",
            OptionKind::Button => "button",
        }
    }
}

/// Everything needed to register an option, except its name.
pub struct OptionSpec {
    pub(crate) kind: OptionKind,
    pub(crate) on_change: Option<OnChange>,
}

impl OptionSpec {
    /// A string option.
    pub fn string(default: impl Into<String>) -> Self {
        let default = default.into();
        Self::with_kind(OptionKind::String {
            current: default.clone(),
            default,
        })
    }

    /// A check option.
    pub fn check(default: bool) -> Self {
        Self::with_kind(OptionKind::Check {
            default,
            current: default,
        })
    }

    /// A spin option bounded by `min..=max`.
    pub fn spin(default: f64, min: i64, max: i64) -> Self {
        Self::with_kind(OptionKind::Spin {
            default,
            current: default,
            min,
            max,
        })
    }

    /// A combo option. `choices` is rendered in the given order.
    pub fn combo<I, S>(default: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default = default.into();
        Self::with_kind(OptionKind::Combo {
            current: default.clone(),
            default,
            choices: choices.into_iter().map(Into::into).collect(),
        })
    }

    /// A button.
    pub fn button() -> Self {
        Self::with_kind(OptionKind::Button)
    }

    /// Attach a callback run after every accepted write.
    pub fn on_change(mut self, callback: impl Fn(&UciOption) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    fn with_kind(kind: OptionKind) -> Self {
        Self {
            kind,
            on_change: None,
        }
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("kind", &self.kind)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// A registered option.
pub struct UciOption {
    name: String,
    kind: OptionKind,
    index: usize,
    on_change: Option<OnChange>,
}

impl UciOption {
    pub(crate) fn new(name: &str, spec: OptionSpec, index: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: spec.kind,
            index,
            on_change: spec.on_change,
        }
    }

    /// The name as registered, with its original casing.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in registration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Kind, default and current value.
    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    /// Current value of a check option.
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            OptionKind::Check { current, .. } => Some(current),
            _ => None,
        }
    }

    /// Current value of a spin option.
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            OptionKind::Spin { current, .. } => Some(current),
            _ => None,
        }
    }

    /// Current value of a spin option, truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|v| v as i64)
    }

    /// Current value of a string or combo option.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            OptionKind::String { current, .. } | OptionKind::Combo { current, .. } => {
                Some(current)
            }
            _ => None,
        }
    }

    /// Whether a combo option currently holds `choice`, ignoring case.
    pub fn is(&self, choice: &str) -> bool {
        match &self.kind {
            OptionKind::Combo { current, .. } => current.eq_ignore_ascii_case(choice),
            _ => false,
        }
    }

    /// Current value as text. Buttons have none.
    pub fn current_value(&self) -> String {
        match &self.kind {
            OptionKind::String { current, .. } | OptionKind::Combo { current, .. } => {
                current.clone()
            }
            OptionKind::Check { current, .. } => current.to_string(),
            OptionKind::Spin { current, .. } => current.to_string(),
            OptionKind::Button => String::new(),
        }
    }

    /// Validate `value`, store it, then run the callback.
    ///
    /// A rejected write leaves the option untouched and fires nothing.
    pub(crate) fn write(&mut self, value: &str) -> Result<(), OptionError> {
        let value = value.trim();
        if value.is_empty() && !matches!(self.kind, OptionKind::Button) {
            return Err(OptionError::EmptyValue {
                name: self.name.clone(),
            });
        }

        match &mut self.kind {
            OptionKind::String { current, .. } | OptionKind::Combo { current, .. } => {
                *current = value.to_string();
            }
            OptionKind::Check { current, .. } => {
                *current = match value {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(OptionError::NotBoolean {
                            name: self.name.clone(),
                            value: value.to_string(),
                        });
                    }
                };
            }
            OptionKind::Spin {
                current, min, max, ..
            } => {
                let number = value
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| OptionError::NotANumber {
                        name: self.name.clone(),
                        value: value.to_string(),
                    })?;
                if number < *min as f64 || number > *max as f64 {
                    return Err(OptionError::OutOfRange {
                        name: self.name.clone(),
                        value: number,
                        min: *min,
                        max: *max,
                    });
                }
                *current = number;
            }
            OptionKind::Button => {}
        }

        if let Some(callback) = &self.on_change {
            callback(self);
        }
        Ok(())
    }

    /// The `option name ...` line announced to a GUI.
    pub fn render(&self) -> String {
        let mut line = format!("option name {} type {}", self.name, self.kind.type_name());
        match &self.kind {
            OptionKind::String { default, .. } => {
                line.push_str(&format!(" default {default}"));
            }
            OptionKind::Check { default, .. } => {
                line.push_str(&format!(" default {default}"));
            }
            OptionKind::Spin {
                default, min, max, ..
            } => {
                line.push_str(&format!(
                    " default {} min {min} max {max}",
                    *default as i64
                ));
            }
            OptionKind::Combo {
                default, choices, ..
            } => {
                line.push_str(&format!(" default {default}"));
                for choice in choices {
                    line.push_str(&format!(" var {choice}"));
                }
            }
            OptionKind::Button => {}
        }
        line
    }
}

impl PartialEq<&str> for UciOption {
    fn eq(&self, other: &&str) -> bool {
        self.is(other)
    }
}

impl fmt::Debug for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UciOption")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
