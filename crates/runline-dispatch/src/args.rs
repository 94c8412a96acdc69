//! Argument containers.
//!
//! The CLI tail arrives as loose `name=value` tokens. [`NamedArguments`]
//! holds them keyed by name, [`CommandArgs`] is what a caller hands to the
//! adapter, and [`PositionalArguments`] is what a target finally receives.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::handler::Completion;

/// Argument name → raw value, with `None` as the absent marker.
///
/// Keys are unique; inserting an existing key replaces its value, so the
/// last occurrence of a repeated token wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamedArguments {
    map: BTreeMap<String, Option<String>>,
}

impl NamedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mapping from raw CLI tokens.
    ///
    /// Each token is split on its first `=`: `name=Ada` maps `name` to
    /// `Some("Ada")`, `a=b=c` maps `a` to `Some("b=c")`, and a token with no
    /// `=` maps its full text to `None`.
    ///
    /// ```rust
    /// use runline_dispatch::NamedArguments;
    ///
    /// let args = NamedArguments::from_tokens(["greet", "name=Ada"]);
    /// assert_eq!(args.get("greet"), None);
    /// assert!(args.contains("greet"));
    /// assert_eq!(args.get("name"), Some("Ada"));
    /// ```
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = Self::new();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once('=') {
                Some((name, value)) => args.insert(name, Some(value.to_string())),
                None => args.insert(token, None),
            };
        }
        args
    }

    /// Sets `name`, returning the previous entry if the key existed.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: Option<String>,
    ) -> Option<Option<String>> {
        self.map.insert(name.into(), value)
    }

    /// Returns the value bound to `name`. Absent and unknown both yield `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).and_then(|v| v.as_deref())
    }

    /// Returns true if `name` appeared at all, even without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for NamedArguments {
    fn from_iter<T: IntoIterator<Item = (K, Option<V>)>>(iter: T) -> Self {
        let mut args = Self::new();
        for (k, v) in iter {
            args.insert(k, v.map(Into::into));
        }
        args
    }
}

/// The two input shapes the binder accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandArgs {
    /// Name → value mapping, bound against the declared parameter names.
    Named(NamedArguments),
    /// Values already in call order, passed through untouched.
    Positional(Vec<Option<String>>),
}

impl CommandArgs {
    /// Returns the named mapping, if this is the named shape.
    pub fn named(&self) -> Option<&NamedArguments> {
        match self {
            CommandArgs::Named(args) => Some(args),
            CommandArgs::Positional(_) => None,
        }
    }
}

impl Default for CommandArgs {
    fn default() -> Self {
        CommandArgs::Named(NamedArguments::new())
    }
}

impl From<NamedArguments> for CommandArgs {
    fn from(args: NamedArguments) -> Self {
        CommandArgs::Named(args)
    }
}

impl From<Vec<Option<String>>> for CommandArgs {
    fn from(values: Vec<Option<String>>) -> Self {
        CommandArgs::Positional(values)
    }
}

/// The ordered arguments handed to one invocation.
///
/// Owned by that invocation alone. For callback-style targets the
/// [`Completion`] occupies the slot after the last value.
#[derive(Debug, Default)]
pub struct PositionalArguments {
    values: Vec<Option<String>>,
    completion: Option<Completion>,
}

impl PositionalArguments {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self {
            values,
            completion: None,
        }
    }

    /// Appends the completion slot.
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Number of slots, counting the completion slot when present.
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.completion.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Returns the value in slot `index`; out-of-range slots read as absent.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Removes and returns the completion slot.
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.completion.take()
    }

    pub fn into_parts(self) -> (Vec<Option<String>>, Option<Completion>) {
        (self.values, self.completion)
    }
}
