// crates/common/src/options.rs
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Job arguments resolved from `--KEY value` / `--KEY=value` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOptions {
    values: BTreeMap<String, String>,
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `--KEY` flag from an argument list.
    ///
    /// Later occurrences of a key win. Positional arguments are ignored and a
    /// flag followed by another flag (or nothing) resolves to an empty string.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = BTreeMap::new();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.next() {
            let Some(flag) = arg.strip_prefix("--") else {
                continue;
            };
            if flag.is_empty() {
                continue;
            }

            match flag.split_once('=') {
                Some((key, value)) => {
                    values.insert(key.to_string(), value.to_string());
                }
                None => {
                    let takes_value = args.peek().is_some_and(|next| !next.starts_with("--"));
                    let value = if takes_value {
                        args.next().unwrap_or_default()
                    } else {
                        String::new()
                    };
                    values.insert(flag.to_string(), value);
                }
            }
        }

        Self { values }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of `key` if present and not blank
    pub fn non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Fail with a configuration error naming every required key that is
    /// missing or blank.
    pub fn resolve(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|key| self.non_blank(key).is_none())
            .map(|key| format!("--{}", key))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "missing required job option(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
