//! Tracks which flags count as supplied.
//!
//! A flag is present when it holds a non-empty value that did not come from
//! the command line (an environment fallback or a declared default), or when
//! it appeared on the command line at all, whatever its value. The second
//! rule lets `-user=` or `-poweron=false` count as supplied even though their
//! values look unset.

use std::collections::BTreeSet;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

/// Names of the flags considered explicitly satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSet {
    names: BTreeSet<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the set from a parsed command line.
    pub fn collect(command: &Command, matches: &ArgMatches) -> Self {
        let mut presence = Self::new();

        // Values that differ from the empty default, wherever they came from.
        for arg in command.get_arguments() {
            if holds_value(arg, matches) {
                presence.insert(arg.get_id().as_str());
            }
        }

        // Everything given on the command line, regardless of value.
        for arg in command.get_arguments() {
            let id = arg.get_id().as_str();
            if matches!(matches.value_source(id), Some(ValueSource::CommandLine)) {
                presence.insert(id);
            }
        }

        presence
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names from `required` that are not present, in the order given.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }
}

/// Whether `arg` currently holds something other than its empty sentinel.
///
/// Repeatable flags are empty when they hold no entries; scalar flags when
/// their value is the empty string. A boolean default of `false` is a value.
fn holds_value(arg: &Arg, matches: &ArgMatches) -> bool {
    let Ok(Some(mut values)) = matches.try_get_raw(arg.get_id().as_str()) else {
        return false;
    };
    match arg.get_action() {
        ArgAction::Append => values.next().is_some(),
        _ => values.any(|value| !value.is_empty()),
    }
}
