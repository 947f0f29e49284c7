//! Command resolution against a downloaded catalog.
//!
//! A command typed by an operator is a name plus string arguments. Resolution
//! looks up every command with that name and argument count and reports
//! whether there is none, exactly one, or several; choosing between several is
//! left to a [`Chooser`] supplied by the caller.

use crate::catalog::{Command, CommandFeature, CommandIndex};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolveOptions {
    /// When `name` with one argument has no match, retry `name` with none.
    ///
    /// This is what lets `count 5` write the zero-argument attribute `count`.
    pub single_arg_fallback: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            single_arg_fallback: true,
        }
    }
}

impl ResolveOptions {
    /// Exact `(name, arg count)` matching only.
    pub fn strict() -> Self {
        Self {
            single_arg_fallback: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    Single(Command),
    /// Candidates in catalog order; the first-registered owner comes first.
    Ambiguous(Vec<Command>),
}

pub fn resolve(
    index: &CommandIndex,
    name: &str,
    arg_count: usize,
    options: ResolveOptions,
) -> Resolution {
    let mut candidates = index.candidates(&CommandFeature::new(name, arg_count));
    if candidates.is_empty() && arg_count == 1 && options.single_arg_fallback {
        candidates = fallback_candidates(index, name);
    }
    match candidates {
        [] => Resolution::NotFound,
        [only] => Resolution::Single(only.clone()),
        many => Resolution::Ambiguous(many.to_vec()),
    }
}

/// Zero-argument commands named `name`, tried when a single supplied argument
/// matched nothing.
pub fn fallback_candidates<'a>(index: &'a CommandIndex, name: &str) -> &'a [Command] {
    index.candidates(&CommandFeature::new(name, 0))
}

/// Picks one of several candidates. Returns a 1-based index; anything outside
/// `1..=candidates.len()` means no valid selection.
pub trait Chooser {
    fn choose(&mut self, candidates: &[Command]) -> usize;
}

impl<F> Chooser for F
where
    F: FnMut(&[Command]) -> usize,
{
    fn choose(&mut self, candidates: &[Command]) -> usize {
        self(candidates)
    }
}
