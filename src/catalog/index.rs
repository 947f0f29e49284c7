//! Indexed view of a fetched command list.
//!
//! The client downloads the catalog once per session and looks commands up by
//! [`CommandFeature`]. Candidates for one feature keep catalog order, so the
//! first-registered owner is always candidate 1.

use crate::catalog::model::{Command, CommandFeature, CommandList};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
/// Command list plus a derived index keyed by `(name, arg count)`.
pub struct CommandIndex {
    commands: CommandList,
    by_feature: BTreeMap<CommandFeature, Vec<Command>>,
}

impl CommandIndex {
    pub fn new(commands: CommandList) -> Self {
        let mut by_feature: BTreeMap<CommandFeature, Vec<Command>> = BTreeMap::new();
        for command in commands.iter() {
            by_feature
                .entry(command.feature())
                .or_default()
                .push(command.clone());
        }
        Self {
            commands,
            by_feature,
        }
    }

    /// Every command sharing `feature`, in catalog order. Empty when unknown.
    pub fn candidates(&self, feature: &CommandFeature) -> &[Command] {
        self.by_feature
            .get(feature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates features in stable order.
    pub fn features(&self) -> impl Iterator<Item = &CommandFeature> {
        self.by_feature.keys()
    }

    /// Access the list the index was built from.
    pub fn commands(&self) -> &CommandList {
        &self.commands
    }
}
