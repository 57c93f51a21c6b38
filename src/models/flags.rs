//! Per-dependency boolean state.

use bitflags::bitflags;
use serde::{Serialize, Serializer};

bitflags! {
    /// Role and placement flags of a resolved dependency.
    ///
    /// Flags are only ever OR'd in while a model is being built; the single way
    /// to drop one is [`Dependency::clear_flags`](crate::models::Dependency::clear_flags).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DependencyFlags: u32 {
        const DIRECT = 1 << 0;
        const OPTIONAL = 1 << 1;
        const PROJECT_MODULE = 1 << 2;
        const RELOADABLE = 1 << 3;
        const RUNTIME_CP = 1 << 4;
        const DEPLOYMENT_CP = 1 << 5;
        const RUNTIME_EXTENSION_ARTIFACT = 1 << 6;
        const TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT = 1 << 7;
    }
}

impl DependencyFlags {
    /// Lower-case flag names, for reports.
    pub fn names(self) -> Vec<String> {
        self.iter_names().map(|(name, _)| name.to_ascii_lowercase()).collect()
    }
}

impl Serialize for DependencyFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
