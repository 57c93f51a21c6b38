use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the application is going to be launched.
///
/// Each mode resolves its own model: development mode activates
/// `conditional-dev-dependencies` and makes workspace modules reloadable, test
/// mode pulls in the root's test-scoped dependencies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    #[default]
    Normal,
    #[serde(rename = "dev", alias = "development")]
    #[value(name = "dev", alias = "development")]
    Development,
    Test,
}

impl LaunchMode {
    pub const ALL: [Self; 3] = [Self::Normal, Self::Development, Self::Test];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Development => "dev",
            Self::Test => "test",
        }
    }

    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn includes_test_scope(self) -> bool {
        matches!(self, Self::Test)
    }

    /// Value of the variant attributes selected by this mode's resolution.
    pub fn configuration_name(self) -> String {
        format!("deployment-{}", self.name())
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
