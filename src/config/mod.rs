//! Tiered configuration.
//!
//! Configuration is merged field by field from four tiers:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/taskflow/config.yaml`
//! 3. **User** - `~/.taskflow/config.yaml`
//! 4. **Environment** - individual overrides, see below
//!
//! ## Environment Variables
//! - `TASKFLOW_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `TASKFLOW_PROJECT_DIR` - Project config dir (default: `./taskflow`)
//! - `TASKFLOW_USER_DIR` - User config dir (default: `~/.taskflow`)
//! - `TASKFLOW_SESSION_PATH` - Session record file
//! - `TASKFLOW_FIXTURES_PATH` - Fixture dataset file
//! - `TASKFLOW_PORT` - HTTP port

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
