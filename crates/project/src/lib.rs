//! 小說專案的章節儲存、順序檔與工作階段。 /
//! Chapter storage, order manifest and open-project context for novelmerge.

mod error;

pub mod context;
pub mod manifest;
pub mod store;
pub mod workspace;

pub use context::{expand_inputs, AddOptions, AddedFile, ProjectContext};
pub use error::ProjectError;
pub use manifest::{Manifest, MANIFEST_FILE, ORDER_SECTION};
pub use store::{AppendOptions, AppendOutcome, Chapter, NameConflictPolicy, ProjectStore};
pub use workspace::{Workspace, HISTORY_FILE, PREFERENCES_FILE, PROJECTS_DIR};
