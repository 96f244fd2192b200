//! Prelude module for common imports

pub use crate::patcher::{
    BackupPolicy, ConfigKey, ConfigPatcher, LineSyntax, PatchError, PatchOptions, PatchOutcome,
    PatchSession, SectionHeader,
};
pub use crate::plan::{Assignment, FileEntry, PatchPlan, PlanReport, Selection};
