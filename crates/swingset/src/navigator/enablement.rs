//! Button enablement as a pure function of navigator state.

use serde::{Deserialize, Serialize};

use super::NavigatorRowState;
use crate::config::NavigatorConfig;

/// How strictly button enablement follows row state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnablementPolicy {
    /// Commit and undo are always enabled and input errors are ignored.
    Legacy,
    /// A modified row or invalid input blocks navigation unless auto-commit
    /// is on, and commit/undo are enabled only when there is something to do.
    #[default]
    Strict,
}

/// Everything button enablement depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnablementInputs {
    /// Rows in the result.
    pub row_count: usize,
    /// 1-based current row, 0 when not on a stored row.
    pub current_row: usize,
    /// On the insert row.
    pub inserting: bool,
    /// The current row has unsaved edits.
    pub row_modified: bool,
    /// Some bound component holds invalid input.
    pub has_errors: bool,
    /// Modified rows are committed implicitly on navigation.
    pub auto_commit: bool,
    /// Rows may be updated.
    pub modification_allowed: bool,
    /// Rows may be inserted.
    pub insertion_allowed: bool,
    /// Rows may be deleted.
    pub deletion_allowed: bool,
}

impl EnablementInputs {
    /// Combine row state with navigator settings.
    pub fn new(state: &NavigatorRowState, config: &NavigatorConfig) -> Self {
        Self {
            row_count: state.row_count,
            current_row: state.current_row,
            inserting: state.inserting,
            row_modified: state.row_modified,
            has_errors: state.has_errors,
            auto_commit: config.auto_commit,
            modification_allowed: config.modification_allowed,
            insertion_allowed: config.insertion_allowed,
            deletion_allowed: config.deletion_allowed,
        }
    }
}

/// Enabled state of each navigator button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonStates {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
    pub commit: bool,
    pub undo: bool,
    pub add: bool,
    pub delete: bool,
    pub refresh: bool,
}

impl ButtonStates {
    /// Whether any of first/previous/next/last is enabled.
    pub fn any_navigation(&self) -> bool {
        self.first || self.previous || self.next || self.last
    }
}

/// Compute button enablement.
///
/// Pure: equal inputs always give equal outputs.
pub fn compute(policy: EnablementPolicy, inputs: &EnablementInputs) -> ButtonStates {
    let strict = policy == EnablementPolicy::Strict;

    if inputs.inserting {
        return ButtonStates {
            commit: !(strict && inputs.has_errors),
            undo: true,
            ..ButtonStates::default()
        };
    }

    let error_block = strict && inputs.has_errors;
    let dirty_block = strict && inputs.row_modified && !inputs.auto_commit;
    let can_move = !error_block && !dirty_block && inputs.row_count > 0;
    let current = inputs.current_row;
    let on_row = current > 0;

    let (commit, undo) = if strict {
        (
            inputs.modification_allowed && inputs.row_modified && on_row && !inputs.has_errors,
            inputs.row_modified,
        )
    } else {
        (inputs.modification_allowed, inputs.modification_allowed)
    };

    ButtonStates {
        first: can_move && current != 1,
        previous: can_move && current > 1,
        next: can_move && current < inputs.row_count,
        last: can_move && current != inputs.row_count,
        commit,
        undo,
        add: inputs.insertion_allowed && !error_block,
        delete: inputs.deletion_allowed && on_row && !error_block,
        refresh: true,
    }
}
