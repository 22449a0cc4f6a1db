//! Filling a selection's option list from a query.

use swingset_core::PerfSpan;
use swingset_core::logging::targets;

use crate::binding::BoundSelection;
use crate::cursor::{ColumnScalar, TabularCursor};
use crate::error::BindingResult;
use crate::model::OptionValue;

struct LoadedRow<M, O, O2> {
    mapping: M,
    option: O,
    option2: Option<O2>,
}

impl<M, O, O2> BoundSelection<M, O, O2>
where
    M: ColumnScalar,
    O: OptionValue + ColumnScalar,
    O2: OptionValue + ColumnScalar,
{
    /// Replace the option list with every row of `source`.
    ///
    /// Each row supplies a mapping from `mapping_column`, an option from
    /// `option_column` and, if given, a secondary option from
    /// `option2_column`. Rows whose mapping is NULL or does not convert are
    /// skipped with a warning. All rows are read before the list changes, so
    /// a data-access failure leaves the list untouched.
    ///
    /// Returns the number of items loaded.
    pub fn populate_from_cursor(
        &self,
        source: &dyn TabularCursor,
        mapping_column: &str,
        option_column: &str,
        option2_column: Option<&str>,
    ) -> BindingResult<usize> {
        let _perf = PerfSpan::new("populate_from_cursor");
        let mapping_type = source.column_type(mapping_column)?;
        let option_type = source.column_type(option_column)?;
        let option2_type = option2_column
            .map(|column| source.column_type(column))
            .transpose()?;

        let mut rows: Vec<LoadedRow<M, O, O2>> = Vec::new();
        let mut more = source.first()?;
        while more {
            let row = source.current_row()?;
            let mapping = match M::read_column(source.column_text(mapping_column)?.as_deref(), mapping_type) {
                Ok(Some(mapping)) => mapping,
                Ok(None) => {
                    tracing::warn!(target: targets::SELECTION, row, "skipping option row with NULL mapping");
                    more = source.next()?;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(target: targets::SELECTION, row, error = %err, "skipping option row");
                    more = source.next()?;
                    continue;
                }
            };
            let option = O::read_column(source.column_text(option_column)?.as_deref(), option_type)
                .ok()
                .flatten()
                .unwrap_or_default();
            let option2 = match (option2_column, option2_type) {
                (Some(column), Some(column_type)) => {
                    O2::read_column(source.column_text(column)?.as_deref(), column_type)
                        .ok()
                        .flatten()
                }
                _ => None,
            };
            rows.push(LoadedRow {
                mapping,
                option,
                option2,
            });
            more = source.next()?;
        }

        let loaded = rows.len();
        let mut session = self.remodel()?;
        session.clear();
        for row in rows {
            match row.option2 {
                Some(option2) => session.add_with_option2(row.mapping, row.option, option2),
                None => session.add(row.mapping, row.option),
            };
        }
        tracing::debug!(target: targets::SELECTION, loaded, "option list populated");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{ColumnSpec, ColumnType, CursorOp, MemoryCursor};
    use crate::error::{BindingError, CursorError};

    fn lookup() -> MemoryCursor {
        MemoryCursor::new(vec![
            ColumnSpec::new("state_id", ColumnType::Integer),
            ColumnSpec::new("name", ColumnType::VarChar),
            ColumnSpec::new("code", ColumnType::Char),
        ])
        .with_row([Some("1"), Some("Alabama"), Some("AL")])
        .with_row([Some("x"), Some("Broken"), Some("??")])
        .with_row([None, Some("Orphan"), None])
        .with_row([Some("2"), Some("Alaska"), None])
    }

    #[test]
    fn test_populate_skips_bad_rows() {
        let selection: BoundSelection<i32> = BoundSelection::new();
        let loaded = selection
            .populate_from_cursor(&lookup(), "state_id", "name", Some("code"))
            .unwrap();
        assert_eq!(loaded, 2);

        let items = selection.store().items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].display_text(" - "), "Alabama - AL");
        assert_eq!(items[1].display_text(" - "), "Alaska");
    }

    #[test]
    fn test_populate_keeps_null_item() {
        let selection: BoundSelection<i32> = BoundSelection::new();
        selection.set_allow_null(true);
        selection
            .populate_from_cursor(&lookup(), "state_id", "name", None)
            .unwrap();
        assert_eq!(selection.store().len(), 3);
        assert!(selection.store().item_at(0).unwrap().is_null());
    }

    #[test]
    fn test_populate_failure_leaves_list() {
        let selection: BoundSelection<i32> = BoundSelection::new();
        selection
            .set_options(vec![9], vec!["Keep".into()])
            .unwrap();

        let source = lookup();
        source.fail_next(CursorOp::Navigate);
        let err = selection
            .populate_from_cursor(&source, "state_id", "name", None)
            .unwrap_err();
        assert!(matches!(err, BindingError::Cursor(CursorError::Backend(_))));
        assert_eq!(selection.store().len(), 1);

        let err = selection
            .populate_from_cursor(&source, "missing", "name", None)
            .unwrap_err();
        assert!(matches!(err, BindingError::Cursor(CursorError::NoSuchColumn(_))));
    }
}
