use super::types::SheetData;
use super::utils::normalized_key;
use crate::models::{percent_of, CrossSheetMatch, CrossSheetSummary, SheetIdentity, SkippedSheet};
use std::collections::HashSet;

/// Which sheets take part in a cross-sheet check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScope {
    pub source: usize,
    pub only: Option<usize>,
}

impl MatchScope {
    pub fn includes(&self, sheet: &SheetIdentity) -> bool {
        sheet.index != self.source && self.only.map_or(true, |only| only == sheet.index)
    }
}

/// Result of checking one target sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Matched(CrossSheetMatch),
    NoMatch,
    Skipped(SkippedSheet),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matches: Vec<CrossSheetMatch>,
    pub skipped: Vec<SkippedSheet>,
}

impl MatchOutcome {
    pub fn push(&mut self, outcome: SheetOutcome) {
        match outcome {
            SheetOutcome::Matched(m) => self.matches.push(m),
            SheetOutcome::Skipped(s) => self.skipped.push(s),
            SheetOutcome::NoMatch => {}
        }
    }
}

/// Looks up the values of a source column in other sheets.
pub struct CrossSheetMatcher {
    row_limit: Option<usize>,
}

impl CrossSheetMatcher {
    pub fn new() -> Self {
        Self { row_limit: None }
    }

    /// Debug/preview variant: only the first `limit` rows of each target sheet
    /// are scanned, so results are partial.
    pub fn with_row_limit(limit: usize) -> Self {
        Self { row_limit: Some(limit) }
    }

    pub fn is_partial(&self) -> bool {
        self.row_limit.is_some()
    }

    /// Non-blank normalized values of a column, duplicates kept.
    pub fn source_values(data: &SheetData, column: usize) -> Vec<String> {
        data.column(column).filter_map(normalized_key).collect()
    }

    /// Checks every in-scope target sheet.
    pub fn find_matches<'a, I>(
        &self,
        source_values: &[String],
        targets: I,
        target_column: Option<&str>,
        scope: MatchScope,
    ) -> MatchOutcome
    where
        I: IntoIterator<Item = (&'a SheetIdentity, &'a SheetData)>,
    {
        let mut outcome = MatchOutcome::default();
        for (sheet, data) in targets.into_iter().filter(|(sheet, _)| scope.includes(sheet)) {
            outcome.push(self.match_sheet(source_values, sheet, data, target_column));
        }
        outcome
    }

    /// `count` is the number of source values (duplicates included) present
    /// in the target, so it can exceed the number of distinct matched values.
    pub fn match_sheet(
        &self,
        source_values: &[String],
        sheet: &SheetIdentity,
        data: &SheetData,
        target_column: Option<&str>,
    ) -> SheetOutcome {
        tracing::debug!("Checking sheet: {} ({})", sheet.name, sheet.index);
        let limit = self.row_limit.unwrap_or(usize::MAX);
        if self.row_limit.is_some() {
            tracing::warn!("Debug mode: only checking first {} rows of '{}'", limit, sheet.name);
        }

        if data.is_empty() {
            return SheetOutcome::NoMatch;
        }

        let target_values: HashSet<String> = match target_column {
            Some(column) => match data.column_index(column) {
                Some(idx) => data.column(idx).take(limit).filter_map(normalized_key).collect(),
                None => {
                    tracing::warn!("Column '{}' not found in '{}'", column, sheet.name);
                    return SheetOutcome::Skipped(SkippedSheet {
                        sheet: sheet.clone(),
                        reason: format!("column '{}' not found", column),
                    });
                }
            },
            None => data.cells(limit).filter_map(|cell| normalized_key(Some(cell))).collect(),
        };

        let mut count = 0;
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for value in source_values.iter().filter(|v| target_values.contains(*v)) {
            count += 1;
            if seen.insert(value.as_str()) {
                values.push(value.clone());
            }
        }

        if count == 0 {
            return SheetOutcome::NoMatch;
        }

        SheetOutcome::Matched(CrossSheetMatch {
            sheet: sheet.clone(),
            column: target_column.map(str::to_string),
            count,
            values,
        })
    }

    pub fn summarize(
        &self,
        source_sheet: &SheetIdentity,
        source_column: &str,
        target_column: Option<&str>,
        source_values: &[String],
        outcome: MatchOutcome,
    ) -> CrossSheetSummary {
        let total = source_values.len();
        let found = outcome.matches.iter().map(|m| m.count).sum();

        CrossSheetSummary {
            source_sheet: source_sheet.clone(),
            source_column: source_column.to_string(),
            target_column: target_column.map(str::to_string),
            total,
            found,
            percent: percent_of(found, total),
            matches: outcome.matches,
            skipped: outcome.skipped,
            partial: self.is_partial(),
        }
    }
}

impl Default for CrossSheetMatcher {
    fn default() -> Self {
        Self::new()
    }
}
