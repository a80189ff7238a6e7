use std::collections::HashSet;

use proptest::prelude::*;

use sheet_inspect::models::SheetIdentity;
use sheet_inspect::services::excel::matcher::{MatchScope, SheetOutcome};
use sheet_inspect::services::excel::types::{CellValue, Row, SheetData};
use sheet_inspect::services::excel::utils::normalize;
use sheet_inspect::services::excel::{CrossSheetMatcher, ExcelAnalyzer};
use sheet_inspect::Config;

fn cell() -> impl Strategy<Value = Option<CellValue>> {
    prop_oneof![
        Just(None),
        Just(Some(CellValue::Empty)),
        Just(Some(CellValue::Text(String::new()))),
        "[a-e]{1,2}".prop_map(|s| Some(CellValue::Text(s))),
        (0i64..30).prop_map(|i| Some(CellValue::Int(i))),
        (0u32..5, 0u32..24).prop_map(|(day, hour)| {
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1 + day)
                .and_then(|d| d.and_hms_opt(hour, 0, 0))
                .map(CellValue::DateTime)
        }),
    ]
}

fn values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-f]", 0..40)
}

fn sheet(values: &[String]) -> SheetData {
    SheetData::new(
        vec!["key".into()],
        values.iter().map(|v| Row::new(vec![CellValue::Text(v.clone())])).collect(),
    )
}

proptest! {
    #[test]
    fn profile_counts_stay_within_bounds(cells in prop::collection::vec(cell(), 0..60)) {
        let analyzer = ExcelAnalyzer::new(&Config::default());
        let total = cells.len();
        let profile = analyzer.profile_column("col", cells.iter().map(Option::as_ref), total);

        prop_assert!(profile.filled <= profile.total);
        prop_assert!(profile.distinct_count <= profile.filled);
        prop_assert!(profile.percent >= 0.0 && profile.percent <= 100.0);
        if profile.distinct_count > 20 {
            prop_assert!(profile.has_more);
            prop_assert_eq!(profile.values.len(), 10);
            prop_assert_eq!(profile.remaining, profile.distinct_count - 10);
        } else {
            prop_assert!(!profile.has_more);
            prop_assert_eq!(profile.values.len(), profile.distinct_count);
        }
        prop_assert!(profile.values.windows(2).all(|pair| pair[0].count >= pair[1].count));
        let listed: usize = profile.values.iter().map(|v| v.count).sum();
        prop_assert!(listed <= profile.filled);
    }

    #[test]
    fn normalization_is_idempotent(value in cell().prop_filter_map("present", |c| c)) {
        let once = normalize(&value).into_owned();
        let twice = normalize(&once).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn matched_values_come_from_the_source(source in values(), target in values()) {
        let matcher = CrossSheetMatcher::new();
        let identity = SheetIdentity::new(2, "Target");
        let data = sheet(&target);

        match matcher.match_sheet(&source, &identity, &data, Some("key")) {
            SheetOutcome::Matched(found) => {
                let source_set: HashSet<&String> = source.iter().collect();
                let distinct: HashSet<&String> = found.values.iter().collect();
                prop_assert!(found.values.iter().all(|v| source_set.contains(v)));
                prop_assert_eq!(distinct.len(), found.values.len());
                prop_assert!(found.count >= found.values.len());
                prop_assert!(found.count <= source.len());
            }
            SheetOutcome::NoMatch => {
                let target_set: HashSet<&String> = target.iter().collect();
                prop_assert!(source.iter().all(|v| !target_set.contains(v)));
            }
            SheetOutcome::Skipped(_) => prop_assert!(false, "key column exists"),
        }
    }

    #[test]
    fn source_sheet_is_never_a_target(source in values()) {
        let matcher = CrossSheetMatcher::new();
        let own = SheetIdentity::new(1, "Source");
        let data = sheet(&source);
        let outcome = matcher.find_matches(
            &source,
            [(&own, &data)],
            None,
            MatchScope { source: 1, only: None },
        );
        prop_assert!(outcome.matches.is_empty());
        prop_assert!(outcome.skipped.is_empty());
    }
}
