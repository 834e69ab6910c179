use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use segdash_core::{
    derive_view, load_narrative, load_shared_dataset, FilterState, Pagination, StrategyTag,
    ViewError,
};
use segdash_table::{parse_dataset, LoadError, Record, SharedDataset};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../segdash-table/tests/data")
        .join(name)
}

fn dataset() -> SharedDataset {
    load_shared_dataset(&fixture_path("top_kpis.csv")).expect("load fixture")
}

fn paged(size: usize, page: usize) -> Pagination {
    Pagination {
        page_size: NonZeroUsize::new(size).expect("non-zero"),
        page,
        show_all: false,
    }
}

#[test]
fn kpis_ignore_the_active_filter() {
    let data = dataset();
    let filter = FilterState::all(&data).with_cities(["PUNE"]);
    let view = derive_view(&data, &filter, &[]);

    assert_eq!(view.kpis.total_customers, 1017);
    assert_eq!(view.kpis.city_count, 5);
    assert_eq!(view.kpis.segment_count, 4);
    let expected = 2_221_227.5 / 1017.0;
    let spend = view.kpis.weighted_avg_spend.expect("defined");
    assert!((spend - expected).abs() < 1e-9);
}

#[test]
fn default_view_pages_ten_cities() {
    let data = dataset();
    let view = derive_view(&data, &FilterState::all(&data), &[]);

    assert_eq!(view.page.total_pages, 1);
    // the row without a city never matches a city filter
    assert_eq!(view.filtered.len(), 11);
    assert_eq!(view.page.rows.len(), 11);
    assert_eq!(view.city_totals[0].city, "MUMBAI");
    assert_eq!(view.city_totals[0].customers, 400);
}

#[test]
fn pages_reassemble_the_show_all_view() {
    let data = dataset();
    let base = FilterState::all(&data);
    let first = derive_view(&data, &base.clone().with_pagination(paged(2, 1)), &[]);
    assert_eq!(first.page.total_pages, 3);

    let mut paged_rows: Vec<*const Record> = Vec::new();
    for page in 1..=first.page.total_pages {
        let view = derive_view(&data, &base.clone().with_pagination(paged(2, page)), &[]);
        paged_rows.extend(view.page.rows.iter().map(|r| *r as *const Record));
    }

    let all = derive_view(
        &data,
        &base.with_pagination(Pagination {
            show_all: true,
            ..paged(2, 1)
        }),
        &[],
    );
    let mut all_rows: Vec<*const Record> = all.page.rows.iter().map(|r| *r as *const Record).collect();

    let unique: BTreeSet<*const Record> = paged_rows.iter().copied().collect();
    assert_eq!(unique.len(), paged_rows.len(), "no row appears on two pages");
    paged_rows.sort();
    all_rows.sort();
    assert_eq!(paged_rows, all_rows);
}

#[test]
fn top_n_keeps_the_biggest_cities() {
    let data = dataset();
    let filter = FilterState::all(&data).with_top_n(NonZeroUsize::new(2));
    let view = derive_view(&data, &filter, &[]);

    assert_eq!(view.page.cities, vec!["MUMBAI", "NEW DELHI"]);
    assert!(view
        .filtered
        .iter()
        .all(|r| matches!(r.city(), Some("MUMBAI") | Some("NEW DELHI"))));
}

#[test]
fn top_n_applies_after_cluster_filter() {
    let data = dataset();
    // cluster 2 only: MUMBAI 80, BANGALORE 100, KOLKATA 25
    let filter = FilterState::all(&data)
        .with_clusters([2])
        .with_top_n(NonZeroUsize::new(1));
    let view = derive_view(&data, &filter, &[]);
    assert_eq!(view.page.cities, vec!["BANGALORE"]);
}

#[test]
fn segment_summary_and_strategies_over_current_page() {
    let data = dataset();
    let view = derive_view(&data, &FilterState::all(&data), &[]);

    let cluster_two = view
        .segments
        .iter()
        .find(|row| row.cluster == 2)
        .expect("cluster 2");
    assert_eq!(cluster_two.customer_count, 205);
    assert_eq!(cluster_two.avg_total_monetary, Some(5016.67));
    assert_eq!(cluster_two.avg_frequency, Some(3.25));

    let tags: Vec<(u32, StrategyTag)> = view
        .strategies
        .iter()
        .map(|rec| (rec.cluster, rec.tag))
        .collect();
    assert_eq!(
        tags,
        vec![
            (2, StrategyTag::Premium),
            (1, StrategyTag::Premium),
            (0, StrategyTag::ReEngagement),
            (3, StrategyTag::ReEngagement),
        ]
    );
}

#[test]
fn comparison_falls_back_to_top_spenders() {
    let data = dataset();
    let view = derive_view(&data, &FilterState::all(&data), &[]);
    // mean spend: KOLKATA 5050, BANGALORE 3350, MUMBAI 2820.08
    assert_eq!(view.comparison, vec!["KOLKATA", "BANGALORE", "MUMBAI"]);

    let picks = vec!["PUNE".to_string()];
    let view = derive_view(&data, &FilterState::all(&data), &picks);
    assert_eq!(view.comparison, picks);
}

#[test]
fn disjoint_city_selection_is_empty_not_an_error() {
    let data = dataset();
    let filter = FilterState::all(&data).with_cities(["ATLANTIS"]);
    let view = derive_view(&data, &filter, &[]);

    assert!(view.filtered.is_empty());
    assert_eq!(view.page.total_pages, 1);
    assert!(view.customer_pivot.is_empty());
    assert!(view.segments.is_empty());
    assert!(view.strategies.is_empty());
    assert!(view.comparison.is_empty());
    assert_eq!(view.kpis.total_customers, 1017);
}

#[test]
fn same_inputs_give_the_same_view() {
    let data = dataset();
    let filter = FilterState::all(&data)
        .with_top_n(NonZeroUsize::new(3))
        .with_pagination(paged(2, 2));
    let first = serde_json::to_value(derive_view(&data, &filter, &[])).expect("json");
    let second = serde_json::to_value(derive_view(&data, &filter, &[])).expect("json");
    assert_eq!(first, second);
}

#[test]
fn shared_dataset_serves_concurrent_views() {
    let data = dataset();
    let totals: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["MUMBAI", "PUNE"]
            .into_iter()
            .map(|city| {
                let data = SharedDataset::clone(&data);
                scope.spawn(move || {
                    let filter = FilterState::all(&data).with_cities([city]);
                    derive_view(&data, &filter, &[]).filtered.len()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });
    assert_eq!(totals, vec![3, 2]);
}

#[test]
fn huge_customer_counts_do_not_break_the_view() {
    let table = "CustLocation,Cluster,CustomerCount,AvgAge,AvgRecency,AvgFrequency,AvgAvgMonetary,AvgTotalMonetary\n\
                 PUNE,0,18446744073709551615,30,20,2,500,900\n\
                 PUNE,1,18446744073709551615,31,21,3,600,1000\n\
                 AGRA,1,1,40,25,1,400,700\n";
    let data = parse_dataset(table).expect("parse").dataset;
    let filter = FilterState::all(&data).with_top_n(NonZeroUsize::new(1));
    let view = derive_view(&data, &filter, &[]);

    assert_eq!(view.kpis.total_customers, u64::MAX);
    assert_eq!(view.page.cities, vec!["PUNE"]);
    assert_eq!(view.city_totals[0].customers, u64::MAX);
    assert_eq!(view.segment_mix.len(), 2);
    assert!(view.segments.iter().all(|row| row.customer_count == u64::MAX));
    assert_eq!(view.insights.leading_segments[0].customers, u64::MAX);
}

#[test]
fn missing_data_file_is_fatal() {
    let err = load_shared_dataset(&fixture_path("nope.csv")).expect_err("missing");
    assert!(matches!(err, ViewError::Load(LoadError::NotFound { .. })));
}

#[test]
fn missing_columns_are_fatal() {
    let err = load_shared_dataset(&fixture_path("missing_columns.csv")).expect_err("columns");
    assert!(matches!(err, ViewError::Load(LoadError::MissingColumns { .. })));
}

#[test]
fn narrative_fixture_is_read_verbatim() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/interpretations.txt");
    let narrative = load_narrative(&path);
    assert!(!narrative.is_fallback());
    assert!(narrative.text().starts_with("- Cluster 2"));
}
