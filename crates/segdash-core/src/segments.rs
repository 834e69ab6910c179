use std::collections::BTreeMap;
use std::fmt;

use segdash_table::{MetricField, Record};
use serde::Serialize;

use crate::profile::descending_missing_last;
use crate::stats::{mean, median, round2};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub cluster: u32,
    pub customer_count: u64,
    pub avg_age: Option<f64>,
    pub avg_recency: Option<f64>,
    pub avg_frequency: Option<f64>,
    pub avg_avg_monetary: Option<f64>,
    pub avg_total_monetary: Option<f64>,
}

impl SegmentSummary {
    pub fn metric(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::CustomerCount => Some(self.customer_count as f64),
            MetricField::AvgAge => self.avg_age,
            MetricField::AvgRecency => self.avg_recency,
            MetricField::AvgFrequency => self.avg_frequency,
            MetricField::AvgAvgMonetary => self.avg_avg_monetary,
            MetricField::AvgTotalMonetary => self.avg_total_monetary,
        }
    }
}

pub fn segment_summary(rows: &[&Record]) -> Vec<SegmentSummary> {
    let mut grouped: BTreeMap<u32, Vec<&Record>> = BTreeMap::new();
    for record in rows {
        if let Some(cluster) = record.cluster {
            grouped.entry(cluster).or_default().push(*record);
        }
    }

    grouped
        .into_iter()
        .map(|(cluster, members)| {
            let avg = |field: MetricField| {
                mean(members.iter().map(|record| record.metric(field))).map(round2)
            };
            SegmentSummary {
                cluster,
                customer_count: members
                    .iter()
                    .map(|record| record.customers())
                    .fold(0, u64::saturating_add),
                avg_age: avg(MetricField::AvgAge),
                avg_recency: avg(MetricField::AvgRecency),
                avg_frequency: avg(MetricField::AvgFrequency),
                avg_avg_monetary: avg(MetricField::AvgAvgMonetary),
                avg_total_monetary: avg(MetricField::AvgTotalMonetary),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyTag {
    Premium,
    ValueAdd,
    CrossSell,
    ReEngagement,
}

impl StrategyTag {
    pub fn classify(meets_spend: bool, meets_frequency: bool) -> Self {
        match (meets_spend, meets_frequency) {
            (true, true) => StrategyTag::Premium,
            (true, false) => StrategyTag::ValueAdd,
            (false, true) => StrategyTag::CrossSell,
            (false, false) => StrategyTag::ReEngagement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::Premium => "premium",
            StrategyTag::ValueAdd => "value-add",
            StrategyTag::CrossSell => "cross-sell",
            StrategyTag::ReEngagement => "re-engagement",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            StrategyTag::Premium => "Premium offers & loyalty: high spend and activity.",
            StrategyTag::ValueAdd => "Value-add bundles to sustain high spend.",
            StrategyTag::CrossSell => "Cross-sell bundles: frequent but mid spend.",
            StrategyTag::ReEngagement => "Re-engagement & onboarding nudges: build activity.",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRecommendation {
    pub cluster: u32,
    pub tag: StrategyTag,
    pub message: &'static str,
}

/// Buckets each cluster against the median spend and median frequency of the
/// summary. Values equal to a median meet it; missing values never do.
/// Output is ordered by spend, highest first.
pub fn classify_strategy(summary: &[SegmentSummary]) -> Vec<StrategyRecommendation> {
    let median_spend = median(summary.iter().map(|row| row.avg_total_monetary));
    let median_freq = median(summary.iter().map(|row| row.avg_frequency));

    let mut ordered: Vec<&SegmentSummary> = summary.iter().collect();
    ordered.sort_by(|a, b| {
        descending_missing_last(a.avg_total_monetary, b.avg_total_monetary)
            .then(a.cluster.cmp(&b.cluster))
    });

    ordered
        .into_iter()
        .map(|row| {
            let tag = StrategyTag::classify(
                meets(row.avg_total_monetary, median_spend),
                meets(row.avg_frequency, median_freq),
            );
            StrategyRecommendation {
                cluster: row.cluster,
                tag,
                message: tag.recommendation(),
            }
        })
        .collect()
}

fn meets(value: Option<f64>, threshold: Option<f64>) -> bool {
    matches!((value, threshold), (Some(v), Some(t)) if v >= t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_row(cluster: u32, spend: f64, freq: f64) -> SegmentSummary {
        SegmentSummary {
            cluster,
            customer_count: 10,
            avg_age: None,
            avg_recency: None,
            avg_frequency: Some(freq),
            avg_avg_monetary: None,
            avg_total_monetary: Some(spend),
        }
    }

    #[test]
    fn summary_sums_counts_and_averages_unweighted() {
        let data = vec![
            Record::new("PUNE", 1, 10).with_metric(MetricField::AvgTotalMonetary, 50.0),
            Record::new("AGRA", 1, 20).with_metric(MetricField::AvgTotalMonetary, 70.0),
            Record::new("AGRA", 0, 5).with_metric(MetricField::AvgAge, 33.333),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let summary = segment_summary(&rows);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].cluster, 0);
        assert_eq!(summary[0].avg_age, Some(33.33));
        assert_eq!(summary[1].cluster, 1);
        assert_eq!(summary[1].customer_count, 30);
        assert_eq!(summary[1].avg_total_monetary, Some(60.0));
        assert_eq!(summary[1].avg_age, None);
    }

    #[test]
    fn strategy_buckets_follow_medians() {
        let summary = vec![
            summary_row(0, 100.0, 1.0),
            summary_row(1, 400.0, 4.0),
            summary_row(2, 300.0, 1.5),
            summary_row(3, 200.0, 3.0),
        ];
        // medians: spend 250, frequency 2.25
        let recs = classify_strategy(&summary);
        let got: Vec<(u32, StrategyTag)> = recs.iter().map(|r| (r.cluster, r.tag)).collect();
        assert_eq!(
            got,
            vec![
                (1, StrategyTag::Premium),
                (2, StrategyTag::ValueAdd),
                (3, StrategyTag::CrossSell),
                (0, StrategyTag::ReEngagement),
            ]
        );
    }

    #[test]
    fn exact_median_meets_threshold() {
        let summary = vec![
            summary_row(0, 100.0, 1.0),
            summary_row(1, 200.0, 2.0),
            summary_row(2, 300.0, 3.0),
        ];
        let recs = classify_strategy(&summary);
        let middle = recs.iter().find(|r| r.cluster == 1).expect("cluster 1");
        assert_eq!(middle.tag, StrategyTag::Premium);
    }

    #[test]
    fn single_segment_is_premium() {
        let recs = classify_strategy(&[summary_row(4, 10.0, 1.0)]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].tag, StrategyTag::Premium);
        assert_eq!(recs[0].message, StrategyTag::Premium.recommendation());
    }

    #[test]
    fn empty_summary_gives_no_recommendations() {
        assert!(classify_strategy(&[]).is_empty());
    }
}
