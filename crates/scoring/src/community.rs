//! Cross-source community aggregation.

use chrono::Utc;
use ecopulse_store::{
    CommunityOverview, ComplaintCategory, ForumOverview, NegativeItem, SocialOverview,
};
use std::collections::BTreeMap;

/// Negative items retained across sources.
const NEGATIVE_SAMPLE_SIZE: usize = 20;

/// Output of one community aggregation: the overview plus the negative
/// items persisted under their own key.
#[derive(Debug, Clone)]
pub struct CommunitySnapshot {
    pub overview: CommunityOverview,
    pub negative_items: Vec<NegativeItem>,
}

/// Merge the forum and social overviews into a single community view.
///
/// Complaint counts are summed key-wise across sources. The top category
/// needs a strictly positive count; ties go to the earlier declared
/// category. Overall sentiment comes from the social source and only when
/// it was actually available this cycle.
pub fn aggregate_community(
    forum: Option<ForumOverview>,
    social: Option<SocialOverview>,
) -> CommunitySnapshot {
    let mut combined: BTreeMap<String, u64> = BTreeMap::new();

    if let Some(forum) = &forum {
        for (key, count) in &forum.complaint_category_counts {
            *combined.entry(key.clone()).or_default() += count;
        }
    }
    if let Some(social) = &social {
        for (key, count) in &social.complaint_category_counts {
            *combined.entry(key.clone()).or_default() += count;
        }
    }

    let mut top_category: Option<String> = None;
    let mut max_count = 0u64;
    for category in ComplaintCategory::ALL {
        let count = combined.get(category.as_key()).copied().unwrap_or(0);
        if count > max_count {
            max_count = count;
            top_category = Some(category.as_key().to_string());
        }
    }

    let overall_sentiment = social
        .as_ref()
        .filter(|s| s.available)
        .and_then(|s| s.average_sentiment);

    let mut negative_items: Vec<NegativeItem> = social
        .as_ref()
        .map(|s| {
            s.top_negative_items
                .iter()
                .cloned()
                .map(|mut item| {
                    item.source = Some("social".to_string());
                    item
                })
                .collect()
        })
        .unwrap_or_default();
    negative_items.sort_by(|a, b| {
        a.sentiment.partial_cmp(&b.sentiment).unwrap_or(std::cmp::Ordering::Equal)
    });
    negative_items.truncate(NEGATIVE_SAMPLE_SIZE);

    CommunitySnapshot {
        overview: CommunityOverview {
            forum,
            social,
            combined_complaint_categories: combined,
            top_complaint_category: top_category,
            overall_sentiment,
            fetched_at: Utc::now(),
        },
        negative_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn forum_with_counts(counts: &[(&str, u64)]) -> ForumOverview {
        ForumOverview {
            total_topics_last30d: 0,
            topics_per_week: vec![],
            keyword_matches: BTreeMap::new(),
            complaint_category_counts: counts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            recent_items: vec![],
            fetched_at: Utc::now(),
        }
    }

    fn social_with(
        counts: &[(&str, u64)],
        average_sentiment: Option<f64>,
        available: bool,
    ) -> SocialOverview {
        SocialOverview {
            available,
            total_posts_last30d: 0,
            average_sentiment,
            negative_share_percent: None,
            daily_sentiment: vec![],
            complaint_category_counts: counts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            top_negative_items: vec![],
            fetched_at: Utc::now(),
            error: None,
        }
    }

    #[test]
    fn complaint_counts_sum_across_sources() {
        let snapshot = aggregate_community(
            Some(forum_with_counts(&[("performance", 3), ("snaps_security", 1)])),
            Some(social_with(&[("performance", 2)], Some(0.4), true)),
        );

        let combined = &snapshot.overview.combined_complaint_categories;
        assert_eq!(combined["performance"], 5);
        assert_eq!(combined["snaps_security"], 1);
        assert_eq!(
            snapshot.overview.top_complaint_category.as_deref(),
            Some("performance")
        );
        assert_eq!(snapshot.overview.overall_sentiment, Some(0.4));
    }

    #[test]
    fn top_category_ties_break_in_declared_order() {
        // updates_breakage and performance tie; updates_breakage is
        // declared earlier.
        let snapshot = aggregate_community(
            Some(forum_with_counts(&[("performance", 2), ("updates_breakage", 2)])),
            None,
        );
        assert_eq!(
            snapshot.overview.top_complaint_category.as_deref(),
            Some("updates_breakage")
        );
    }

    #[test]
    fn all_zero_counts_yield_no_top_category() {
        let snapshot = aggregate_community(
            Some(forum_with_counts(&[("performance", 0), ("snaps_security", 0)])),
            None,
        );
        assert_eq!(snapshot.overview.top_complaint_category, None);
    }

    #[test]
    fn unavailable_social_contributes_no_sentiment() {
        let snapshot = aggregate_community(
            None,
            Some(social_with(&[], Some(1.0), false)),
        );
        assert_eq!(snapshot.overview.overall_sentiment, None);
        assert!(snapshot.overview.social.is_some());
    }

    #[test]
    fn negative_items_are_tagged_with_their_source() {
        let mut social = social_with(&[], Some(-1.0), true);
        social.top_negative_items = vec![NegativeItem {
            title: "everything is broken".to_string(),
            url: "https://example.com/1".to_string(),
            community: "Ubuntu".to_string(),
            sentiment: -2.0,
            source: None,
        }];

        let snapshot = aggregate_community(None, Some(social));
        assert_eq!(snapshot.negative_items.len(), 1);
        assert_eq!(snapshot.negative_items[0].source.as_deref(), Some("social"));
    }

    #[test]
    fn both_sources_missing_yields_empty_overview() {
        let snapshot = aggregate_community(None, None);
        assert!(snapshot.overview.combined_complaint_categories.is_empty());
        assert_eq!(snapshot.overview.top_complaint_category, None);
        assert_eq!(snapshot.overview.overall_sentiment, None);
        assert!(snapshot.negative_items.is_empty());
    }
}
