//! Complaint-category classification and keyword tagging.
//!
//! Categories are evaluated in the order declared on
//! [`ComplaintCategory::ALL`]; the first bucket with a substring hit wins.

use ecopulse_store::ComplaintCategory;

/// Keyword sets per category, in dispatch-priority order.
pub fn bucket_keywords(category: ComplaintCategory) -> &'static [&'static str] {
    match category {
        ComplaintCategory::SnapsSecurity => {
            &["snap", "snapd", "store", "malware", "security", "sandbox"]
        }
        ComplaintCategory::UpdatesBreakage => {
            &["update", "upgrade", "broke", "broken", "dependency", "fail"]
        }
        ComplaintCategory::Performance => {
            &["slow", "performance", "lag", "cpu", "memory", "ram", "freeze"]
        }
        ComplaintCategory::EnterpriseSupport => {
            &["enterprise", "support", "sla", "compliance", "lts"]
        }
        ComplaintCategory::PackagingDevWorkflow => {
            &["apt", "packaging", "build", "dependency", "toolchain", "ppa"]
        }
    }
}

/// General keywords counted across forum topics.
pub static GENERAL_KEYWORDS: &[&str] = &[
    "canonical", "ubuntu", "snap", "snapd", "apt", "lxd", "multipass", "update",
    "upgrade", "security", "performance",
];

/// Case-insensitive substring match.
pub fn matches_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Map text to at most one complaint category: first matching bucket in
/// declared order wins, unmatched text maps to none. Deterministic and
/// pure.
pub fn categorize(text: &str) -> Option<ComplaintCategory> {
    let lower = text.to_lowercase();

    for category in ComplaintCategory::ALL {
        if bucket_keywords(category).iter().any(|kw| lower.contains(kw)) {
            return Some(category);
        }
    }

    None
}
