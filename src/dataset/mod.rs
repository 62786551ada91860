//! Dataset model and assembly for the quotation classifier.
//!
//! The labeled dataset is assembled from three source relations:
//!
//! | Relation | Keyed by | Provides |
//! |----------|----------|----------|
//! | `apb_labeled` | (doc_id, verse_id) | ground-truth match boolean |
//! | `apb_potential_quotations` | (doc_id, verse_id) | feature measurements |
//! | `scriptures` | verse_id | version name of the verse |
//!
//! [`assemble`] left-joins them, drops rows with no feature match,
//! recodes the boolean label into a two-level categorical, and derives
//! the tradition group from the version name. The version name itself
//! does not survive into the output schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod cache;
pub mod split;

/// Scripture versions belonging to the LDS tradition. Membership is
/// exact-match on the version name; anything else maps to [`Tradition::NotLds`].
pub const LDS_TRADITIONS: [&str; 3] = [
    "Book of Mormon",
    "Doctrine and Covenants",
    "Pearl of Great Price",
];

/// Two-level ground-truth label, in fixed level order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLabel {
    /// A genuine quotation of the verse.
    Quotation,
    /// A superficial match that is not a genuine quotation.
    Noise,
}

impl MatchLabel {
    /// Recode the source boolean into the categorical label.
    pub fn from_bool(is_match: bool) -> Self {
        if is_match {
            MatchLabel::Quotation
        } else {
            MatchLabel::Noise
        }
    }
}

/// Two-level tradition group derived from the version name, in fixed
/// level order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tradition {
    #[serde(rename = "lds")]
    Lds,
    #[serde(rename = "not-lds")]
    NotLds,
}

impl Tradition {
    /// Derive the group from a version name. `None` (no scriptures row
    /// joined) and unseen version names both map to `NotLds`.
    pub fn from_version(version: Option<&str>) -> Self {
        match version {
            Some(v) if LDS_TRADITIONS.contains(&v) => Tradition::Lds,
            _ => Tradition::NotLds,
        }
    }
}

/// A labeled match outcome from `apb_labeled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledMatchRow {
    pub doc_id: String,
    pub verse_id: String,
    pub is_match: bool,
}

/// Feature measurements for one potential quotation from
/// `apb_potential_quotations`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationFeatureRow {
    pub doc_id: String,
    pub verse_id: String,
    pub token_count: u32,
    pub tfidf: f64,
    pub proportion: f64,
    /// Absent when there was not enough data to compute the statistic.
    pub runs_pval: Option<f64>,
}

/// Verse-to-version mapping from the `scriptures` relation, narrowed to
/// the two columns the join needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRow {
    pub verse_id: String,
    pub version: String,
}

/// One row of the assembled labeled dataset. Field order is the
/// persisted CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledQuotation {
    pub verse_id: String,
    pub doc_id: String,
    #[serde(rename = "match")]
    pub label: MatchLabel,
    pub tokens: u32,
    pub tfidf: f64,
    pub proportion: f64,
    /// Still nullable here; the post-split cleanup substitutes 1.0.
    pub runs_pval: Option<f64>,
    #[serde(rename = "lds")]
    pub tradition: Tradition,
}

/// A cleaned observation ready for preprocessing: identifiers dropped,
/// runs_pval made total. Produced by [`split::clean`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: MatchLabel,
    pub tokens: u32,
    pub tfidf: f64,
    pub proportion: f64,
    pub runs_pval: f64,
    pub tradition: Tradition,
}

/// Assemble the labeled dataset from the three source relations.
///
/// Left-joins labels to features on (doc_id, verse_id) and the result to
/// versions on verse_id. Label rows with no feature match are dropped;
/// every surviving row has a label, a token count, and a defined
/// tradition group. Output is sorted by (doc_id, verse_id) so repeated
/// assembly over the same relations is row-for-row identical.
pub fn assemble(
    labels: &[LabeledMatchRow],
    features: &[QuotationFeatureRow],
    versions: &[VersionRow],
) -> Vec<LabeledQuotation> {
    let feature_map: HashMap<(&str, &str), &QuotationFeatureRow> = features
        .iter()
        .map(|f| ((f.doc_id.as_str(), f.verse_id.as_str()), f))
        .collect();
    let version_map: HashMap<&str, &str> = versions
        .iter()
        .map(|v| (v.verse_id.as_str(), v.version.as_str()))
        .collect();

    let mut rows: Vec<LabeledQuotation> = labels
        .iter()
        .filter_map(|l| {
            let f = feature_map.get(&(l.doc_id.as_str(), l.verse_id.as_str()))?;
            let version = version_map.get(l.verse_id.as_str()).copied();
            Some(LabeledQuotation {
                verse_id: l.verse_id.clone(),
                doc_id: l.doc_id.clone(),
                label: MatchLabel::from_bool(l.is_match),
                tokens: f.token_count,
                tfidf: f.tfidf,
                proportion: f.proportion,
                runs_pval: f.runs_pval,
                tradition: Tradition::from_version(version),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.doc_id
            .cmp(&b.doc_id)
            .then_with(|| a.verse_id.cmp(&b.verse_id))
    });

    rows
}
