//! Weighted Reciprocal Rank Fusion for combining ranked lists.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use faq_core::{validate_rank_bias_constant, Document, DocumentId, FaqError, RankedList, Result, ScoredDocument};

/// Default rank-bias constant.
/// Higher values flatten the difference between top and lower ranks.
pub const DEFAULT_RANK_BIAS_CONSTANT: f64 = 80.0;

/// Accumulated state for one unique document.
struct FusedEntry {
    id: DocumentId,
    document: Document,
    score: f64,
    /// Best (smallest) 1-based rank in any positive-weight list.
    best_rank: usize,
    /// Order of first appearance.
    first_seen: usize,
}

/// Fuses ranked lists from independent retrievers into one ranked list.
///
/// Only ranks are used; retriever scores are on incomparable scales.
/// The contribution of the document at rank `r` (1-based) in a list with
/// normalized weight `w` is
///
/// ```text
/// w / (c + r)
/// ```
///
/// and contributions are summed per content-derived document id.
#[derive(Debug, Clone, Copy)]
pub struct RankFusionEngine {
    rank_bias_constant: f64,
}

impl RankFusionEngine {
    /// Create an engine, rejecting non-positive or non-finite constants.
    pub fn new(rank_bias_constant: f64) -> Result<Self> {
        validate_rank_bias_constant(rank_bias_constant)?;
        Ok(Self { rank_bias_constant })
    }

    /// The rank-bias constant `c`.
    pub fn rank_bias_constant(&self) -> f64 {
        self.rank_bias_constant
    }

    /// Fuse weighted lists into scored results.
    ///
    /// Ordering is score descending, then best rank in any positive-weight
    /// list, then first appearance (positive-weight lists in the order
    /// given, then zero-weight lists). Documents that only appear in
    /// zero-weight lists are kept with a score of zero. Duplicates within a
    /// single list are ignored after their first occurrence.
    ///
    /// `limit` truncates the fused list; `Some(0)` yields an empty result.
    pub fn fuse_scored(
        &self,
        lists: &[(RankedList, f64)],
        limit: Option<usize>,
    ) -> Result<Vec<ScoredDocument>> {
        for (index, (_, weight)) in lists.iter().enumerate() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(FaqError::config(format!(
                    "weight of list {} must be a finite non-negative number, got {}",
                    index, weight
                )));
            }
        }

        // Scale by the largest weight so the sum cannot overflow.
        let max_weight = lists.iter().map(|(_, w)| *w).fold(0.0, f64::max);
        if max_weight <= 0.0 {
            return Err(FaqError::config(
                "at least one ranked list must have a positive weight",
            ));
        }
        let total_weight: f64 = lists.iter().map(|(_, w)| w / max_weight).sum();

        // The first copy of a document, in the order the lists were given,
        // represents it in the output.
        let mut representatives: HashMap<DocumentId, &Document> = HashMap::new();
        for (list, _) in lists {
            for document in list {
                representatives.entry(document.id()).or_insert(document);
            }
        }

        // Positive-weight lists first so they decide first-appearance order.
        let order = lists
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .chain(lists.iter().filter(|(_, w)| *w == 0.0));

        let capacity = representatives.len();
        let mut entries: Vec<FusedEntry> = Vec::with_capacity(capacity);
        let mut index_of: HashMap<DocumentId, usize> = HashMap::with_capacity(capacity);

        for (list, weight) in order {
            let normalized = (weight / max_weight) / total_weight;
            let mut seen_in_list: HashSet<DocumentId> = HashSet::with_capacity(list.len());

            for (position, document) in list.iter().enumerate() {
                let id = document.id();
                if !seen_in_list.insert(id) {
                    continue;
                }

                let slot = *index_of.entry(id).or_insert_with(|| {
                    let representative = representatives.get(&id).copied().unwrap_or(document);
                    entries.push(FusedEntry {
                        id,
                        document: representative.clone(),
                        score: 0.0,
                        best_rank: usize::MAX,
                        first_seen: entries.len(),
                    });
                    entries.len() - 1
                });

                if normalized > 0.0 {
                    let rank = position + 1;
                    let entry = &mut entries[slot];
                    entry.score += normalized / (self.rank_bias_constant + rank as f64);
                    entry.best_rank = entry.best_rank.min(rank);
                }
            }
        }

        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.best_rank.cmp(&b.best_rank))
                .then(a.first_seen.cmp(&b.first_seen))
        });

        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        debug!(
            "Fused {} lists into {} results (c = {})",
            lists.len(),
            entries.len(),
            self.rank_bias_constant
        );

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| ScoredDocument {
                rank: i as u32 + 1,
                score: entry.score,
                id: entry.id,
                document: entry.document,
            })
            .collect())
    }

    /// Fuse weighted lists into a plain ranked list.
    pub fn fuse(&self, lists: &[(RankedList, f64)], limit: Option<usize>) -> Result<RankedList> {
        Ok(self
            .fuse_scored(lists, limit)?
            .into_iter()
            .map(|scored| scored.document)
            .collect())
    }
}

impl Default for RankFusionEngine {
    fn default() -> Self {
        Self {
            rank_bias_constant: DEFAULT_RANK_BIAS_CONSTANT,
        }
    }
}

/// Fuse weighted ranked lists using weighted Reciprocal Rank Fusion.
///
/// # Arguments
/// * `lists` - (ranked list, weight) pairs; weights need not sum to one
/// * `rank_bias_constant` - the `c` in `w / (c + rank)`, must be positive
/// * `limit` - Maximum number of results to return (None for all)
///
/// # Returns
/// Scored documents sorted by fused score descending
pub fn weighted_reciprocal_rank_fusion(
    lists: &[(RankedList, f64)],
    rank_bias_constant: f64,
    limit: Option<usize>,
) -> Result<Vec<ScoredDocument>> {
    RankFusionEngine::new(rank_bias_constant)?.fuse_scored(lists, limit)
}
