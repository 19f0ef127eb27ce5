//! Profile Index: append-only store of profile embeddings with exact
//! top-k inner-product search.
//!
//! Embeddings live in one contiguous buffer (row `i` = `i`-th inserted
//! record), records in a parallel `Vec`. Both sit behind a single `RwLock`:
//! inserts are exclusive, searches share the read lock.

pub mod similarity;

use std::cmp::Ordering;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::profile::{ProfileFields, ProfileRecord, ScoredProfile};

use self::similarity::dot_product;

/// Embedding width of all-MiniLM-L6-v2, the default sentence model.
pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("top_k must be greater than zero")]
    InvalidTopK,

    #[error("index dimension must be greater than zero")]
    InvalidDimension,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct IndexStats {
    pub dimension: usize,
    pub profiles: usize,
}

#[derive(Debug, Default)]
struct IndexInner {
    /// Row-major, `records.len() * dimension` values.
    embeddings: Vec<f32>,
    records: Vec<ProfileRecord>,
}

/// In-memory profile index. Construct once and share via `Arc`.
#[derive(Debug)]
pub struct ProfileIndex {
    dimension: usize,
    inner: RwLock<IndexInner>,
}

impl ProfileIndex {
    pub fn new(dimension: usize) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::InvalidDimension);
        }
        Ok(Self {
            dimension,
            inner: RwLock::new(IndexInner::default()),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            dimension: self.dimension,
            profiles: self.len(),
        }
    }

    /// Appends a profile and its embedding.
    ///
    /// Identifiers are not deduplicated: inserting the same id twice yields two
    /// independently retrievable records. On error nothing is appended.
    pub fn insert(
        &self,
        id: String,
        embedding: Vec<f32>,
        fields: ProfileFields,
    ) -> Result<(), IndexError> {
        self.check_dimension(&embedding)?;

        let record = ProfileRecord { id, fields };

        let mut inner = self.inner.write();
        debug!(
            id = %record.id,
            position = inner.records.len(),
            "Inserting profile into index"
        );
        inner.embeddings.extend_from_slice(&embedding);
        inner.records.push(record);
        debug_assert_eq!(
            inner.embeddings.len(),
            inner.records.len() * self.dimension
        );
        Ok(())
    }

    /// Returns up to `top_k` profiles ranked by descending inner product with
    /// `query`. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredProfile>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK);
        }
        self.check_dimension(query)?;

        let inner = self.inner.read();
        if inner.records.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = inner
            .embeddings
            .chunks_exact(self.dimension)
            .map(|row| dot_product(query, row))
            .enumerate()
            .collect();

        let k = top_k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank);

        let results = scored
            .into_iter()
            .map(|(position, score)| ScoredProfile {
                record: inner.records[position].clone(),
                score,
            })
            .collect::<Vec<_>>();

        debug!(
            requested = top_k,
            returned = results.len(),
            "Searched profile index"
        );
        Ok(results)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Descending score, NaN last, then ascending insertion position.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    let by_score = match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
    };
    by_score.then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Domain;
    use serde_json::json;
    use std::sync::Arc;

    fn unit(dimension: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimension];
        v[axis] = 1.0;
        v
    }

    fn fields(domain: Domain) -> ProfileFields {
        ProfileFields {
            domain,
            ..ProfileFields::default()
        }
    }

    fn ids(results: &[ScoredProfile]) -> Vec<&str> {
        results.iter().map(|r| r.record.id.as_str()).collect()
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        assert_eq!(ProfileIndex::new(0).unwrap_err(), IndexError::InvalidDimension);
    }

    #[test]
    fn test_lengths_track_successful_inserts() {
        let index = ProfileIndex::new(4).unwrap();
        for i in 0..5 {
            index
                .insert(format!("r{i}"), unit(4, i % 4), ProfileFields::default())
                .unwrap();
            let inner = index.inner.read();
            assert_eq!(inner.records.len(), i + 1);
            assert_eq!(inner.embeddings.len(), (i + 1) * 4);
        }
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_insert_dimension_mismatch_leaves_index_unchanged() {
        let index = ProfileIndex::new(DEFAULT_DIMENSION).unwrap();
        index
            .insert("ok".to_string(), unit(DEFAULT_DIMENSION, 0), ProfileFields::default())
            .unwrap();

        let err = index
            .insert("bad".to_string(), vec![0.1; 10], ProfileFields::default())
            .unwrap_err();

        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: DEFAULT_DIMENSION,
                actual: 10
            }
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.inner.read().embeddings.len(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_search_empty_index_returns_empty() {
        let index = ProfileIndex::new(8).unwrap();
        for k in [1, 5, 1000] {
            assert!(index.search(&unit(8, 0), k).unwrap().is_empty());
        }
    }

    #[test]
    fn test_search_zero_top_k_is_invalid() {
        let index = ProfileIndex::new(8).unwrap();
        assert_eq!(index.search(&unit(8, 0), 0).unwrap_err(), IndexError::InvalidTopK);
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = ProfileIndex::new(8).unwrap();
        let err = index.search(&[1.0, 0.0], 3).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 8,
                actual: 2
            }
        );
    }

    #[test]
    fn test_round_trip_single_record_scores_self_product() {
        let index = ProfileIndex::new(DEFAULT_DIMENSION).unwrap();
        let mut v = vec![0.0; DEFAULT_DIMENSION];
        v[3] = 0.6;
        v[7] = 0.8;
        let mut meta = fields(Domain::Engineering);
        meta.skills = vec!["rust".to_string()];
        meta.location = Some("Berlin".to_string());
        index.insert("X".to_string(), v.clone(), meta.clone()).unwrap();

        let results = index.search(&v, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.id, "X");
        assert_eq!(results[0].record.fields, meta);
        assert!((results[0].score - dot_product(&v, &v)).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_exceeding_size_returns_all_descending() {
        let index = ProfileIndex::new(3).unwrap();
        index.insert("low".to_string(), vec![0.1, 0.0, 0.0], ProfileFields::default()).unwrap();
        index.insert("high".to_string(), vec![0.9, 0.0, 0.0], ProfileFields::default()).unwrap();
        index.insert("mid".to_string(), vec![0.5, 0.0, 0.0], ProfileFields::default()).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(ids(&results), vec!["high", "mid", "low"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_truncates_to_best() {
        let index = ProfileIndex::new(2).unwrap();
        for (i, x) in [0.3_f32, 0.9, 0.1, 0.7, 0.5].iter().enumerate() {
            index
                .insert(format!("r{i}"), vec![*x, 0.0], ProfileFields::default())
                .unwrap();
        }

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["r1", "r3"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = ProfileIndex::new(2).unwrap();
        for id in ["a", "b", "c", "d"] {
            index.insert(id.to_string(), vec![1.0, 0.0], ProfileFields::default()).unwrap();
        }

        assert_eq!(ids(&index.search(&[1.0, 0.0], 4).unwrap()), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(&index.search(&[1.0, 0.0], 2).unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn test_negative_scores_rank_below_positive() {
        let index = ProfileIndex::new(2).unwrap();
        index.insert("neg".to_string(), vec![-1.0, 0.0], ProfileFields::default()).unwrap();
        index.insert("pos".to_string(), vec![0.5, 0.0], ProfileFields::default()).unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["pos", "neg"]);
        assert_eq!(results[1].score, -1.0);
    }

    #[test]
    fn test_nan_scores_sort_last() {
        let index = ProfileIndex::new(2).unwrap();
        index.insert("nan".to_string(), vec![f32::NAN, 0.0], ProfileFields::default()).unwrap();
        index.insert("real".to_string(), vec![-0.5, 0.0], ProfileFields::default()).unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["real", "nan"]);
    }

    #[test]
    fn test_duplicate_ids_are_kept_as_distinct_records() {
        let index = ProfileIndex::new(2).unwrap();
        index.insert("dup".to_string(), vec![1.0, 0.0], fields(Domain::Engineering)).unwrap();
        index.insert("dup".to_string(), vec![0.0, 1.0], fields(Domain::Other)).unwrap();

        assert_eq!(index.len(), 2);
        let results = index.search(&[0.0, 1.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["dup", "dup"]);
        assert_eq!(results[0].record.fields.domain, Domain::Other);
        assert_eq!(results[1].record.fields.domain, Domain::Engineering);
    }

    #[test]
    fn test_repeated_search_is_deterministic() {
        let index = ProfileIndex::new(3).unwrap();
        for i in 0..20 {
            let x = (i % 7) as f32 / 7.0;
            index
                .insert(format!("r{i}"), vec![x, 1.0 - x, 0.5], ProfileFields::default())
                .unwrap();
        }

        let query = [0.3, 0.6, 0.1];
        let first = index.search(&query, 8).unwrap();
        for _ in 0..5 {
            assert_eq!(index.search(&query, 8).unwrap(), first);
        }
    }

    #[test]
    fn test_concrete_scenario_json_shape() {
        let index = ProfileIndex::new(DEFAULT_DIMENSION).unwrap();
        let v1 = unit(DEFAULT_DIMENSION, 0);
        let mut v2 = vec![0.0; DEFAULT_DIMENSION];
        v2[0] = 0.2;
        v2[1] = 0.96_f32.sqrt();

        index.insert("r1".to_string(), v1.clone(), fields(Domain::Engineering)).unwrap();
        index.insert("r2".to_string(), v2, fields(Domain::Other)).unwrap();

        let results = index.search(&v1, 2).unwrap();
        let value = serde_json::to_value(&results).unwrap();

        assert_eq!(value[0]["id"], json!("r1"));
        assert_eq!(value[0]["domain"], json!("Engineering"));
        assert_eq!(results[0].score, 1.0);
        assert_eq!(value[1]["id"], json!("r2"));
        assert_eq!(value[1]["domain"], json!("Other"));
        assert!((results[1].score - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_concurrent_inserts_and_searches_keep_invariant() {
        let index = Arc::new(ProfileIndex::new(4).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        index
                            .insert(format!("t{t}-{i}"), unit(4, (t + i) % 4), ProfileFields::default())
                            .unwrap();
                        let hits = index.search(&unit(4, 0), 3).unwrap();
                        assert!(hits.len() <= 3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let inner = index.inner.read();
        assert_eq!(inner.records.len(), 400);
        assert_eq!(inner.embeddings.len(), 400 * 4);
    }

    #[test]
    fn test_panicking_reader_does_not_block_later_writes() {
        let index = Arc::new(ProfileIndex::new(4).unwrap());
        let reader = Arc::clone(&index);
        let result = std::thread::spawn(move || {
            let _guard = reader.inner.read();
            panic!("reader failed while holding the lock");
        })
        .join();
        assert!(result.is_err());

        index
            .insert("after".to_string(), unit(4, 1), ProfileFields::default())
            .unwrap();
        assert_eq!(ids(&index.search(&unit(4, 1), 1).unwrap()), vec!["after"]);
    }

    #[test]
    fn test_search_hit_carries_only_fields_and_score() {
        let index = ProfileIndex::new(4).unwrap();
        index
            .insert("cv.pdf".to_string(), unit(4, 0), fields(Domain::Engineering))
            .unwrap();
        let hits = index.search(&unit(4, 0), 1).unwrap();

        let value = serde_json::to_value(&hits[0]).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["degree", "domain", "id", "location", "score", "skills"]);
    }

    #[test]
    fn test_stats_reports_dimension_and_count() {
        let index = ProfileIndex::new(16).unwrap();
        index.insert("a".to_string(), unit(16, 2), ProfileFields::default()).unwrap();
        assert_eq!(
            index.stats(),
            IndexStats {
                dimension: 16,
                profiles: 1
            }
        );
        assert!(!index.is_empty());
    }
}
