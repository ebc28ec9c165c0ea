//! Ranking a population of vectors against a target.

use std::cmp::Ordering;
use std::thread;

use serde::Serialize;

use super::error::SimilarityError;
use super::score::similarity;

/// Populations at least this large are scored on worker threads.
pub const PARALLEL_RANK_THRESHOLD: usize = 4096;
const MAX_RANK_WORKERS: usize = 64;

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<K> {
    pub id: K,
    pub score: f64,
}

/// Sort `population` by descending similarity to `target`.
///
/// Equal scores keep their input order. Candidates whose score is NaN sort last.
pub fn rank<K, V>(
    target: &[f64],
    population: &[(K, V)],
    alpha: f64,
) -> Result<Vec<Ranked<K>>, SimilarityError>
where
    K: Clone + Sync,
    V: AsRef<[f64]> + Sync,
{
    rank_with_threshold(target, population, alpha, PARALLEL_RANK_THRESHOLD)
}

pub(crate) fn rank_with_threshold<K, V>(
    target: &[f64],
    population: &[(K, V)],
    alpha: f64,
    parallel_threshold: usize,
) -> Result<Vec<Ranked<K>>, SimilarityError>
where
    K: Clone + Sync,
    V: AsRef<[f64]> + Sync,
{
    let scores = if population.len() >= parallel_threshold {
        score_parallel(target, population, alpha)?
    } else {
        score_chunk(target, population, alpha)?
    };
    let mut ranked: Vec<Ranked<K>> = population
        .iter()
        .zip(scores)
        .map(|((id, _), score)| Ranked {
            id: id.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| descending(a.score, b.score));
    Ok(ranked)
}

fn score_chunk<K, V: AsRef<[f64]>>(
    target: &[f64],
    chunk: &[(K, V)],
    alpha: f64,
) -> Result<Vec<f64>, SimilarityError> {
    chunk
        .iter()
        .map(|(_, candidate)| similarity(target, candidate.as_ref(), alpha))
        .collect()
}

fn score_parallel<K, V>(
    target: &[f64],
    population: &[(K, V)],
    alpha: f64,
) -> Result<Vec<f64>, SimilarityError>
where
    K: Sync,
    V: AsRef<[f64]> + Sync,
{
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_RANK_WORKERS);
    let chunk_len = population.len().div_ceil(workers).max(1);
    tracing::debug!(
        candidates = population.len(),
        workers,
        "Scoring population on worker threads"
    );
    let parts = thread::scope(|scope| {
        let handles: Vec<_> = population
            .chunks(chunk_len)
            .map(|chunk| scope.spawn(move || score_chunk(target, chunk, alpha)))
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(part) => part,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect::<Vec<_>>()
    });
    let mut scores = Vec::with_capacity(population.len());
    for part in parts {
        scores.extend(part?);
    }
    Ok(scores)
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
