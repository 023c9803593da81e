//! Random tie-breaking over scored candidates.

use gmcts_core::{Result, SearchError};
use rand::{Rng, RngCore};

/// Return a candidate with the maximal `key`, chosen uniformly at random
/// among all candidates sharing that maximum.
///
/// Scores are compared with exact equality. If every score is NaN all
/// candidates count as tied.
///
/// # Errors
/// Returns `SearchError::EmptyCandidateSet` if `candidates` is empty.
pub fn rand_max<T, I, F>(candidates: I, mut key: F, rng: &mut dyn RngCore) -> Result<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> f64,
{
    let scored: Vec<(T, f64)> = candidates
        .into_iter()
        .map(|c| {
            let score = key(&c);
            (c, score)
        })
        .collect();

    let max = scored
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::NAN, f64::max);

    let mut best: Vec<T> = Vec::new();
    let mut rest: Vec<T> = Vec::new();
    for (candidate, score) in scored {
        if score == max {
            best.push(candidate);
        } else {
            rest.push(candidate);
        }
    }
    if best.is_empty() {
        best = rest;
    }

    if best.is_empty() {
        return Err(SearchError::EmptyCandidateSet);
    }
    let index = rng.gen_range(0..best.len());
    Ok(best.swap_remove(index))
}
