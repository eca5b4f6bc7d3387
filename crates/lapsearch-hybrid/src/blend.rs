use lapsearch_core::config::ScoreNormalization;
use lapsearch_core::types::Candidate;

/// Rescales to [0, 1] across the slice. A flat signal maps to 0.
fn min_max(values: &[f32]) -> Vec<f32> {
    let (lo, hi) = values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    values.iter().map(|&v| if range > 0.0 { (v - lo) / range } else { 0.0 }).collect()
}

pub fn blend_score(alpha: f32, semantic: f32, lexical: f32) -> f32 {
    alpha * semantic + (1.0 - alpha) * lexical
}

/// Sets every candidate's final score, sorts descending (ties keep fusion
/// order) and keeps the best `limit`.
pub fn blend(mut candidates: Vec<Candidate>, alpha: f32, normalization: ScoreNormalization, limit: usize) -> Vec<Candidate> {
    let semantic: Vec<f32> = candidates.iter().map(|c| c.semantic_score).collect();
    let lexical: Vec<f32> = candidates.iter().map(|c| c.lexical_score).collect();
    let (semantic, lexical) = match normalization {
        ScoreNormalization::None => (semantic, lexical),
        ScoreNormalization::MinMax => (min_max(&semantic), min_max(&lexical)),
    };
    for (c, (s, l)) in candidates.iter_mut().zip(semantic.into_iter().zip(lexical)) {
        c.final_score = blend_score(alpha, s, l);
    }
    candidates.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    candidates.truncate(limit);
    candidates
}
