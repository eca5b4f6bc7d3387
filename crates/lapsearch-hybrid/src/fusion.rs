use std::collections::HashMap;

use lapsearch_core::types::{Candidate, DocId, SearchHit, StoreMatch};

/// Deduplicated candidates of one search, in fusion order: semantic hits in
/// store order, then lexical-only hits in rank order.
#[derive(Debug, Default)]
pub struct CandidatePool { candidates: Vec<Candidate>, by_id: HashMap<DocId, usize> }

impl CandidatePool {
    pub fn len(&self) -> usize { self.candidates.len() }
    pub fn is_empty(&self) -> bool { self.candidates.is_empty() }
    pub fn candidates(&self) -> &[Candidate] { &self.candidates }
    pub fn into_candidates(self) -> Vec<Candidate> { self.candidates }
    pub fn get(&self, id: &str) -> Option<&Candidate> { self.by_id.get(id).map(|&i| &self.candidates[i]) }

    fn entry(&mut self, id: &str, text: &str) -> &mut Candidate {
        let i = match self.by_id.get(id) {
            Some(&i) => i,
            None => {
                self.candidates.push(Candidate::new(id, text));
                self.by_id.insert(id.to_string(), self.candidates.len() - 1);
                self.candidates.len() - 1
            }
        };
        &mut self.candidates[i]
    }
}

/// Merges both retrieval paths by document id.
///
/// Semantic presence is only a flag: the vector similarity is dropped and the
/// semantic score stays 0.0 until re-ranking. Lexical hits carry their score.
pub fn fuse(semantic: &[StoreMatch], lexical: &[SearchHit]) -> CandidatePool {
    let mut pool = CandidatePool::default();
    for m in semantic { pool.entry(&m.id, &m.text).sources.semantic = true; }
    for h in lexical {
        let c = pool.entry(&h.id, &h.text);
        c.sources.lexical = true;
        c.lexical_score = h.score;
    }
    pool
}
