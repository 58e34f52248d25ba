use crate::core::text;
use crate::models::{ProjectRow, ProposalRow, ScoredProject, ScoredSeller, SellerHistoryRow, UserRow};

/// Score handed out by the no-history fallbacks
pub const FALLBACK_SCORE: f64 = 0.5;

/// Rank open projects for a seller.
///
/// With proposal history: the seller profile is the mean TF-IDF vector over
/// the projects they bid on, fit jointly with the open projects, and every
/// open project is scored by cosine similarity to that profile. Without
/// history: the most recently created open projects, each scored 0.5.
///
/// Sorting is stable descending, so ties keep the order the candidates were
/// fetched in.
pub fn recommend_projects_for_seller(
    open_projects: &[ProjectRow],
    history: &[SellerHistoryRow],
    limit: usize,
) -> Vec<ScoredProject> {
    if open_projects.is_empty() {
        return Vec::new();
    }

    // Dedupe history to one document per past project, preserving order.
    let mut past_ids: Vec<i64> = Vec::new();
    let mut past_docs: Vec<String> = Vec::new();
    for entry in history {
        if !past_ids.contains(&entry.project_id) {
            past_ids.push(entry.project_id);
            past_docs.push(entry.text_features());
        }
    }

    if past_docs.is_empty() {
        let mut recent: Vec<&ProjectRow> = open_projects.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        return recent
            .into_iter()
            .take(limit)
            .map(|project| ScoredProject {
                project_id: project.id,
                title: project.title.clone(),
                score: FALLBACK_SCORE,
                budget: project.budget,
            })
            .collect();
    }

    let n_past = past_docs.len();
    let mut corpus = past_docs;
    corpus.extend(open_projects.iter().map(|p| p.text_features()));

    let matrix = text::fit_transform(&corpus, 1);
    let profile = matrix.mean_of(0..n_past);
    let similarities = matrix.similarities(&profile, n_past..corpus.len());

    let mut scored: Vec<ScoredProject> = open_projects
        .iter()
        .zip(similarities)
        .map(|(project, score)| ScoredProject {
            project_id: project.id,
            title: project.title.clone(),
            score,
            budget: project.budget,
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Rank sellers for a project.
///
/// Sellers with proposal history are represented by one document
/// concatenating the text of every project they bid on, vectorized jointly
/// with the target project and scored by cosine similarity. When no seller
/// has history the sellers are returned in data-source order with score 0.5.
pub fn recommend_sellers_for_project(
    project: &ProjectRow,
    sellers: &[UserRow],
    proposals: &[ProposalRow],
    projects: &[ProjectRow],
    limit: usize,
) -> Vec<ScoredSeller> {
    if sellers.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(&UserRow, String)> = Vec::new();
    for seller in sellers {
        let bid_project_ids: Vec<i64> = proposals
            .iter()
            .filter(|proposal| proposal.seller_id == seller.id)
            .map(|proposal| proposal.project_id)
            .collect();
        if bid_project_ids.is_empty() {
            continue;
        }

        let document = projects
            .iter()
            .filter(|p| bid_project_ids.contains(&p.id))
            .map(|p| p.text_features())
            .collect::<Vec<_>>()
            .join(" ");
        if !document.is_empty() {
            candidates.push((seller, document));
        }
    }

    if candidates.is_empty() {
        return sellers
            .iter()
            .take(limit)
            .map(|seller| ScoredSeller {
                seller_id: seller.id,
                name: seller.name.clone(),
                score: FALLBACK_SCORE,
            })
            .collect();
    }

    let mut corpus = vec![project.text_features()];
    corpus.extend(candidates.iter().map(|(_, document)| document.clone()));

    let matrix = text::fit_transform(&corpus, 1);
    let project_vector = matrix.row(0).clone();
    let similarities = matrix.similarities(&project_vector, 1..corpus.len());

    let mut scored: Vec<ScoredSeller> = candidates
        .iter()
        .zip(similarities)
        .map(|((seller, _), score)| ScoredSeller {
            seller_id: seller.id,
            name: seller.name.clone(),
            score,
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
