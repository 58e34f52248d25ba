use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ModelError;
use crate::models::{
    BuyerProjectRow, PaymentRow, ProjectRow, ProjectStatus, ProposalRow, ProposalStatus,
    SellerHistoryRow,
};
use crate::services::postgres::MarketDb;

/// Reporting window for market trends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    Week,
    Month,
    Year,
}

impl TrendPeriod {
    /// Parse a query value, defaulting to month
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("week") => TrendPeriod::Week,
            Some("year") => TrendPeriod::Year,
            _ => TrendPeriod::Month,
        }
    }

    fn window(&self) -> Duration {
        match self {
            TrendPeriod::Week => Duration::days(7),
            TrendPeriod::Month => Duration::days(30),
            TrendPeriod::Year => Duration::days(365),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TrendPeriod::Week => "week",
            TrendPeriod::Month => "month",
            TrendPeriod::Year => "year",
        }
    }

    fn bucket(&self, at: DateTime<Utc>) -> String {
        match self {
            // Week and month bucket by day, year by month.
            TrendPeriod::Week | TrendPeriod::Month => at.format("%Y-%m-%d").to_string(),
            TrendPeriod::Year => at.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBucket {
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub total_projects: usize,
    pub status_distribution: BTreeMap<String, usize>,
    pub avg_budget: f64,
    pub avg_proposals_per_project: f64,
    pub avg_proposal_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketTrends {
    pub time_period: String,
    pub metrics: MarketMetrics,
    pub time_series: Vec<TimeBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthBucket {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerMetrics {
    pub total_projects: usize,
    pub status_distribution: BTreeMap<String, usize>,
    pub completion_rate: f64,
    pub total_spent: f64,
    pub avg_project_cost: f64,
    pub avg_completion_time_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerAnalytics {
    pub buyer_id: i64,
    pub metrics: BuyerMetrics,
    pub timeline: Vec<MonthBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsBucket {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerMetrics {
    pub total_proposals: usize,
    pub proposal_status_distribution: BTreeMap<String, usize>,
    pub win_rate: f64,
    pub total_earnings: f64,
    pub completed_projects: usize,
    pub avg_earnings_per_project: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerAnalytics {
    pub seller_id: i64,
    pub metrics: SellerMetrics,
    pub earnings_timeline: Vec<EarningsBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutlook {
    pub project_id: i64,
    pub predicted_completion_days: f64,
    pub success_probability: f64,
    pub confidence: f64,
}

/// Market trends over the trailing window ending at `now`
pub fn market_trends_from(
    projects: &[ProjectRow],
    proposals: &[ProposalRow],
    period: TrendPeriod,
    now: DateTime<Utc>,
) -> Result<MarketTrends, ModelError> {
    if projects.is_empty() {
        return Err(ModelError::DataUnavailable(
            "no project data available".to_string(),
        ));
    }

    let start = now - period.window();
    let recent_projects: Vec<&ProjectRow> =
        projects.iter().filter(|p| p.created_at >= start).collect();
    let recent_proposals: Vec<&ProposalRow> =
        proposals.iter().filter(|p| p.created_at >= start).collect();

    let mut status_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for project in &recent_projects {
        *status_distribution
            .entry(project.status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let avg_budget = if recent_projects.is_empty() {
        0.0
    } else {
        recent_projects.iter().map(|p| p.budget).sum::<f64>() / recent_projects.len() as f64
    };

    let mut proposals_per_project: BTreeMap<i64, usize> = BTreeMap::new();
    for proposal in &recent_proposals {
        *proposals_per_project.entry(proposal.project_id).or_insert(0) += 1;
    }
    let avg_proposals_per_project = if proposals_per_project.is_empty() {
        0.0
    } else {
        proposals_per_project.values().sum::<usize>() as f64 / proposals_per_project.len() as f64
    };

    let avg_proposal_price = if recent_proposals.is_empty() {
        0.0
    } else {
        recent_proposals.iter().map(|p| p.price).sum::<f64>() / recent_proposals.len() as f64
    };

    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for project in &recent_projects {
        *buckets.entry(period.bucket(project.created_at)).or_insert(0) += 1;
    }
    let time_series = buckets
        .into_iter()
        .map(|(period, count)| TimeBucket { period, count })
        .collect();

    Ok(MarketTrends {
        time_period: period.label().to_string(),
        metrics: MarketMetrics {
            total_projects: recent_projects.len(),
            status_distribution,
            avg_budget,
            avg_proposals_per_project,
            avg_proposal_price,
        },
        time_series,
    })
}

/// Spending summary for a buyer from their project history and payments
pub fn buyer_analytics_from(
    buyer_id: i64,
    projects: &[BuyerProjectRow],
    payments: &[PaymentRow],
) -> Result<BuyerAnalytics, ModelError> {
    if projects.is_empty() {
        return Err(ModelError::DataUnavailable(
            "no project data available for this buyer".to_string(),
        ));
    }

    let total_projects = projects.len();
    let mut status_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for project in projects {
        *status_distribution
            .entry(project.status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let completed = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Completed)
        .count();
    let completion_rate = completed as f64 / total_projects as f64;

    let total_spent: f64 = payments.iter().map(|p| p.amount).sum();
    let avg_project_cost = if total_spent > 0.0 {
        total_spent / total_projects as f64
    } else {
        0.0
    };

    // Completion dates are not recorded, so a nominal 30-day figure stands
    // in whenever any project completed.
    let avg_completion_time_days = if completed > 0 { 30.0 } else { 0.0 };

    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for project in projects {
        *months
            .entry(project.created_at.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }
    let timeline = months
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect();

    Ok(BuyerAnalytics {
        buyer_id,
        metrics: BuyerMetrics {
            total_projects,
            status_distribution,
            completion_rate,
            total_spent,
            avg_project_cost,
            avg_completion_time_days,
        },
        timeline,
    })
}

/// Earnings summary for a seller from their proposal history and payments
pub fn seller_analytics_from(
    seller_id: i64,
    history: &[SellerHistoryRow],
    payments: &[PaymentRow],
) -> Result<SellerAnalytics, ModelError> {
    if history.is_empty() {
        return Err(ModelError::DataUnavailable(
            "no proposal data available for this seller".to_string(),
        ));
    }

    let total_proposals = history.len();
    let mut proposal_status_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for entry in history {
        *proposal_status_distribution
            .entry(entry.proposal_status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let accepted = history
        .iter()
        .filter(|h| h.proposal_status == ProposalStatus::Accepted)
        .count();
    let win_rate = accepted as f64 / total_proposals as f64;

    let total_earnings: f64 = payments.iter().map(|p| p.amount).sum();
    let completed_projects = history
        .iter()
        .filter(|h| h.project_status == ProjectStatus::Completed)
        .count();
    let avg_earnings_per_project = if completed_projects > 0 && total_earnings > 0.0 {
        total_earnings / completed_projects as f64
    } else {
        0.0
    };

    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for payment in payments {
        *months
            .entry(payment.created_at.format("%Y-%m").to_string())
            .or_insert(0.0) += payment.amount;
    }
    let earnings_timeline = months
        .into_iter()
        .map(|(month, amount)| EarningsBucket { month, amount })
        .collect();

    Ok(SellerAnalytics {
        seller_id,
        metrics: SellerMetrics {
            total_proposals,
            proposal_status_distribution,
            win_rate,
            total_earnings,
            completed_projects,
            avg_earnings_per_project,
        },
        earnings_timeline,
    })
}

/// Heuristic completion outlook for a project from its proposals.
///
/// Delivery estimate is the mean proposed delivery time; the success
/// probability starts at 0.7 and is nudged by proposal count and budget,
/// clamped to [0.10, 0.95].
pub fn completion_outlook_from(
    project: &ProjectRow,
    proposals: &[ProposalRow],
) -> CompletionOutlook {
    let predicted_completion_days = if proposals.is_empty() {
        30.0
    } else {
        proposals.iter().map(|p| p.delivery_time as f64).sum::<f64>() / proposals.len() as f64
    };

    let mut success_probability: f64 = 0.7;

    if !proposals.is_empty() {
        if proposals.len() > 5 {
            success_probability += 0.1;
        } else if proposals.len() > 2 {
            success_probability += 0.05;
        } else {
            success_probability -= 0.1;
        }
    }

    if project.budget > 5000.0 {
        success_probability += 0.1;
    } else if project.budget > 1000.0 {
        success_probability += 0.05;
    } else {
        success_probability -= 0.05;
    }

    CompletionOutlook {
        project_id: project.id,
        predicted_completion_days,
        success_probability: success_probability.clamp(0.10, 0.95),
        confidence: 0.7,
    }
}

/// Business analytics over the marketplace data store
pub struct BusinessAnalytics {
    db: Arc<MarketDb>,
}

impl BusinessAnalytics {
    pub fn new(db: Arc<MarketDb>) -> Self {
        Self { db }
    }

    pub async fn market_trends(&self, period: TrendPeriod) -> Result<MarketTrends, ModelError> {
        let projects = self.db.get_projects().await?;
        let proposals = self.db.get_proposals().await?;
        market_trends_from(&projects, &proposals, period, Utc::now())
    }

    pub async fn buyer_analytics(&self, buyer_id: i64) -> Result<BuyerAnalytics, ModelError> {
        let projects = self.db.get_buyer_projects(buyer_id).await?;
        let payments = self.db.get_payments_by_buyer(buyer_id).await?;
        buyer_analytics_from(buyer_id, &projects, &payments)
    }

    pub async fn seller_analytics(&self, seller_id: i64) -> Result<SellerAnalytics, ModelError> {
        let history = self.db.get_seller_history(seller_id).await?;
        let payments = self.db.get_payments_by_seller(seller_id).await?;
        seller_analytics_from(seller_id, &history, &payments)
    }

    pub async fn completion_outlook(
        &self,
        project_id: i64,
    ) -> Result<CompletionOutlook, ModelError> {
        let project = self
            .db
            .get_project(project_id)
            .await?
            .ok_or(ModelError::EntityNotFound("project", project_id))?;
        let proposals = self.db.get_proposals_by_project(project_id).await?;
        Ok(completion_outlook_from(&project, &proposals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: i64, status: ProjectStatus, budget: f64, age_days: i64) -> ProjectRow {
        ProjectRow {
            id,
            title: format!("Project {}", id),
            description: "work".to_string(),
            budget,
            status,
            buyer_id: 1,
            created_at: Utc::now() - Duration::days(age_days),
            buyer_name: "Buyer".to_string(),
            buyer_email: "buyer@example.com".to_string(),
        }
    }

    fn proposal(id: i64, project_id: i64, price: f64, delivery: i32, age_days: i64) -> ProposalRow {
        ProposalRow {
            id,
            service_details: "offer".to_string(),
            price,
            delivery_time: delivery,
            status: ProposalStatus::Pending,
            project_id,
            seller_id: 1,
            created_at: Utc::now() - Duration::days(age_days),
            seller_name: "Seller".to_string(),
            seller_email: "seller@example.com".to_string(),
        }
    }

    #[test]
    fn test_market_trends_window_and_metrics() {
        let projects = vec![
            project(1, ProjectStatus::Open, 100.0, 1),
            project(2, ProjectStatus::Completed, 300.0, 5),
            project(3, ProjectStatus::Open, 900.0, 90),
        ];
        let proposals = vec![
            proposal(1, 1, 80.0, 7, 1),
            proposal(2, 1, 120.0, 14, 2),
            proposal(3, 3, 500.0, 30, 90),
        ];

        let trends =
            market_trends_from(&projects, &proposals, TrendPeriod::Month, Utc::now()).unwrap();

        // The 90-day-old project and proposal fall outside the window.
        assert_eq!(trends.metrics.total_projects, 2);
        assert_eq!(trends.metrics.avg_budget, 200.0);
        assert_eq!(trends.metrics.avg_proposals_per_project, 2.0);
        assert_eq!(trends.metrics.avg_proposal_price, 100.0);
        assert_eq!(trends.metrics.status_distribution["open"], 1);
        assert_eq!(trends.metrics.status_distribution["completed"], 1);
    }

    #[test]
    fn test_market_trends_requires_projects() {
        let result = market_trends_from(&[], &[], TrendPeriod::Week, Utc::now());
        assert!(matches!(result, Err(ModelError::DataUnavailable(_))));
    }

    #[test]
    fn test_buyer_analytics_rates() {
        let projects = vec![
            BuyerProjectRow {
                id: 1,
                title: "A".to_string(),
                description: "a".to_string(),
                budget: 100.0,
                status: ProjectStatus::Completed,
                created_at: Utc::now(),
                proposal_count: 3,
            },
            BuyerProjectRow {
                id: 2,
                title: "B".to_string(),
                description: "b".to_string(),
                budget: 200.0,
                status: ProjectStatus::Open,
                created_at: Utc::now(),
                proposal_count: 1,
            },
        ];
        let payments = vec![PaymentRow {
            id: 1,
            amount: 90.0,
            status: "completed".to_string(),
            proposal_id: 1,
            created_at: Utc::now(),
        }];

        let analytics = buyer_analytics_from(9, &projects, &payments).unwrap();
        assert_eq!(analytics.buyer_id, 9);
        assert_eq!(analytics.metrics.completion_rate, 0.5);
        assert_eq!(analytics.metrics.total_spent, 90.0);
        assert_eq!(analytics.metrics.avg_project_cost, 45.0);
        assert_eq!(analytics.metrics.avg_completion_time_days, 30.0);
    }

    #[test]
    fn test_seller_analytics_win_rate_and_timeline() {
        let mut history = Vec::new();
        for i in 0..4 {
            history.push(SellerHistoryRow {
                project_id: i,
                title: "T".to_string(),
                description: "d".to_string(),
                project_budget: 100.0,
                project_status: if i < 2 {
                    ProjectStatus::Completed
                } else {
                    ProjectStatus::Open
                },
                proposal_id: i * 10,
                proposal_price: 90.0,
                proposal_status: if i == 0 {
                    ProposalStatus::Accepted
                } else {
                    ProposalStatus::Pending
                },
                created_at: Utc::now(),
            });
        }
        let payments = vec![
            PaymentRow {
                id: 1,
                amount: 100.0,
                status: "completed".to_string(),
                proposal_id: 0,
                created_at: Utc::now(),
            },
            PaymentRow {
                id: 2,
                amount: 60.0,
                status: "completed".to_string(),
                proposal_id: 10,
                created_at: Utc::now(),
            },
        ];

        let analytics = seller_analytics_from(3, &history, &payments).unwrap();
        assert_eq!(analytics.metrics.win_rate, 0.25);
        assert_eq!(analytics.metrics.total_earnings, 160.0);
        assert_eq!(analytics.metrics.completed_projects, 2);
        assert_eq!(analytics.metrics.avg_earnings_per_project, 80.0);
        assert_eq!(analytics.earnings_timeline.len(), 1);
    }

    #[test]
    fn test_completion_outlook_bounds() {
        let target = project(1, ProjectStatus::Open, 400.0, 0);

        let few = completion_outlook_from(&target, &[proposal(1, 1, 100.0, 10, 0)]);
        assert!((0.10..=0.95).contains(&few.success_probability));
        assert_eq!(few.predicted_completion_days, 10.0);

        let many: Vec<ProposalRow> = (0..6).map(|i| proposal(i, 1, 100.0, 20, 0)).collect();
        let crowded = completion_outlook_from(&target, &many);
        assert!(crowded.success_probability > few.success_probability);
        assert_eq!(crowded.predicted_completion_days, 20.0);
    }
}
