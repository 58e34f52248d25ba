use serde::{Deserialize, Serialize};

/// Lifecycle states of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Lifecycle states of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

/// Marketplace roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
}

/// Project row as read from the data store (projects joined with the owning buyer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: ProjectStatus,
    pub buyer_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub buyer_name: String,
    pub buyer_email: String,
}

impl ProjectRow {
    /// Combined title + description text used by the similarity engine
    pub fn text_features(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Proposal row as read from the data store (proposals joined with the seller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRow {
    pub id: i64,
    pub service_details: String,
    pub price: f64,
    pub delivery_time: i32,
    pub status: ProposalStatus,
    pub project_id: i64,
    pub seller_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub seller_name: String,
    pub seller_email: String,
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Payment row (realized-price ground truth, exists only for completed transactions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: i64,
    pub amount: f64,
    pub status: String,
    pub proposal_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Completed project joined with its accepted proposal and completed payment.
/// One row per historical transaction; the regression training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedProjectRow {
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub buyer_id: i64,
    pub project_created_at: chrono::DateTime<chrono::Utc>,
    pub proposal_id: i64,
    pub proposal_price: f64,
    pub delivery_time: i32,
    pub seller_id: i64,
    pub payment_id: i64,
    pub payment_amount: Option<f64>,
    pub payment_status: String,
    pub payment_date: chrono::DateTime<chrono::Utc>,
}

/// One entry of a seller's proposal history: the proposal plus the project it was made on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerHistoryRow {
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub project_budget: f64,
    pub project_status: ProjectStatus,
    pub proposal_id: i64,
    pub proposal_price: f64,
    pub proposal_status: ProposalStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SellerHistoryRow {
    pub fn text_features(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// One entry of a buyer's project history with its proposal count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: ProjectStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub proposal_count: i64,
}

/// Raw project/proposal record the price model accepts for inference.
///
/// All fields are optional; the feature extractor fills documented defaults
/// for anything absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFields {
    pub description: Option<String>,
    pub complexity: Option<u8>,
    pub delivery_time: Option<f64>,
    pub duration: Option<f64>,
    pub category: Option<String>,
    pub required_skills: Option<String>,
    pub budget: Option<f64>,
    pub initial_price: Option<f64>,
}

impl From<&ProjectRow> for ProjectFields {
    fn from(project: &ProjectRow) -> Self {
        Self {
            description: Some(project.description.clone()),
            budget: Some(project.budget),
            ..Default::default()
        }
    }
}

/// Fixed-schema feature vector derived from a raw record.
///
/// Every field has a documented default when the source field is absent:
/// complexity 2, duration 30, category "other", skills "general". The two
/// optional numerics stay absent and are imputed by the fitted preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub complexity: u8,
    pub duration: f64,
    pub category: String,
    pub required_skills: String,
    pub budget: Option<f64>,
    pub initial_price: Option<f64>,
}

/// Inclusive price band around a point estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Fairness classification of a proposed price against the predicted band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceEvaluation {
    BelowMarket,
    Fair,
    AboveMarket,
}

impl PriceEvaluation {
    /// Human-readable reason attached to evaluation responses
    pub fn message(&self) -> &'static str {
        match self {
            PriceEvaluation::BelowMarket => "Price is below the expected market rate",
            PriceEvaluation::AboveMarket => "Price is above the expected market rate",
            PriceEvaluation::Fair => "Price is within the expected market range",
        }
    }
}

/// Scored open project recommended to a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredProject {
    pub project_id: i64,
    pub title: String,
    pub score: f64,
    pub budget: f64,
}

/// Scored seller recommended for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSeller {
    pub seller_id: i64,
    pub name: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_shape() {
        let status = ProjectStatus::InProgress;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: ProposalStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(parsed, ProposalStatus::Accepted);
    }

    #[test]
    fn test_project_fields_from_row() {
        let project = ProjectRow {
            id: 7,
            title: "Logo design".to_string(),
            description: "A minimal logo for a bakery".to_string(),
            budget: 500.0,
            status: ProjectStatus::Open,
            buyer_id: 1,
            created_at: chrono::Utc::now(),
            buyer_name: "Ana".to_string(),
            buyer_email: "ana@example.com".to_string(),
        };

        let fields = ProjectFields::from(&project);
        assert_eq!(fields.budget, Some(500.0));
        assert!(fields.description.is_some());
        assert!(fields.category.is_none());
    }
}
