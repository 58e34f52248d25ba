use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    BuyerProjectRow, CompletedProjectRow, PaymentRow, ProjectRow, ProposalRow, SellerHistoryRow,
    UserRow,
};

/// Errors that can occur when reading from the marketplace database
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Read-only client for the marketplace PostgreSQL database.
///
/// The relational store is owned and mutated by the main platform; this
/// service only reads tabular projections of projects, proposals, users and
/// payments for training and inference.
pub struct MarketDb {
    pool: PgPool,
}

impl MarketDb {
    /// Create a new client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, DbError> {
        tracing::info!("Connecting to PostgreSQL");
        Self::new(url, max_connections.unwrap_or(10), min_connections.unwrap_or(1)).await
    }

    fn project_from_row(row: &sqlx::postgres::PgRow) -> ProjectRow {
        ProjectRow {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            budget: row.get("budget"),
            status: row.get("status"),
            buyer_id: row.get("buyer_id"),
            created_at: row.get("created_at"),
            buyer_name: row.get("buyer_name"),
            buyer_email: row.get("buyer_email"),
        }
    }

    /// All projects joined with the owning buyer
    pub async fn get_projects(&self) -> Result<Vec<ProjectRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.title, p.description, p.budget, p.status,
                p.buyer_id, p.created_at,
                u.name as buyer_name, u.email as buyer_email
            FROM projects p
            JOIN users u ON p.buyer_id = u.id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::project_from_row).collect())
    }

    /// Open projects only, in data-source order
    pub async fn get_open_projects(&self) -> Result<Vec<ProjectRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.title, p.description, p.budget, p.status,
                p.buyer_id, p.created_at,
                u.name as buyer_name, u.email as buyer_email
            FROM projects p
            JOIN users u ON p.buyer_id = u.id
            WHERE p.status = 'open'
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::project_from_row).collect())
    }

    /// A single project by id
    pub async fn get_project(&self, project_id: i64) -> Result<Option<ProjectRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.title, p.description, p.budget, p.status,
                p.buyer_id, p.created_at,
                u.name as buyer_name, u.email as buyer_email
            FROM projects p
            JOIN users u ON p.buyer_id = u.id
            WHERE p.id = $1
        "#;

        let row = sqlx::query(query)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(Self::project_from_row))
    }

    /// All proposals joined with the submitting seller
    pub async fn get_proposals(&self) -> Result<Vec<ProposalRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.service_details, p.price, p.delivery_time,
                p.status, p.project_id, p.seller_id, p.created_at,
                u.name as seller_name, u.email as seller_email
            FROM proposals p
            JOIN users u ON p.seller_id = u.id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::proposal_from_row).collect())
    }

    fn proposal_from_row(row: &sqlx::postgres::PgRow) -> ProposalRow {
        ProposalRow {
            id: row.get("id"),
            service_details: row.get("service_details"),
            price: row.get("price"),
            delivery_time: row.get("delivery_time"),
            status: row.get("status"),
            project_id: row.get("project_id"),
            seller_id: row.get("seller_id"),
            created_at: row.get("created_at"),
            seller_name: row.get("seller_name"),
            seller_email: row.get("seller_email"),
        }
    }

    /// Proposals submitted on a single project
    pub async fn get_proposals_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProposalRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.service_details, p.price, p.delivery_time,
                p.status, p.project_id, p.seller_id, p.created_at,
                u.name as seller_name, u.email as seller_email
            FROM proposals p
            JOIN users u ON p.seller_id = u.id
            WHERE p.project_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::proposal_from_row).collect())
    }

    /// All users, in data-source order
    pub async fn get_users(&self) -> Result<Vec<UserRow>, DbError> {
        let query = r#"
            SELECT id, name, email, role, created_at
            FROM users
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| UserRow {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                role: row.get("role"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Users with the seller role, in data-source order
    pub async fn get_sellers(&self) -> Result<Vec<UserRow>, DbError> {
        let query = r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE role = 'seller'
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| UserRow {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                role: row.get("role"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Completed projects joined with their proposals and completed payments.
    /// The price model's training set.
    pub async fn get_completed_projects(&self) -> Result<Vec<CompletedProjectRow>, DbError> {
        let query = r#"
            SELECT
                p.id as project_id, p.title, p.description, p.budget,
                p.buyer_id, p.created_at as project_created_at,
                pr.id as proposal_id, pr.price as proposal_price,
                pr.delivery_time, pr.seller_id,
                pay.id as payment_id, pay.amount as payment_amount,
                pay.status as payment_status, pay.created_at as payment_date
            FROM projects p
            JOIN proposals pr ON p.id = pr.project_id
            JOIN payments pay ON pr.id = pay.proposal_id
            WHERE p.status = 'completed' AND pay.status = 'completed'
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| CompletedProjectRow {
                project_id: row.get("project_id"),
                title: row.get("title"),
                description: row.get("description"),
                budget: row.get("budget"),
                buyer_id: row.get("buyer_id"),
                project_created_at: row.get("project_created_at"),
                proposal_id: row.get("proposal_id"),
                proposal_price: row.get("proposal_price"),
                delivery_time: row.get("delivery_time"),
                seller_id: row.get("seller_id"),
                payment_id: row.get("payment_id"),
                payment_amount: row.get("payment_amount"),
                payment_status: row.get("payment_status"),
                payment_date: row.get("payment_date"),
            })
            .collect())
    }

    /// A seller's proposal history with the projects they bid on,
    /// most recent first
    pub async fn get_seller_history(
        &self,
        seller_id: i64,
    ) -> Result<Vec<SellerHistoryRow>, DbError> {
        let query = r#"
            SELECT
                p.id as project_id, p.title, p.description,
                p.budget as project_budget, p.status as project_status,
                pr.id as proposal_id, pr.price as proposal_price,
                pr.status as proposal_status, pr.created_at
            FROM proposals pr
            JOIN projects p ON pr.project_id = p.id
            WHERE pr.seller_id = $1
            ORDER BY pr.created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(seller_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| SellerHistoryRow {
                project_id: row.get("project_id"),
                title: row.get("title"),
                description: row.get("description"),
                project_budget: row.get("project_budget"),
                project_status: row.get("project_status"),
                proposal_id: row.get("proposal_id"),
                proposal_price: row.get("proposal_price"),
                proposal_status: row.get("proposal_status"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// A buyer's projects with their proposal counts, most recent first
    pub async fn get_buyer_projects(
        &self,
        buyer_id: i64,
    ) -> Result<Vec<BuyerProjectRow>, DbError> {
        let query = r#"
            SELECT
                p.id, p.title, p.description, p.budget,
                p.status, p.created_at,
                count(pr.id) as proposal_count
            FROM projects p
            LEFT JOIN proposals pr ON p.id = pr.project_id
            WHERE p.buyer_id = $1
            GROUP BY p.id
            ORDER BY p.created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| BuyerProjectRow {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                budget: row.get("budget"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                proposal_count: row.get("proposal_count"),
            })
            .collect())
    }

    fn payment_from_row(row: &sqlx::postgres::PgRow) -> PaymentRow {
        PaymentRow {
            id: row.get("id"),
            amount: row.get("amount"),
            status: row.get("status"),
            proposal_id: row.get("proposal_id"),
            created_at: row.get("created_at"),
        }
    }

    /// Payments made by a buyer across their projects
    pub async fn get_payments_by_buyer(&self, buyer_id: i64) -> Result<Vec<PaymentRow>, DbError> {
        let query = r#"
            SELECT pay.id, pay.amount, pay.status, pay.proposal_id, pay.created_at
            FROM payments pay
            JOIN proposals pr ON pay.proposal_id = pr.id
            JOIN projects p ON pr.project_id = p.id
            WHERE p.buyer_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::payment_from_row).collect())
    }

    /// Payments received by a seller for their accepted proposals
    pub async fn get_payments_by_seller(
        &self,
        seller_id: i64,
    ) -> Result<Vec<PaymentRow>, DbError> {
        let query = r#"
            SELECT pay.id, pay.amount, pay.status, pay.proposal_id, pay.created_at
            FROM payments pay
            JOIN proposals pr ON pay.proposal_id = pr.id
            WHERE pr.seller_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(seller_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::payment_from_row).collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, DbError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
