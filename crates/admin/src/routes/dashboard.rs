//! Dashboard overview: revenue, sales, stock and the monthly revenue graph.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{GraphPoint, OrderRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::state::AppState;

use super::owned_store;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/{store_id}/dashboard", get(overview))
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_revenue: Decimal,
    pub sales_count: i64,
    pub stock_count: i64,
    pub graph_revenue: Vec<GraphPoint>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn overview(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(store_id): Path<String>,
) -> Result<Json<DashboardOverview>, AppError> {
    let store = owned_store(&state, &store_id, &user_id).await?;
    let repo = OrderRepository::new(state.pool());

    let (total_revenue, sales_count, stock_count, graph_revenue) = tokio::try_join!(
        repo.total_revenue(store.id),
        repo.sales_count(store.id),
        repo.stock_count(store.id),
        repo.monthly_revenue(store.id),
    )?;

    Ok(Json(DashboardOverview {
        total_revenue,
        sales_count,
        stock_count,
        graph_revenue,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::db::orders::monthly_buckets;

    use super::*;

    #[test]
    fn test_overview_serializes_camel_case() {
        let overview = DashboardOverview {
            total_revenue: Decimal::new(12550, 2),
            sales_count: 3,
            stock_count: 7,
            graph_revenue: monthly_buckets(&[(3, Decimal::new(12550, 2))]),
        };
        let value = serde_json::to_value(&overview).unwrap();
        assert_eq!(value["totalRevenue"], "125.50");
        assert_eq!(value["salesCount"], 3);
        assert_eq!(value["stockCount"], 7);
        assert_eq!(value["graphRevenue"][2]["name"], "MAR");
        assert_eq!(value["graphRevenue"][2]["total"], "125.50");
    }
}
