use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::StoreContext;
use crate::modules::sales::models::CreateSaleRequest;
use crate::modules::sales::repositories::SaleListFilter;
use crate::modules::sales::services::settlement_service::parse_payment_method_filter;
use crate::modules::sales::services::{SaleQueryService, SettlementService};

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Settle a sale
/// POST /sales
pub async fn create_sale(
    service: web::Data<Arc<SettlementService>>,
    ctx: StoreContext,
    request: web::Json<CreateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .settle(&ctx.store_id, &ctx.user_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(sale))
}

/// List sales for the store
/// GET /sales
pub async fn list_sales(
    service: web::Data<Arc<SaleQueryService>>,
    ctx: StoreContext,
    query: web::Query<ListSalesQuery>,
) -> Result<HttpResponse, AppError> {
    let payment_method = query
        .payment_method
        .as_deref()
        .map(parse_payment_method_filter)
        .transpose()?
        .map(|m| m.to_string());

    let filter = SaleListFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        cashier_id: query.cashier_id.clone(),
        payment_method,
    };

    let sales = service
        .list(&ctx.store_id, &filter, query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(sales))
}

/// Configure sale routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .route("", web::post().to(create_sale))
            .route("", web::get().to(list_sales)),
    );
}
