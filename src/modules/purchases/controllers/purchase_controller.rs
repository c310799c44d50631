use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::StoreContext;
use crate::modules::purchases::models::CreatePurchaseRequest;
use crate::modules::purchases::services::PurchaseService;

/// Query parameters for listing purchases
#[derive(Debug, Deserialize)]
pub struct ListPurchasesQuery {
    #[serde(default)]
    pub tax_period_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Record a purchase
/// POST /purchases
pub async fn create_purchase(
    service: web::Data<Arc<PurchaseService>>,
    ctx: StoreContext,
    request: web::Json<CreatePurchaseRequest>,
) -> Result<HttpResponse, AppError> {
    let purchase = service
        .record(&ctx.store_id, &ctx.user_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(purchase))
}

/// List purchases with aggregate sums
/// GET /purchases
pub async fn list_purchases(
    service: web::Data<Arc<PurchaseService>>,
    ctx: StoreContext,
    query: web::Query<ListPurchasesQuery>,
) -> Result<HttpResponse, AppError> {
    let listing = service
        .list(
            &ctx.store_id,
            query.tax_period_id.as_deref(),
            query.limit,
            query.offset,
        )
        .await?;

    Ok(HttpResponse::Ok().json(listing))
}

/// Configure purchase routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("", web::post().to(create_purchase))
            .route("", web::get().to(list_purchases)),
    );
}
