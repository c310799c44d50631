use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::middleware::auth::StoreContext;
use crate::modules::taxes::models::CreateTaxPeriodRequest;
use crate::modules::taxes::services::PeriodService;

/// Open a new tax period
/// POST /tax-periods
pub async fn create_period(
    service: web::Data<Arc<PeriodService>>,
    ctx: StoreContext,
    request: web::Json<CreateTaxPeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let period = service.create(&ctx.store_id, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(period))
}

/// List the store's tax periods
/// GET /tax-periods
pub async fn list_periods(
    service: web::Data<Arc<PeriodService>>,
    ctx: StoreContext,
) -> Result<HttpResponse, AppError> {
    let periods = service.list(&ctx.store_id).await?;

    Ok(HttpResponse::Ok().json(periods))
}

/// Full period detail with nested sales and purchases
/// GET /tax-periods/{id}
pub async fn get_period(
    service: web::Data<Arc<PeriodService>>,
    ctx: StoreContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let period_id = path.into_inner();
    let detail = service.get_detail(&ctx.store_id, &period_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Close a tax period (one-way)
/// POST /tax-periods/{id}/close
pub async fn close_period(
    service: web::Data<Arc<PeriodService>>,
    ctx: StoreContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let period_id = path.into_inner();
    let period = service
        .close(&ctx.store_id, &ctx.user_id, &period_id)
        .await?;

    Ok(HttpResponse::Ok().json(period))
}

/// Configure tax period routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tax-periods")
            .route("", web::post().to(create_period))
            .route("", web::get().to(list_periods))
            .route("/{id}", web::get().to(get_period))
            .route("/{id}/close", web::post().to(close_period)),
    );
}
