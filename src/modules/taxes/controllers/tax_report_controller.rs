use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::middleware::auth::StoreContext;
use crate::modules::taxes::services::VatReportService;

/// VAT reconciliation report for a closed period
/// GET /tax-reports/{period_id}
pub async fn get_vat_report(
    service: web::Data<Arc<VatReportService>>,
    ctx: StoreContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let period_id = path.into_inner();
    let report = service.build(&ctx.store_id, &period_id).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Configure tax report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tax-reports").route("/{period_id}", web::get().to(get_vat_report)),
    );
}
