use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, web};

use crate::dto::reports::PeriodQuery;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, reports as reports_service};

#[get("/reports/financial")]
pub async fn financial_report(
    query: web::Query<PeriodQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let report =
        reports_service::financial_report(repo.get_ref(), &user, clinic.id(), query.into_inner())?;
    Ok(HttpResponse::Ok().json(report))
}

/// Settled entries of the period as a CSV attachment.
#[get("/reports/financial.csv")]
pub async fn financial_csv(
    query: web::Query<PeriodQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let period = query.into_inner();
    let csv = reports_service::financial_csv(repo.get_ref(), &user, clinic.id(), period)?;
    let filename = format!("financeiro_{}_{}.csv", period.from, period.to);
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(csv))
}

#[get("/reports/appointments")]
pub async fn appointments_report(
    query: web::Query<PeriodQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let report =
        reports_service::appointments_report(repo.get_ref(), &user, clinic.id(), query.into_inner())?;
    Ok(HttpResponse::Ok().json(report))
}
