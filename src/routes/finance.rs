use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::finance::FinanceQuery;
use crate::forms::finance::{PayableForm, ReceivableForm, SettlementForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{DieselRepository, now};
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, finance as finance_service};

/// Totals per status for both sides, honouring the same filters as the lists.
#[get("/finance/summary")]
pub async fn summary(
    query: web::Query<FinanceQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let overview =
        finance_service::summary(repo.get_ref(), &user, clinic.id(), query.into_inner(), now().date())?;
    Ok(HttpResponse::Ok().json(overview))
}

#[get("/payables")]
pub async fn list_payables(
    query: web::Query<FinanceQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let payables = finance_service::list_payables(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(payables))
}

#[post("/payables")]
pub async fn create_payable(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PayableForm>,
) -> Result<HttpResponse, ServiceError> {
    let payable =
        finance_service::create_payable(repo.get_ref(), &user, clinic.id(), form, now().date())?;
    Ok(HttpResponse::Created().json(payable))
}

#[get("/payables/{payable_id}")]
pub async fn show_payable(
    payable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let payable = finance_service::get_payable(
        repo.get_ref(),
        &user,
        clinic.id(),
        payable_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(payable))
}

#[put("/payables/{payable_id}")]
pub async fn update_payable(
    payable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PayableForm>,
) -> Result<HttpResponse, ServiceError> {
    let payable = finance_service::update_payable(
        repo.get_ref(),
        &user,
        clinic.id(),
        payable_id.into_inner(),
        form,
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(payable))
}

/// Settles the payable; `paid_date` defaults to today.
#[post("/payables/{payable_id}/pay")]
pub async fn pay_payable(
    payable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    form: Option<web::Json<SettlementForm>>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let payable = finance_service::mark_payable_paid(
        repo.get_ref(),
        &user,
        clinic.id(),
        payable_id.into_inner(),
        form,
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(payable))
}

#[post("/payables/{payable_id}/unpay")]
pub async fn unpay_payable(
    payable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let payable = finance_service::mark_payable_unpaid(
        repo.get_ref(),
        &user,
        clinic.id(),
        payable_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(payable))
}

#[delete("/payables/{payable_id}")]
pub async fn delete_payable(
    payable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    finance_service::delete_payable(repo.get_ref(), &user, clinic.id(), payable_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/receivables")]
pub async fn list_receivables(
    query: web::Query<FinanceQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let receivables = finance_service::list_receivables(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(receivables))
}

#[post("/receivables")]
pub async fn create_receivable(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ReceivableForm>,
) -> Result<HttpResponse, ServiceError> {
    let receivable =
        finance_service::create_receivable(repo.get_ref(), &user, clinic.id(), form, now().date())?;
    Ok(HttpResponse::Created().json(receivable))
}

#[get("/receivables/{receivable_id}")]
pub async fn show_receivable(
    receivable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let receivable = finance_service::get_receivable(
        repo.get_ref(),
        &user,
        clinic.id(),
        receivable_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(receivable))
}

#[put("/receivables/{receivable_id}")]
pub async fn update_receivable(
    receivable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ReceivableForm>,
) -> Result<HttpResponse, ServiceError> {
    let receivable = finance_service::update_receivable(
        repo.get_ref(),
        &user,
        clinic.id(),
        receivable_id.into_inner(),
        form,
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(receivable))
}

#[post("/receivables/{receivable_id}/pay")]
pub async fn pay_receivable(
    receivable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    form: Option<web::Json<SettlementForm>>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let receivable = finance_service::mark_receivable_paid(
        repo.get_ref(),
        &user,
        clinic.id(),
        receivable_id.into_inner(),
        form,
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(receivable))
}

#[post("/receivables/{receivable_id}/unpay")]
pub async fn unpay_receivable(
    receivable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let receivable = finance_service::mark_receivable_unpaid(
        repo.get_ref(),
        &user,
        clinic.id(),
        receivable_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(receivable))
}

#[delete("/receivables/{receivable_id}")]
pub async fn delete_receivable(
    receivable_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    finance_service::delete_receivable(repo.get_ref(), &user, clinic.id(), receivable_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
