use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::agenda::{AppointmentsQuery, DayQuery, SlotsQuery, WeekQuery};
use crate::forms::appointments::{
    AppointmentForm, CancelSeriesForm, RecurringForm, RescheduleForm, StatusForm,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{DieselRepository, now};
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, appointments as appointments_service};

/// Appointments overlapping `[from, to)` with optional filters.
#[get("/appointments")]
pub async fn list_appointments(
    query: web::Query<AppointmentsQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let appointments = appointments_service::list_appointments(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[post("/appointments")]
pub async fn create_appointment(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<AppointmentForm>,
) -> Result<HttpResponse, ServiceError> {
    let appointment =
        appointments_service::create_appointment(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(appointment))
}

#[post("/appointments/recurring")]
pub async fn create_recurring(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<RecurringForm>,
) -> Result<HttpResponse, ServiceError> {
    let series = appointments_service::create_recurring(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(series))
}

#[post("/appointments/series/{recurrence_group}/cancel")]
pub async fn cancel_series(
    recurrence_group: web::Path<String>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CancelSeriesForm>,
) -> Result<HttpResponse, ServiceError> {
    let cancelled = appointments_service::cancel_series(
        repo.get_ref(),
        &user,
        clinic.id(),
        &recurrence_group,
        form,
        now(),
    )?;
    Ok(HttpResponse::Ok().json(cancelled))
}

#[get("/appointments/{appointment_id}")]
pub async fn show_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let appointment = appointments_service::get_appointment(
        repo.get_ref(),
        &user,
        clinic.id(),
        appointment_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[put("/appointments/{appointment_id}")]
pub async fn update_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<AppointmentForm>,
) -> Result<HttpResponse, ServiceError> {
    let appointment = appointments_service::update_appointment(
        repo.get_ref(),
        &user,
        clinic.id(),
        appointment_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[delete("/appointments/{appointment_id}")]
pub async fn delete_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    appointments_service::delete_appointment(
        repo.get_ref(),
        &user,
        clinic.id(),
        appointment_id.into_inner(),
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/appointments/{appointment_id}/reschedule")]
pub async fn reschedule(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<RescheduleForm>,
) -> Result<HttpResponse, ServiceError> {
    let appointment = appointments_service::reschedule(
        repo.get_ref(),
        &user,
        clinic.id(),
        appointment_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[post("/appointments/{appointment_id}/status")]
pub async fn set_status(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<StatusForm>,
) -> Result<HttpResponse, ServiceError> {
    let appointment = appointments_service::set_status(
        repo.get_ref(),
        &user,
        clinic.id(),
        appointment_id.into_inner(),
        form,
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[get("/agenda/day")]
pub async fn day_view(
    query: web::Query<DayQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let day = appointments_service::day_view(repo.get_ref(), &user, clinic.id(), query.into_inner())?;
    Ok(HttpResponse::Ok().json(day))
}

/// Seven days starting at `start`, or at the Monday of the current week.
#[get("/agenda/week")]
pub async fn week_view(
    query: web::Query<WeekQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let week = appointments_service::week_view(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(week))
}

#[get("/agenda/slots")]
pub async fn available_slots(
    query: web::Query<SlotsQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let slots =
        appointments_service::available_slots(repo.get_ref(), &user, clinic.id(), query.into_inner())?;
    Ok(HttpResponse::Ok().json(slots))
}
