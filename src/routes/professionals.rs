use actix_web::{HttpResponse, get, post, put, web};

use crate::forms::professionals::{ProfessionalForm, RoomForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{ActiveClinic, InactiveQuery};
use crate::services::{ServiceError, professionals as professionals_service};

#[get("/professionals")]
pub async fn list_professionals(
    query: web::Query<InactiveQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let professionals = professionals_service::list_professionals(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.include_inactive,
    )?;
    Ok(HttpResponse::Ok().json(professionals))
}

#[post("/professionals")]
pub async fn create_professional(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ProfessionalForm>,
) -> Result<HttpResponse, ServiceError> {
    let professional =
        professionals_service::create_professional(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(professional))
}

#[get("/professionals/{professional_id}")]
pub async fn show_professional(
    professional_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let professional = professionals_service::get_professional(
        repo.get_ref(),
        &user,
        clinic.id(),
        professional_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(professional))
}

#[put("/professionals/{professional_id}")]
pub async fn update_professional(
    professional_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ProfessionalForm>,
) -> Result<HttpResponse, ServiceError> {
    let professional = professionals_service::update_professional(
        repo.get_ref(),
        &user,
        clinic.id(),
        professional_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(professional))
}

#[post("/professionals/{professional_id}/deactivate")]
pub async fn deactivate_professional(
    professional_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let professional = professionals_service::deactivate_professional(
        repo.get_ref(),
        &user,
        clinic.id(),
        professional_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(professional))
}

#[get("/rooms")]
pub async fn list_rooms(
    query: web::Query<InactiveQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let rooms =
        professionals_service::list_rooms(repo.get_ref(), &user, clinic.id(), query.include_inactive)?;
    Ok(HttpResponse::Ok().json(rooms))
}

#[post("/rooms")]
pub async fn create_room(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<RoomForm>,
) -> Result<HttpResponse, ServiceError> {
    let room = professionals_service::create_room(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(room))
}

#[get("/rooms/{room_id}")]
pub async fn show_room(
    room_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let room =
        professionals_service::get_room(repo.get_ref(), &user, clinic.id(), room_id.into_inner())?;
    Ok(HttpResponse::Ok().json(room))
}

#[put("/rooms/{room_id}")]
pub async fn update_room(
    room_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<RoomForm>,
) -> Result<HttpResponse, ServiceError> {
    let room = professionals_service::update_room(
        repo.get_ref(),
        &user,
        clinic.id(),
        room_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(room))
}

#[post("/rooms/{room_id}/deactivate")]
pub async fn deactivate_room(
    room_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let room = professionals_service::deactivate_room(
        repo.get_ref(),
        &user,
        clinic.id(),
        room_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(room))
}
