use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use fisio_clinic::models::auth::AuthenticatedUser;
use fisio_clinic::models::config::ServerConfig;
use fisio_clinic::repository::DieselRepository;
use fisio_clinic::routes;
use serde_json::{Value, json};

mod common;

const SECRET: &str = "route-tests-secret-route-tests-secret-route-tests-secret-0123456";

fn server_config() -> ServerConfig {
    ServerConfig {
        domain: "localhost".into(),
        address: "127.0.0.1".into(),
        port: 8080,
        database_url: String::new(),
        secret: SECRET.into(),
        auth_service_url: "http://localhost:8000".into(),
        invitation_ttl_days: 7,
        items_per_page: 20,
    }
}

fn token(email: &str) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    AuthenticatedUser {
        sub: "1".into(),
        email: email.into(),
        name: "Ana".into(),
        exp,
    }
    .to_jwt(SECRET)
    .unwrap()
}

macro_rules! init_app {
    ($test_db:expr) => {
        test::init_service(
            App::new()
                .wrap(IdentityMiddleware::default())
                .wrap(
                    SessionMiddleware::builder(
                        CookieSessionStore::default(),
                        Key::from(SECRET.as_bytes()),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(routes::configure)
                .app_data(web::Data::new(DieselRepository::new($test_db.pool())))
                .app_data(web::Data::new(server_config())),
        )
        .await
    };
}

/// The session cookie set by a response, if any.
fn session_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .next()
        .map(|cookie| cookie.into_owned())
}

#[actix_web::test]
async fn anonymous_requests_are_rejected() {
    let test_db = common::TestDb::new("test_routes_anonymous.db");
    let app = init_app!(test_db);

    let req = test::TestRequest::get().uri("/api/v1/clinics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn invalid_callback_token_is_rejected() {
    let test_db = common::TestDb::new("test_routes_bad_token.db");
    let app = init_app!(test_db);

    let req = test::TestRequest::get()
        .uri("/auth/callback?token=not-a-jwt")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn clinic_workflow_through_the_session() {
    let test_db = common::TestDb::new("test_routes_workflow.db");
    let app = init_app!(test_db);

    let req = test::TestRequest::get()
        .uri(&format!("/auth/callback?token={}", token("ana@clinica.com")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mut cookie = session_cookie(&resp).expect("session cookie");

    // Clinic-scoped endpoints need a selected clinic.
    let req = test::TestRequest::get()
        .uri("/api/v1/patients")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/clinics")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Clínica Movimento" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    cookie = session_cookie(&resp).unwrap_or(cookie);
    let clinic: Value = test::read_body_json(resp).await;
    assert_eq!(clinic["role"], "admin");

    let req = test::TestRequest::post()
        .uri("/api/v1/patients")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Maria Souza", "cpf": "529.982.247-25" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/patients")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Outra Maria", "cpf": "52998224725" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/patients")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get()
        .uri("/api/v1/patients?search=souza")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "Maria Souza");

    let req = test::TestRequest::get()
        .uri("/api/v1/dashboard")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let dashboard: Value = test::read_body_json(resp).await;
    assert_eq!(dashboard["active_patients"], 1);
    assert!(dashboard["financial"].is_object());
}

#[actix_web::test]
async fn malformed_json_is_unprocessable() {
    let test_db = common::TestDb::new("test_routes_bad_json.db");
    let app = init_app!(test_db);

    let req = test::TestRequest::get()
        .uri(&format!("/auth/callback?token={}", token("ana@clinica.com")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");

    let req = test::TestRequest::post()
        .uri("/api/v1/clinics")
        .cookie(cookie)
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"name\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
