use actix_web::{test, App};

use crate::routes::health;

#[actix_web::test]
async fn health_check_returns_a_thumbs_up() {
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(body, "👍️\n".as_bytes());
}
