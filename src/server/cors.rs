use actix_cors::Cors;
use actix_web::http::header;

/// The `/plan` endpoint's only consumer is a browser-based transit-app
/// frontend; GET-only keeps this permissive without opening up mutation.
pub fn cors_middleware() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
