use crate::error::ApiError;
use crate::pipeline::placeholders::extract_placeholders;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Serialize)]
struct PlaceholderList {
    template_id: String,
    placeholders: Vec<String>,
}

pub async fn process(
    store: web::Data<Store>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let template = store.get_template(&template_id)?;
    Ok(HttpResponse::Ok().json(PlaceholderList {
        placeholders: extract_placeholders(&template.content),
        template_id: template.id,
    }))
}
