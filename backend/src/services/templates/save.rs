use crate::error::ApiError;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::model::template::Template;
use log::info;

pub async fn process(
    store: web::Data<Store>,
    payload: web::Json<Template>,
) -> Result<HttpResponse, ApiError> {
    let template = payload.into_inner();
    validate(&template)?;
    store.save_template(&template)?;
    info!("Saved template {} ({})", template.id, template.name);
    Ok(HttpResponse::Ok().body("Template saved"))
}

fn validate(template: &Template) -> Result<(), ApiError> {
    if template.id.trim().is_empty() {
        return Err(ApiError::BadRequest("Template id must not be empty".to_string()));
    }
    if template.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Template name must not be empty".to_string()));
    }
    Ok(())
}
