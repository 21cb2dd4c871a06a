use crate::error::ApiError;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use log::info;

pub async fn process(
    store: web::Data<Store>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    store.delete_template(&template_id)?;
    info!("Deleted template {}", template_id);
    Ok(HttpResponse::NoContent().finish())
}
