use crate::error::ApiError;
use crate::services::contacts::contact_filter;
use crate::store::Store;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use common::model::log::Contact;
use common::requests::ContactQuery;
use csv::{QuoteStyle, WriterBuilder};
use log::info;

const HEADERS: [&str; 4] = ["Sent Time", "Email Address", "Name", "Template"];

/// `GET /api/contacts/export`: the same listing as `GET /api/contacts`, as a
/// CSV attachment.
pub(crate) async fn process(
    store: web::Data<Store>,
    query: web::Query<ContactQuery>,
) -> Result<HttpResponse, ApiError> {
    let contacts = store.list_contacts(&contact_filter(&query)?)?;
    let body = to_csv(&contacts)?;
    info!("Exported {} contacts", contacts.len());

    let filename = format!("contacts_{}.csv", Utc::now().format("%Y-%m-%d"));
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body))
}

fn sent_time(sent_at: &str) -> String {
    DateTime::parse_from_rfc3339(sent_at)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| sent_at.to_string())
}

fn to_csv(contacts: &[Contact]) -> Result<Vec<u8>, ApiError> {
    // Header line is bare, every data cell is quoted.
    let header_line = format!("{}\n", HEADERS.join(",")).into_bytes();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(header_line);
    for contact in contacts {
        let sent = sent_time(&contact.sent_at);
        writer
            .write_record([
                sent.as_str(),
                contact.email_address.as_str(),
                contact.name.as_str(),
                contact.template_name.as_str(),
            ])
            .map_err(ApiError::Export)?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Export(e.into_error().into()))
}
