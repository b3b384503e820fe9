use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{entities::contact::ContactForm, errors::AppError, utils::get_client_ip::get_client_ip, AppState};

#[instrument(skip(req, state, form))]
pub async fn submit_contact_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<impl Responder, AppError> {
    let client_ip = get_client_ip(&req, state.web.trust_x_forwarded_for);

    let response = state
        .contact_handler
        .submit(&client_ip, form.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
