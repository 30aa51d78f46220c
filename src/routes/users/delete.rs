use actix_web::web;

use crate::services::{Envelope, UserError, UserService};

pub async fn delete_user(
    id: web::Path<i64>,
    service: web::Data<UserService>,
) -> Result<Envelope<String>, UserError> {
    service.delete_user(id.into_inner()).await
}
