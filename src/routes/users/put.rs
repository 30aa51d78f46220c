use actix_web::web;

use crate::{
    domain::UserChanges,
    services::{Envelope, UserError, UserService},
};

pub async fn update_user(
    id: web::Path<i64>,
    body: web::Json<UserChanges>,
    service: web::Data<UserService>,
) -> Result<Envelope<String>, UserError> {
    service.update_user(id.into_inner(), body.into_inner()).await
}
