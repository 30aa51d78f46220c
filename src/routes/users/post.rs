use actix_web::web;
use serde::Deserialize;

use crate::{
    domain::{BulkUserPayload, NewUser},
    services::{BulkCreateReport, Envelope, UserError, UserService},
};

#[derive(Deserialize)]
pub struct BulkCreateRequest {
    users: Vec<BulkUserPayload>,
}

pub async fn create_user(
    body: web::Json<NewUser>,
    service: web::Data<UserService>,
) -> Result<Envelope<String>, UserError> {
    service.create_user(body.into_inner()).await
}

pub async fn bulk_create_users(
    body: web::Json<BulkCreateRequest>,
    service: web::Data<UserService>,
) -> Envelope<BulkCreateReport> {
    service.bulk_create_users(body.into_inner().users).await
}
