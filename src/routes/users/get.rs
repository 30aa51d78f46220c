use actix_web::web;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    domain::{User, UserSearch},
    services::{Envelope, UserError, UserService},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindUsersQuery {
    deleted: Option<String>,
    name: Option<String>,
    logged_in_before: Option<String>,
    logged_in_after: Option<String>,
}

impl TryFrom<FindUsersQuery> for UserSearch {
    type Error = UserError;

    fn try_from(query: FindUsersQuery) -> Result<Self, Self::Error> {
        let logged_in_before = query
            .logged_in_before
            .map(|raw| parse_timestamp(&raw).ok_or(UserError::InvalidTimestamp("loggedInBefore")))
            .transpose()?;
        let logged_in_after = query
            .logged_in_after
            .map(|raw| parse_timestamp(&raw).ok_or(UserError::InvalidTimestamp("loggedInAfter")))
            .transpose()?;

        Ok(Self {
            deleted: query.deleted.as_deref() == Some("true"),
            name: query.name,
            logged_in_before,
            logged_in_after,
        })
    }
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc())
        })
}

pub async fn find_users(
    query: web::Query<FindUsersQuery>,
    service: web::Data<UserService>,
) -> Result<Envelope<Vec<User>>, UserError> {
    let search = UserSearch::try_from(query.into_inner())?;
    service.find_users(search).await
}

pub async fn get_all_users(
    service: web::Data<UserService>,
) -> Result<Envelope<Vec<User>>, UserError> {
    service.get_all_users().await
}

pub async fn get_user_by_id(
    id: web::Path<i64>,
    service: web::Data<UserService>,
) -> Result<Envelope<Option<User>>, UserError> {
    service.get_user_by_id(id.into_inner()).await
}
