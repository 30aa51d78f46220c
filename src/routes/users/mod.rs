mod delete;
mod get;
mod post;
mod put;

use std::sync::Arc;

use actix_web::{middleware::from_fn, web};
use casbin::Enforcer;

pub use delete::*;
pub use get::*;
pub use post::*;
pub use put::*;

use crate::{
    authentication::{PermissionGuard, TokenGuard, TokenKeys},
    guards::{require_existing_user, require_numeric_id},
};

/// Registers the `/users` routes. The fixed paths come first so they are not
/// captured by `/{id}`.
pub fn configure(
    keys: Arc<TokenKeys>,
    enforcer: Arc<Enforcer>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route("/create", web::post().to(create_user))
            .route("/bulkCreate", web::post().to(bulk_create_users))
            .route("/findUsers", web::get().to(find_users))
            .route("/getAllUsers", web::get().to(get_all_users))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_user_by_id))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user))
                    // registered innermost first: the last `wrap` runs first
                    .wrap(PermissionGuard::new(enforcer))
                    .wrap(TokenGuard::new(keys))
                    .wrap(from_fn(require_existing_user))
                    .wrap(from_fn(require_numeric_id)),
            );
    }
}
