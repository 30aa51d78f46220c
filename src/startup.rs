use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    http::header,
    web::{self, Data},
    App, HttpServer,
};
use anyhow::Context;
use casbin::Enforcer;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing_actix_web::TracingLogger;

use crate::{
    authentication::{load_enforcer, TokenKeys},
    configuration::{DatabaseSettings, Settings},
    persistence::{PostgresUserRepository, UserRepository},
    routes::{health_check, login, users},
    services::UserService,
    utils::{json_error_handler, query_error_handler},
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Connects to Postgres, applies pending migrations and binds the server.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .context("Failed to migrate the database.")?;

        let repository = Arc::new(PostgresUserRepository::new(connection_pool));
        Self::build_with_repository(configuration, repository).await
    }

    pub async fn build_with_repository(
        configuration: Settings,
        repository: Arc<dyn UserRepository>,
    ) -> Result<Self, anyhow::Error> {
        let enforcer = load_enforcer(&configuration.auth).await?;
        let keys = TokenKeys::from_secret(
            &configuration.auth.jwt_secret,
            configuration.auth.token_ttl_minutes,
        );

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {address}"))?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            repository,
            keys,
            enforcer,
            configuration.application.allowed_origin,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(configuration.connect_options())
}

pub fn run(
    listener: TcpListener,
    repository: Arc<dyn UserRepository>,
    keys: TokenKeys,
    enforcer: Enforcer,
    allowed_origin: String,
) -> Result<Server, anyhow::Error> {
    let user_service = Data::new(UserService::new(repository));
    let keys = Data::new(keys);
    let enforcer = Arc::new(enforcer);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    .service(web::scope("/auth").route("/login", web::post().to(login)))
                    .service(
                        web::scope("/users")
                            .configure(users::configure(keys.clone().into_inner(), enforcer.clone())),
                    ),
            )
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(user_service.clone())
            .app_data(keys.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
