use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::AuthSettings;
use crate::middleware::{AuthMiddleware, RequestLogger};
use crate::routes::{
    create_course, delete_course, enroll_course, get_course, get_me, health_check, list_courses,
    list_users, login, register, update_course, update_me,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let auth_data = web::Data::new(auth_settings.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)
            // Shared state
            .app_data(connection.clone())
            .app_data(auth_data.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    // Public authentication endpoints
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(register))
                            .route("/login", web::post().to(login)),
                    )
                    // User endpoints sit behind the access-guard middleware
                    .service(
                        web::scope("/users")
                            .wrap(AuthMiddleware::new(auth_settings.clone()))
                            .route("/me", web::get().to(get_me))
                            .route("/me", web::put().to(update_me))
                            .route("", web::get().to(list_users)),
                    )
                    // Course endpoints mix public reads with guarded
                    // mutation, so the guarded handlers run the guard
                    // stages themselves
                    .service(
                        web::scope("/courses")
                            .route("", web::get().to(list_courses))
                            .route("", web::post().to(create_course))
                            .route("/{id}", web::get().to(get_course))
                            .route("/{id}", web::put().to(update_course))
                            .route("/{id}", web::delete().to(delete_course))
                            .route("/{id}/enroll", web::post().to(enroll_course)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
