pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod view;

use axum::routing::{get, post};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the full application router: public auth routes, the session-gated
/// portal routes, and global middleware.
pub fn app() -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(
            portal_routes().layer(axum::middleware::from_fn(middleware::auth::require_session)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Login and logout are the only routes reachable without a session.
fn auth_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
}

fn portal_routes() -> Router {
    use handlers::dashboard;

    Router::new()
        .route("/", get(dashboard::index))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/connections", get(dashboard::connections))
        .merge(alumni_routes())
        .merge(student_routes())
        .merge(session_routes())
        .merge(feedback_routes())
        .merge(diagnostic_routes())
}

fn alumni_routes() -> Router {
    use handlers::{achievements, alumni};

    Router::new()
        .route("/alumni", get(alumni::list))
        .route("/alumni/add", get(alumni::add_form).post(alumni::add_submit))
        .route(
            "/alumni/edit/:id",
            get(alumni::edit_form).post(alumni::edit_submit),
        )
        .route("/alumni/delete/:id", post(alumni::delete))
        .route(
            "/alumni/achievements",
            get(achievements::list).post(achievements::add),
        )
        .route(
            "/alumni/achievements/edit/:id",
            get(achievements::edit_form).post(achievements::edit_submit),
        )
        .route("/alumni/achievements/delete/:id", post(achievements::delete))
}

fn student_routes() -> Router {
    use handlers::students;

    Router::new()
        .route("/students", get(students::list))
        .route(
            "/students/add",
            get(students::add_form).post(students::add_submit),
        )
        .route(
            "/students/edit/:id",
            get(students::edit_form).post(students::edit_submit),
        )
        .route("/students/delete/:id", post(students::delete))
}

fn session_routes() -> Router {
    use handlers::sessions;

    Router::new()
        .route("/sessions", get(sessions::list))
        .route(
            "/sessions/add",
            get(sessions::add_form).post(sessions::add_submit),
        )
        .route(
            "/sessions/edit/:id",
            get(sessions::edit_form).post(sessions::edit_submit),
        )
        .route("/sessions/delete/:id", post(sessions::delete))
}

fn feedback_routes() -> Router {
    use handlers::feedback;

    Router::new()
        .route("/feedback", get(feedback::list))
        .route(
            "/feedback/add",
            get(feedback::add_form).post(feedback::add_submit),
        )
        .route(
            "/feedback/edit/:id",
            get(feedback::edit_form).post(feedback::edit_submit),
        )
        .route("/feedback/delete/:id", post(feedback::delete))
}

fn diagnostic_routes() -> Router {
    use handlers::diagnostics;

    Router::new()
        .route("/test/triggers", get(diagnostics::triggers_page))
        .route("/test/email_uniqueness", post(diagnostics::email_uniqueness))
        .route("/test/rating_validation", post(diagnostics::rating_validation))
        .route("/test/auto_logging", post(diagnostics::auto_logging))
        .route("/test/procedures", get(diagnostics::procedures_page))
        .route("/api/procedures/:name", post(diagnostics::api_procedure))
}
