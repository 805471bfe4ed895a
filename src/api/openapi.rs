//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lectoria API",
        version = "1.0.0",
        description = "Library Membership System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Lectoria Team", email = "contact@lectoria.dev")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::search_books,
        books::get_book,
        books::get_book_by_isbn,
        books::get_book_by_author,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::list_users,
        users::search_users,
        users::get_user,
        users::get_user_by_username,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::modify_book_list,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            crate::models::RemoteBook,
            // Users
            crate::models::User,
            crate::models::UserKind,
            users::ModifyBookListParams,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "users", description = "Library member management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
