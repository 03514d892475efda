//! Router assembly for the Calshare service.

use axum::{routing::get, Router};
use calshare_supabase::AppContext;
use tower_http::trace::TraceLayer;

/// Mount point of the calendar API
pub const API_PREFIX: &str = "/api";

pub const WELCOME: &str = "Welcome to the Calshare API!";

async fn welcome() -> &'static str {
    WELCOME
}

/// Builds the full application router around `ctx`.
///
/// The welcome text answers on both `/api` and `/api/`; a nested `/` route
/// only matches the former.
pub fn app(ctx: AppContext) -> Router {
    let api_router = Router::new()
        .route("/", get(welcome))
        .merge(calshare_supabase::routes(ctx));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new()
        .route(&format!("{}/", API_PREFIX), get(welcome))
        .nest(API_PREFIX, api_router);

    #[cfg(feature = "openapi")]
    {
        app = app.merge(swagger_ui());
    }

    app.layer(TraceLayer::new_for_http())
}

#[cfg(feature = "openapi")]
fn swagger_ui() -> utoipa_swagger_ui::SwaggerUi {
    use calshare_supabase::openapi::CalshareApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    #[derive(OpenApi)]
    #[openapi(
        info(
            title = "Calshare API",
            version = "0.1.0",
            description = "Shared calendars, bookings and calendar shares",
            license(name = "MIT", url = "https://opensource.org/licenses/MIT")
        ),
        servers((url = "/api", description = "Main API Prefix")),
    )]
    struct ApiDoc;

    let mut doc = ApiDoc::openapi();
    doc.merge(CalshareApiDoc::openapi());
    tracing::info!("Adding Swagger UI at /api/docs");
    SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", doc)
}
