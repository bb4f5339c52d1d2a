use axum::extract::Query;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::server::types::{ApiRouteResult, TemplatesQuery, TemplatesResponse};
use crate::types::templates::template_catalogue;

/// Lists the built-in templates, optionally filtered on their `show` flag
async fn handle_list_templates(Query(query): Query<TemplatesQuery>) -> ApiRouteResult {
    let templates = template_catalogue()
        .into_iter()
        .filter(|template| query.show.map_or(true, |show| template.show == show))
        .collect();
    Ok(Json(TemplatesResponse { templates }).into_response())
}

pub fn template_router() -> Router {
    Router::new().route("/", get(handle_list_templates))
}
