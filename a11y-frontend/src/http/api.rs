use axum::{routing::any, Router};

use super::proxy;

pub fn router() -> Router {
    Router::new()
        .route("/scan", any(proxy::forward))
        .route("/scan/:id", any(proxy::forward))
        .route("/stripe/webhook", any(handlers::stripe_webhook))
}

mod handlers {
    use axum::{
        body::Bytes,
        http::{header, Method, StatusCode},
        response::{IntoResponse, Json, Response},
    };
    use serde_json::json;
    use tracing::{info, instrument};

    /// Payment provider webhook.
    ///
    /// Acknowledges every POST and logs its payload. The signature is not
    /// verified and nothing is written to the subscription store yet.
    #[instrument(skip_all, fields(%method))]
    pub async fn stripe_webhook(method: Method, body: Bytes) -> Response {
        if method != Method::POST {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "POST")],
                "Method Not Allowed",
            )
                .into_response();
        }

        info!(
            len = body.len(),
            payload = %String::from_utf8_lossy(&body),
            "received stripe webhook"
        );

        Json(json!({ "received": true })).into_response()
    }
}
