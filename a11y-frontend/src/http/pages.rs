use axum::{routing::get, Router};

pub fn router() -> Router {
    Router::new()
        .route("/", get(handlers::home).post(handlers::submit))
        .route("/scans/:id", get(handlers::status))
}

mod handlers {
    use std::sync::Arc;

    use axum::{
        extract::{Extension, Form, Path},
        http::StatusCode,
        response::Html,
    };
    use serde::Deserialize;
    use tracing::instrument;

    use crate::http::State;
    use crate::page::{self, FormState, ScanForm};
    use crate::scan::SubmitError;

    #[derive(Debug, Deserialize)]
    pub struct SubmitForm {
        #[serde(default)]
        url: String,
    }

    pub async fn home() -> Html<String> {
        Html(page::render_home(&FormState::default()))
    }

    /// Form fallback for browsers without scripting.
    #[instrument(skip(state))]
    pub async fn submit(
        Extension(state): Extension<Arc<State>>,
        Form(input): Form<SubmitForm>,
    ) -> Html<String> {
        let form = ScanForm::new();
        form.set_url(input.url);
        form.submit(&state.scans).await;

        Html(page::render_home(&form.state()))
    }

    #[instrument(skip(state))]
    pub async fn status(
        Extension(state): Extension<Arc<State>>,
        Path(id): Path<i64>,
    ) -> (StatusCode, Html<String>) {
        match state.scans.fetch(id).await {
            Ok(record) => (StatusCode::OK, Html(page::render_status(id, Ok(&record)))),
            Err(err) => {
                let status = match &err {
                    SubmitError::Rejected { status, .. } if status.is_client_error() => *status,
                    _ => StatusCode::BAD_GATEWAY,
                };
                let message = err.to_string();

                (status, Html(page::render_status(id, Err(&message))))
            }
        }
    }
}
