//! Scan submission page
//!
//! [`ScanForm`] holds the state behind the submission form and drives a single
//! submission at a time. The `render_*` functions turn that state into HTML
//! through `maud` templates.
//! The rendered page also carries a small script that performs the same flow
//! in the browser against `/api/scan`, so the form works with or without it.

use maud::{html, Markup, PreEscaped, DOCTYPE};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::scan::{ScanClient, ScanRecord};

const TITLE: &str = "AI-Powered Accessibility Compliance";
const SUBMIT_LABEL: &str = "Start scan";
const LOADING_LABEL: &str = "Processing…";
const URL_REQUIRED: &str = "URL is required";

/// What the last submission produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    None,
    Submitted(i64),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub url: String,
    pub loading: bool,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub struct ScanForm {
    state: watch::Sender<FormState>,
}

impl Default for ScanForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanForm {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FormState::default());
        Self { state }
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.send_modify(|state| state.url = url);
    }

    /// Submit the current URL through `client`.
    ///
    /// Returns `false` without touching the state when a submission is
    /// already in flight.
    pub async fn submit(&self, client: &ScanClient) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            state.outcome = Outcome::None;
            accepted = true;
            true
        });

        if !accepted {
            debug!("submission already in flight");
            return false;
        }

        let guard = LoadingGuard(&self.state);
        let url = self.state.borrow().url.clone();

        let outcome = if url.trim().is_empty() {
            Outcome::Failed(URL_REQUIRED.to_owned())
        } else {
            match client.create(&url).await {
                Ok(created) => {
                    debug!(id = created.id, "scan accepted");
                    Outcome::Submitted(created.id)
                }
                Err(err) => {
                    warn!(error = %err, "scan submission failed");
                    Outcome::Failed(err.to_string())
                }
            }
        };

        self.state.send_modify(|state| {
            state.loading = false;
            state.outcome = outcome;
        });
        drop(guard);

        true
    }
}

/// Clears the loading flag if a submission is dropped before it resolves.
struct LoadingGuard<'a>(&'a watch::Sender<FormState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
    }
}

pub fn render_home(state: &FormState) -> String {
    let label = if state.loading { LOADING_LABEL } else { SUBMIT_LABEL };

    let body = html! {
        h1 { (TITLE) }
        p class="lead" {
            "Enter the address of your website to generate an accessibility report. "
            "The site is audited with axe-core/Pa11y and the results are published as PDF/JSON."
        }
        form id="scan-form" method="post" action="/" {
            input type="url" name="url" required placeholder="https://example.com" value=(state.url);
            button type="submit" id="scan-submit" disabled[state.loading] { (label) }
        }
        div id="scan-result" {
            @match &state.outcome {
                Outcome::None => {},
                Outcome::Submitted(id) => {
                    p id="scan-success" class="success" {
                        "Your scan was saved with identifier " (id) ". You can check its status "
                        a href={ "/scans/" (id) } { "here" }
                        "."
                    }
                },
                Outcome::Failed(message) => { (error_paragraph(message)) },
            }
        }
        script { (PreEscaped(SCRIPT)) }
    };

    layout(TITLE, body)
}

pub fn render_status(id: i64, record: Result<&ScanRecord, &str>) -> String {
    let details = record.ok().map(|record| {
        [
            ("Submitted", record.created_at.as_deref()),
            ("Completed", record.completed_at.as_deref()),
            ("Report", record.report_path.as_deref()),
        ]
    });

    let body = html! {
        h1 { "Scan " (id) }
        @match record {
            Ok(record) => {
                dl id="scan-record" {
                    dt { "URL" }
                    dd { (record.url) }
                    dt { "Status" }
                    dd class={ "status-" (record.status) } { (record.status) }
                    @for (label, value) in details.into_iter().flatten() {
                        @if let Some(value) = value {
                            dt { (label) }
                            dd { (value) }
                        }
                    }
                }
            },
            Err(message) => { (error_paragraph(message)) },
        }
        p { a href="/" { "New scan" } }
    };

    layout(&format!("Scan {id}"), body)
}

fn error_paragraph(message: &str) -> Markup {
    html! {
        p id="scan-error" class="error" {
            "An error occurred: "
            span class="message" { (message) }
        }
    }
}

fn layout(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                main { (body) }
            }
        }
    }
    .into_string()
}

// Browser-side counterpart of `ScanForm::submit`.
const SCRIPT: &str = r#"
const form = document.getElementById('scan-form');
const button = document.getElementById('scan-submit');
const result = document.getElementById('scan-result');
let loading = false;

function show(kind, text) {
  const p = document.createElement('p');
  p.id = 'scan-' + kind;
  p.className = kind;
  p.textContent = text;
  result.replaceChildren(p);
}

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  if (loading) return;
  loading = true;
  button.disabled = true;
  button.textContent = 'Processing…';
  result.replaceChildren();
  try {
    const res = await fetch('/api/scan', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ url: form.elements.url.value }),
    });
    if (!res.ok) {
      throw new Error(await res.text());
    }
    const data = await res.json();
    show('success', 'Your scan was saved with identifier ' + data.id + '.');
  } catch (err) {
    show('error', 'An error occurred: ' + err.message);
  } finally {
    loading = false;
    button.disabled = false;
    button.textContent = 'Start scan';
  }
});
"#;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::scan::ScanStatus;
    use crate::test_support;

    const SUBMIT_ENABLED: &str = r#"<button type="submit" id="scan-submit">"#;
    const SUBMIT_DISABLED: &str = r#"<button type="submit" id="scan-submit" disabled>"#;

    #[tokio::test]
    async fn successful_submission_shows_identifier() {
        let backend = test_support::spawn_backend(Router::new().route(
            "/scan",
            post(|| async { Json(json!({ "id": 42 })) }),
        ))
        .await;
        let form = ScanForm::new();
        form.set_url("https://example.com");

        assert!(form.submit(&test_support::scan_client(backend)).await);

        let state = form.state();
        assert_eq!(state.outcome, Outcome::Submitted(42));
        assert!(!state.loading);

        let html = render_home(&state);
        assert!(html.contains("identifier 42"));
        assert!(!html.contains(r#"<p id="scan-error""#));
    }

    #[tokio::test]
    async fn rejected_submission_shows_body_as_error() {
        let backend = test_support::spawn_backend(Router::new().route(
            "/scan",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "server error") }),
        ))
        .await;
        let form = ScanForm::new();
        form.set_url("https://example.com");

        form.submit(&test_support::scan_client(backend)).await;

        let state = form.state();
        assert_eq!(state.outcome, Outcome::Failed("server error".to_owned()));

        let html = render_home(&state);
        assert!(html.contains(r#"<span class="message">server error</span>"#));
        assert!(!html.contains(r#"<p id="scan-success""#));
        assert!(html.contains(SUBMIT_ENABLED));
    }

    #[tokio::test]
    async fn submit_is_disabled_while_in_flight() {
        let release = Arc::new(Notify::new());
        let backend_release = release.clone();
        let backend = test_support::spawn_backend(Router::new().route(
            "/scan",
            post(move || {
                let release = backend_release.clone();
                async move {
                    release.notified().await;
                    Json(json!({ "id": 7 }))
                }
            }),
        ))
        .await;
        let client = test_support::scan_client(backend);
        let form = ScanForm::new();
        form.set_url("https://example.com");
        let mut states = form.state.subscribe();

        let observe = async {
            let in_flight = states.wait_for(|state| state.loading).await.unwrap().clone();
            assert!(render_home(&in_flight).contains(SUBMIT_DISABLED));
            assert!(render_home(&in_flight).contains(LOADING_LABEL));

            // A second submission while the first is pending is ignored.
            assert!(!form.submit(&client).await);

            release.notify_one();
        };

        let (accepted, ()) = tokio::join!(form.submit(&client), observe);

        assert!(accepted);
        let state = form.state();
        assert!(!state.loading);
        assert_eq!(state.outcome, Outcome::Submitted(7));
        assert!(render_home(&state).contains(SUBMIT_ENABLED));
    }

    #[tokio::test]
    async fn transport_failure_shows_error_message() {
        let form = ScanForm::new();
        form.set_url("https://example.com");

        form.submit(&test_support::scan_client(test_support::closed_backend()))
            .await;

        let state = form.state();
        assert!(!state.loading);
        assert!(matches!(state.outcome, Outcome::Failed(ref message) if !message.is_empty()));
    }

    #[tokio::test]
    async fn empty_url_is_refused_without_a_request() {
        let form = ScanForm::new();
        form.set_url("   ");

        form.submit(&test_support::scan_client(test_support::closed_backend()))
            .await;

        assert_eq!(form.state().outcome, Outcome::Failed(URL_REQUIRED.to_owned()));
    }

    #[tokio::test]
    async fn new_submission_clears_previous_outcome() {
        let backend = test_support::spawn_backend(Router::new().route(
            "/scan",
            post(|| async { Json(json!({ "id": 1 })) }),
        ))
        .await;
        let form = ScanForm::new();
        form.set_url("");
        form.submit(&test_support::scan_client(backend.clone())).await;
        assert!(matches!(form.state().outcome, Outcome::Failed(_)));

        form.set_url("https://example.com");
        form.submit(&test_support::scan_client(backend)).await;

        assert_eq!(form.state().outcome, Outcome::Submitted(1));
        assert!(!render_home(&form.state()).contains(r#"<p id="scan-error""#));
    }

    #[test]
    fn idle_page_shows_enabled_form_without_result() {
        let html = render_home(&FormState::default());

        assert!(html.contains(r#"<input type="url" name="url" required"#));
        assert!(html.contains(SUBMIT_ENABLED));
        assert!(!html.contains(r#"<p id="scan-success""#));
        assert!(!html.contains(r#"<p id="scan-error""#));
    }

    #[test]
    fn script_disables_submit_while_request_is_pending() {
        let disable = SCRIPT.find("button.disabled = true;").unwrap();
        let request = SCRIPT.find("fetch('/api/scan'").unwrap();
        let cleanup = SCRIPT.find("} finally {").unwrap();
        let enable = SCRIPT.find("button.disabled = false;").unwrap();

        assert!(SCRIPT.find("if (loading) return;").unwrap() < disable);
        assert!(disable < request);
        assert!(request < cleanup);
        assert!(cleanup < enable);

        let finally_block = &SCRIPT[cleanup..];
        assert!(finally_block.contains("loading = false;"));
        assert!(finally_block.contains(&format!("button.textContent = '{SUBMIT_LABEL}';")));
        assert!(SCRIPT[disable..request].contains(&format!("button.textContent = '{LOADING_LABEL}';")));

        assert!(render_home(&FormState::default()).contains(SCRIPT));
    }

    #[test]
    fn error_text_is_escaped() {
        let state = FormState {
            outcome: Outcome::Failed("<b>bad</b> & worse".to_owned()),
            ..FormState::default()
        };

        let html = render_home(&state);

        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt; &amp; worse"));
        assert!(!html.contains("<b>bad</b>"));
    }

    #[test]
    fn status_page_shows_record() {
        let record = ScanRecord {
            id: 5,
            url: "https://example.com/".to_owned(),
            status: ScanStatus::Processing,
            created_at: Some("2024-05-01T10:00:00".to_owned()),
            completed_at: None,
            report_path: None,
        };

        let html = render_status(5, Ok(&record));

        assert!(html.contains("<h1>Scan 5</h1>"));
        assert!(html.contains("https://example.com/"));
        assert!(html.contains(r#"<dd class="status-processing">processing</dd>"#));
        assert!(html.contains("<dt>Submitted</dt><dd>2024-05-01T10:00:00</dd>"));
        assert!(!html.contains("Completed"));
    }

    #[test]
    fn status_page_shows_lookup_error() {
        let html = render_status(9, Err(r#"{"detail":"Scan not found"}"#));

        assert!(html.contains(r#"<p id="scan-error""#));
        assert!(html.contains("Scan not found"));
    }
}
