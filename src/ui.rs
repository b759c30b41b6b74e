//! Form-based UI that relays applications to the scoring API.
//!
//! Runs as its own process. The API base URL comes from `API_URL`.

use crate::types::application::LoanApplication;
use crate::types::prediction::{Decision, PredictionResponse};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the scoring API base URL
pub const API_URL_ENV: &str = "API_URL";

/// Fallback when `API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Errors talking to the scoring API
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API could not be reached.
    #[error("Could not connect to the scoring API at {url}: {message}")]
    Connection { url: String, message: String },

    /// The API answered with a non-success status.
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// The API answered 200 with an unexpected body.
    #[error("Unexpected response from scoring API: {0}")]
    Decode(String),
}

/// HTTP client for `POST /predict`
#[derive(Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client for `API_URL`, or `fallback` when it is unset.
    pub fn from_env(fallback: &str) -> Self {
        let url = std::env::var(API_URL_ENV).unwrap_or_else(|_| fallback.to_string());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Score one application.
    pub async fn score(&self, app: &LoanApplication) -> Result<PredictionResponse, ClientError> {
        let url = format!("{}/predict", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(app)
            .send()
            .await
            .map_err(|e| ClientError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Raw form submission; utilization arrives as a percentage.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationForm {
    pub age: u32,
    pub income: u64,
    pub years_employed: u32,
    pub credit_limit: u64,
    pub loan_amount: u64,
    pub delinquencies_2y: u32,
    pub utilization_percent: u32,
}

impl ApplicationForm {
    /// Convert to the API record (30% becomes 0.3).
    pub fn into_application(self) -> LoanApplication {
        LoanApplication {
            age: self.age,
            income: self.income,
            years_employed: self.years_employed,
            credit_limit: self.credit_limit,
            credit_utilization: self.utilization_percent as f64 / 100.0,
            delinquencies_2y: self.delinquencies_2y,
            loan_amount: self.loan_amount,
        }
    }
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self {
            age: 30,
            income: 50000,
            years_employed: 5,
            credit_limit: 20000,
            loan_amount: 15000,
            delinquencies_2y: 0,
            utilization_percent: 30,
        }
    }
}

/// State shared by UI handlers
#[derive(Clone)]
pub struct UiState {
    pub client: Arc<ScoringClient>,
    /// Used only to show the high-risk warning
    pub threshold: f64,
}

/// Build the UI router
pub fn router(state: UiState) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/score", post(score))
        .with_state(state)
}

async fn form_page() -> Html<String> {
    Html(render_page(&ApplicationForm::default(), None))
}

async fn score(
    State(state): State<UiState>,
    form: Result<Form<ApplicationForm>, FormRejection>,
) -> Html<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let message = format!("Invalid form input: {}", rejection.body_text());
            warn!(error = %message, "Rejected form submission");
            let result = format!("<hr><h2>Scoring result</h2>{}", error_panel(&message));
            return Html(render_page(&ApplicationForm::default(), Some(&result)));
        }
    };

    let application = form.clone().into_application();
    let outcome = state.client.score(&application).await;

    match &outcome {
        Ok(result) => info!(
            decision = result.decision.as_str(),
            default_probability = result.default_probability,
            "Application scored"
        ),
        Err(e) => warn!(error = %e, "Scoring request failed"),
    }

    let result = render_result(&outcome, state.threshold);
    Html(render_page(&form, Some(&result)))
}

/// Minimal HTML escaping for text interpolated into the page
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn error_panel(message: &str) -> String {
    format!(r#"<p class="err">{}</p>"#, escape_html(message))
}

/// Result panel for a scoring outcome
pub fn render_result(outcome: &Result<PredictionResponse, ClientError>, threshold: f64) -> String {
    let mut html = String::from("<hr><h2>Scoring result</h2>");

    match outcome {
        Ok(result) => {
            let verdict = match result.decision {
                Decision::Approved => r#"<p class="ok">&#10004; Loan APPROVED</p>"#,
                Decision::Rejected => r#"<p class="err">&#10008; Loan REJECTED</p>"#,
            };
            html.push_str(verdict);

            let percent = result.default_probability * 100.0;
            let _ = write!(
                html,
                "<p>Probability of default: <b>{:.2}%</b></p>\
                 <label>Risk level <progress max=\"1\" value=\"{}\"></progress></label>",
                percent, result.default_probability
            );

            if result.default_probability > threshold {
                let _ = write!(
                    html,
                    r#"<p class="warn">&#9888; Risk is too high (&gt; {:.0}%)</p>"#,
                    threshold * 100.0
                );
            }
        }
        Err(ClientError::Connection { .. }) => {
            html.push_str(
                r#"<p class="err">Could not connect to the API. Make sure the backend is running.</p>"#,
            );
        }
        Err(e) => html.push_str(&error_panel(&e.to_string())),
    }

    html
}

/// Full page: the form, prefilled with `form`, and an optional result panel
pub fn render_page(form: &ApplicationForm, result: Option<&str>) -> String {
    let number = |label: &str, name: &str, min: u32, max: Option<u32>, step: u32, value: u64| {
        let max = max.map(|m| format!(" max=\"{}\"", m)).unwrap_or_default();
        format!(
            "<label>{label}<input type=\"number\" name=\"{name}\" min=\"{min}\"{max} step=\"{step}\" value=\"{value}\" required></label>"
        )
    };

    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Bank Scoring System</title>\
         <style>body{font-family:sans-serif;max-width:40em;margin:2em auto}\
         label{display:block;margin:.5em 0}.ok{color:green}.err{color:#b00}.warn{color:#b60}\
         .cols{display:flex;gap:2em}</style></head><body>\
         <h1>&#127974; Credit Scoring</h1>\
         <p>Enter the applicant's details to estimate the probability of default.</p>\
         <form method=\"post\" action=\"/score\"><div class=\"cols\"><div>",
    );

    html.push_str(&number("Age", "age", 18, Some(100), 1, form.age as u64));
    html.push_str(&number("Annual income ($)", "income", 0, None, 1000, form.income));
    html.push_str(&number(
        "Years employed",
        "years_employed",
        0,
        None,
        1,
        form.years_employed as u64,
    ));
    html.push_str(&number("Total credit limit ($)", "credit_limit", 0, None, 1, form.credit_limit));
    html.push_str("</div><div>");
    html.push_str(&number("Requested amount ($)", "loan_amount", 0, None, 1, form.loan_amount));
    html.push_str(&number(
        "Delinquencies (2 years)",
        "delinquencies_2y",
        0,
        None,
        1,
        form.delinquencies_2y as u64,
    ));
    let _ = write!(
        html,
        "<label>Credit card utilization (%)<input type=\"range\" name=\"utilization_percent\" \
         min=\"0\" max=\"150\" value=\"{}\" oninput=\"this.nextElementSibling.value=this.value\">\
         <output>{}</output></label>",
        form.utilization_percent, form.utilization_percent
    );
    html.push_str("</div></div><button type=\"submit\">Calculate risk</button></form>");

    if let Some(result) = result {
        html.push_str(result);
    }
    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_conversion() {
        let app = ApplicationForm::default().into_application();
        assert_eq!(app.age, 30);
        assert_eq!(app.income, 50000);
        assert_eq!(app.credit_utilization, 0.3);
        assert_eq!(app.loan_amount, 15000);
    }

    #[test]
    fn test_form_page_has_every_field() {
        let html = render_page(&ApplicationForm::default(), None);
        for name in [
            "age",
            "income",
            "years_employed",
            "credit_limit",
            "loan_amount",
            "delinquencies_2y",
            "utilization_percent",
        ] {
            assert!(html.contains(&format!("name=\"{}\"", name)), "missing {}", name);
        }
        assert!(!html.contains("Scoring result"));
    }

    #[test]
    fn test_render_approved_and_rejected() {
        let approved = Ok(PredictionResponse {
            default_probability: 0.12,
            risk_class: 0,
            decision: Decision::Approved,
        });
        let html = render_result(&approved, 0.35);
        assert!(html.contains("APPROVED"));
        assert!(html.contains("12.00%"));
        assert!(!html.contains("too high"));

        let rejected = Ok(PredictionResponse {
            default_probability: 0.8,
            risk_class: 1,
            decision: Decision::Rejected,
        });
        let html = render_result(&rejected, 0.35);
        assert!(html.contains("REJECTED"));
        assert!(html.contains("too high (&gt; 35%)"));
    }

    #[test]
    fn test_render_errors_are_escaped() {
        let outcome = Err(ClientError::Server {
            status: 500,
            body: "<script>boom</script>".to_string(),
        });
        let html = render_result(&outcome, 0.35);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));

        let outcome = Err(ClientError::Connection {
            url: "http://127.0.0.1:1/predict".to_string(),
            message: "refused".to_string(),
        });
        assert!(render_result(&outcome, 0.35).contains("Could not connect"));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ScoringClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_bad_form_input_renders_error_panel() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        let state = UiState {
            client: Arc::new(ScoringClient::new("http://127.0.0.1:9")),
            threshold: 0.35,
        };
        let request = Request::post("/score")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(
                "age=&income=abc&years_employed=5&credit_limit=20000\
                 &loan_amount=15000&delinquencies_2y=0&utilization_percent=30",
            ))
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(html.contains(r#"<p class="err">Invalid form input: "#), "{}", html);
        assert!(html.contains("<form"));
        assert!(!html.contains("Could not connect"));
    }

    #[tokio::test]
    async fn test_client_reports_connection_failure() {
        // Port 9 (discard) is not expected to be listening.
        let client = ScoringClient::new("http://127.0.0.1:9");
        let err = client
            .score(&ApplicationForm::default().into_application())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Connection { .. }));
    }
}
