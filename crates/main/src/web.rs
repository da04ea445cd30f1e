//! The SmartDrive web form.

use std::fmt::Write as _;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use smartdrive_report::config::MailConfig;
use smartdrive_report::controller::{FeedbackLevel, FormController, SubmissionOutcome};
use smartdrive_report::notify::{Notifier, SmtpNotifier};
use smartdrive_report::report::{PDF_CONTENT_TYPE, PDF_FILE_NAME, REPORT_SUBTITLE};
use tracing::{error, info, warn};

/// Builds the notifier used for one submission.
pub type NotifierFactory = fn(MailConfig) -> Box<dyn Notifier>;

fn smtp_notifier(config: MailConfig) -> Box<dyn Notifier> {
    Box::new(SmtpNotifier::new(config))
}

/// Read-only settings shared by every request.
pub struct AppState {
    pub mail: Option<MailConfig>,
    pub make_notifier: NotifierFactory,
}

impl AppState {
    /// Mails reports over SMTP when `mail` is set.
    pub fn new(mail: Option<MailConfig>) -> Self {
        Self {
            mail,
            make_notifier: smtp_notifier,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    #[serde(default)]
    pub email: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/report", get(index).post(submit))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Serves the form on `addr` until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    if state.mail.is_none() {
        warn!("no sender configured; reports will be generated but not mailed");
    }

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "SmartDrive form listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await
}

async fn index() -> Html<String> {
    Html(render_form_page(""))
}

async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<ReportForm>) -> Response {
    let mail = state.mail.clone();
    let make_notifier = state.make_notifier;
    // SMTP I/O is blocking and bounded by the transport timeout.
    let task = tokio::task::spawn_blocking(move || {
        FormController::new(mail.map(make_notifier)).submit(&form.email, &mut rand::thread_rng())
    });

    match task.await {
        Ok(outcome) => {
            let status = if outcome.is_rejected() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::OK
            };
            (status, Html(render_result_page(&outcome))).into_response()
        }
        Err(err) => {
            error!(error = %err, "submission task failed");
            let page = render_error_page(&format!("An error occurred: {err}"));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
        }
    }
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = "body{font-family:sans-serif;max-width:860px;margin:2em auto;padding:0 1em}
.info{color:#055160}.success{color:#0f5132}.warning{color:#664d03}.error{color:#842029}
pre{white-space:pre-wrap;margin:0.2em 0 0 1em}
.charts svg{max-width:100%;height:auto}";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>SmartDrive</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>SmartDrive</h1>\n<p>{}</p>\n{body}</body>\n</html>\n",
        html_escape(REPORT_SUBTITLE)
    )
}

fn form(email: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/report\">\n\
         <label for=\"email\">Enter your email address</label>\n\
         <input id=\"email\" name=\"email\" type=\"text\" value=\"{}\">\n\
         <button type=\"submit\">Generate &amp; Send Report</button>\n</form>\n",
        html_escape(email)
    )
}

pub fn render_form_page(email: &str) -> String {
    page(&form(email))
}

pub fn render_error_page(message: &str) -> String {
    page(&format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>\n",
        html_escape(message)
    ))
}

fn level_class(level: FeedbackLevel) -> &'static str {
    match level {
        FeedbackLevel::Info => "info",
        FeedbackLevel::Success => "success",
        FeedbackLevel::Warning => "warning",
        FeedbackLevel::Error => "error",
    }
}

/// Charts, tip, feedback and download link for one submission.
pub fn render_result_page(outcome: &SubmissionOutcome) -> String {
    let mut body = form(&outcome.recipient);

    for item in &outcome.feedback {
        let _ = write!(
            body,
            "<div class=\"{}\"><p>{}</p>",
            level_class(item.level),
            html_escape(&item.message)
        );
        if let Some(detail) = &item.detail {
            let _ = write!(body, "<pre>{}</pre>", html_escape(detail));
        }
        body.push_str("</div>\n");
    }

    if let Some(metrics) = &outcome.metrics {
        body.push_str("<h2>Results</h2>\n<ul>\n");
        for (name, value) in metrics.iter() {
            let _ = writeln!(body, "<li>{}: {value}%</li>", html_escape(name));
        }
        body.push_str("</ul>\n");
    }

    // plotters escapes its own text nodes
    if let Some(charts) = &outcome.charts {
        let _ = write!(
            body,
            "<div class=\"charts\">\n{}\n{}\n</div>\n",
            charts.pie, charts.bar
        );
    }

    if let Some(tip) = &outcome.tip {
        let _ = writeln!(body, "<p><strong>{}</strong></p>", html_escape(&tip.text()));
    }

    if let Some(report) = &outcome.report {
        let _ = writeln!(
            body,
            "<p><a href=\"data:{PDF_CONTENT_TYPE};base64,{}\" download=\"{PDF_FILE_NAME}\">\
             Download PDF Report</a></p>",
            STANDARD.encode(report.as_bytes())
        );
    }

    page(&body)
}
