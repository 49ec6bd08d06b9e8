use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use petal::{FieldViolation, ValidationError};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// One entry of a 422 `detail` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Path to the offending value, e.g. `["body", 2, "petal_width"]`
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&FieldViolation> for FieldError {
    fn from(violation: &FieldViolation) -> Self {
        let mut loc = vec![json!("body")];
        if let Some(item) = violation.item {
            loc.push(json!(item));
        }
        loc.push(json!(violation.field.name()));
        Self {
            loc,
            msg: violation.constraint.message().to_string(),
            kind: violation.constraint.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    detail: ErrorDetail,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, detail: ErrorDetail, report_policy: ReportPolicy) -> Self {
        Self {
            status,
            detail,
            report_policy,
            report_summary: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>) -> Self {
        self.report_summary = Some(summary.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    /// Model failure; the cause is passed through to the caller
    pub fn prediction_failed(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Prediction failed: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetail::Message(msg.clone()),
            ReportPolicy::Report,
        )
        .with_report(msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorDetail::Message(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn unprocessable(fields: Vec<FieldError>) -> Self {
        tracing::warn!(violations = fields.len(), "Unprocessable entity");
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorDetail::Fields(fields),
            ReportPolicy::Ignore,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Service unavailable: {}", msg);
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorDetail::Message(msg.clone()),
            ReportPolicy::Report,
        )
        .with_report(msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            detail: &'a ErrorDetail,
        }

        let mut response = (
            self.status,
            Json(ErrorEnvelope {
                detail: &self.detail,
            }),
        )
            .into_response();

        if self.report_policy == ReportPolicy::Report {
            let id = uuid::Uuid::new_v4().to_string();
            tracing::error!(
                error_id = %id,
                status = self.status.as_u16(),
                summary = self.report_summary.as_deref().unwrap_or_default(),
                "Reported error"
            );
            if let Ok(v) = HeaderValue::from_str(&id) {
                response.headers_mut().insert("x-error-id", v);
            }
        }

        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::unprocessable(err.violations().iter().map(FieldError::from).collect())
    }
}

// Body that is not JSON, or not the expected shape, is reported like a field error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(vec![FieldError {
            loc: vec![json!("body")],
            msg: rejection.body_text(),
            kind: "json_invalid".to_string(),
        }])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            ErrorDetail::Message(msg) => write!(f, "{}: {}", self.status, msg),
            ErrorDetail::Fields(fields) => {
                write!(f, "{}: {} invalid field(s)", self.status, fields.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petal::{Constraint, Field};

    #[test]
    fn violation_location_includes_batch_index() {
        let single = FieldError::from(&FieldViolation::new(Field::SepalWidth, Constraint::Type));
        assert_eq!(single.loc, vec![json!("body"), json!("sepal_width")]);
        assert_eq!(single.kind, "type");

        let batched = FieldError::from(
            &FieldViolation::new(Field::PetalWidth, Constraint::Range).at_item(2),
        );
        assert_eq!(
            batched.loc,
            vec![json!("body"), json!(2), json!("petal_width")]
        );
        assert_eq!(batched.msg, "Measurements must be between 0 and 10 cm");
    }

    #[test]
    fn reported_errors_carry_an_error_id() {
        let response = ApiError::prediction_failed("Prediction error: boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-error-id"));

        let response = ApiError::bad_request("nope").into_response();
        assert!(!response.headers().contains_key("x-error-id"));
    }
}
