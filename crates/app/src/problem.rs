use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use isa_invest_core::EngineError;
use serde::Serialize;

/// RFC 7807 problem document.
#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
}

pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }
}

impl From<EngineError> for ProblemResponse {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        // Storage details stay in the logs.
        let detail = match &err {
            EngineError::Storage(_) => "investment storage failure".to_string(),
            other => other.to_string(),
        };
        Self::new(status, err.kind(), detail)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isa_invest_core::RepositoryError;

    #[test]
    fn maps_engine_errors_to_statuses() {
        let cases = [
            (EngineError::MissingCustomerId, StatusCode::BAD_REQUEST),
            (EngineError::MissingFundId, StatusCode::BAD_REQUEST),
            (EngineError::MissingId, StatusCode::BAD_REQUEST),
            (EngineError::NonPositiveAmount, StatusCode::BAD_REQUEST),
            (EngineError::NotFound("inv-1".into()), StatusCode::NOT_FOUND),
            (
                EngineError::Storage(RepositoryError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let kind = err.kind();
            let problem = ProblemResponse::from(err);
            assert_eq!(problem.status, status);
            assert_eq!(problem.body.problem_type, kind);
        }
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let problem = ProblemResponse::from(EngineError::Storage(RepositoryError::Unavailable(
            "lock poisoned".into(),
        )));
        assert_eq!(problem.body.detail, "investment storage failure");
        assert_eq!(problem.body.title, "Internal Server Error");
    }
}
