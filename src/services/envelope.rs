use actix_web::{body::BoxBody, http::StatusCode, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

/// Uniform result of a service call: a status code and the message that
/// becomes the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub code: StatusCode,
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn ok(message: T) -> Self {
        Self {
            code: StatusCode::OK,
            message,
        }
    }
}

impl<T: Serialize> Responder for Envelope<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.code).json(self.message)
    }
}
