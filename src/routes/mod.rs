use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

use crate::helper::admin_helpers::AdminHelperError;
use crate::helper::workflow_helpers::WorkflowError;

pub mod admin;
pub mod member;
pub mod public;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Maps expected workflow failures to their status codes; anything else is a
/// store failure and surfaces as a 500 with the store's message attached.
pub(crate) fn workflow_error_response(e: WorkflowError) -> HttpResponse {
    match e {
        WorkflowError::Forbidden(msg) => {
            HttpResponse::Forbidden().json(json!({ "success": false, "error": msg }))
        }
        WorkflowError::Validation(msg) => {
            HttpResponse::BadRequest().json(json!({ "success": false, "error": msg }))
        }
        WorkflowError::NotFound(id) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": format!("Content item {} not found.", id) })),
        other => {
            log::error!("Workflow operation failed: {}", other);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": other.to_string() }))
        }
    }
}

pub(crate) fn admin_error_response(e: AdminHelperError) -> HttpResponse {
    match e {
        AdminHelperError::Forbidden(msg) => {
            HttpResponse::Forbidden().json(json!({ "success": false, "error": msg }))
        }
        AdminHelperError::Validation(msg) => {
            HttpResponse::BadRequest().json(json!({ "success": false, "error": msg }))
        }
        AdminHelperError::NotFound => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "User not found." })),
        other => {
            log::error!("Admin operation failed: {}", other);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": other.to_string() }))
        }
    }
}
