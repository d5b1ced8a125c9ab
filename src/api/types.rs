use serde::Serialize;

/// 统一响应包装
///
/// Success is `{ "code": 200, "message": "Success", "data": ... }`; failures are
/// rendered by `AuthError` as `{ "code", "message" }`.
#[derive(Debug, Clone, Serialize)]
pub struct RestResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> RestResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(RestResponse::success("tok")).unwrap();
        assert_eq!(json, serde_json::json!({ "code": 200, "message": "Success", "data": "tok" }));
    }

    #[test]
    fn test_failure_envelope_has_no_data() {
        let json = serde_json::to_value(RestResponse::<()>::failure(406, "invalid code")).unwrap();
        assert_eq!(json, serde_json::json!({ "code": 406, "message": "invalid code" }));
    }
}
