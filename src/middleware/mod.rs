use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::sync::Arc;

/// Непрозрачный идентификатор сессии из заголовка X-Session-Id.
/// Движок не аутентифицирует: идентификатор выдаёт вызывающий слой,
/// здесь он только связывает брони с их владельцем.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl FromRequestParts<Arc<crate::AppState>> for SessionId {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Получаем заголовок X-Session-Id
        let session_id = parts
            .headers
            .get("x-session-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if session_id.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                "Требуется заголовок X-Session-Id".to_string(),
            ));
        }
        if session_id.len() > 128 {
            return Err((
                StatusCode::BAD_REQUEST,
                "X-Session-Id слишком длинный".to_string(),
            ));
        }

        Ok(SessionId(session_id.to_string()))
    }
}
