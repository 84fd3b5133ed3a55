use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::shared::format::{format_duration, format_number};

/// Middleware для логирования HTTP запросов
///
/// Пишет в лог метод, путь, статус, длительность и размер ответа.
/// Ответы с кодом не 2xx уходят уровнем warn.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(
                %method,
                path = uri.path(),
                status = parts.status.as_u16(),
                elapsed = %format_duration(start.elapsed()),
                "Failed to read response body: {}",
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let size = format_number(bytes.len());
    let elapsed = format_duration(start.elapsed());
    let status = parts.status.as_u16();

    if parts.status.is_success() {
        tracing::info!(%method, path = uri.path(), status, %elapsed, %size, "request");
    } else {
        tracing::warn!(%method, path = uri.path(), status, %elapsed, %size, "request");
    }

    Response::from_parts(parts, Body::from(bytes))
}
