use axum::response::{IntoResponse, Response};

use crate::Error;

/// The fallback handler for routes that do not exist.
pub async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{AppState, build_router};

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();
        let server = TestServer::new(build_router(state));

        let response = server.get("/openfinance/nothing-here").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body = response.json::<Value>();
        assert_eq!(body["category"], "NotFound");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
