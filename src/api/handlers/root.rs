use axum::response::IntoResponse;

// axum handler for "/"
pub async fn root() -> impl IntoResponse {
    concat!("FocusMate API ", env!("CARGO_PKG_VERSION"))
}
