use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use cvforge_engine::editing::Snapshot;
use cvforge_engine::export::{ExportRequest, render_print_html};
use cvforge_engine::render::SectionRenderer;
use serde_json::json;

use crate::error::Result;
use crate::state::AppState;

/// Render the posted sections into a print page and convert it to PDF
pub async fn export_pdf(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    log::info!("Export request with {} sections", request.sections.len());

    let snapshot = Snapshot::from(request);
    let html = render_print_html(&snapshot, &mut SectionRenderer::default());
    let pdf = state.gotenberg.convert_html(html).await?;

    log::info!("Export completed ({} bytes)", pdf.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"cv.pdf\""),
        ],
        pdf,
    ))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
