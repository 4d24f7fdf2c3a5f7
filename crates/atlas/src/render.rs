//! Plain-text rendering of bound cells.

use atlas_cells::{CellAction, CellHolder, CellRegistry, CellView};

use crate::transcript::Row;

/// Describes one bound cell on a single line.
pub fn describe(registry: &CellRegistry, row: &Row, holder: &CellHolder) -> String {
    let side = if row.is_me { "me  " } else { "them" };
    let kind = registry
        .factory_for(&row.message)
        .map_or("?", |factory| factory.name());
    let body = match holder.view() {
        CellView::Text(view) => view
            .text
            .as_deref()
            .map_or_else(|| "(placeholder)".to_string(), |text| format!("{text:?}")),
        CellView::Image(view) => {
            let state = view.snapshot();
            let layout = state
                .layout
                .map_or_else(|| "wrap".to_string(), |size| size.to_string());
            let shown = state.displayed.map_or_else(
                || "nothing".to_string(),
                |image| format!("{} @ {}°", image.source, image.rotation),
            );
            let placeholder = if state.placeholder { " placeholder" } else { "" };
            format!("{:?} layout={layout} shown={shown}{placeholder}", state.stage)
        }
    };
    let action = match holder.action() {
        Some(CellAction::OpenMap { geo_uri }) => format!(" -> {geo_uri}"),
        Some(CellAction::OpenImage { full, .. }) => format!(" -> {full}"),
        None => String::new(),
    };
    let preview = registry.preview_text(&row.message).unwrap_or_default();
    format!("[{side}] {kind:<16} {body}{action}\n        {preview}")
}
