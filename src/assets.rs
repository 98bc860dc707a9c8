use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

use crate::model::ShoppingList;

#[derive(Embed)]
#[folder = "web"]
pub struct Assets;

fn embedded(path: &str) -> Option<Response> {
    let content = Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Some(([(header::CONTENT_TYPE, mime.to_string())], content.data.into_owned()).into_response())
}

pub fn page(path: &str) -> Response {
    embedded(path).unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

pub async fn serve_embedded(req: Request<Body>) -> impl IntoResponse {
    let path = req.uri().path().trim_start_matches('/');
    page(path)
}

/// Fills the list page template with the list's name and share id.
pub fn render_list_page(list: &ShoppingList) -> Response {
    let Some(template) = Assets::get("list.html") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let template = String::from_utf8_lossy(&template.data);

    let html = template
        .replace("{{list_name}}", &escape_html(&list.name))
        .replace("{{share_id}}", &escape_html(&list.share_id));

    Html(html).into_response()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
