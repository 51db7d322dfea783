//! Static files baked into the binary.

const GURU_JS: &str = include_str!("../../static/guru.js");
const STYLE_CSS: &str = include_str!("../../static/style.css");

/// A baked static file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub content_type: &'static str,
    pub body: &'static str,
}

/// Look up an asset by its name below `/static/`.
pub fn lookup(name: &str) -> Option<Asset> {
    let (content_type, body) = match name {
        "guru.js" => ("text/javascript; charset=utf-8", GURU_JS),
        "style.css" => ("text/css; charset=utf-8", STYLE_CSS),
        _ => return None,
    };
    Some(Asset { content_type, body })
}
