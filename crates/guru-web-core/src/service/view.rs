//! Minimal HTML shells around the scope listing and the source viewer.

use std::fmt::Write;

use url::form_urlencoded;

use crate::position::ByteRange;
use crate::scope::PackageInfo;

const TITLE: &str = "Go source code guru";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn encode_query(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Landing page: scope summary, packages and the files that may be opened.
pub fn index_page(scope: &str, packages: &[PackageInfo], files: &[String]) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{TITLE}</h1>");
    let _ = writeln!(body, "<p class=\"scope\">Scope: <code>{}</code></p>", escape_html(scope));

    let _ = writeln!(body, "<h2>Packages</h2>\n<ul class=\"packages\">");
    for package in packages {
        let class = if package.standard { "std" } else { "pkg" };
        let _ = writeln!(
            body,
            "<li class=\"{class}\">{}</li>",
            escape_html(&package.import_path)
        );
    }
    let _ = writeln!(body, "</ul>");

    let _ = writeln!(body, "<h2>Files</h2>\n<ul class=\"files\">");
    for file in files {
        let _ = writeln!(
            body,
            "<li><a href=\"/source?file={}\" title=\"{}\">{}</a></li>",
            encode_query(file),
            escape_html(file),
            escape_html(base_name(file)),
        );
    }
    let _ = writeln!(body, "</ul>");

    page(TITLE, &body)
}

/// Viewer shell for one file; the content is fetched from `/file` by the script.
pub fn source_page(file: &str, lines: usize) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<div id=\"source\" data-file=\"{}\" data-lines=\"{lines}\">",
        escape_html(file)
    );
    body.push_str("<div class=\"nums\">");
    for n in 1..=lines {
        let _ = writeln!(body, "<a id=\"L{n}\" href=\"#L{n}\">{n}</a>");
    }
    body.push_str("</div>\n<pre class=\"lines\"></pre>\n</div>\n");
    body.push_str("<pre id=\"output\"></pre>\n");
    body.push_str("<script src=\"/static/guru.js\"></script>\n");
    page(&format!("{} - {TITLE}", base_name(file)), &body)
}

/// File content as escaped HTML with the selected range wrapped in a span.
///
/// The range is clamped to the buffer and both bounds are moved back to the
/// start of the UTF-8 character they fall in. A range whose start lies after
/// its end is ignored.
pub fn highlighted(content: &[u8], selection: Option<ByteRange>) -> String {
    let Some(range) = selection else {
        return escape_html(&String::from_utf8_lossy(content));
    };
    let start = char_boundary(content, range.start.min(content.len()));
    let end = char_boundary(content, range.end.min(content.len()));
    if start > end {
        return escape_html(&String::from_utf8_lossy(content));
    }
    format!(
        "{}<span class=\"selection\">{}</span>{}",
        escape_html(&String::from_utf8_lossy(&content[..start])),
        escape_html(&String::from_utf8_lossy(&content[start..end])),
        escape_html(&String::from_utf8_lossy(&content[end..])),
    )
}

fn char_boundary(content: &[u8], mut offset: usize) -> usize {
    while offset > 0 && offset < content.len() && content[offset] & 0xC0 == 0x80 {
        offset -= 1;
    }
    offset
}
