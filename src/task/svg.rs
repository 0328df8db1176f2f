//! Markup cleanup for SVG images.

use std::sync::LazyLock;

use regex::Regex;

static PROLOG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\?xml[^>]*\?>").unwrap());
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!DOCTYPE[^\[>]*(\[.*?\])?\s*>").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static METADATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<metadata\b[^>]*/>|<metadata\b.*?</metadata>").unwrap());
static LAYOUT_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s*\n\s*<").unwrap());
static ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").unwrap());
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Strips markup that doesn't affect rendering: the XML prolog, doctype,
/// comments, `<metadata>` and whitespace used only for indentation. The
/// root `viewBox` is dropped when it is equivalent to the `width` and
/// `height` attributes. Element ids are left untouched.
pub(crate) fn strip(svg: &str) -> String {
    let svg = PROLOG.replace_all(svg, "");
    let svg = DOCTYPE.replace_all(&svg, "");
    let svg = COMMENT.replace_all(&svg, "");
    let svg = METADATA.replace_all(&svg, "");
    let svg = LAYOUT_WS.replace_all(&svg, "><");
    let svg = svg.trim();

    match ROOT.find(svg) {
        Some(tag) => {
            let mut out = String::with_capacity(svg.len());
            out.push_str(&svg[..tag.start()]);
            out.push_str(&strip_view_box(tag.as_str()));
            out.push_str(&svg[tag.end()..]);
            out
        }
        None => svg.to_string(),
    }
}

fn strip_view_box(tag: &str) -> String {
    let mut width = None;
    let mut height = None;
    let mut view_box = None;

    for cap in ATTR.captures_iter(tag) {
        let Some(whole) = cap.get(0) else { continue };
        let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());

        match &cap[1] {
            "width" => width = Some(value),
            "height" => height = Some(value),
            "viewBox" => view_box = Some((whole.range(), value)),
            _ => {}
        }
    }

    let (Some(width), Some(height), Some((range, view_box))) = (width, height, view_box) else {
        return tag.to_string();
    };

    let numbers: Vec<_> = view_box
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let width = width.strip_suffix("px").unwrap_or(width);
    let height = height.strip_suffix("px").unwrap_or(height);

    if numbers == ["0", "0", width, height] {
        let mut out = tag.to_string();
        out.replace_range(range, "");
        out
    } else {
        tag.to_string()
    }
}
