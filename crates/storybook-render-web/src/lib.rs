//! Web preview helpers for `storybook-render`.
//!
//! The `web-preview` binary speaks a tiny query-string protocol: the browser
//! shell forwards raw DOM events as `GET /api/input?kind=...` and this crate
//! turns them into viewer inputs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::BTreeMap;
use storybook_render::{Control, InputEvent, Key, Viewport};

pub mod covers;

/// Crate marker module.
pub mod preview {
    /// Current crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// One decoded `/api/input` request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WebInput {
    Event(InputEvent),
    Resize(Viewport),
}

/// Split a query string into decoded key/value pairs. Later keys win.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (percent_decode(k), percent_decode(v)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode an `/api/input` query.
///
/// Kinds: `key` (`key=<DOM key name>`), `touch-start` / `touch-end`
/// (`x`, `y`), `toc` (`story`), `control` (`control=prev|next|home`), and
/// `resize` (`width`, `height`).
pub fn parse_input(query: &str) -> Result<WebInput, String> {
    let params = parse_query(query);
    let kind = params
        .get("kind")
        .ok_or_else(|| "missing 'kind' parameter".to_string())?;
    let event = match kind.as_str() {
        "key" => InputEvent::Key {
            key: Key::from_name(param(&params, "key")?),
        },
        "touch-start" => InputEvent::TouchStart {
            x: parse_param(&params, "x")?,
            y: parse_param(&params, "y")?,
        },
        "touch-end" => InputEvent::TouchEnd {
            x: parse_param(&params, "x")?,
            y: parse_param(&params, "y")?,
        },
        "toc" => InputEvent::TocLink {
            story_id: parse_param(&params, "story")?,
        },
        "control" => InputEvent::Control {
            control: match param(&params, "control")? {
                "prev" => Control::Prev,
                "next" => Control::Next,
                "home" => Control::Home,
                other => return Err(format!("unknown control '{}'", other)),
            },
        },
        "resize" => {
            let width: i32 = parse_param(&params, "width")?;
            let height: i32 = parse_param(&params, "height")?;
            if width <= 0 || height <= 0 {
                return Err(format!("invalid viewport {}x{}", width, height));
            }
            return Ok(WebInput::Resize(Viewport::new(width, height)));
        }
        other => return Err(format!("unknown input kind '{}'", other)),
    };
    Ok(WebInput::Event(event))
}

fn param<'a>(params: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing '{}' parameter", name))
}

fn parse_param<T: core::str::FromStr>(
    params: &BTreeMap<String, String>,
    name: &str,
) -> Result<T, String> {
    let raw = param(params, name)?;
    raw.parse::<T>()
        .map_err(|_| format!("invalid '{}' value '{}'", name, raw))
}

pub fn mime_from_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// `data:` URI for an image, typed by its file extension.
pub fn image_data_uri(path: &str, bytes: &[u8]) -> String {
    let mime = mime_from_path(path).unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
