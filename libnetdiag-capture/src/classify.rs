use std::fmt::Write;

use crate::record::HttpInfo;

/// Lowercase hex rendering of a byte slice, no separators.
pub fn hex_string(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for b in data {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Render application payload bytes for display.
///
/// Precedence is fixed, first match wins: printable ASCII text is returned
/// as-is, then UTF-16 BOM detection, then binary, then an encoded-text
/// fallback. All tagged renderings carry the full hex dump.
pub fn format_payload(payload: &[u8]) -> String {
    if payload.is_empty() {
        return String::new();
    }

    if payload.iter().all(|&b| (0x20..=0x7e).contains(&b)) {
        return String::from_utf8_lossy(payload).into_owned();
    }

    if payload.len() >= 2 {
        let bom = [payload[0], payload[1]];
        if bom == [0xff, 0xfe] || bom == [0xfe, 0xff] {
            return format!("[UTF-16 encoded data] 0x{}", hex_string(payload));
        }
    }

    let is_binary = payload
        .iter()
        .any(|&b| b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r');
    if is_binary {
        return format!("[Binary data] 0x{}", hex_string(payload));
    }

    format!("[Encoded/Corrupted text] 0x{}", hex_string(payload))
}

/// Extract a reduced header set from HTTP request/response framing.
///
/// The first line decides the direction: a line starting with "HTTP/" is a
/// response, anything else is tried as a request. Header lines are read until
/// the first blank line; only content-type and host are retained. Returns
/// None when neither a method nor a status code could be extracted.
pub fn parse_http(payload: &[u8]) -> Option<HttpInfo> {
    if payload.is_empty() {
        return None;
    }

    let text = String::from_utf8_lossy(payload);
    let mut lines = text.split("\r\n");
    let first = lines.next()?;

    let mut info = HttpInfo::default();
    if first.starts_with("HTTP/") {
        // response: version, status code, status text (keeps embedded spaces)
        let mut parts = first.splitn(3, ' ');
        if let (Some(version), Some(code), Some(status_text)) =
            (parts.next(), parts.next(), parts.next())
        {
            info.version = version.to_owned();
            if let Ok(status) = code.parse::<u16>() {
                info.status_code = status;
            }
            info.status_text = status_text.to_owned();
            info.is_request = false;
        }
    } else {
        let mut parts = first.splitn(3, ' ');
        if let (Some(method), Some(path), Some(version)) =
            (parts.next(), parts.next(), parts.next())
        {
            info.method = method.to_owned();
            info.path = path.to_owned();
            info.version = version.to_owned();
            info.is_request = true;
        }
    }

    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(": ") {
            match key.to_ascii_lowercase().as_str() {
                "content-type" => info.content_type = value.to_owned(),
                "host" => info.host = value.to_owned(),
                _ => (),
            }
        }
    }

    if info.method.is_empty() && info.status_code == 0 {
        return None;
    }
    Some(info)
}
