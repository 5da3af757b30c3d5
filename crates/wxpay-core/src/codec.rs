//! Wire codec: parameter sets to and from the provider's flat XML frames, and
//! the `k=v&k=v` canonical form used for signing and deep links.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::CoreError;
use crate::params::ParameterSet;

/// Name of the root element of every frame.
pub const ROOT_ELEMENT: &str = "xml";

/// Encode a parameter set as a provider XML frame.
///
/// Numeric-looking values are written as plain text, everything else inside a
/// CDATA section. Keys that are not valid element names are dropped.
pub fn to_xml(params: &ParameterSet) -> String {
    let mut xml = String::with_capacity(64 + params.len() * 48);
    xml.push('<');
    xml.push_str(ROOT_ELEMENT);
    xml.push('>');
    for (key, value) in params.iter() {
        if !is_element_name(key) {
            tracing::warn!(key = %key, "dropping parameter with invalid element name");
            continue;
        }
        xml.push('<');
        xml.push_str(key);
        xml.push('>');
        if is_numeric(value) {
            xml.push_str(value);
        } else {
            push_cdata(&mut xml, value);
        }
        xml.push_str("</");
        xml.push_str(key);
        xml.push('>');
    }
    xml.push_str("</");
    xml.push_str(ROOT_ELEMENT);
    xml.push('>');
    xml
}

/// Decode a provider XML frame into a parameter set.
///
/// Accepts exactly one root element whose children carry text or CDATA.
/// Document type declarations are refused, so no external or custom entity
/// can ever be resolved.
pub fn from_xml(xml: &str) -> Result<ParameterSet, CoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut params = ParameterSet::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                match depth {
                    0 => open_root(&mut root_seen)?,
                    1 => field = Some((element_name(e.name().as_ref())?, String::new())),
                    _ => return Err(nested(e.name().as_ref())),
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => match depth {
                0 => open_root(&mut root_seen)?,
                1 => {
                    params.insert(element_name(e.name().as_ref())?, "");
                }
                _ => return Err(nested(e.name().as_ref())),
            },
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unbalanced closing tag"))?;
                if depth == 1 {
                    if let Some((key, value)) = field.take() {
                        params.insert(key, value);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| malformed(e.to_string()))?;
                text_for(&mut field, depth)?.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(|e| malformed(e.to_string()))?;
                text_for(&mut field, depth)?.push_str(text);
            }
            Ok(Event::DocType(_)) => {
                return Err(malformed("document type declarations are not accepted"));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e.to_string())),
        }
    }

    if !root_seen {
        return Err(malformed("no root element"));
    }
    if depth != 0 {
        return Err(malformed("unexpected end of document"));
    }
    Ok(params)
}

/// Join the set as `k1=v1&k2=v2`, skipping excluded keys and empty values.
///
/// Values are not percent-encoded: this is the canonical string the signature
/// is computed over.
pub fn to_url_params(params: &ParameterSet, exclude: &[&str]) -> String {
    params
        .iter()
        .filter(|(k, v)| !exclude.contains(k) && !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Whether a value is written as a bare number on the wire: an optional sign,
/// digits with at most one decimal point, and an optional exponent.
pub fn is_numeric(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut digits = 0;
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    i == bytes.len()
}

fn push_cdata(xml: &mut String, value: &str) {
    xml.push_str("<![CDATA[");
    // `]]>` cannot appear inside one section; split it across two.
    xml.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
    xml.push_str("]]>");
}

fn is_element_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn open_root(root_seen: &mut bool) -> Result<(), CoreError> {
    if *root_seen {
        return Err(malformed("more than one root element"));
    }
    *root_seen = true;
    Ok(())
}

fn element_name(raw: &[u8]) -> Result<String, CoreError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| malformed(e.to_string()))
}

fn text_for(field: &mut Option<(String, String)>, depth: usize) -> Result<&mut String, CoreError> {
    match (depth, field) {
        (2, Some((_, value))) => Ok(value),
        _ => Err(malformed("text outside of a field element")),
    }
}

fn nested(name: &[u8]) -> CoreError {
    malformed(format!(
        "nested element <{}> is not allowed",
        String::from_utf8_lossy(name)
    ))
}

fn malformed(msg: impl Into<String>) -> CoreError {
    CoreError::MalformedResponse(msg.into())
}
