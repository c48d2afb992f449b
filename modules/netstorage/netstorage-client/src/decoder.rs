//! Response payload decoding.
//!
//! NetStorage answers metadata actions with small XML documents such as
//!
//! ```xml
//! <stat directory="/dir">
//!   <file type="file" name="a.txt" size="12" mtime="1700000000"/>
//! </stat>
//! ```
//!
//! [`XmlPayloadDecoder`] turns them into a [`serde_json::Value`] tree:
//! attributes live under `"$"`, non-blank text under `"_"`, children are
//! keyed by element name and repeated names collapse into arrays.

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

const ATTRIBUTES_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// Errors produced while decoding a response body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("XML processing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Parses a raw response body into a structured value.
pub trait PayloadDecoder: Send + Sync {
    /// # Errors
    /// Returns [`DecodeError`] when the body is not a valid payload.
    fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError>;
}

/// Default decoder for NetStorage XML responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlPayloadDecoder;

impl PayloadDecoder for XmlPayloadDecoder {
    fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        // Text is trimmed per node, not per event: entity references split
        // text events and trimming each piece would drop inner spaces.
        // The declared encoding (ISO-8859-1 for NetStorage) is picked up from
        // the declaration, so every byte sequence below goes through
        // `reader.decoder()`.
        let mut reader = Reader::from_reader(raw);

        // Skip the declaration, comments and whitespace until the root element.
        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let name = element_name(reader.decoder(), &start)?;
                    let node = read_element(&mut reader, &start)?;
                    return Ok(single_entry(name, node));
                }
                Event::Empty(start) => {
                    let decoder = reader.decoder();
                    let name = element_name(decoder, &start)?;
                    let node = finish_node(attributes(decoder, &start)?, String::new(), Map::new());
                    return Ok(single_entry(name, node));
                }
                Event::Eof => {
                    return Err(DecodeError::Malformed("missing root element".to_owned()));
                }
                _ => {}
            }
        }
    }
}

fn single_entry(name: String, node: Value) -> Value {
    let mut root = Map::new();
    root.insert(name, node);
    Value::Object(root)
}

fn decode_bytes(decoder: Decoder, bytes: &[u8]) -> Result<String, DecodeError> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

fn element_name(decoder: Decoder, start: &BytesStart<'_>) -> Result<String, DecodeError> {
    decode_bytes(decoder, start.name().as_ref())
}

fn attributes(decoder: Decoder, start: &BytesStart<'_>) -> Result<Map<String, Value>, DecodeError> {
    let mut attrs = Map::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = decode_bytes(decoder, attr.key.as_ref())?;
        let raw = decode_bytes(decoder, &attr.value)?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?
            .into_owned();
        attrs.insert(key, Value::String(value));
    }
    Ok(attrs)
}

/// Read the content of an element whose start tag was just consumed.
fn read_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Value, DecodeError> {
    let attrs = attributes(reader.decoder(), start)?;
    let mut text = String::new();
    let mut children = Map::new();

    loop {
        match reader.read_event()? {
            Event::Start(child) => {
                let name = element_name(reader.decoder(), &child)?;
                let node = read_element(reader, &child)?;
                push_child(&mut children, name, node);
            }
            Event::Empty(child) => {
                let decoder = reader.decoder();
                let name = element_name(decoder, &child)?;
                let node = finish_node(attributes(decoder, &child)?, String::new(), Map::new());
                push_child(&mut children, name, node);
            }
            Event::Text(t) => {
                let decoded = decode_bytes(reader.decoder(), &t)?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => {
                text.push_str(&decode_bytes(reader.decoder(), &c)?);
            }
            Event::GeneralRef(r) => {
                let name = decode_bytes(reader.decoder(), &r)?;
                let reference = format!("&{name};");
                let resolved = quick_xml::escape::unescape(&reference)
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                text.push_str(&resolved);
            }
            Event::End(_) => return Ok(finish_node(attrs, text, children)),
            Event::Eof => {
                return Err(DecodeError::Malformed(
                    "unexpected end of document".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

fn push_child(children: &mut Map<String, Value>, name: String, node: Value) {
    match children.remove(&name) {
        None => {
            children.insert(name, node);
        }
        Some(Value::Array(mut items)) => {
            items.push(node);
            children.insert(name, Value::Array(items));
        }
        Some(existing) => {
            children.insert(name, Value::Array(vec![existing, node]));
        }
    }
}

/// A node with only text becomes a plain string; anything else an object.
fn finish_node(attrs: Map<String, Value>, text: String, mut children: Map<String, Value>) -> Value {
    let text = text.trim();
    if attrs.is_empty() && children.is_empty() {
        return Value::String(text.to_owned());
    }
    if !attrs.is_empty() {
        children.insert(ATTRIBUTES_KEY.to_owned(), Value::Object(attrs));
    }
    if !text.is_empty() {
        children.insert(TEXT_KEY.to_owned(), Value::String(text.to_owned()));
    }
    Value::Object(children)
}
