//! Builds element trees from an ONIX 3.0 message.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::{Element, OnixMessage};
use crate::error::LoadError;
use crate::marcxml::parse::unexpected_eof;

pub fn parse_str(content: &str) -> Result<OnixMessage, LoadError> {
    parse_reader(Reader::from_str(content))
}

pub fn parse_reader<B: BufRead>(mut reader: Reader<B>) -> Result<OnixMessage, LoadError> {
    reader.config_mut().trim_text(true);

    let mut message = OnixMessage::default();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ONIXMessage" => saw_root = true,
                b"Header" => {
                    message.header = Some(parse_element(&mut reader, "Header".to_string())?);
                }
                b"Product" => {
                    let product = parse_element(&mut reader, "Product".to_string())?;
                    message.products.push(product);
                }
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    if !saw_root {
        return Err(LoadError::UnexpectedShape(
            "no ONIXMessage element; only reference tags are supported".to_string(),
        ));
    }
    Ok(message)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Reads the element whose start tag was just consumed, down to its end tag.
fn parse_element<B: BufRead>(reader: &mut Reader<B>, name: String) -> Result<Element, LoadError> {
    let mut element = Element {
        name,
        ..Element::default()
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let child_name = local_name(e.local_name().as_ref());
                element.children.push(parse_element(reader, child_name)?);
            }
            Event::Empty(e) => {
                element.children.push(Element {
                    name: local_name(e.local_name().as_ref()),
                    ..Element::default()
                });
            }
            Event::Text(e) => element.text.push_str(&e.unescape()?),
            Event::CData(e) => element.text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof(&element.name)),
            _ => (),
        }
        buf.clear();
    }

    element.text = element.text.trim().to_string();
    Ok(element)
}
