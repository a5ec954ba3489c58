//! MARCXML event loop.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{DataField, MarcRecord, Subfield};
use crate::error::LoadError;

pub fn parse_str(content: &str) -> Result<Vec<MarcRecord>, LoadError> {
    parse_reader(Reader::from_str(content))
}

pub fn parse_reader<B: BufRead>(mut reader: Reader<B>) -> Result<Vec<MarcRecord>, LoadError> {
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"record" => {
                records.push(parse_record(&mut reader)?);
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    Ok(records)
}

fn parse_record<B: BufRead>(reader: &mut Reader<B>) -> Result<MarcRecord, LoadError> {
    let mut record = MarcRecord::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"leader" => record.leader = extract_text(reader, b"leader")?,
                b"controlfield" => {
                    let tag = attribute(&e, b"tag")?.unwrap_or_default();
                    let value = extract_text(reader, b"controlfield")?;
                    record.control_fields.insert(tag, value);
                }
                b"datafield" => {
                    let mut field = data_field(&e)?;
                    field.subfields = parse_subfields(reader)?;
                    record.data_fields.push(field);
                }
                _ => (),
            },
            Event::Empty(e) if e.local_name().as_ref() == b"datafield" => {
                record.data_fields.push(data_field(&e)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"record" => break,
            Event::Eof => return Err(unexpected_eof("record")),
            _ => (),
        }
        buf.clear();
    }

    Ok(record)
}

fn data_field(e: &BytesStart) -> Result<DataField, LoadError> {
    let indicator = |name: &[u8]| -> Result<char, LoadError> {
        Ok(attribute(e, name)?
            .and_then(|v| v.chars().next())
            .unwrap_or(' '))
    };
    Ok(DataField {
        tag: attribute(e, b"tag")?.unwrap_or_default(),
        ind1: indicator(b"ind1")?,
        ind2: indicator(b"ind2")?,
        subfields: Vec::new(),
    })
}

fn parse_subfields<B: BufRead>(reader: &mut Reader<B>) -> Result<Vec<Subfield>, LoadError> {
    let mut subfields = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"subfield" => {
                let code = subfield_code(&e)?;
                let data = extract_text(reader, b"subfield")?;
                subfields.push(Subfield { code, data });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"subfield" => {
                subfields.push(Subfield {
                    code: subfield_code(&e)?,
                    data: String::new(),
                });
            }
            Event::End(e) if e.local_name().as_ref() == b"datafield" => break,
            Event::Eof => return Err(unexpected_eof("datafield")),
            _ => (),
        }
        buf.clear();
    }

    Ok(subfields)
}

fn subfield_code(e: &BytesStart) -> Result<char, LoadError> {
    Ok(attribute(e, b"code")?
        .and_then(|c| c.chars().next())
        .unwrap_or(' '))
}

/// Extracts text content from XML events until the closing tag is found
pub(crate) fn extract_text<B: BufRead>(
    reader: &mut Reader<B>,
    closing_tag: &[u8],
) -> Result<String, LoadError> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) if e.local_name().as_ref() == closing_tag => break,
            Event::Eof => {
                return Err(unexpected_eof(&String::from_utf8_lossy(closing_tag)));
            }
            _ => (),
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

pub(crate) fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, LoadError> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

pub(crate) fn unexpected_eof(element: &str) -> LoadError {
    LoadError::Xml(format!(
        "Unexpected EOF while looking for closing tag '{element}'"
    ))
}
