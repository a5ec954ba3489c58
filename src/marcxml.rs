//! MARCXML input reader.
//!
//! Decodes a `collection` of `record` elements into [`MarcRecord`]s holding
//! the leader, control fields and data fields with their subfields. Namespace
//! prefixes such as `marc:` are ignored.
//!
//! # Example
//!
//! ```
//! let xml = r#"<collection><record>
//!   <controlfield tag="001">uwp-1</controlfield>
//!   <datafield tag="245" ind1="1" ind2="0">
//!     <subfield code="a">A Title /</subfield>
//!   </datafield>
//! </record></collection>"#;
//!
//! let records = bibingest::marcxml::parse_str(xml).unwrap();
//! assert_eq!(records[0].control("001"), Some("uwp-1"));
//! assert_eq!(records[0].subfield("245", 'a'), Some("A Title /"));
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::Result;

pub(crate) mod parse;

pub use parse::{parse_reader, parse_str};

pub fn read_path(path: &Path) -> Result<Vec<MarcRecord>> {
    let reader = quick_xml::Reader::from_file(path)?;
    parse_reader(reader)
}

/// A MARC record containing leader and fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarcRecord {
    pub leader: String,
    /// Control fields (00X)
    pub control_fields: HashMap<String, String>,
    pub data_fields: Vec<DataField>,
}

/// A MARC data field (010-999)
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub tag: String,
    pub ind1: char,
    pub ind2: char,
    pub subfields: Vec<Subfield>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subfield {
    pub code: char,
    pub data: String,
}

impl MarcRecord {
    pub fn control(&self, tag: &str) -> Option<&str> {
        self.control_fields.get(tag).map(String::as_str)
    }

    /// All data fields with the given tag, in record order.
    pub fn fields<'a, 't>(
        &'a self,
        tag: &'t str,
    ) -> impl Iterator<Item = &'a DataField> + use<'a, 't> {
        self.data_fields.iter().filter(move |f| f.tag == tag)
    }

    /// First value of a subfield in the first field that has it.
    pub fn subfield<'a>(&'a self, tag: &str, code: char) -> Option<&'a str> {
        self.fields(tag).find_map(|f| f.subfield(code))
    }

    /// Every value of a subfield across all fields with the tag.
    pub fn subfields<'a>(&'a self, tag: &str, code: char) -> Vec<&'a str> {
        self.fields(tag).flat_map(|f| f.subfields(code)).collect()
    }
}

impl DataField {
    pub fn subfield(&self, code: char) -> Option<&str> {
        self.subfields(code).next()
    }

    pub fn subfields(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.data.as_str())
    }
}
