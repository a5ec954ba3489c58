//! ONIX 3.0 input reader.
//!
//! The message is decoded into a generic [`Element`] tree per `Header` and
//! `Product`; [`Product`] then reads the composites a loader needs. Only the
//! reference tag names are understood.

use std::path::Path;

use crate::Result;

mod parse;
mod product;

pub use parse::{parse_reader, parse_str};
pub use product::{OnixContributor, Product};

pub fn read_path(path: &Path) -> Result<OnixMessage> {
    let reader = quick_xml::Reader::from_file(path)?;
    parse_reader(reader)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnixMessage {
    pub header: Option<Element>,
    pub products: Vec<Element>,
}

impl OnixMessage {
    /// `Header/DefaultLanguageOfText`, upper-cased.
    pub fn default_language(&self) -> Option<String> {
        self.header
            .as_ref()
            .and_then(|h| h.text_of("DefaultLanguageOfText"))
            .map(str::to_ascii_uppercase)
    }

    pub fn products(&self) -> impl Iterator<Item = Product<'_>> {
        self.products.iter().map(Product::new)
    }
}

/// An XML element with its trimmed text and child elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the name, if it is not empty.
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Every element reached by following `path` through all matching children.
    pub fn find_all(&self, path: &[&str]) -> Vec<&Element> {
        let mut current = vec![self];
        for name in path {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(|c| c.name == *name))
                .collect();
        }
        current
    }

    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }
}
