//! Element writer for the documents served to the device.
//!
//! The device parser expects compact output with no declaration and no
//! whitespace between elements. Escaping and event encoding are left to
//! `quick_xml`; this layer only tracks which elements are still open.

use std::io;

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::error::CodecError;

pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
    open: Vec<&'static str>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
            open: Vec::new(),
        }
    }

    pub fn open(&mut self, tag: &'static str, attrs: &[(&str, &str)]) -> io::Result<&mut Self> {
        self.inner.write_event(Event::Start(start_tag(tag, attrs)))?;
        self.open.push(tag);
        Ok(self)
    }

    pub fn close(&mut self) -> io::Result<&mut Self> {
        if let Some(tag) = self.open.pop() {
            self.inner.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        Ok(self)
    }

    /// `<tag attrs/>`
    pub fn empty(&mut self, tag: &'static str, attrs: &[(&str, &str)]) -> io::Result<&mut Self> {
        self.inner.write_event(Event::Empty(start_tag(tag, attrs)))?;
        Ok(self)
    }

    /// `<tag>text</tag>`
    pub fn text(&mut self, tag: &'static str, text: &str) -> io::Result<&mut Self> {
        self.inner.write_event(Event::Start(BytesStart::new(tag)))?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.inner.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(self)
    }

    /// Closes any elements still open and returns the document.
    pub fn finish(mut self) -> Result<String, CodecError> {
        while !self.open.is_empty() {
            self.close()?;
        }
        Ok(String::from_utf8(self.inner.into_inner())?)
    }
}

fn start_tag<'a>(tag: &'static str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    for &attr in attrs {
        start.push_attribute(attr);
    }
    start
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn writes_compact_nested_elements() {
        let mut writer = XmlWriter::new();
        writer
            .open("zone", &[("id", "1")])
            .unwrap()
            .text("name", "Zone 1")
            .unwrap()
            .empty("otmr", &[])
            .unwrap()
            .close()
            .unwrap();

        assert_eq!(
            writer.finish().unwrap(),
            r#"<zone id="1"><name>Zone 1</name><otmr/></zone>"#
        );
    }

    #[test]
    fn unclosed_elements_are_closed_on_finish() {
        let mut writer = XmlWriter::new();
        writer.open("config", &[]).unwrap().open("zones", &[]).unwrap();

        assert_eq!(writer.finish().unwrap(), "<config><zones></zones></config>");
    }

    #[test]
    fn escaped_values_survive_a_parse() {
        let href = r#"x?a=1&b="2"&c='3'"#;
        let mode = "<cool & 'dry'>";
        let mut writer = XmlWriter::new();
        writer
            .open("a", &[("href", href)])
            .unwrap()
            .text("mode", mode)
            .unwrap();
        let xml = writer.finish().unwrap();

        assert!(!xml.contains("<cool"));
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("href"), Some(href));
        assert_eq!(root.first_element_child().and_then(|node| node.text()), Some(mode));
    }
}
