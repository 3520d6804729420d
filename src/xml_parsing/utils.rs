//! Small helpers for event-driven XML reading.

use std::io::Read;

use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

/// Advance the reader until the opening tag named `tag` is consumed.
///
/// Matching uses the local name only, so namespace prefixes do not matter.
/// Returns `false` when the document ends without such a tag.
pub fn find_start_of<R: Read>(
    xml: &mut EventReader<R>,
    tag: &str,
) -> Result<bool, xml::reader::Error> {
    loop {
        match xml.next()? {
            XmlEvent::StartElement { name, .. } if name.local_name == tag => return Ok(true),
            XmlEvent::EndDocument => return Ok(false),
            _ => {}
        }
    }
}

/// Look up an attribute of the current element by local name.
pub fn attribute_value(attributes: &[OwnedAttribute], attribute: &str) -> Option<String> {
    attributes.iter().find_map(|candidate| {
        if candidate.name.local_name == attribute {
            Some(candidate.value.clone())
        } else {
            None
        }
    })
}
