//! Reader for PNML place/transition nets.
//!
//! The reader streams the document and collects exactly what the normalizer
//! needs: places with their initial token counts, transition ids, and the
//! ordered arc list. Structural problems with the net itself (dangling arc
//! endpoints, arcs between two nodes of the same kind) are not errors; they
//! are collected by [ParsedNet::validate] so a caller can report all of them
//! at once.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;
use xml::reader::{EventReader, XmlEvent};

use super::utils::{attribute_value, find_start_of};

/// Errors for documents the reader cannot make sense of at all.
#[derive(Debug, Error)]
pub enum PnmlError {
    #[error("cannot open PNML file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] xml::reader::Error),
    #[error("document has no <{0}> element")]
    MissingElement(&'static str),
    #[error("<{element}> is missing its \"{attribute}\" attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("place {place} has a non-numeric initial marking: {text:?}")]
    InvalidTokenCount { place: String, text: String },
}

/// A structural problem found by [ParsedNet::validate].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("arc endpoint {endpoint} is neither a place nor a transition")]
    UnknownEndpoint { endpoint: String },
    #[error("arc connects place {from} to place {to}")]
    PlaceToPlace { from: String, to: String },
    #[error("arc connects transition {from} to transition {to}")]
    TransitionToTransition { from: String, to: String },
}

/// The raw content of one `<net>` element, before index normalization.
#[derive(Debug, Clone, Default)]
pub struct ParsedNet {
    /// Place ids with their initial token counts, in document order.
    pub places: Vec<(String, u64)>,
    /// Transition ids in document order.
    pub transitions: Vec<String>,
    /// Arcs as `(source, target)` id pairs, in document order.
    pub arcs: Vec<(String, String)>,
}

impl ParsedNet {
    /// Collect every structural problem of the net. An empty result means
    /// the arc list can be classified cleanly by the normalizer.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let places: HashSet<&str> = self.places.iter().map(|(id, _)| id.as_str()).collect();
        let transitions: HashSet<&str> = self.transitions.iter().map(String::as_str).collect();

        let mut issues = Vec::new();
        for (source, target) in &self.arcs {
            for endpoint in [source, target] {
                if !places.contains(endpoint.as_str()) && !transitions.contains(endpoint.as_str())
                {
                    issues.push(ValidationIssue::UnknownEndpoint {
                        endpoint: endpoint.clone(),
                    });
                }
            }
            if places.contains(source.as_str()) && places.contains(target.as_str()) {
                issues.push(ValidationIssue::PlaceToPlace {
                    from: source.clone(),
                    to: target.clone(),
                });
            }
            if transitions.contains(source.as_str()) && transitions.contains(target.as_str()) {
                issues.push(ValidationIssue::TransitionToTransition {
                    from: source.clone(),
                    to: target.clone(),
                });
            }
        }
        issues
    }
}

/// Read the first `<net>` element of a PNML document.
///
/// A place without an `<initialMarking>` holds zero tokens. Tag and
/// attribute matching ignores namespace prefixes throughout.
pub fn read_pnml<R: Read>(input: R) -> Result<ParsedNet, PnmlError> {
    let mut xml = EventReader::new(input);
    if !find_start_of(&mut xml, "net")? {
        return Err(PnmlError::MissingElement("net"));
    }

    let mut net = ParsedNet::default();
    // index into `net.places` while inside the corresponding <place>
    let mut current_place: Option<usize> = None;
    let mut in_initial_marking = false;
    let mut in_marking_text = false;

    loop {
        match xml.next()? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => match name.local_name.as_str() {
                "place" => {
                    let id = attribute_value(&attributes, "id").ok_or(
                        PnmlError::MissingAttribute {
                            element: "place",
                            attribute: "id",
                        },
                    )?;
                    net.places.push((id, 0));
                    current_place = Some(net.places.len() - 1);
                }
                "transition" => {
                    let id = attribute_value(&attributes, "id").ok_or(
                        PnmlError::MissingAttribute {
                            element: "transition",
                            attribute: "id",
                        },
                    )?;
                    net.transitions.push(id);
                }
                "arc" => {
                    let source = attribute_value(&attributes, "source").ok_or(
                        PnmlError::MissingAttribute {
                            element: "arc",
                            attribute: "source",
                        },
                    )?;
                    let target = attribute_value(&attributes, "target").ok_or(
                        PnmlError::MissingAttribute {
                            element: "arc",
                            attribute: "target",
                        },
                    )?;
                    net.arcs.push((source, target));
                }
                "initialMarking" if current_place.is_some() => in_initial_marking = true,
                "text" if in_initial_marking => in_marking_text = true,
                _ => {}
            },
            XmlEvent::Characters(text) if in_marking_text => {
                if let Some(slot) = current_place {
                    let tokens = text.trim().parse::<u64>().map_err(|_| {
                        PnmlError::InvalidTokenCount {
                            place: net.places[slot].0.clone(),
                            text: text.trim().to_string(),
                        }
                    })?;
                    net.places[slot].1 = tokens;
                }
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "place" => current_place = None,
                "initialMarking" => in_initial_marking = false,
                "text" => in_marking_text = false,
                "net" => break,
                _ => {}
            },
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    Ok(net)
}

/// Read a PNML document from a file.
pub fn read_pnml_file<P: AsRef<Path>>(path: P) -> Result<ParsedNet, PnmlError> {
    let file = File::open(path)?;
    read_pnml(BufReader::new(file))
}
