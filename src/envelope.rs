//! SOAP envelope encoding and decoding.
//!
//! Uses quick-xml which is safe against XXE by default (doesn't expand entities).
//! Responses are read into a small element tree; the reader functions below
//! pick the parts the service needs out of the SOAP body.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::Fault;
use crate::request::{Address, Credentials, Person, RecordRequest, RecordsOptions};
use crate::transport::{Operation, Request, Response};

/// SOAP namespace URIs.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Namespace of the address verification operations.
pub const SERVICE_NS: &str = "urn:postdirekt:addressfactory:direct:v1";

/// Local name of the in-band authentication denial marker.
pub const AUTH_ERROR_ELEMENT: &str = "authenticationError";

/// Fault code used for responses that cannot be read.
const CLIENT_FAULT: &str = "Client";

/// Maximum element nesting accepted in a response document.
const MAX_DEPTH: usize = 64;

/// A parsed XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name (namespace prefix stripped)
    pub name: String,
    /// Attributes as written, keyed by qualified name
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant (depth-first) with the given local name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.rsplit(':').next() == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text of a direct child, empty if absent.
    fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }
}

/// One record returned by getRecords.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifiedRecord {
    /// Correlation id echoed from the request
    pub metadata_id: Option<u64>,
    /// Status codes assigned by the service
    pub status_codes: Vec<String>,
    /// Corrected person data (if returned)
    pub person: Option<Person>,
    /// Corrected address data (if returned)
    pub address: Option<Address>,
}

// ============================================================================
// Encoding
// ============================================================================

/// Build the openSession request.
pub fn open_session_request(credentials: &Credentials) -> Request {
    let body = format!(
        "    <af:openSession>\n{}{}    </af:openSession>\n",
        text_element(6, "user", credentials.user()),
        text_element(6, "password", credentials.password()),
    );
    Request::new(Operation::OpenSession, envelope(&body))
}

/// Build the getRecords request for a batch of records.
pub fn get_records_request(
    session_id: &str,
    options: &RecordsOptions,
    records: &[RecordRequest],
) -> Request {
    let mut body = String::from("    <af:getRecords>\n");
    body.push_str(&text_element(6, "sessionId", session_id));
    if let Some(ref config_name) = options.config_name {
        body.push_str(&text_element(6, "configName", config_name));
    }
    if let Some(ref client_id) = options.client_id {
        body.push_str(&text_element(6, "clientId", client_id));
    }
    for record in records {
        body.push_str(&record_element(record));
    }
    body.push_str("    </af:getRecords>\n");

    Request::new(Operation::GetRecords, envelope(&body))
}

/// Build the closeSession request.
pub fn close_session_request(session_id: &str) -> Request {
    let body = format!(
        "    <af:closeSession>\n{}    </af:closeSession>\n",
        text_element(6, "sessionId", session_id),
    );
    Request::new(Operation::CloseSession, envelope(&body))
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{}" xmlns:af="{}">
  <soap:Body>
{}  </soap:Body>
</soap:Envelope>"#,
        SOAP_11_NS, SERVICE_NS, body
    )
}

fn record_element(record: &RecordRequest) -> String {
    let mut xml = match record.metadata_id() {
        Some(id) => format!("      <af:record metadataId=\"{}\">\n", id),
        None => String::from("      <af:record>\n"),
    };

    if let Some(person) = record.person() {
        xml.push_str("        <af:person>\n");
        xml.push_str(&text_element(10, "firstname", &person.given_name));
        xml.push_str(&text_element(10, "lastname", &person.family_name));
        xml.push_str("        </af:person>\n");
    }

    let address = record.address();
    xml.push_str("        <af:address>\n");
    xml.push_str(&text_element(10, "country", &address.country));
    xml.push_str(&text_element(10, "postalCode", &address.postal_code));
    xml.push_str(&text_element(10, "city", &address.city));
    xml.push_str(&text_element(10, "street", &address.street));
    xml.push_str(&text_element(10, "houseNumber", &address.house_number));
    xml.push_str("        </af:address>\n");
    xml.push_str("      </af:record>\n");
    xml
}

fn text_element(indent: usize, name: &str, value: &str) -> String {
    format!(
        "{:indent$}<af:{name}>{}</af:{name}>\n",
        "",
        escape(value),
        indent = indent,
        name = name
    )
}

// ============================================================================
// Decoding
// ============================================================================

/// Read a raw response into its SOAP body.
///
/// SOAP faults and unreadable payloads come back as a [`Fault`] that keeps
/// the raw XML.
pub fn read_response(xml: &str) -> Result<Response, Fault> {
    match decode(xml)? {
        Decoded::Body(body) => Ok(Response::new(xml, body)),
        Decoded::Fault(fault) => Err(fault),
    }
}

/// The SOAP Fault carried by `xml`, if it is a well-formed fault envelope.
pub fn read_fault(xml: &str) -> Option<Fault> {
    match decode(xml) {
        Ok(Decoded::Fault(fault)) => Some(fault),
        _ => None,
    }
}

enum Decoded {
    Body(Element),
    Fault(Fault),
}

fn decode(xml: &str) -> Result<Decoded, Fault> {
    let client_fault = |message: String| Fault::new(CLIENT_FAULT, message).with_response(xml);

    check_xxe_patterns(xml).map_err(|m| client_fault(m.to_string()))?;

    let document = parse_document(xml).map_err(client_fault)?;
    if document.name != "Envelope" || soap_version_ns(&document).is_none() {
        return Err(client_fault(
            "No valid SOAP Envelope found with recognized namespace".to_string(),
        ));
    }

    let body = document
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| client_fault("SOAP Envelope has no Body".to_string()))?;

    match body.child("Fault") {
        Some(fault) => Ok(Decoded::Fault(fault_from_element(fault).with_response(xml))),
        None => Ok(Decoded::Body(body)),
    }
}

/// Session id from an openSession response body.
pub fn session_id(body: &Element) -> Option<String> {
    body.find("sessionId")
        .map(|e| e.text.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Whether the body carries an in-band authentication denial.
pub fn has_authentication_error(body: &Element) -> bool {
    body.find(AUTH_ERROR_ELEMENT).is_some()
}

/// All records in a getRecords response body, in document order.
pub fn records(body: &Element) -> Vec<VerifiedRecord> {
    let mut found = Vec::new();
    collect_records(body, &mut found);
    found
}

fn collect_records(element: &Element, found: &mut Vec<VerifiedRecord>) {
    for child in &element.children {
        if child.name == "record" {
            found.push(read_record(child));
        } else {
            collect_records(child, found);
        }
    }
}

fn read_record(record: &Element) -> VerifiedRecord {
    let status_codes = record
        .child("statusCodes")
        .map(|codes| {
            codes
                .children
                .iter()
                .map(|c| c.text.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    VerifiedRecord {
        metadata_id: record
            .attribute("metadataId")
            .and_then(|id| id.trim().parse().ok()),
        status_codes,
        person: record.child("person").map(|p| Person {
            given_name: p.child_text("firstname"),
            family_name: p.child_text("lastname"),
        }),
        address: record.child("address").map(|a| Address {
            country: a.child_text("country"),
            postal_code: a.child_text("postalCode"),
            city: a.child_text("city"),
            street: a.child_text("street"),
            house_number: a.child_text("houseNumber"),
        }),
    }
}

/// Read a SOAP 1.1 or SOAP 1.2 Fault element.
fn fault_from_element(fault: &Element) -> Fault {
    // SOAP 1.1: faultcode/faultstring, SOAP 1.2: Code/Value and Reason/Text
    let code = fault
        .child("faultcode")
        .or_else(|| fault.child("Code").and_then(|c| c.child("Value")))
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default();
    let message = fault
        .child("faultstring")
        .or_else(|| fault.child("Reason").and_then(|r| r.child("Text")))
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default();

    Fault::new(code, message)
}

fn soap_version_ns(envelope: &Element) -> Option<&str> {
    envelope
        .attributes
        .iter()
        .map(|(_, value)| value.as_str())
        .find(|ns| *ns == SOAP_11_NS || *ns == SOAP_12_NS)
}

/// Check for XXE attack patterns.
fn check_xxe_patterns(xml: &str) -> Result<(), &'static str> {
    if xml.contains("<!DOCTYPE") || xml.contains("<!doctype") {
        return Err("DOCTYPE declarations are not allowed");
    }
    if xml.contains("<!ENTITY") || xml.contains("<!entity") {
        return Err("Entity declarations are not allowed");
    }
    Ok(())
}

/// Parse an XML document into an element tree.
fn parse_document(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(format!(
                        "XML parse error: nesting exceeds {} elements",
                        MAX_DEPTH
                    ));
                }
                stack.push(start_element(e)?);
            }

            Ok(Event::Empty(ref e)) => attach(&mut stack, &mut root, start_element(e)?),

            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }

            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| format!("XML parse error: {}", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }

            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => return Err(format!("XML parse error: {}", e)),

            _ => {}
        }

        buf.clear();
    }

    if !stack.is_empty() {
        return Err("XML parse error: unexpected end of document".to_string());
    }
    root.ok_or_else(|| "XML parse error: empty document".to_string())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn start_element(e: &BytesStart) -> Result<Element, String> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_err(|e| format!("XML parse error: {}", e))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }

    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}
