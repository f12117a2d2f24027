// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders [`CallAction`] decisions into carrier call-control documents.
//!
//! Every document is a `<Response>` root holding an ordered list of verbs.
//! Interpolated text and attribute values are escaped by the XML writer;
//! values that end up in routing positions (dial destinations, caller ids,
//! client identities, callback URLs) are validated first and rejected with
//! [`SwitchboardError::Markup`] instead of being rendered.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use switchboard_core::{CallAction, PhoneNumber, PstnDial, SwitchboardError};

/// Carrier events requested on PSTN dial legs.
const DIAL_STATUS_EVENTS: &str = "initiated ringing answered completed";

const MAX_IDENTITY_LEN: usize = 128;

/// Renders call actions using a fixed text-to-speech voice.
#[derive(Debug, Clone)]
pub struct Renderer {
    voice: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new("alice")
    }
}

impl Renderer {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
        }
    }

    /// Render a complete document for `action`.
    pub fn render(&self, action: &CallAction) -> Result<String, SwitchboardError> {
        let mut doc = Document::new()?;
        if matches!(action, CallAction::Empty) {
            doc.empty("Response", &[])?;
        } else {
            doc.start("Response", &[])?;
            self.verbs(&mut doc, action)?;
            doc.end("Response")?;
        }
        doc.finish()
    }

    fn verbs(
        &self,
        doc: &mut Document,
        action: &CallAction,
    ) -> Result<(), SwitchboardError> {
        match action {
            CallAction::DialClient {
                identity,
                timeout_secs,
                action_url,
                fallback,
            } => {
                validate_identity(identity)?;
                if let Some(next) = fallback {
                    // The fallback is served from the dial callback; without
                    // one it would be unreachable.
                    if action_url.is_none() {
                        return Err(SwitchboardError::Markup(
                            "client dial fallback needs a dial action url".into(),
                        ));
                    }
                    if matches!(next.as_ref(), CallAction::DialClient { .. }) {
                        return Err(SwitchboardError::Markup(
                            "nested client dial in fallback".into(),
                        ));
                    }
                }
                let timeout = timeout_secs.to_string();
                let mut attrs: Vec<(&str, &str)> = vec![("timeout", &timeout)];
                if let Some(url) = action_url {
                    validate_url(url)?;
                    attrs.push(("action", url));
                }
                doc.start("Dial", &attrs)?;
                doc.text_element("Client", &[], identity)?;
                doc.end("Dial")?;
            }
            CallAction::DialPstn(dial) => self.dial_pstn(doc, dial)?,
            CallAction::RecordVoicemail {
                prompt,
                timeout_secs,
                action_url,
            } => {
                if let Some(prompt) = prompt {
                    self.say(doc, prompt)?;
                }
                let timeout = timeout_secs.to_string();
                let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(3);
                if let Some(url) = action_url {
                    validate_url(url)?;
                    attrs.push(("action", url));
                }
                attrs.push(("timeout", &timeout));
                attrs.push(("playBeep", "true"));
                doc.empty("Record", &attrs)?;
            }
            CallAction::Say { message, hangup } => {
                self.say(doc, message)?;
                if *hangup {
                    doc.empty("Hangup", &[])?;
                }
            }
            CallAction::Reject { message } => {
                self.say(doc, message)?;
                doc.empty("Hangup", &[])?;
            }
            CallAction::Empty => {}
        }
        Ok(())
    }

    fn dial_pstn(&self, doc: &mut Document, dial: &PstnDial) -> Result<(), SwitchboardError> {
        validate_number("destination", &dial.destination)?;
        validate_number("caller id", &dial.caller_id)?;

        let timeout = dial.timeout_secs.to_string();
        let mut attrs: Vec<(&str, &str)> = vec![("callerId", &dial.caller_id)];
        if dial.record {
            attrs.push(("record", "record-from-answer"));
        }
        attrs.push(("timeout", &timeout));
        if let Some(url) = &dial.action_url {
            validate_url(url)?;
            attrs.push(("action", url));
        }
        doc.start("Dial", &attrs)?;

        let mut number_attrs: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(url) = &dial.status_callback {
            validate_url(url)?;
            number_attrs.push(("statusCallback", url));
            number_attrs.push(("statusCallbackEvent", DIAL_STATUS_EVENTS));
        }
        doc.text_element("Number", &number_attrs, &dial.destination)?;
        doc.end("Dial")
    }

    fn say(&self, doc: &mut Document, message: &str) -> Result<(), SwitchboardError> {
        doc.text_element("Say", &[("voice", &self.voice)], message)
    }
}

/// Render with the default voice.
pub fn render(action: &CallAction) -> Result<String, SwitchboardError> {
    Renderer::default().render(action)
}

/// Document returned when rendering itself fails or routing timed out.
///
/// Contains no interpolated values, so it cannot fail.
pub fn static_reject() -> &'static str {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<Response><Say voice="alice">We are unable to complete your call right now. Please try again later.</Say><Hangup/></Response>"#
    )
}

fn validate_number(field: &str, value: &str) -> Result<(), SwitchboardError> {
    PhoneNumber::parse(value)
        .map(|_| ())
        .map_err(|_| SwitchboardError::Markup(format!("{field} is not an E.164 number")))
}

fn validate_identity(identity: &str) -> Result<(), SwitchboardError> {
    let well_formed = !identity.is_empty()
        && identity.len() <= MAX_IDENTITY_LEN
        && identity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if well_formed {
        Ok(())
    } else {
        Err(SwitchboardError::Markup(
            "client identity contains unsupported characters".into(),
        ))
    }
}

fn validate_url(url: &str) -> Result<(), SwitchboardError> {
    let scheme_ok = url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/');
    if scheme_ok && !url.chars().any(|c| c.is_control() || c.is_whitespace()) {
        Ok(())
    } else {
        Err(SwitchboardError::Markup("callback url is not usable".into()))
    }
}

/// Thin wrapper over the XML writer mapping write failures to markup errors.
struct Document {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Document {
    fn new() -> Result<Self, SwitchboardError> {
        let mut doc = Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        };
        doc.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(doc)
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), SwitchboardError> {
        self.writer
            .write_event(event)
            .map_err(|e| SwitchboardError::Markup(format!("write failed: {e}")))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SwitchboardError> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.write(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SwitchboardError> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.write(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<(), SwitchboardError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), SwitchboardError> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String, SwitchboardError> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| SwitchboardError::Markup(e.to_string()))
    }
}
