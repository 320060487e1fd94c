//! XML-RPC wire format.
//!
//! Values are modelled as [`serde_json::Value`] so responses can be
//! deserialized straight into typed descriptors:
//!
//! | XML-RPC                          | JSON value |
//! |----------------------------------|------------|
//! | `struct`                         | object     |
//! | `array`                          | array      |
//! | `int`, `i4`, `i8`                | integer    |
//! | `double`                         | float      |
//! | `boolean`                        | bool       |
//! | `string`, `dateTime.iso8601`, `base64`, untyped | string |
//! | `nil`                            | null       |

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesText, Event};
use serde_json::{Map, Number, Value};

use crate::error::{DeployError, DeployResult};

/// Encode a `methodCall` document.
///
/// ```
/// use serde_json::json;
/// use slipway::api::xmlrpc::encode_call;
///
/// let xml = encode_call("login", &[json!("alice"), json!("s3cret")]);
///
/// assert!(xml.contains("<methodName>login</methodName>"));
/// assert!(xml.contains("<value><string>alice</string></value>"));
/// ```
#[must_use]
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                let _ = write!(out, "<int>{i}</int>");
            } else {
                let _ = write!(out, "<double>{n}</double>");
            }
        }
        Value::String(s) => {
            let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Decode a `methodResponse` document.
///
/// A `fault` response becomes [`DeployError::Fault`].
pub fn decode_response(xml: &str) -> DeployResult<Value> {
    let mut parser = Parser::new(xml);

    parser.expect_start(b"methodResponse")?;
    match parser.next()? {
        Event::Start(e) if e.name().as_ref() == b"params" => {
            parser.expect_start(b"param")?;
            parser.expect_start(b"value")?;
            let value = parser.parse_value()?;
            parser.expect_end(b"param")?;
            parser.expect_end(b"params")?;
            Ok(value)
        }
        Event::Start(e) if e.name().as_ref() == b"fault" => {
            parser.expect_start(b"value")?;
            let fault = parser.parse_value()?;
            Err(fault_error(&fault))
        }
        other => Err(unexpected("params or fault", &other)),
    }
}

fn fault_error(fault: &Value) -> DeployError {
    let code = fault.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
    let message = fault
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("unknown fault")
        .to_string();
    DeployError::Fault { code, message }
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    /// Next event, skipping declarations and comments. Text is
    /// returned untouched.
    fn next_raw(&mut self) -> DeployResult<Event<'a>> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| DeployError::Protocol(e.to_string()))?;
            match event {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => {
                    return Err(DeployError::Protocol("unexpected end of document".into()));
                }
                other => return Ok(other),
            }
        }
    }

    /// Next structural event: like [`Self::next_raw`], but also skips
    /// the whitespace that indents markup.
    fn next(&mut self) -> DeployResult<Event<'a>> {
        loop {
            match self.next_raw()? {
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
                other => return Ok(other),
            }
        }
    }

    fn expect_start(&mut self, name: &[u8]) -> DeployResult<()> {
        match self.next()? {
            Event::Start(e) if e.name().as_ref() == name => Ok(()),
            other => Err(unexpected(&tag(name), &other)),
        }
    }

    fn expect_end(&mut self, name: &[u8]) -> DeployResult<()> {
        match self.next()? {
            Event::End(e) if e.name().as_ref() == name => Ok(()),
            other => Err(unexpected(&format!("/{}", tag(name)), &other)),
        }
    }

    /// Text content of the element just opened, consuming its end tag.
    fn read_text(&mut self, name: &[u8]) -> DeployResult<String> {
        match self.next_raw()? {
            Event::Text(t) => {
                let text = unescape(&t)?;
                self.expect_end(name)?;
                Ok(text)
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                self.expect_end(name)?;
                Ok(text)
            }
            Event::End(e) if e.name().as_ref() == name => Ok(String::new()),
            other => Err(unexpected("text", &other)),
        }
    }

    /// Parse the body of a `<value>` element whose start tag has
    /// already been consumed.
    fn parse_value(&mut self) -> DeployResult<Value> {
        // Text right after <value> is either an untyped string or the
        // indentation before a typed element.
        let (text, event) = match self.next_raw()? {
            Event::Text(t) => (Some(unescape(&t)?), self.next_raw()?),
            Event::CData(c) => (
                Some(String::from_utf8_lossy(&c).into_owned()),
                self.next_raw()?,
            ),
            other => (None, other),
        };

        if matches!(&event, Event::End(e) if e.name().as_ref() == b"value") {
            return Ok(Value::String(text.unwrap_or_default()));
        }
        if text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
            return Err(unexpected("</value>", &event));
        }

        match event {
            Event::Empty(e) => {
                let value = scalar(e.name().as_ref(), "")?;
                self.expect_end(b"value")?;
                Ok(value)
            }
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let value = match name.as_slice() {
                    b"struct" => self.parse_struct()?,
                    b"array" => self.parse_array()?,
                    other => {
                        let text = self.read_text(other)?;
                        scalar(other, &text)?
                    }
                };
                self.expect_end(b"value")?;
                Ok(value)
            }
            other => Err(unexpected("value body", &other)),
        }
    }

    fn parse_struct(&mut self) -> DeployResult<Value> {
        let mut members = Map::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.name().as_ref() == b"member" => {
                    self.expect_start(b"name")?;
                    let key = self.read_text(b"name")?;
                    self.expect_start(b"value")?;
                    let value = self.parse_value()?;
                    self.expect_end(b"member")?;
                    members.insert(key, value);
                }
                Event::End(e) if e.name().as_ref() == b"struct" => break,
                other => return Err(unexpected("member", &other)),
            }
        }
        Ok(Value::Object(members))
    }

    fn parse_array(&mut self) -> DeployResult<Value> {
        let mut items = Vec::new();
        match self.next()? {
            Event::Empty(e) if e.name().as_ref() == b"data" => {}
            Event::Start(e) if e.name().as_ref() == b"data" => loop {
                match self.next()? {
                    Event::Start(e) if e.name().as_ref() == b"value" => {
                        items.push(self.parse_value()?);
                    }
                    Event::Empty(e) if e.name().as_ref() == b"value" => {
                        items.push(Value::String(String::new()));
                    }
                    Event::End(e) if e.name().as_ref() == b"data" => break,
                    other => return Err(unexpected("value", &other)),
                }
            },
            other => return Err(unexpected("data", &other)),
        }
        self.expect_end(b"array")?;
        Ok(Value::Array(items))
    }
}

fn scalar(kind: &[u8], text: &str) -> DeployResult<Value> {
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() && kind != b"string");
    match kind {
        b"int" | b"i4" | b"i8" => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| DeployError::Protocol(format!("bad integer '{text}': {e}"))),
        b"boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(DeployError::Protocol(format!("bad boolean '{other}'"))),
        },
        b"double" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| DeployError::Protocol(format!("bad double '{text}'"))),
        b"string" | b"dateTime.iso8601" | b"base64" => Ok(Value::String(text.to_string())),
        b"nil" => Ok(Value::Null),
        other => Err(DeployError::Protocol(format!(
            "unsupported value type <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn unescape(text: &BytesText<'_>) -> DeployResult<String> {
    text.unescape()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| DeployError::Protocol(e.to_string()))
}

fn tag(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn unexpected(expected: &str, found: &Event<'_>) -> DeployError {
    let found = match found {
        Event::Start(e) => format!("<{}>", tag(e.name().as_ref())),
        Event::End(e) => format!("</{}>", tag(e.name().as_ref())),
        Event::Empty(e) => format!("<{}/>", tag(e.name().as_ref())),
        Event::Text(_) => "text".to_string(),
        other => format!("{other:?}"),
    };
    DeployError::Protocol(format!("expected <{expected}>, found {found}"))
}
