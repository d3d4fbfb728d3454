//! XML-RPC wire format, mapped onto `serde_json::Value`.

use crate::error::{AppError, AppResult};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

pub fn encode_method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from(r#"<?xml version="1.0"?><methodCall><methodName>"#);
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push(if *b { '1' } else { '0' });
            out.push_str("</boolean>");
        }
        // <int> is 32-bit; wider integers use the <i8> extension WordPress reads
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => out.push_str(&format!("<int>{}</int>", i)),
            Some(i) => out.push_str(&format!("<i8>{}</i8>", i)),
            None => out.push_str(&format!("<double>{}</double>", n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn named(name: &[u8]) -> Self {
        Node {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> AppResult<&Node> {
        self.child(name)
            .ok_or_else(|| AppError::Xml(format!("<{}> without <{}>", self.name, name)))
    }
}

fn parse_tree(xml: &str) -> AppResult<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Node::named(e.name().as_ref())),
            Event::Empty(e) => {
                let node = Node::named(e.name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(AppError::Xml("unbalanced closing tag".to_string()));
                }
                if let (Some(node), Some(parent)) = (stack.pop(), stack.last_mut()) {
                    parent.children.push(node);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.len(), stack.pop()) {
        (1, Some(root)) => Ok(root),
        _ => Err(AppError::Xml("unexpected end of document".to_string())),
    }
}

/// Decodes a `methodResponse`; a `<fault>` comes back as `AppError::Fault`.
pub fn decode_method_response(xml: &str) -> AppResult<Value> {
    let root = parse_tree(xml)?;
    let response = root.require("methodResponse")?;

    if let Some(fault) = response.child("fault") {
        let detail = decode_value(fault.require("value")?)?;
        // Some servers send the code as a <string>
        let code = detail["faultCode"]
            .as_i64()
            .or_else(|| detail["faultCode"].as_str().and_then(|c| c.trim().parse().ok()))
            .unwrap_or_default();
        return Err(AppError::Fault {
            code,
            message: detail["faultString"]
                .as_str()
                .unwrap_or("unknown fault")
                .to_string(),
        });
    }

    let value = response.require("params")?.require("param")?.require("value")?;
    decode_value(value)
}

fn decode_value(node: &Node) -> AppResult<Value> {
    let Some(typed) = node.children.first() else {
        // An untyped <value> is a string.
        return Ok(Value::String(node.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "string" => Ok(Value::String(typed.text.clone())),
        "base64" | "dateTime.iso8601" => Ok(Value::String(text.to_string())),
        "int" | "i4" | "i8" => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| AppError::Xml(format!("bad integer {:?}: {}", text, e))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(AppError::Xml(format!("bad boolean {:?}", other))),
        },
        "double" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| AppError::Xml(format!("bad double {:?}", text))),
        "nil" => Ok(Value::Null),
        "array" => typed
            .require("data")?
            .children
            .iter()
            .filter(|c| c.name == "value")
            .map(decode_value)
            .collect::<AppResult<Vec<_>>>()
            .map(Value::Array),
        "struct" => {
            let mut members = Map::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.require("name")?.text.clone();
                members.insert(name, decode_value(member.require("value")?)?);
            }
            Ok(Value::Object(members))
        }
        other => Err(AppError::Xml(format!("unsupported value type <{}>", other))),
    }
}
