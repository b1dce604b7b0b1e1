// provider/src/framework/codec.rs
//
// DynamicValue <-> Record. Terraform encodes cty objects as MessagePack maps;
// unknown values travel as msgpack extensions.

use rmpv::Value as Msgpack;
use zeroize::Zeroize;

use crate::framework::diagnostics::Diagnostic;
use crate::framework::record::{Attributes, Record};
use crate::framework::schema::Schema;
use crate::framework::value::Value;
use crate::server::tfplugin6::DynamicValue;

/// cty's extension code for a wholly unknown value.
const UNKNOWN_EXT: i8 = 0;
/// Refined unknowns (Terraform 1.6+) carry their refinements in ext 12.
const REFINED_UNKNOWN_EXT: i8 = 12;

fn decode_error(detail: impl Into<String>) -> Diagnostic {
    Diagnostic::error("Unable to Decode Value", detail)
}

/// Decodes a payload. A missing or empty DynamicValue is a null record.
pub fn decode(value: Option<&DynamicValue>) -> Result<Record, Diagnostic> {
    match value {
        Some(dv) if !dv.msgpack.is_empty() => decode_msgpack(&dv.msgpack),
        Some(dv) if !dv.json.is_empty() => decode_json(&dv.json),
        _ => Ok(Record::null()),
    }
}

/// Decodes a configuration payload and scrubs the wire buffers afterwards,
/// since configuration is where write-only values arrive in plaintext.
pub fn decode_and_scrub(value: &mut Option<DynamicValue>) -> Result<Record, Diagnostic> {
    let record = decode(value.as_ref());
    if let Some(dv) = value.as_mut() {
        dv.msgpack.zeroize();
        dv.json.zeroize();
    }
    record
}

fn decode_msgpack(mut bytes: &[u8]) -> Result<Record, Diagnostic> {
    let value = rmpv::decode::read_value(&mut bytes)
        .map_err(|e| decode_error(format!("Invalid MessagePack payload: {}", e)))?;

    match value {
        Msgpack::Nil => Ok(Record::null()),
        Msgpack::Map(entries) => {
            let mut attributes = Attributes::new();
            for (key, value) in entries {
                let name = key
                    .as_str()
                    .ok_or_else(|| decode_error("Object attribute names must be strings."))?
                    .to_string();
                let value = msgpack_attribute(&name, value)?;
                attributes.insert(name, value);
            }
            Ok(Record::object(attributes))
        }
        Msgpack::Ext(..) => Err(decode_error("Received an unknown value where an object was expected.")),
        other => Err(decode_error(format!("Expected an object, got {}.", other))),
    }
}

fn msgpack_attribute(name: &str, value: Msgpack) -> Result<Value<String>, Diagnostic> {
    match value {
        Msgpack::Nil => Ok(Value::Null),
        Msgpack::Ext(UNKNOWN_EXT | REFINED_UNKNOWN_EXT, _) => Ok(Value::Unknown),
        Msgpack::String(s) => s
            .into_str()
            .map(Value::Known)
            .ok_or_else(|| decode_error("String attribute is not valid UTF-8.").with_attribute(name)),
        Msgpack::Ext(code, _) => Err(decode_error(format!("Unsupported MessagePack extension {}.", code))
            .with_attribute(name)),
        _ => Err(decode_error("Expected a string value.").with_attribute(name)),
    }
}

/// Decodes a JSON object. JSON cannot express unknown values, so this is
/// only valid for configuration and stored state.
pub fn decode_json(bytes: &[u8]) -> Result<Record, Diagnostic> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| decode_error(format!("Invalid JSON payload: {}", e)))?;

    match value {
        serde_json::Value::Null => Ok(Record::null()),
        serde_json::Value::Object(map) => {
            let mut attributes = Attributes::new();
            for (name, value) in map {
                let value = match value {
                    serde_json::Value::Null => Value::Null,
                    serde_json::Value::String(s) => Value::Known(s),
                    _ => return Err(decode_error("Expected a string value.").with_attribute(name)),
                };
                attributes.insert(name, value);
            }
            Ok(Record::object(attributes))
        }
        _ => Err(decode_error("Expected a JSON object.")),
    }
}

/// Encodes a record as MessagePack. Every attribute declared by `schema` is
/// written, absent ones as nil; attributes outside the schema are rejected.
pub fn encode(record: &Record, schema: &Schema) -> Result<DynamicValue, Diagnostic> {
    let value = match record.attributes() {
        None => Msgpack::Nil,
        Some(attrs) => {
            if let Some(stray) = attrs.keys().find(|name| schema.get(name).is_none()) {
                return Err(Diagnostic::error(
                    "Value Conversion Error",
                    format!("Attribute {:?} is not declared in the schema.", stray),
                )
                .with_attribute(stray.clone()));
            }

            let entries = schema
                .attributes
                .iter()
                .map(|attr| {
                    let value = match record.attribute(attr.name) {
                        Value::Null => Msgpack::Nil,
                        Value::Unknown => Msgpack::Ext(UNKNOWN_EXT, vec![0]),
                        Value::Known(s) => Msgpack::from(s),
                    };
                    (Msgpack::from(attr.name), value)
                })
                .collect();
            Msgpack::Map(entries)
        }
    };

    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &value)
        .map_err(|e| Diagnostic::error("Unable to Encode Value", e.to_string()))?;

    Ok(DynamicValue {
        msgpack: buf,
        json: Vec::new(),
    })
}
