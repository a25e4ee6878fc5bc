//! Policy-driven encryption of CRM record fields.
//!
//! Each policy field present in a record is replaced by its envelope (on
//! encrypt) or by its decrypted value (on decrypt). Records are processed
//! all-or-nothing: the first failure aborts the transform and the caller
//! discards the partially rewritten payload.
//!
//! Envelopes written here tag their `additionalData` with the plaintext kind
//! (`"text"` or `"json"`) so that decryption restores the original JSON type.
//! Untagged envelopes fall back to the codec's JSON-or-string interpretation.

use cryptosphere::{
    CryptoError, DecryptParams, EncryptParams, EncryptionEnvelope, Encryptor, Plaintext,
};
use serde_json::{json, Value};

use crate::policy::{EntityPolicy, PathSegment};

/// Shape of the plaintext sealed in a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Json,
}

impl FieldKind {
    fn of(plaintext: &Plaintext) -> Self {
        match plaintext {
            Plaintext::Json(_) => FieldKind::Json,
            Plaintext::Text(_) | Plaintext::Bytes(_) => FieldKind::Text,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Json => "json",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(FieldKind::Text),
            "json" => Some(FieldKind::Json),
            _ => None,
        }
    }
}

/// Decrypt parameters recovered from an envelope-shaped field.
struct SealedField {
    params: DecryptParams,
    kind: Option<FieldKind>,
}

/// Encrypt every policy field of `payload` in place.
///
/// Strings, objects and arrays are encrypted; numbers, booleans, nulls,
/// absent fields and fields that already hold an envelope are left untouched.
/// Each envelope records the entity, field path and plaintext kind in its
/// `additionalData`.
///
/// # Errors
///
/// Returns the first [`CryptoError`] raised by the encryptor.
pub fn encrypt_record(
    encryptor: &dyn Encryptor,
    entity: &str,
    policy: &EntityPolicy,
    payload: &mut Value,
) -> Result<usize, CryptoError> {
    let mut count = 0;
    for field in policy.fields.iter() {
        visit_at_path(payload, field.segments(), &mut |leaf| {
            if !matches!(leaf, Value::String(_) | Value::Object(_) | Value::Array(_)) {
                return Ok(());
            }
            if sealed_field(leaf, policy).is_some() {
                return Ok(());
            }
            let plaintext = Plaintext::from_value(leaf.take())?;
            let kind = FieldKind::of(&plaintext);
            let mut params = EncryptParams::new(plaintext).with_additional_data(json!({
                "entity": entity,
                "field": field.as_str(),
                "kind": kind.tag(),
            }));
            params.key_id = policy.key_id.clone();
            let envelope = encryptor.encrypt(params)?;
            *leaf = serde_json::to_value(&envelope)
                .map_err(|e| CryptoError::Encryption(format!("envelope serialisation: {e}")))?;
            count += 1;
            Ok(())
        })?;
    }
    Ok(count)
}

/// Decrypt every policy field of `payload` that holds an envelope.
///
/// Fields that are not envelope objects (legacy plaintext, nulls) are left
/// untouched. Envelopes without a key id are opened under the policy key id.
///
/// # Errors
///
/// Returns the first [`CryptoError`] raised by the encryptor.
pub fn decrypt_record(
    encryptor: &dyn Encryptor,
    policy: &EntityPolicy,
    payload: &mut Value,
) -> Result<usize, CryptoError> {
    let mut count = 0;
    for field in policy.fields.iter() {
        visit_at_path(payload, field.segments(), &mut |leaf| {
            let Some(sealed) = sealed_field(leaf, policy) else {
                return Ok(());
            };
            *leaf = match sealed.kind {
                Some(FieldKind::Text) => {
                    let bytes = encryptor.decrypt_bytes(&sealed.params)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                Some(FieldKind::Json) => {
                    let bytes = encryptor.decrypt_bytes(&sealed.params)?;
                    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                        Value::String(String::from_utf8_lossy(&bytes).into_owned())
                    })
                }
                None => encryptor.decrypt(&sealed.params)?.decrypted,
            };
            count += 1;
            Ok(())
        })?;
    }
    Ok(count)
}

/// Recognise a value shaped like an envelope and extract what decrypting it
/// needs.
fn sealed_field(value: &Value, policy: &EntityPolicy) -> Option<SealedField> {
    let obj = value.as_object()?;
    if !obj.contains_key("encrypted") || !obj.contains_key("iv") {
        return None;
    }
    let mut params = match serde_json::from_value::<EncryptionEnvelope>(value.clone()) {
        Ok(envelope) => envelope.to_decrypt_params(),
        // Envelopes from older writers may lack the informational fields.
        Err(_) => serde_json::from_value::<DecryptParams>(value.clone()).ok()?,
    };
    if params.key_id.as_deref().map_or(true, str::is_empty) {
        params.key_id = policy.key_id.clone();
    }
    let kind = obj
        .get("additionalData")
        .and_then(|meta| meta.get("kind"))
        .and_then(Value::as_str)
        .and_then(FieldKind::from_tag);
    Some(SealedField { params, kind })
}

/// Recursively navigate `value` following `segments` and apply `f` to every
/// leaf found at the end of the path.
fn visit_at_path(
    value: &mut Value,
    segments: &[PathSegment],
    f: &mut dyn FnMut(&mut Value) -> Result<(), CryptoError>,
) -> Result<(), CryptoError> {
    let Some((head, rest)) = segments.split_first() else {
        return f(value);
    };

    match head {
        PathSegment::Key(key) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get_mut(key) {
                    visit_at_path(child, rest, f)?;
                }
            }
        }
        PathSegment::ArrayItem => {
            if let Value::Array(items) = value {
                for item in items.iter_mut() {
                    visit_at_path(item, rest, f)?;
                }
            }
        }
    }
    Ok(())
}
