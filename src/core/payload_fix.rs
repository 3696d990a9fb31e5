//! One-shot body rewrites for vendor 400 errors that a resend can recover from.

use crate::domain::model::HttpReply;
use crate::domain::payload::IDENTITY_TYPE_MOBILE;
use serde::Deserialize;
use serde_json::Value;

pub const MPID_NOT_FOUND: &str = "MpId doesn't exist";
pub const NOTHING_TO_MODIFY: &str = "ToModifyIdentities is empty.";

#[derive(Debug, Default, Deserialize)]
struct VendorErrorBody {
    #[serde(rename = "Errors", default)]
    errors: Vec<VendorError>,
}

#[derive(Debug, Default, Deserialize)]
struct VendorError {
    #[serde(default)]
    message: Option<String>,
}

/// First `Errors[].message` of a vendor error body, if the body has one.
pub fn vendor_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<VendorErrorBody>(body)
        .ok()?
        .errors
        .into_iter()
        .next()?
        .message
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFix {
    /// The profile lives in the development environment.
    DevelopmentEnvironment,
    /// The mobile number is already gone; stop asking to remove it.
    ClearMobileOldValue,
}

impl PayloadFix {
    pub fn for_reply(reply: &HttpReply) -> Option<Self> {
        if reply.status != 400 {
            return None;
        }
        match vendor_error_message(&reply.body)?.as_str() {
            MPID_NOT_FOUND => Some(PayloadFix::DevelopmentEnvironment),
            NOTHING_TO_MODIFY => Some(PayloadFix::ClearMobileOldValue),
            _ => None,
        }
    }

    /// Rewrites `body` in place. Returns `false` when nothing changed, in
    /// which case a resend would be pointless.
    pub fn apply(&self, body: &mut Value) -> bool {
        match body {
            Value::Array(items) => items
                .iter_mut()
                .fold(false, |changed, item| self.apply(item) || changed),
            Value::Object(_) => match self {
                PayloadFix::DevelopmentEnvironment => set_development(body),
                PayloadFix::ClearMobileOldValue => clear_mobile_old_values(body),
            },
            _ => false,
        }
    }
}

fn set_development(body: &mut Value) -> bool {
    if body.get("environment").and_then(Value::as_str) == Some("development") {
        return false;
    }
    body["environment"] = Value::String("development".to_string());
    true
}

fn clear_mobile_old_values(body: &mut Value) -> bool {
    let Some(changes) = body.get_mut("identity_changes").and_then(Value::as_array_mut) else {
        return false;
    };

    let mut changed = false;
    for change in changes {
        let is_mobile =
            change.get("identity_type").and_then(Value::as_str) == Some(IDENTITY_TYPE_MOBILE);
        if is_mobile && !change["old_value"].is_null() {
            change["old_value"] = Value::Null;
            changed = true;
        }
    }
    changed
}
