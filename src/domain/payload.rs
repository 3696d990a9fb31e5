//! Request bodies for the vendor identity and events APIs.

use serde::{Deserialize, Serialize};

pub const IDENTITY_TYPE_EMAIL: &str = "email";
pub const IDENTITY_TYPE_MOBILE: &str = "mobile_number";
pub const PROFILE_TO_KEEP: &str = "ProfileToKeep";
const SCHEMA_VERSION: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityChange {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub identity_type: String,
}

/// Body of `POST identity/{mpid}/modify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyPayload {
    pub environment: String,
    pub identity_changes: Vec<IdentityChange>,
}

impl ModifyPayload {
    /// Clears the given email and/or phone from a profile. Blank values are
    /// left out; with neither present the change list is empty.
    pub fn clear_identities(environment: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        let clear = |value: &str, identity_type: &str| IdentityChange {
            old_value: Some(value.to_string()),
            new_value: None,
            identity_type: identity_type.to_string(),
        };

        let identity_changes = [
            email.map(str::trim).filter(|v| !v.is_empty()).map(|v| clear(v, IDENTITY_TYPE_EMAIL)),
            phone.map(str::trim).filter(|v| !v.is_empty()).map(|v| clear(v, IDENTITY_TYPE_MOBILE)),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            environment: environment.to_string(),
            identity_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEventData {
    pub event_name: String,
    pub custom_event_type: String,
    pub user_attribute_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub new: String,
    pub is_new_attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub event_type: String,
    pub data: CustomEventData,
}

impl CustomEvent {
    fn profile_to_keep(keep: bool, email: Option<&str>) -> Self {
        Self {
            event_type: "custom_event".to_string(),
            data: CustomEventData {
                event_name: PROFILE_TO_KEEP.to_string(),
                custom_event_type: "other".to_string(),
                user_attribute_name: PROFILE_TO_KEEP.to_string(),
                email: email.map(str::to_string),
                new: keep.to_string(),
                is_new_attribute: keep.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemotedAttributes {
    #[serde(rename = "ProfileToKeep")]
    pub profile_to_keep: String,
    #[serde(rename = "$mobile")]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedIdentities {
    pub email: Option<String>,
    pub mobile_number: Option<String>,
}

/// Body of `POST events` marking a child profile as not-to-keep and
/// clearing its identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoteEventsPayload {
    pub mpid: String,
    pub schema_version: u8,
    pub environment: String,
    pub events: Vec<CustomEvent>,
    pub user_attributes: DemotedAttributes,
    pub user_identities: ClearedIdentities,
}

impl DemoteEventsPayload {
    pub fn new(mpid: &str, environment: &str) -> Self {
        Self {
            mpid: mpid.to_string(),
            schema_version: SCHEMA_VERSION,
            environment: environment.to_string(),
            events: vec![CustomEvent::profile_to_keep(false, None)],
            user_attributes: DemotedAttributes {
                profile_to_keep: "false".to_string(),
                mobile: None,
            },
            user_identities: ClearedIdentities {
                email: None,
                mobile_number: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptAttributes {
    #[serde(rename = "ProfileToKeep")]
    pub profile_to_keep: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIdentity {
    pub email: String,
}

/// One element of a `POST bulkevents` array marking a winner profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepProfileEvent {
    pub events: Vec<CustomEvent>,
    pub user_attributes: KeptAttributes,
    pub user_identities: EmailIdentity,
    pub mpid: String,
    pub schema_version: u8,
    pub environment: String,
}

impl KeepProfileEvent {
    pub fn new(mpid: &str, email: &str, environment: &str) -> Self {
        Self {
            events: vec![CustomEvent::profile_to_keep(true, Some(email))],
            user_attributes: KeptAttributes {
                profile_to_keep: "true".to_string(),
                email: email.to_string(),
            },
            user_identities: EmailIdentity {
                email: email.to_string(),
            },
            mpid: mpid.to_string(),
            schema_version: SCHEMA_VERSION,
            environment: environment.to_string(),
        }
    }
}
