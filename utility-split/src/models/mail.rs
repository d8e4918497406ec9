use serde::Deserialize;

/// A Gmail label.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MailLabel {
    pub id: String,
    pub name: String,
}

/// Message handle as returned by a Gmail list call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}
