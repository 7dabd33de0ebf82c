use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{ModuleKind, ProtocolError};

// ============================================================================
// Message identifiers
// ============================================================================

/// `<module>.<step>` identifier carried by every message and reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId {
    pub module: ModuleKind,
    pub step: u32,
}

impl MessageId {
    pub fn new(module: ModuleKind, step: u32) -> Self {
        Self { module, step }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.step)
    }
}

impl FromStr for MessageId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, step) = s
            .split_once('.')
            .ok_or_else(|| ProtocolError::MalformedMessageId(s.to_string()))?;
        let module = module.parse::<ModuleKind>()?;
        let step = step
            .parse::<u32>()
            .map_err(|_| ProtocolError::MalformedMessageId(s.to_string()))?;
        Ok(Self { module, step })
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Payload of a message: display text, an optional list to choose from and
/// any module-specific fields (`lat`, `lon`, `layerName`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub list: Option<Vec<String>>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A unit of the wizard conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub message: MessageBody,
}

impl Message {
    pub fn new(module: ModuleKind, step: u32) -> Self {
        Self {
            message_id: MessageId::new(module, step),
            message: MessageBody::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.message.text = Some(text.into());
        self
    }

    pub fn with_list(mut self, list: Vec<String>) -> Self {
        self.message.list = Some(list);
        self
    }

    /// Attach a module-specific field. `text` and `list` are reserved.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.message.fields.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.message.text.as_deref()
    }

    pub fn list(&self) -> Option<&[String]> {
        self.message.list.as_deref()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.message.fields.get(key)
    }
}

// ============================================================================
// Replies
// ============================================================================

/// What the user sent back for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A single value: a choice (`yes`), a name or a number.
    Text(String),
    /// An ordered list, e.g. a query built from several form fields.
    List(Vec<String>),
    /// A file that arrived in the data exchange directory.
    File(PathBuf),
}

impl Reply {
    pub fn text(value: impl Into<String>) -> Self {
        Reply::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reply::List(values.into_iter().map(Into::into).collect())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Reply::File(path.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Reply::List(values) => Some(values),
            _ => None,
        }
    }

    /// Uploaded files are forwarded as plain path strings by some callers.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Reply::File(path) => Some(path),
            Reply::Text(value) => Some(Path::new(value)),
            Reply::List(_) => None,
        }
    }

    /// Decode the `msg` field of a JSON reply body: a string or a list of strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Reply::Text(text.clone())),
            Value::Number(number) => Some(Reply::Text(number.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Some(text.clone()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Reply::List),
            _ => None,
        }
    }
}
