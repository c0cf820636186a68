// Tracker rich-text documents (Atlassian Document Format).
//
// Decoding is lenient: any JSON value becomes a `Node`, and structurally
// malformed branches degrade to empty nodes instead of failing.

mod flatten;

pub use flatten::{flatten, flatten_value, INDENT_UNIT};

use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Node type tag. Unknown tags are preserved verbatim in [`NodeKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Doc,
    Paragraph,
    BulletList,
    OrderedList,
    ListItem,
    Heading,
    CodeBlock,
    Panel,
    MediaSingle,
    Media,
    Rule,
    Text,
    HardBreak,
    Other(String),
}

impl NodeKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "doc" => Self::Doc,
            "paragraph" => Self::Paragraph,
            "bulletList" => Self::BulletList,
            "orderedList" => Self::OrderedList,
            "listItem" => Self::ListItem,
            "heading" => Self::Heading,
            "codeBlock" => Self::CodeBlock,
            "panel" => Self::Panel,
            "mediaSingle" => Self::MediaSingle,
            "media" => Self::Media,
            "rule" => Self::Rule,
            "text" => Self::Text,
            "hardBreak" => Self::HardBreak,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::BulletList => "bulletList",
            Self::OrderedList => "orderedList",
            Self::ListItem => "listItem",
            Self::Heading => "heading",
            Self::CodeBlock => "codeBlock",
            Self::Panel => "panel",
            Self::MediaSingle => "mediaSingle",
            Self::Media => "media",
            Self::Rule => "rule",
            Self::Text => "text",
            Self::HardBreak => "hardBreak",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of a rich-text document tree.
///
/// `content` is `None` when the source had no children array at all (missing
/// or not a sequence). Both cases render as "no children".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub kind: NodeKind,
    pub content: Option<Vec<Node>>,
    pub attrs: Option<Map<String, Value>>,
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: NodeKind::Text, text: Some(text.into()), ..Self::default() }
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.get_or_insert_with(Map::new).insert(key.to_string(), value);
        self
    }

    /// Decode a node from arbitrary JSON. Never fails.
    ///
    /// Non-object values decode to an empty `Other("")` node so that they
    /// render as nothing. A missing `type` is treated the same way.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::new(NodeKind::Other(String::new()));
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(NodeKind::parse)
            .unwrap_or_else(|| NodeKind::Other(String::new()));

        let content = object
            .get("content")
            .and_then(Value::as_array)
            .map(|children| children.iter().map(Self::from_value).collect());

        let attrs = object.get("attrs").and_then(Value::as_object).cloned();
        let text = object.get("text").and_then(Value::as_str).map(ToOwned::to_owned);

        Self { kind, content, attrs, text }
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".into(), Value::String(self.kind.as_str().to_string()));
        if let Some(content) = &self.content {
            object.insert("content".into(), content.iter().map(Self::to_value).collect());
        }
        if let Some(attrs) = &self.attrs {
            object.insert("attrs".into(), Value::Object(attrs.clone()));
        }
        if let Some(text) = &self.text {
            object.insert("text".into(), Value::String(text.clone()));
        }
        Value::Object(object)
    }

    /// Children, or an empty slice when `content` is absent.
    pub fn children(&self) -> &[Node] {
        self.content.as_deref().unwrap_or(&[])
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(key))
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attr(key).and_then(Value::as_u64)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
