use std::collections::BTreeMap;
use std::fmt::Formatter;

use bytes::Bytes;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

pub const DEFAULT_METHOD: &str = "POST";

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
  name: String,
  value: String,
}

/// Header names are matched case-insensitively. The spelling of the most
/// recent write is kept for output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
  entries: BTreeMap<String, HeaderEntry>,
}

impl Headers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    self.entries.insert(name.to_ascii_lowercase(), HeaderEntry {
      name,
      value: value.into(),
    });
  }

  pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let key = name.to_ascii_lowercase();

    if !self.entries.contains_key(&key) {
      self.entries.insert(key, HeaderEntry {
        name,
        value: value.into(),
      });
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.entries
      .get(&name.to_ascii_lowercase())
      .map(|entry| entry.value.as_str())
  }

  pub fn remove(&mut self, name: &str) -> Option<String> {
    self.entries
      .remove(&name.to_ascii_lowercase())
      .map(|entry| entry.value)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(&name.to_ascii_lowercase())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item=(&str, &str)> {
    self.entries
      .values()
      .map(|entry| (entry.name.as_str(), entry.value.as_str()))
  }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<I: IntoIterator<Item=(K, V)>>(iter: I) -> Self {
    let mut headers = Headers::new();

    for (name, value) in iter {
      headers.insert(name, value);
    }

    headers
  }
}

impl Serialize for Headers {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.len()))?;

    for (name, value) in self.iter() {
      map.serialize_entry(name, value)?;
    }

    map.end()
  }
}

struct HeadersVisitor;

impl<'de> Visitor<'de> for HeadersVisitor {
  type Value = Headers;

  fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
    formatter.write_str("an object of string header values")
  }

  // Entries arrive in document order, so a later spelling of the same name wins.
  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
    let mut headers = Headers::new();

    while let Some((name, value)) = access.next_entry::<String, String>()? {
      headers.insert(name, value);
    }

    Ok(headers)
  }
}

impl<'de> Deserialize<'de> for Headers {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(HeadersVisitor)
  }
}

/// The JSON request description accepted in the inbound body.
///
/// Only an object (or `null`, read as an empty description) is accepted.
/// Field names match case-insensitively, unknown fields are ignored, a
/// repeated field keeps its last non-null value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestDescription {
  pub url: Option<String>,
  pub method: Option<String>,
  pub headers: Option<Headers>,
  pub body: Option<String>,
}

struct RequestDescriptionVisitor;

impl<'de> Visitor<'de> for RequestDescriptionVisitor {
  type Value = RequestDescription;

  fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
    formatter.write_str("a request description object")
  }

  fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
    Ok(RequestDescription::default())
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
    let mut description = RequestDescription::default();

    while let Some(key) = access.next_key::<String>()? {
      match key.to_ascii_lowercase().as_str() {
        "url" => replace_if_some(&mut description.url, access.next_value()?),
        "method" => replace_if_some(&mut description.method, access.next_value()?),
        "headers" => replace_if_some(&mut description.headers, access.next_value()?),
        "body" => replace_if_some(&mut description.body, access.next_value()?),
        _ => {
          access.next_value::<IgnoredAny>()?;
        }
      }
    }

    Ok(description)
  }
}

fn replace_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
  if value.is_some() {
    *slot = value;
  }
}

impl<'de> Deserialize<'de> for RequestDescription {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(RequestDescriptionVisitor)
  }
}

/// A validated request ready to be forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
  url: Url,
  method: String,
  headers: Headers,
  body: Bytes,
}

impl ProxyRequest {
  pub(crate) fn new(url: Url, method: String, headers: Headers, body: Bytes) -> Self {
    Self {
      url,
      method,
      headers,
      body,
    }
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  pub fn method(&self) -> &str {
    &self.method
  }

  pub fn headers(&self) -> &Headers {
    &self.headers
  }

  pub fn body(&self) -> &Bytes {
    &self.body
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
  pub status_code: u16,
  pub headers: Headers,
  pub body: String,
}
