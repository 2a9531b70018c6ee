//! Storage-agnostic vocabulary for cursor (keyset) pagination.
//!
//! This crate defines the sort specification, the opaque page cursor and the
//! page envelope. Compiling these values into SQL belongs to the database
//! layer (`cinevault-db`); parsing client input belongs to the API layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod page;
pub use page::{Page, PageInfo};


/// Unified pagination error, shared by the codec and the query compiler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid cursor: invalid base64url encoding")]
    CursorInvalidBase64,

    #[error("invalid cursor: invalid JSON payload")]
    CursorInvalidJson,

    #[error("invalid cursor: unsupported version")]
    CursorInvalidVersion,

    #[error("invalid cursor: empty key values")]
    CursorInvalidKeys,

    #[error("invalid cursor: empty order fields")]
    CursorInvalidFields,

    #[error("invalid cursor: invalid sort direction")]
    CursorInvalidDirection,

    #[error("invalid cursor: key count does not match order fields")]
    CursorKeyCountMismatch,

    #[error("unsupported sort field: {0}")]
    InvalidSortField(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("cursor filter does not match the requested filter")]
    FilterMismatch,

    #[error("invalid page limit")]
    InvalidLimit,

    #[error("database error: {0}")]
    Db(String),
}

/// Sort direction of a single order key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

/// One column of a sort specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Ordered sort specification. The sequence position is the tie-break
/// precedence; the direction is per key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortSpec(pub Vec<OrderKey>);

impl SortSpec {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Direction of the first key; `Asc` for an empty spec.
    pub fn primary_dir(&self) -> SortDir {
        self.0.first().map(|k| k.dir).unwrap_or(SortDir::Asc)
    }

    /// Serialize to the compact signed form carried inside cursors,
    /// e.g. `-like_count,+id`.
    pub fn to_signed_tokens(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => format!("+{}", k.field),
                SortDir::Desc => format!("-{}", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the signed form. A token without a sign is ascending; empty
    /// segments are skipped; an entirely empty spec is rejected.
    pub fn from_signed_tokens(s: &str) -> Result<Self, PageError> {
        let mut keys = Vec::new();
        for raw in s.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (dir, field) = if let Some(rest) = token.strip_prefix('+') {
                (SortDir::Asc, rest)
            } else if let Some(rest) = token.strip_prefix('-') {
                (SortDir::Desc, rest)
            } else {
                (SortDir::Asc, token)
            };
            if field.is_empty() {
                return Err(PageError::InvalidSortField(token.to_string()));
            }
            keys.push(OrderKey {
                field: field.to_string(),
                dir,
            });
        }
        if keys.is_empty() {
            return Err(PageError::InvalidSortField(s.to_string()));
        }
        Ok(Self(keys))
    }

    /// Parse the `column_ASC` / `column_DESC` wire form used by list queries.
    pub fn from_order_strings<S: AsRef<str>>(parts: &[S]) -> Result<Self, PageError> {
        let mut keys = Vec::new();
        for part in parts {
            let part = part.as_ref().trim();
            let Some((field, dir)) = part.rsplit_once('_') else {
                return Err(PageError::InvalidSortDirection(part.to_string()));
            };
            let dir = match dir {
                "ASC" => SortDir::Asc,
                "DESC" => SortDir::Desc,
                other => return Err(PageError::InvalidSortDirection(other.to_string())),
            };
            if field.is_empty() {
                return Err(PageError::InvalidSortField(part.to_string()));
            }
            keys.push(OrderKey {
                field: field.to_string(),
                dir,
            });
        }
        if keys.is_empty() {
            return Err(PageError::InvalidSortField(String::new()));
        }
        Ok(Self(keys))
    }

    /// Append a tiebreaker key unless the field is already present. A key
    /// that is already in the spec keeps its original direction.
    pub fn ensure_tiebreaker(mut self, field: &str, dir: SortDir) -> Self {
        if !self.0.iter().any(|k| k.field == field) {
            self.0.push(OrderKey {
                field: field.to_string(),
                dir,
            });
        }
        self
    }

    /// Compare against a signed-token string, tolerating whitespace and an
    /// implicit ascending sign.
    pub fn equals_signed_tokens(&self, s: &str) -> bool {
        match Self::from_signed_tokens(s) {
            Ok(other) => *self == other,
            Err(_) => false,
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }
        let rendered = self
            .0
            .iter()
            .map(|k| {
                let dir = match k.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                };
                format!("{} {}", k.field, dir)
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{rendered}")
    }
}

/// URL-safe unpadded base64, the outer layer of the cursor token.
pub mod base64_url {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(s)
    }
}

/// Versioned page cursor: the last-seen key values of a page together with
/// the sort order that produced them.
///
/// `k` holds one stringified value per order key, in the order of `s`.
/// `o` is the primary sort direction, `f` an optional hash of the filter the
/// page was computed under. The token is opaque to clients; it round-trips
/// through [`CursorV1::encode`] / [`CursorV1::decode`] without loss.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorV1 {
    pub k: Vec<String>,
    pub o: SortDir,
    pub s: String,
    pub f: Option<String>,
}

#[derive(Serialize)]
struct CursorWire<'a> {
    v: u8,
    k: &'a [String],
    o: SortDir,
    s: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    f: Option<&'a str>,
}

impl CursorV1 {
    /// Serialize to the opaque token form. Deterministic: the same cursor
    /// always encodes to the same token.
    pub fn encode(&self) -> String {
        let wire = CursorWire {
            v: 1,
            k: &self.k,
            o: self.o,
            s: &self.s,
            f: self.f.as_deref(),
        };
        let json = serde_json::to_vec(&wire).expect("cursor serialization cannot fail");
        base64_url::encode(&json)
    }

    /// Decode and structurally validate a token.
    ///
    /// Only structure is checked: key values referencing rows that have since
    /// been deleted still decode fine; the next query simply returns fewer or
    /// adjusted rows.
    pub fn decode(token: &str) -> Result<Self, PageError> {
        let bytes = base64_url::decode(token).map_err(|_| PageError::CursorInvalidBase64)?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| PageError::CursorInvalidJson)?;
        let obj = value.as_object().ok_or(PageError::CursorInvalidJson)?;

        match obj.get("v").and_then(|v| v.as_u64()) {
            Some(1) => {}
            _ => return Err(PageError::CursorInvalidVersion),
        }

        let k: Vec<String> = obj
            .get("k")
            .and_then(|v| v.as_array())
            .ok_or(PageError::CursorInvalidKeys)?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<_>>()
            .ok_or(PageError::CursorInvalidKeys)?;
        if k.is_empty() {
            return Err(PageError::CursorInvalidKeys);
        }

        let o = match obj.get("o").and_then(|v| v.as_str()) {
            Some("asc") => SortDir::Asc,
            Some("desc") => SortDir::Desc,
            _ => return Err(PageError::CursorInvalidDirection),
        };

        let s = obj
            .get("s")
            .and_then(|v| v.as_str())
            .ok_or(PageError::CursorInvalidFields)?
            .to_string();
        if s.trim().is_empty() {
            return Err(PageError::CursorInvalidFields);
        }

        let f = match obj.get("f") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(hash)) => Some(hash.clone()),
            Some(_) => return Err(PageError::CursorInvalidJson),
        };

        let order =
            SortSpec::from_signed_tokens(&s).map_err(|_| PageError::CursorInvalidFields)?;
        if order.0.len() != k.len() {
            return Err(PageError::CursorKeyCountMismatch);
        }

        Ok(Self { k, o, s, f })
    }

    /// The sort spec embedded in this cursor. Per the cursor-wins policy it
    /// supersedes any sort spec supplied alongside the cursor.
    pub fn order(&self) -> Result<SortSpec, PageError> {
        SortSpec::from_signed_tokens(&self.s)
    }
}

/// Assembled input of one page query.
#[derive(Clone, Debug, Default)]
pub struct PageQuery {
    pub order: SortSpec,
    pub cursor: Option<CursorV1>,
    pub limit: Option<u64>,
    pub filter_hash: Option<String>,
}

impl PageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: SortSpec) -> Self {
        self.order = order;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorV1) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filter_hash(mut self, hash: String) -> Self {
        self.filter_hash = Some(hash);
        self
    }
}
