//! Cursor (keyset) pagination over SeaORM selects.
//!
//! The compiler turns a decoded cursor plus a sort spec into a row-wise
//! lexicographic comparison predicate, applies the ORDER BY, and derives the
//! next cursor from the last row of a page. Parsing cursor tokens belongs to
//! `page-core`; this module only consumes decoded values.

use std::collections::HashMap;

use chrono::Utc;
use page_core::{CursorV1, Page, PageError, PageInfo, PageQuery, SortDir, SortSpec};
use sea_orm::{
    sea_query::{Expr, Order},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use thiserror::Error;
use tracing::debug;

/// Type alias for cursor extraction function to reduce type complexity
type CursorExtractor<E> = fn(&<E as EntityTrait>::Model) -> String;

/// Whitelisted field kind, used to parse cursor key strings back into typed
/// SQL values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    DateTimeUtc,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
    pub to_string_for_cursor: Option<CursorExtractor<E>>,
}

/// Sortable-attribute whitelist of one entity. Lookup is case-insensitive;
/// only listed fields may appear in a sort spec or cursor.
#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map.insert(
            api_name.into().to_lowercase(),
            Field {
                col,
                kind,
                to_string_for_cursor: None,
            },
        );
        self
    }

    pub fn insert_with_extractor(
        mut self,
        api_name: impl Into<String>,
        col: E::Column,
        kind: FieldKind,
        to_string_for_cursor: CursorExtractor<E>,
    ) -> Self {
        self.map.insert(
            api_name.into().to_lowercase(),
            Field {
                col,
                kind,
                to_string_for_cursor: Some(to_string_for_cursor),
            },
        );
        self
    }

    pub fn encode_model_key(&self, model: &E::Model, field_name: &str) -> Option<String> {
        let f = self.get(field_name)?;
        f.to_string_for_cursor.map(|f| f(model))
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_lowercase())
    }
}

#[derive(Debug, Error, Clone)]
pub enum KeysetBuildError {
    #[error("unknown sort field: {0}")]
    UnknownField(String),

    #[error("cursor keys count mismatch with order fields")]
    KeyCountMismatch,

    #[error("{0}")]
    InvalidKeyValue(&'static str),

    #[error("field has no cursor extractor: {0}")]
    MissingExtractor(String),
}

pub type KeysetBuildResult<T> = Result<T, KeysetBuildError>;

impl From<KeysetBuildError> for PageError {
    fn from(e: KeysetBuildError) -> Self {
        match e {
            KeysetBuildError::UnknownField(f) | KeysetBuildError::MissingExtractor(f) => {
                PageError::InvalidSortField(f)
            }
            KeysetBuildError::KeyCountMismatch => PageError::CursorKeyCountMismatch,
            KeysetBuildError::InvalidKeyValue(_) => PageError::CursorInvalidKeys,
        }
    }
}

/* ---------- cursor value decoding ---------- */

/// Parse a cursor key string into a typed value based on field kind.
pub fn parse_cursor_value(kind: FieldKind, s: &str) -> KeysetBuildResult<sea_orm::Value> {
    use sea_orm::Value as V;

    let result = match kind {
        FieldKind::String => V::String(Some(Box::new(s.to_string()))),
        FieldKind::I64 => {
            let i = s
                .parse::<i64>()
                .map_err(|_| KeysetBuildError::InvalidKeyValue("invalid i64 in cursor"))?;
            V::BigInt(Some(i))
        }
        FieldKind::F64 => {
            let f = s
                .parse::<f64>()
                .map_err(|_| KeysetBuildError::InvalidKeyValue("invalid f64 in cursor"))?;
            V::Double(Some(f))
        }
        FieldKind::Bool => {
            let b = s
                .parse::<bool>()
                .map_err(|_| KeysetBuildError::InvalidKeyValue("invalid bool in cursor"))?;
            V::Bool(Some(b))
        }
        FieldKind::DateTimeUtc => {
            let dt = chrono::DateTime::parse_from_rfc3339(s)
                .map_err(|_| KeysetBuildError::InvalidKeyValue("invalid datetime in cursor"))?
                .with_timezone(&Utc);
            V::ChronoDateTimeUtc(Some(Box::new(dt)))
        }
    };

    Ok(result)
}

/* ---------- keyset predicate building ---------- */

/// Build the keyset continuation predicate for one page.
///
/// The predicate is the row-wise lexicographic comparison over the order
/// keys, expanded into the OR-of-AND chain:
/// for ASC  `(k0 > v0) OR (k0 = v0 AND k1 > v1) OR ...`
/// for DESC `(k0 < v0) OR (k0 = v0 AND k1 < v1) OR ...`
/// with the comparison per key following that key's own direction. Unlike
/// per-column independent comparisons, this excludes exactly the rows
/// already emitted, no matter how many leading keys tie.
pub fn build_keyset_predicate<E: EntityTrait>(
    cursor: &CursorV1,
    order: &SortSpec,
    fmap: &FieldMap<E>,
) -> KeysetBuildResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    if cursor.k.len() != order.0.len() {
        return Err(KeysetBuildError::KeyCountMismatch);
    }

    // Parse cursor values
    let mut cursor_values = Vec::new();
    for (i, key_str) in cursor.k.iter().enumerate() {
        let order_key = &order.0[i];
        let field = fmap
            .get(&order_key.field)
            .ok_or_else(|| KeysetBuildError::UnknownField(order_key.field.clone()))?;
        let value = parse_cursor_value(field.kind, key_str)?;
        cursor_values.push((field, value, order_key.dir));
    }

    let mut main_condition = Condition::any();

    for i in 0..cursor_values.len() {
        let mut prefix_condition = Condition::all();

        // Equality on all previous keys
        for (field, value, _) in cursor_values.iter().take(i) {
            prefix_condition = prefix_condition.add(Expr::col(field.col).eq(value.clone()));
        }

        // Strict comparison on the current key
        let (field, value, dir) = &cursor_values[i];
        let comparison = match dir {
            SortDir::Asc => Expr::col(field.col).gt(value.clone()),
            SortDir::Desc => Expr::col(field.col).lt(value.clone()),
        };
        prefix_condition = prefix_condition.add(comparison);

        main_condition = main_condition.add(prefix_condition);
    }

    Ok(main_condition)
}

/* ---------- ordering ---------- */

/// Apply ORDER BY for every key of the spec, each with its own direction.
pub fn apply_sort<E>(
    select: sea_orm::Select<E>,
    order: &SortSpec,
    fmap: &FieldMap<E>,
) -> Result<sea_orm::Select<E>, PageError>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let mut query = select;

    for order_key in &order.0 {
        let field = fmap
            .get(&order_key.field)
            .ok_or_else(|| PageError::InvalidSortField(order_key.field.clone()))?;

        let sea_order = match order_key.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };

        query = query.order_by(field.col, sea_order);
    }

    Ok(query)
}

/* ---------- cursor building ---------- */

/// Build the next cursor from the last row of a page, using the effective
/// order and the field map extractors.
pub fn build_cursor_for_model<E: EntityTrait>(
    model: &E::Model,
    order: &SortSpec,
    fmap: &FieldMap<E>,
    filter_hash: Option<String>,
) -> KeysetBuildResult<CursorV1> {
    let mut k = Vec::with_capacity(order.0.len());
    for key in &order.0 {
        let s = fmap
            .encode_model_key(model, &key.field)
            .ok_or_else(|| KeysetBuildError::MissingExtractor(key.field.clone()))?;
        k.push(s);
    }
    Ok(CursorV1 {
        k,
        o: order.primary_dir(),
        s: order.to_signed_tokens(),
        f: filter_hash,
    })
}

/* ---------- limit clamping ---------- */

#[derive(Clone, Copy, Debug)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

pub fn clamp_limit(req: Option<u64>, cfg: LimitCfg) -> u64 {
    let mut l = req.unwrap_or(cfg.default);
    if l == 0 {
        l = 1;
    }
    if l > cfg.max {
        l = cfg.max;
    }
    l
}

/* ---------- pagination combiner ---------- */

/// One-shot pagination combiner: cursor predicate → order → limit → execute →
/// count → build next cursor.
///
/// Order resolution follows the cursor-wins policy: when a cursor is present
/// its embedded signed order tokens define the effective order and the
/// caller-supplied order is ignored, so a page sequence stays consistent even
/// if the caller re-sends a different sort spec mid-walk. Without a cursor,
/// the caller's order is used with the tiebreaker key appended.
///
/// The limit is applied exactly; no OFFSET is ever emitted. The next cursor
/// is derived from the last row whenever the page is non-empty, and is
/// `None` only for an empty page (end of the sequence).
pub async fn paginate<E, D, F, C>(
    select: sea_orm::Select<E>,
    conn: &C,
    q: &PageQuery,
    fmap: &FieldMap<E>,
    tiebreaker: (&str, SortDir),
    limit_cfg: LimitCfg,
    model_to_item: F,
) -> Result<Page<D>, PageError>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
    E::Model: Send + Sync,
    F: Fn(E::Model) -> D,
    C: ConnectionTrait + Send + Sync,
{
    let limit = clamp_limit(q.limit, limit_cfg);

    // Effective order: the cursor's embedded order supersedes the caller's.
    let effective_order = if let Some(cur) = &q.cursor {
        SortSpec::from_signed_tokens(&cur.s).map_err(|_| PageError::CursorInvalidFields)?
    } else {
        q.order
            .clone()
            .ensure_tiebreaker(tiebreaker.0, tiebreaker.1)
    };

    // A cursor computed under a different filter would splice two unrelated
    // sequences; reject when both sides carry a hash and they differ.
    if let Some(cur) = &q.cursor {
        if let (Some(h), Some(cf)) = (q.filter_hash.as_deref(), cur.f.as_deref()) {
            if h != cf {
                return Err(PageError::FilterMismatch);
            }
        }
    }

    let mut s = select;

    if let Some(cursor) = &q.cursor {
        let cond = build_keyset_predicate(cursor, &effective_order, fmap)?;
        s = s.filter(cond);
    }

    s = apply_sort(s, &effective_order, fmap)?;

    // Total count of the remaining sequence, before the page limit.
    let count = s
        .clone()
        .count(conn)
        .await
        .map_err(|e| PageError::Db(e.to_string()))?;

    s = s.limit(limit);

    let rows = s
        .all(conn)
        .await
        .map_err(|e| PageError::Db(e.to_string()))?;

    debug!(
        rows = rows.len(),
        count,
        order = %effective_order,
        "fetched one keyset page"
    );

    let next_cursor = rows
        .last()
        .map(|m| {
            build_cursor_for_model::<E>(m, &effective_order, fmap, q.filter_hash.clone())
                .map(|c| c.encode())
        })
        .transpose()?;

    let items = rows.into_iter().map(model_to_item).collect();

    Ok(Page {
        items,
        page_info: PageInfo {
            next_cursor,
            count,
            limit,
        },
    })
}

#[cfg(test)]
#[path = "keyset_tests.rs"]
mod keyset_tests;
