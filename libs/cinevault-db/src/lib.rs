//! SeaORM keyset-pagination compiler for CineVault.
//!
//! `page-core` defines the vocabulary (sort specs, cursors, page envelopes);
//! this crate compiles those values into SeaORM query fragments and provides
//! the one-shot [`keyset::paginate`] combiner used by repository adapters.

pub mod keyset;

pub use keyset::{
    apply_sort, build_cursor_for_model, build_keyset_predicate, clamp_limit, paginate, Field,
    FieldKind, FieldMap, KeysetBuildError, LimitCfg,
};

// Re-export the shared pagination types for adapter convenience.
pub use page_core::{CursorV1, Page, PageError, PageInfo, PageQuery, SortDir, SortSpec};
