/// Data layer: discovery, parsing, and export.
///
/// Architecture:
/// ```text
///   root folder
///        │
///        ▼
///   ┌───────────┐
///   │ discovery │  walk tree → FileRecord (suffix match, marker pruned)
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐   ┌───────────┐
///   │  loader   │ ← │ path_meta │  .t2t body + folder name → ParsedTable
///   └───────────┘   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │  export   │  TableSink: CSV / Parquet / in-memory ConsolidatedTable
///   └───────────┘
/// ```

pub mod discovery;
pub mod export;
pub mod loader;
pub mod model;
pub mod path_meta;
