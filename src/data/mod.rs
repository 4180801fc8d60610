/// Data layer: core types, loading, filtering, and export.
///
/// Architecture:
/// ```text
///  .xlsx / .xls
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse workbook + header row → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named, typed columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  conditions + combine mode → matching rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Table → filtered_output.xlsx
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
