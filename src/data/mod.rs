/// Data layer: core types, loading, and window selection.
///
/// Architecture:
/// ```text
///  fig_4.dat / b0.txt (.csv)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse table → Spectrum / BackgroundCurve
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────────┐
///   │ Spectrum, BackgroundCurve │  Vec of typed rows, file order
///   └──────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  energy window → selected samples
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod synthetic;
