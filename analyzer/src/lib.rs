//! §4.C/D/E: `Transformer` derivations, the fixed detector module battery,
//! `AnalysisContext`, `Analyzer::run`, interpretation and `compare`.

pub mod analyzer;
pub mod config;
pub mod context;
pub mod interpretation;
pub mod module;
pub mod modules;
pub mod services;
pub mod transformer;
pub mod util;

pub use analyzer::{AnalysisResult, Analyzer, Task};
pub use config::Config;
pub use context::{AnalysisContext, ModuleOutcome};
pub use interpretation::{compare, detected_keys, interpret, Comparison, Interpretation};
pub use module::{Module, ScanContext, ScanOutcome};
pub use services::AnalysisServices;
pub use transformer::Transformer;
