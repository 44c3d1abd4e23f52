pub mod config;
pub mod discovery;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use crate::config::{ConfigError, RunConfiguration, DEFAULT_MODELS};
pub use discovery::{ExtensionSet, FileDiscoverer, SourceFile};
pub use llm::{build_classifier, Classifier, ClassifierSettings, NoopClassifier, ProviderKind};
pub use normalize::{normalize, EmptySource};
pub use pipeline::{analyze_model, run_models, FileRecord, ModelOutcome, RecordStatus};
pub use report::{build_workbook, report_path, write_report};
