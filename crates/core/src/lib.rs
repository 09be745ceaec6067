pub mod classify;
pub mod config;
pub mod eval;
pub mod ignore;
pub mod markdown;
pub mod model;
pub mod registry;
pub mod scan;
pub mod section;

pub use classify::Classifier;
pub use config::{load_classifier, ClassifierConfig, ConfigError};
pub use eval::{
    evaluate_suite, evaluate_suite_file, outcome_label, EvaluationCase, EvaluationCaseResult,
    EvaluationResult, EvaluationSuite,
};
pub use ignore::{
    IgnoreCatalog, IgnoreEntries, IgnorePattern, PatternError, IGNORE_BINARIES, IGNORE_FILENAMES,
    IGNORE_SHARED_LIBS,
};
pub use markdown::render_markdown_summary;
pub use model::{
    Blob, BlobPathError, ClassificationReport, ClassificationResult, ExcludedBlob,
    ExclusionCount, IgnoreRule, ScanMetadata, ScanMetrics, SectionGroup, REPORT_VERSION,
};
pub use registry::{SectionRegistry, SectionRegistryBuilder};
pub use scan::{classify_blobs, collect_blobs, run_classification, ScanOptions, WalkOutput};
pub use section::{builtin_sections, Section};
