pub mod analysis;
pub mod document;
pub mod draft;
pub mod quota;
pub mod strategy;

pub use analysis::{
    DocumentType, ProcessingMetrics, ReadingLevel, Section, SectionKind, StructuredData,
    TableRegion,
};
pub use document::{Document, DocumentId, DocumentSource, ExtractionResult, SourceKind};
pub use draft::{Draft, InputKind};
pub use quota::RateLimitStatus;
pub use strategy::{ExecutionPlan, ProcessingOption, ProcessingStrategy};
