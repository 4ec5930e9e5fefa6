//! Domain models for the qsf-flow conversion pipeline.
//!
//! - [`localized`] - [`LocalizedText`], the language-code to string map used by every label
//! - [`qsf`] - the source survey document ([`SurveyDocument`])
//! - [`flow`] - the target flow document ([`FlowDocument`])
//! - [`import`] - CSV column mapping and bulk import rows
//! - [`account`] - API session and language catalog types

pub mod account;
pub mod flow;
pub mod import;
pub mod localized;
pub mod qsf;

pub use account::{Account, AccountSession, Language, LanguageCatalog, NodeRef};
pub use flow::{
    ChoiceOption, DetailExtra, ElementType, FlowDocument, FlowElement, FlowState, QuestionDetail,
    QuestionStyle, Statement,
};
pub use import::{import_headers, ColumnMapping, ImportContext, ImportRow, CANONICAL_KEYS};
pub use localized::LocalizedText;
pub use qsf::{
    Answer, Choice, OrderedMap, QuestionKind, QuestionPayload, SurveyDocument, SurveyElement,
    SurveyEntry,
};
