//! Synthesized responses

pub mod response;
pub mod synthesis;

pub use response::{DispatchOutcome, ReportSection, SectionStatus, SynthesizedResponse};
pub use synthesis::{LeadSummary, Synthesizer, parse_lead_summary};
