//! Output formatter trait

use crew_domain::SynthesizedResponse;

/// Trait for formatting synthesized responses
pub trait OutputFormatter {
    /// Format the complete response
    fn format(&self, response: &SynthesizedResponse) -> String;

    /// Format as JSON
    fn format_json(&self, response: &SynthesizedResponse) -> String;
}
