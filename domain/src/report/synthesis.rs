//! Merging agent results into one report.
//!
//! Sections follow capability order (knowledge base, web, code). Content is
//! split into markdown units (headings, paragraphs, list items, fenced code)
//! and a paragraph or list item already seen in an earlier section is
//! dropped. Code blocks are never deduplicated. List items under a
//! "Recommendations" / "Next steps" heading are lifted out of the section
//! into the response-wide recommendations.

use super::response::{DispatchOutcome, ReportSection, SectionStatus, SynthesizedResponse};
use crate::capability::entities::Capability;
use crate::core::string::{normalize_for_comparison, truncate};
use crate::gate::{GateCheck, GateOutcome, check_memo};
use std::collections::HashSet;

const SUMMARY_POINT_MAX: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Heading,
    Prose,
    Bullet,
    Code,
}

#[derive(Debug, Clone)]
struct Unit {
    kind: UnitKind,
    text: String,
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn bullet_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

fn split_units(content: &str) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut code: Option<Vec<&str>> = None;

    fn flush(prose: &mut Vec<&str>, units: &mut Vec<Unit>) {
        if !prose.is_empty() {
            units.push(Unit {
                kind: UnitKind::Prose,
                text: prose.join("\n"),
            });
            prose.clear();
        }
    }

    for line in content.lines() {
        if let Some(block) = code.as_mut() {
            block.push(line);
            if is_fence(line) {
                units.push(Unit {
                    kind: UnitKind::Code,
                    text: block.join("\n"),
                });
                code = None;
            }
            continue;
        }
        if is_fence(line) {
            flush(&mut prose, &mut units);
            code = Some(vec![line]);
        } else if line.trim().is_empty() {
            flush(&mut prose, &mut units);
        } else if line.trim_start().starts_with('#') {
            flush(&mut prose, &mut units);
            units.push(Unit {
                kind: UnitKind::Heading,
                text: line.trim().to_string(),
            });
        } else if bullet_body(line).is_some() {
            flush(&mut prose, &mut units);
            units.push(Unit {
                kind: UnitKind::Bullet,
                text: line.trim_end().to_string(),
            });
        } else if prose.is_empty()
            && line.starts_with(char::is_whitespace)
            && let Some(last) = units.last_mut()
            && last.kind == UnitKind::Bullet
        {
            // Continuation of a wrapped list item
            last.text.push('\n');
            last.text.push_str(line.trim_end());
        } else {
            prose.push(line.trim_end());
        }
    }
    flush(&mut prose, &mut units);
    if let Some(block) = code {
        units.push(Unit {
            kind: UnitKind::Code,
            text: block.join("\n"),
        });
    }
    units
}

fn join_units(units: &[Unit]) -> String {
    let mut out = String::new();
    let mut previous: Option<UnitKind> = None;
    for unit in units {
        if let Some(prev) = previous {
            if prev == UnitKind::Bullet && unit.kind == UnitKind::Bullet {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(&unit.text);
        previous = Some(unit.kind);
    }
    out
}

fn is_recommendation_heading(heading: &str) -> bool {
    let normalized = normalize_for_comparison(heading);
    ["recommend", "next step", "recomendac", "próximos pasos", "proximos pasos"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

fn is_summary_heading(heading: &str) -> bool {
    let normalized = normalize_for_comparison(heading);
    normalized.contains("summary") || normalized.contains("resumen")
}

/// First sentence of a block, flattened to one line.
fn first_sentence(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let end = flat
        .char_indices()
        .find(|(i, c)| {
            matches!(c, '.' | '?' | '!')
                && flat[i + c.len_utf8()..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(flat.len());
    truncate(&flat[..end], SUMMARY_POINT_MAX)
}

struct SectionBuilder<'a> {
    seen_points: &'a mut HashSet<String>,
    recommendations: &'a mut Vec<String>,
    seen_recommendations: &'a mut HashSet<String>,
}

impl SectionBuilder<'_> {
    fn push_recommendation(&mut self, text: &str) {
        let key = normalize_for_comparison(text);
        if !key.is_empty() && self.seen_recommendations.insert(key) {
            self.recommendations.push(text.to_string());
        }
    }

    /// Deduplicated body units plus the text used for the summary point
    fn build(&mut self, content: &str) -> (Vec<Unit>, Option<String>) {
        let mut kept = Vec::new();
        let mut lead: Option<String> = None;
        let mut bullet_lead: Option<String> = None;
        let mut in_recommendations = false;

        for unit in split_units(content) {
            match unit.kind {
                UnitKind::Heading => {
                    in_recommendations = is_recommendation_heading(&unit.text);
                    if !in_recommendations {
                        kept.push(unit);
                    }
                }
                UnitKind::Code => {
                    in_recommendations = false;
                    kept.push(unit);
                }
                UnitKind::Prose | UnitKind::Bullet if in_recommendations => {
                    let text = bullet_body(&unit.text).unwrap_or(&unit.text).to_string();
                    self.push_recommendation(&text);
                }
                UnitKind::Prose | UnitKind::Bullet => {
                    let key = normalize_for_comparison(&unit.text);
                    if !key.is_empty() && !self.seen_points.insert(key) {
                        continue;
                    }
                    if unit.kind == UnitKind::Prose {
                        lead.get_or_insert_with(|| unit.text.clone());
                    } else if let Some(body) = bullet_body(&unit.text) {
                        bullet_lead.get_or_insert_with(|| body.to_string());
                    }
                    kept.push(unit);
                }
            }
        }
        (kept, lead.or(bullet_lead))
    }
}

/// Deterministic synthesis of dispatch outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer;

impl Synthesizer {
    pub fn synthesize(outcomes: &[DispatchOutcome], gate: Option<GateOutcome>) -> SynthesizedResponse {
        let mut ordered: Vec<&DispatchOutcome> = outcomes.iter().collect();
        ordered.sort_by_key(|o| o.capability());

        let mut seen_points = HashSet::new();
        let mut seen_citations = HashSet::new();
        let mut recommendations = Vec::new();
        let mut seen_recommendations = HashSet::new();
        let mut summary = Vec::new();
        let mut sections = Vec::new();
        let ungated = gate.as_ref().is_some_and(GateOutcome::is_ungated);

        for outcome in ordered {
            let capability = outcome.capability();
            let title = capability.section_title().to_string();
            let source = outcome.agent().map(str::to_string);

            let Some(result) = outcome.result() else {
                sections.push(ReportSection {
                    capability,
                    title,
                    source,
                    status: SectionStatus::Unavailable {
                        reason: outcome.unavailable_reason().unwrap_or_default(),
                    },
                    body: String::new(),
                    citations: Vec::new(),
                });
                continue;
            };

            let mut builder = SectionBuilder {
                seen_points: &mut seen_points,
                recommendations: &mut recommendations,
                seen_recommendations: &mut seen_recommendations,
            };
            let (units, lead) = builder.build(&result.content);

            let point = match check_memo(&result.content) {
                GateCheck::Satisfied(memo) if capability == Capability::CodeGeneration => {
                    Some(first_sentence(&memo.what))
                }
                _ => lead.as_deref().map(first_sentence),
            };
            if let Some(point) = point.filter(|p| !p.is_empty()) {
                summary.push(format!("**{}:** {}", title, point));
            }

            let body = if units.is_empty() {
                "_Everything in this section was already covered above._".to_string()
            } else {
                join_units(&units)
            };

            let citations = result
                .citations
                .iter()
                .filter(|c| seen_citations.insert(c.dedup_key()))
                .cloned()
                .collect();

            // Under a gated cycle, code outside the code section has no memo
            let carries_code = units.iter().any(|u| u.kind == UnitKind::Code);
            let status = match capability {
                Capability::CodeGeneration if ungated => SectionStatus::Ungated,
                Capability::CodeGeneration => SectionStatus::Available,
                _ if gate.is_some() && carries_code => SectionStatus::Ungated,
                _ => SectionStatus::Available,
            };

            sections.push(ReportSection {
                capability,
                title,
                source,
                status,
                body,
                citations,
            });
        }

        if summary.is_empty() {
            summary.push("No source produced a usable answer for this request.".to_string());
        }
        if sections.iter().any(|s| s.status == SectionStatus::Ungated) {
            recommendations.push(
                "Write a Decision Memo (WHAT, WHY, WHO, WHERE, WHEN) and review impact and risk before applying the proposed code.".to_string(),
            );
        }
        for section in sections.iter().filter(|s| !s.is_available()) {
            recommendations.push(format!(
                "Ask again once {} is reachable; it was left out of this answer.",
                section.title
            ));
        }

        SynthesizedResponse {
            executive_summary: summary,
            sections,
            recommendations,
            warnings: Vec::new(),
            gate,
        }
    }
}

/// Summary points and recommendations written by a lead model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSummary {
    pub summary: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Parse a lead model reply into summary and recommendation bullets.
///
/// Returns `None` when the reply has no summary bullets.
pub fn parse_lead_summary(text: &str) -> Option<LeadSummary> {
    #[derive(PartialEq)]
    enum Target {
        None,
        Summary,
        Recommendations,
    }

    let mut target = Target::None;
    let mut summary = Vec::new();
    let mut recommendations = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            target = if is_summary_heading(trimmed) {
                Target::Summary
            } else if is_recommendation_heading(trimmed) {
                Target::Recommendations
            } else {
                Target::None
            };
            continue;
        }
        let Some(item) = bullet_body(trimmed) else {
            continue;
        };
        match target {
            Target::Summary => summary.push(item.to_string()),
            Target::Recommendations => recommendations.push(item.to_string()),
            Target::None => {}
        }
    }

    (!summary.is_empty()).then_some(LeadSummary {
        summary,
        recommendations,
    })
}
