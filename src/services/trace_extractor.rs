//! Execution trace extractor.
//!
//! Converts a heterogeneous trace (structured tool calls, explicit
//! invocation records, routing decisions, free-form narrative) into one
//! `StepSummary`. Capability detection runs in priority order (structured
//! call, then explicit invocation, then free-text mention) and the first
//! recorded occurrence per capability wins, so the same capability reported
//! through several shapes is counted once.
//!
//! Extraction is a pure function of the event sequence: identical input
//! yields an identical summary.

use std::collections::HashSet;

use crate::domain::models::{
    DetectionMethod, StepSummary, TimelineEntry, TimelineEntryKind, ToolExecution, TraceEvent,
    TraceEventKind,
};

/// Phrases that mark a sentence as a finding.
const FINDING_TRIGGERS: &[&str] = &[
    "identified",
    "indicates",
    "shows",
    "found",
    "detected",
    "root cause",
    "caused by",
];

/// Phrases that open a recommendation section.
const RECOMMENDATION_TRIGGERS: &[&str] = &["recommend", "suggest", "should", "next step"];

/// Keywords that precede a capability name in free text.
const MENTION_KEYWORDS: &[&str] = &["ran", "executed", "called", "invoked", "using"];

/// Extracts structured step summaries from execution traces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceExtractor;

impl TraceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a `StepSummary` from a sequence of trace events.
    pub fn extract(&self, events: &[TraceEvent]) -> StepSummary {
        let tools_executed = detect_tools(events);

        let mut diagnostic_steps = Vec::new();
        let mut key_findings = Vec::new();
        let mut recommendations = Vec::new();
        let mut timeline = Vec::new();

        for event in events {
            match &event.kind {
                TraceEventKind::Narrative { text } => {
                    for step in split_diagnostic_steps(text) {
                        timeline.push(TimelineEntry {
                            sequence_index: event.sequence_index,
                            entry_kind: TimelineEntryKind::DiagnosticStep,
                            description: step.clone(),
                        });
                        diagnostic_steps.push(step);
                    }
                    key_findings.extend(extract_findings(text));
                    recommendations.extend(extract_recommendations(text));
                }
                TraceEventKind::Routing { from_state, to_role, rationale } => {
                    timeline.push(TimelineEntry {
                        sequence_index: event.sequence_index,
                        entry_kind: TimelineEntryKind::Routing,
                        description: format!("{from_state} -> {to_role}: {rationale}"),
                    });
                }
                TraceEventKind::ToolCall { .. } | TraceEventKind::ToolInvocation { .. } => {}
            }
        }

        for tool in &tools_executed {
            timeline.push(TimelineEntry {
                sequence_index: tool.sequence_index,
                entry_kind: TimelineEntryKind::ToolExecution,
                description: tool.capability.clone(),
            });
        }

        // Stable sort: ties keep insertion order (steps before tools).
        timeline.sort_by_key(|entry| entry.sequence_index);

        StepSummary {
            tools_executed,
            diagnostic_steps,
            key_findings,
            recommendations,
            timeline,
        }
    }
}

/// Detect executed capabilities in priority order.
///
/// Three passes, highest priority first; a capability recorded by an earlier
/// pass is ignored thereafter. Results are ordered by sequence index.
fn detect_tools(events: &[TraceEvent]) -> Vec<ToolExecution> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut tools = Vec::new();

    for event in events {
        if let TraceEventKind::ToolCall { capability, arguments } = &event.kind {
            if seen.insert(capability.clone()) {
                tools.push(ToolExecution {
                    capability: capability.clone(),
                    detection: DetectionMethod::StructuredCall,
                    sequence_index: event.sequence_index,
                    arguments: arguments.clone(),
                });
            }
        }
    }

    for event in events {
        if let TraceEventKind::ToolInvocation { capability_id, arguments } = &event.kind {
            if seen.insert(capability_id.clone()) {
                tools.push(ToolExecution {
                    capability: capability_id.clone(),
                    detection: DetectionMethod::ExplicitInvocation,
                    sequence_index: event.sequence_index,
                    arguments: arguments.clone(),
                });
            }
        }
    }

    for event in events {
        if let TraceEventKind::Narrative { text } = &event.kind {
            for mention in text_mentions(text) {
                if seen.insert(mention.clone()) {
                    tools.push(ToolExecution {
                        capability: mention,
                        detection: DetectionMethod::TextMention,
                        sequence_index: event.sequence_index,
                        arguments: serde_json::Value::Null,
                    });
                }
            }
        }
    }

    tools.sort_by_key(|tool| tool.sequence_index);
    tools
}

/// A token that can plausibly name a capability.
fn is_capability_token(token: &str) -> bool {
    token.len() >= 3
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
}

/// Find capability names mentioned in free text.
///
/// Deterministic scan, in order of appearance: backtick-quoted identifiers,
/// identifiers preceded by an invocation keyword, and `<name> tool` phrases.
fn text_mentions(text: &str) -> Vec<String> {
    let mut mentions = Vec::new();

    // `capability_name`
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('`') else { break };
        let token = &after[..close];
        if is_capability_token(token) {
            mentions.push(token.to_string());
        }
        rest = &after[close + 1..];
    }

    // "ran capability_name" / "capability_name tool"
    let words: Vec<&str> = text.split_whitespace().collect();
    for window in words.windows(2) {
        let [first, second] = window else { continue };
        let first_clean = strip_punctuation(&first.to_lowercase()).to_string();
        let second_clean = strip_punctuation(&second.to_lowercase()).to_string();

        if MENTION_KEYWORDS.contains(&first_clean.as_str()) && is_capability_token(&second_clean) {
            mentions.push(second_clean);
        } else if second_clean == "tool" && is_capability_token(&first_clean) {
            mentions.push(first_clean);
        }
    }

    mentions
}

/// Split a narrative into diagnostic steps at section-boundary markers.
///
/// A boundary is a heading line (`#`-prefixed) or a `Step N:` line; the
/// step text is the marker line stripped of its marker.
fn split_diagnostic_steps(text: &str) -> Vec<String> {
    let mut steps = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            if !heading.is_empty() {
                steps.push(heading.to_string());
            }
        } else if is_step_marker(trimmed) {
            steps.push(trimmed.to_string());
        }
    }
    steps
}

fn is_step_marker(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.starts_with("step ") && line.contains(':')
}

/// Findings: sentences containing a finding trigger phrase.
fn extract_findings(text: &str) -> Vec<String> {
    let mut findings = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        for sentence in split_sentences(trimmed) {
            let lower = sentence.to_lowercase();
            if FINDING_TRIGGERS.iter().any(|t| lower.contains(t)) {
                findings.push(sentence);
            }
        }
    }
    findings
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recommendations: lines of a section opened by a recommendation trigger,
/// collected until a blank line or the next section boundary.
fn extract_recommendations(text: &str) -> Vec<String> {
    let mut recommendations = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        let is_boundary = trimmed.starts_with('#') || is_step_marker(trimmed);

        if in_section {
            if trimmed.is_empty() || is_boundary {
                in_section = false;
            } else {
                recommendations.push(strip_bullet(trimmed).to_string());
            }
        }

        if !in_section
            && !trimmed.is_empty()
            && RECOMMENDATION_TRIGGERS.iter().any(|t| lower.contains(t))
        {
            in_section = true;
            // A trigger line that already carries content counts too.
            if !is_boundary {
                recommendations.push(strip_bullet(trimmed).to_string());
            }
        }
    }

    recommendations
}

fn strip_bullet(line: &str) -> &str {
    let trimmed = line
        .trim_start_matches(['-', '*'])
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')']);
    trimmed.trim()
}
