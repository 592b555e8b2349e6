//! Execution trace events and the structured step summary.
//!
//! A trace is a flat, sequence-ordered list of everything that happened
//! during a run: capability invocations, routing decisions, and narrative
//! fragments. One tagged `TraceEventKind` replaces the several ad hoc
//! "a tool was called" shapes the trace can arrive in; the extractor applies
//! a documented detection priority across them.

use serde::{Deserialize, Serialize};

/// One atomic occurrence during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Strictly increasing; relative timestamp and tie-break.
    pub sequence_index: u64,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

impl TraceEvent {
    pub fn new(sequence_index: u64, kind: TraceEventKind) -> Self {
        Self { sequence_index, kind }
    }
}

/// The shape of a trace event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// Structured capability call record (highest detection priority).
    ToolCall {
        capability: String,
        arguments: serde_json::Value,
    },
    /// Explicit id+arguments record, e.g. replayed from an external log.
    ToolInvocation {
        capability_id: String,
        arguments: serde_json::Value,
    },
    /// Free-form narrative fragment; may mention capabilities by name.
    Narrative { text: String },
    /// A triage routing decision.
    Routing {
        from_state: String,
        to_role: String,
        rationale: String,
    },
}

/// How a capability execution was detected in the trace.
///
/// Ordering is the detection priority: once a capability is recorded by a
/// higher-priority method, lower-priority mentions of it are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    StructuredCall,
    ExplicitInvocation,
    TextMention,
}

/// One deduplicated capability execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub capability: String,
    pub detection: DetectionMethod,
    pub sequence_index: u64,
    /// Arguments for structured detections, `Null` for text mentions.
    pub arguments: serde_json::Value,
}

/// An entry in the merged, sequence-ordered timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub sequence_index: u64,
    #[serde(rename = "kind")]
    pub entry_kind: TimelineEntryKind,
    pub description: String,
}

/// Discriminator for timeline entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEntryKind {
    Routing,
    ToolExecution,
    DiagnosticStep,
}

/// Structured digest of a trace event sequence.
///
/// Pure data: extracting the same trace twice yields an identical summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Ordered, deduplicated by capability name (first occurrence wins,
    /// by detection priority).
    pub tools_executed: Vec<ToolExecution>,
    /// Narrative sections, split on section-boundary markers.
    pub diagnostic_steps: Vec<String>,
    /// Sentences containing a finding trigger phrase.
    pub key_findings: Vec<String>,
    /// Lines from recommendation sections.
    pub recommendations: Vec<String>,
    /// Sequence-ordered merge of routing decisions, tool executions, and
    /// diagnostic steps.
    pub timeline: Vec<TimelineEntry>,
}
