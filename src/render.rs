use crate::models::{MetricKind, RenderInstruction};
use serde::Serialize;
use std::io::Write;
use tracing::error;

/// Receiver of render instructions, typically a charting front end.
///
/// For any metric, `attach` is never called twice without a `teardown` in
/// between. Implementations drop whatever they drew for the metric on
/// `teardown`.
pub trait RenderSink {
    fn teardown(&mut self, metric: MetricKind);
    fn attach(&mut self, metric: MetricKind, instruction: &RenderInstruction);
}

/// The live render instruction of one metric.
#[derive(Debug, Clone, Default)]
pub struct RenderSlot {
    live: Option<RenderInstruction>,
    generation: u64,
}

impl RenderSlot {
    pub fn live(&self) -> Option<&RenderInstruction> {
        self.live.as_ref()
    }

    /// Load generation the live instruction came from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn replace<S: RenderSink>(
        &mut self,
        metric: MetricKind,
        instruction: RenderInstruction,
        generation: u64,
        sink: &mut S,
    ) {
        if self.live.take().is_some() {
            sink.teardown(metric);
        }
        sink.attach(metric, &instruction);
        self.live = Some(instruction);
        self.generation = generation;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    Teardown { metric: MetricKind },
    Attach { metric: MetricKind, instruction: RenderInstruction },
}

/// Keeps every event in order. Useful for embedding and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<RenderEvent>,
}

impl RecordingSink {
    pub fn attached(&self) -> impl Iterator<Item = &RenderInstruction> {
        self.events.iter().filter_map(|event| match event {
            RenderEvent::Attach { instruction, .. } => Some(instruction),
            RenderEvent::Teardown { .. } => None,
        })
    }

    pub fn latest(&self, metric: MetricKind) -> Option<&RenderInstruction> {
        self.attached().filter(|instruction| instruction.metric == metric).last()
    }
}

impl RenderSink for RecordingSink {
    fn teardown(&mut self, metric: MetricKind) {
        self.events.push(RenderEvent::Teardown { metric });
    }

    fn attach(&mut self, metric: MetricKind, instruction: &RenderInstruction) {
        self.events.push(RenderEvent::Attach {
            metric,
            instruction: instruction.clone(),
        });
    }
}

/// Writes one JSON object per event.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &RenderEvent) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            error!("failed to write render event: {err}");
        }
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn teardown(&mut self, metric: MetricKind) {
        self.emit(&RenderEvent::Teardown { metric });
    }

    fn attach(&mut self, metric: MetricKind, instruction: &RenderInstruction) {
        self.emit(&RenderEvent::Attach {
            metric,
            instruction: instruction.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn instruction(metric: MetricKind, display: &str) -> RenderInstruction {
        RenderInstruction {
            metric,
            labels: vec!["2024-06-15".to_string()],
            values: vec![8000.0],
            status: Status::Favorable,
            display_value: display.to_string(),
            reference_label: Some("7,500".to_string()),
        }
    }

    #[test]
    fn slot_tears_down_before_reattaching() {
        let mut sink = RecordingSink::default();
        let mut slot = RenderSlot::default();

        slot.replace(MetricKind::Steps, instruction(MetricKind::Steps, "1"), 1, &mut sink);
        slot.replace(MetricKind::Steps, instruction(MetricKind::Steps, "2"), 2, &mut sink);

        assert_eq!(sink.events.len(), 3);
        assert!(matches!(sink.events[0], RenderEvent::Attach { .. }));
        assert_eq!(sink.events[1], RenderEvent::Teardown { metric: MetricKind::Steps });
        assert_eq!(slot.live().map(|i| i.display_value.as_str()), Some("2"));
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn json_lines_are_tagged() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.teardown(MetricKind::Bmi);
        sink.attach(MetricKind::Steps, &instruction(MetricKind::Steps, "8,000"));

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0]["event"], "teardown");
        assert_eq!(lines[0]["metric"], "bmi");
        assert_eq!(lines[1]["event"], "attach");
        assert_eq!(lines[1]["instruction"]["display_value"], "8,000");
        assert_eq!(lines[1]["instruction"]["status"], "favorable");
    }
}
