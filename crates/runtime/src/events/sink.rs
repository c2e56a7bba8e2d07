//! Presentation sink that forwards everything to the event bus.

use battle_core::{
    AnimationProgress, AnimationRequest, BattleEvent, BattleMessage, PresentationSink, TextColor,
};

use super::{Event, EventBus, LogLine};

/// Headless sink: animations finish as soon as they are requested, log
/// lines are both published and kept until the session collects them.
pub struct ChannelSink {
    bus: EventBus,
    lines: Vec<String>,
}

impl ChannelSink {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            lines: Vec::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Log lines produced since the last call.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl PresentationSink for ChannelSink {
    fn notify(&mut self, event: BattleEvent) {
        tracing::trace!(?event, "battle event");
        self.bus.publish(Event::Battle(event));
    }

    fn show_message(&mut self, message: BattleMessage, color: TextColor) {
        let text = message.to_string();
        self.lines.push(text.clone());
        self.bus.publish(Event::Log(LogLine { text, color }));
    }

    fn request_animation(&mut self, request: AnimationRequest) -> AnimationProgress {
        self.bus.publish(Event::Animation(request));
        AnimationProgress::Finished
    }
}
