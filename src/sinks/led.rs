use crate::assistant::Feedback;

/// Accepts one symbolic state at a time; drawing it is the renderer's business.
pub trait LedRenderer: Send {
    fn render(&mut self, feedback: Feedback);
}

/// Renderer for boards without a pixel strip: logs each requested state.
#[derive(Debug, Default)]
pub struct TracingLed {
    last: Option<Feedback>,
}

impl TracingLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Feedback> {
        self.last
    }
}

impl LedRenderer for TracingLed {
    fn render(&mut self, feedback: Feedback) {
        tracing::info!(
            led = feedback.led_state().as_str(),
            feedback = feedback.name(),
            "led"
        );
        self.last = Some(feedback);
    }
}
