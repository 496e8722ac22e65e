use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("bricktutor.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("bricktutor.client.request_errors");
pub(crate) static CLIENT_BLOCKED_RESPONSES: Counter =
    Counter::new("bricktutor.client.blocked_responses");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("bricktutor.client.request_duration_seconds");

pub(crate) static CHAT_SUBMITS: Counter = Counter::new("bricktutor.chat.submits");
pub(crate) static CHAT_SUBMITS_IGNORED: Counter = Counter::new("bricktutor.chat.submits_ignored");
pub(crate) static CHAT_SUBMITS_BUSY: Counter = Counter::new("bricktutor.chat.submits_busy");
pub(crate) static CHAT_TURN_FAILURES: Counter = Counter::new("bricktutor.chat.turn_failures");
pub(crate) static CHAT_RESETS: Counter = Counter::new("bricktutor.chat.resets");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("bricktutor.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_BLOCKED_RESPONSES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_SUBMITS);
    collector.register_counter(&CHAT_SUBMITS_IGNORED);
    collector.register_counter(&CHAT_SUBMITS_BUSY);
    collector.register_counter(&CHAT_TURN_FAILURES);
    collector.register_counter(&CHAT_RESETS);
    collector.register_moments(&CHAT_TURN_DURATION);
}
