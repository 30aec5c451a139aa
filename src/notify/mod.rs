/// Slack reporting
pub mod slack;

pub use slack::SlackNotifier;
