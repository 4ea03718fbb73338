pub mod attachments;
pub mod gateway;
pub mod history;
pub mod prompt;
pub mod rate_limit;
pub mod sanitize;
pub mod settings;

pub use attachments::AttachmentProcessor;
pub use gateway::InferenceGateway;
pub use history::HistoryStore;
pub use rate_limit::RateLimiter;
pub use settings::SettingsStore;
