pub mod app_config;
pub mod document_repo;
pub mod documents;
pub mod gateway;
pub mod mailer;
pub mod memory;
pub mod uploads;

pub use app_config::Config;
pub use document_repo::PgDocumentStore;
pub use gateway::RazorpayClient;
pub use mailer::{LogNotifier, SmtpNotifier};
pub use memory::MemoryStore;
pub use uploads::FsArtifactStore;
