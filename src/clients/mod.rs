pub mod document_store_client;
pub mod mail_client;

pub use document_store_client::{DocumentAccess, DocumentStore, HttpDocumentStore};
pub use mail_client::{HttpMailer, MailMessage, Mailer};
