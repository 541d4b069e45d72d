use async_trait::async_trait;

use confcentral::errors::ServiceError;
use confcentral::log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), ServiceError>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), ServiceError> {
        if mail.to.is_empty() {
            return Err(ServiceError::BadRequest("Mail needs a recipient".to_string()));
        }

        log::info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "Sending mail\n{}",
            mail.body
        );
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<Mail>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}
