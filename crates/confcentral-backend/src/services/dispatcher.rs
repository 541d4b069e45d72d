use std::sync::Arc;

use async_trait::async_trait;

use confcentral::data::{ConfirmationEmailParams, SpeakerAnnouncementParams};
use confcentral::errors::ServiceError;

use crate::mail::{Mail, Mailer};
use crate::services::AnnouncementService;
use crate::tasks::{Task, TaskHandler};

pub const CONFIRMATION_SUBJECT: &str = "You created a new Conference!";

/// Runs queued tasks; shared by the worker and the internal task endpoints.
#[derive(Clone)]
pub struct TaskDispatcher {
    announcements: AnnouncementService,
    mailer: Arc<dyn Mailer>,
    sender: String,
}

impl TaskDispatcher {
    pub fn new(announcements: AnnouncementService, mailer: Arc<dyn Mailer>, sender: String) -> Self {
        Self {
            announcements,
            mailer,
            sender,
        }
    }

    pub async fn send_confirmation_email(&self, params: &ConfirmationEmailParams) -> Result<(), ServiceError> {
        self.mailer
            .send(Mail {
                from: self.sender.clone(),
                to: params.email.clone(),
                subject: CONFIRMATION_SUBJECT.to_string(),
                body: format!(
                    "Hi, you have created a following conference:\r\n\r\n{}",
                    params.conference_info
                ),
            })
            .await
    }

    pub async fn set_speaker_announcement(&self, params: &SpeakerAnnouncementParams) -> Result<(), ServiceError> {
        self.announcements
            .refresh_featured_speaker(&params.speaker, &params.websafe_conference_key)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl TaskHandler for TaskDispatcher {
    async fn handle(&self, task: &Task) -> Result<(), ServiceError> {
        match task {
            Task::SendConfirmationEmail(params) => self.send_confirmation_email(params).await,
            Task::SetSpeakerAnnouncement(params) => self.set_speaker_announcement(params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::RecordingMailer;
    use crate::services::testing::Harness;
    use confcentral::id::ConferenceKey;

    #[tokio::test]
    async fn confirmation_mail_uses_the_app_sender() {
        let harness = Harness::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = TaskDispatcher::new(
            harness.announcements.clone(),
            mailer.clone(),
            "noreply@conference-central.appspotmail.com".to_string(),
        );

        dispatcher
            .handle(&Task::SendConfirmationEmail(ConfirmationEmailParams {
                email: "ferris@example.com".to_string(),
                conference_info: "name: RustConf".to_string(),
            }))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "noreply@conference-central.appspotmail.com");
        assert_eq!(sent[0].to, "ferris@example.com");
        assert_eq!(sent[0].subject, CONFIRMATION_SUBJECT);
        assert!(sent[0].body.ends_with("name: RustConf"));
    }

    #[tokio::test]
    async fn speaker_task_for_a_missing_conference_fails() {
        let harness = Harness::new();
        let dispatcher = TaskDispatcher::new(
            harness.announcements.clone(),
            Arc::new(RecordingMailer::default()),
            String::new(),
        );

        let result = dispatcher
            .handle(&Task::SetSpeakerAnnouncement(SpeakerAnnouncementParams {
                speaker: "Ferris".to_string(),
                websafe_conference_key: ConferenceKey::from("missing"),
            }))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
