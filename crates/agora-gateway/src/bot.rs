use agora_types::models::BotContent;

use crate::commands::BotCommand;
use crate::services::{ExternalServices, ServiceError};

/// Run one bot command. Makes at most one attempt per service call and
/// never touches room state.
pub async fn run(
    services: &dyn ExternalServices,
    command: &BotCommand,
) -> Result<BotContent, ServiceError> {
    match command {
        BotCommand::Ask { question } => {
            let text = services.ask_chat(question).await?;
            Ok(BotContent::Answer { text })
        }
        BotCommand::Play { song } => {
            let media = services.search_media(song).await?;
            let url = services.download_audio(&media).await?;
            Ok(BotContent::Audio {
                title: media.title,
                url,
            })
        }
        BotCommand::Video { query } => {
            let media = services.search_media(query).await?;
            let url = services.download_video(&media).await?;
            Ok(BotContent::Video {
                title: media.title,
                url,
            })
        }
        BotCommand::Image { prompt } => {
            let url = services.generate_image(prompt).await?;
            Ok(BotContent::Image { url })
        }
        BotCommand::Lyrics { title } => {
            let lyrics = services.fetch_lyrics(title).await?;
            let title = if lyrics.title.is_empty() {
                title.clone()
            } else {
                lyrics.title
            };
            Ok(BotContent::Lyrics {
                title,
                author: lyrics.author,
                text: lyrics.text,
            })
        }
    }
}

/// User-facing explanation of a failed command.
pub fn failure_text(command: &BotCommand, error: &ServiceError) -> &'static str {
    match (command, error) {
        (BotCommand::Ask { .. }, ServiceError::MalformedResponse(_)) => {
            "AI service returned an unexpected response."
        }
        (BotCommand::Ask { .. }, _) => "AI service is temporarily unavailable.",
        (BotCommand::Play { .. }, ServiceError::NotFound) => "Song not found.",
        (BotCommand::Play { .. }, _) => "Unable to fetch the song at this time.",
        (BotCommand::Video { .. }, ServiceError::NotFound) => "Video not found.",
        (BotCommand::Video { .. }, _) => "Unable to fetch the video at this time.",
        (BotCommand::Image { .. }, _) => "Unable to generate image at this time.",
        (BotCommand::Lyrics { .. }, ServiceError::NotFound) => "Lyrics not found.",
        (BotCommand::Lyrics { .. }, _) => "Unable to fetch lyrics at this time.",
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::services::{ExternalServices, Lyrics, MediaMatch, ServiceError};

    /// Scripted services that record every call.
    #[derive(Default)]
    pub struct FakeServices {
        pub calls: Mutex<Vec<String>>,
        pub chat: Mutex<VecDeque<Result<String, ServiceError>>>,
        pub search: Mutex<VecDeque<Result<MediaMatch, ServiceError>>>,
        pub download: Mutex<VecDeque<Result<String, ServiceError>>>,
        pub image: Mutex<VecDeque<Result<String, ServiceError>>>,
        pub lyrics: Mutex<VecDeque<Result<Lyrics, ServiceError>>>,
        /// When set, every call waits for one permit before answering.
        pub gate: Option<Arc<Notify>>,
    }

    impl FakeServices {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ServiceError>>>) -> Result<T, ServiceError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Unavailable("no scripted response".into())))
    }

    pub fn media(title: &str) -> MediaMatch {
        MediaMatch {
            id: "vid1".into(),
            title: title.into(),
            url: "https://www.youtube.com/watch?v=vid1".into(),
        }
    }

    #[async_trait]
    impl ExternalServices for FakeServices {
        async fn ask_chat(&self, question: &str) -> Result<String, ServiceError> {
            self.record(format!("ask_chat:{question}")).await;
            next(&self.chat)
        }

        async fn search_media(&self, query: &str) -> Result<MediaMatch, ServiceError> {
            self.record(format!("search_media:{query}")).await;
            next(&self.search)
        }

        async fn download_audio(&self, media: &MediaMatch) -> Result<String, ServiceError> {
            self.record(format!("download_audio:{}", media.id)).await;
            next(&self.download)
        }

        async fn download_video(&self, media: &MediaMatch) -> Result<String, ServiceError> {
            self.record(format!("download_video:{}", media.id)).await;
            next(&self.download)
        }

        async fn generate_image(&self, prompt: &str) -> Result<String, ServiceError> {
            self.record(format!("generate_image:{prompt}")).await;
            next(&self.image)
        }

        async fn fetch_lyrics(&self, title: &str) -> Result<Lyrics, ServiceError> {
            self.record(format!("fetch_lyrics:{title}")).await;
            next(&self.lyrics)
        }
    }
}
