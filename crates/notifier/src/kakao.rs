//! Kakao "memo to me" notifier.

use async_trait::async_trait;
use rest_client::RestClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strategy_core::NotificationSink;
use tracing::{debug, warn};

use crate::error::NotifyError;

pub const KAKAO_API_BASE_URL: &str = "https://kapi.kakao.com";
const MEMO_SEND_PATH: &str = "/v2/api/talk/memo/default/send";
const LINK_URL: &str = "https://www.naver.com";
const BUTTON_TITLE: &str = "Open";

#[derive(Debug, Serialize)]
struct TextTemplate<'a> {
    object_type: &'a str,
    text: &'a str,
    link: TemplateLink<'a>,
    button_title: &'a str,
}

#[derive(Debug, Serialize)]
struct TemplateLink<'a> {
    web_url: &'a str,
    mobile_web_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct MemoResponse {
    #[serde(default)]
    result_code: i64,
}

/// Sends each message to the token owner's own Kakao chat.
pub struct KakaoNotifier {
    client: RestClient,
    access_token: SecretString,
}

impl KakaoNotifier {
    pub fn new(access_token: SecretString) -> Result<Self, NotifyError> {
        Self::with_base_url(access_token, KAKAO_API_BASE_URL)
    }

    pub fn with_base_url(access_token: SecretString, base_url: &str) -> Result<Self, NotifyError> {
        Ok(Self {
            client: RestClient::with_default_timeout(base_url)?,
            access_token,
        })
    }

    /// `template_object` form value for a plain text memo.
    fn template(&self, text: &str) -> Result<String, NotifyError> {
        let template = TextTemplate {
            object_type: "text",
            text,
            link: TemplateLink {
                web_url: LINK_URL,
                mobile_web_url: LINK_URL,
            },
            button_title: BUTTON_TITLE,
        };
        Ok(serde_json::to_string(&template)?)
    }

    async fn try_send(&self, text: &str) -> Result<(), NotifyError> {
        let template = self.template(text)?;
        let bearer = format!("Bearer {}", self.access_token.expose_secret());
        let headers = [("Authorization", bearer.as_str())];

        let response: MemoResponse = self
            .client
            .post_form(MEMO_SEND_PATH, &[("template_object", template.as_str())], &headers)
            .await?;

        if response.result_code != 0 {
            return Err(NotifyError::Refused(response.result_code));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for KakaoNotifier {
    async fn send(&self, text: &str) -> bool {
        match self.try_send(text).await {
            Ok(()) => {
                debug!("Kakao memo sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Kakao memo not delivered");
                false
            }
        }
    }
}

impl std::fmt::Debug for KakaoNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KakaoNotifier")
            .field("base_url", &self.client.base_url())
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
