//! HTTP plumbing shared by the providers

use crate::{LLMError, Message, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Report generation is slow; the whole request gets this long by default
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub(crate) fn client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send `request` and decode the JSON body
///
/// Non-success statuses become the matching [`LLMError`] carrying the body
/// text; a body that does not decode is [`LLMError::UnexpectedResponse`].
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder, model: &str) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LLMError::from_status(status, body, model));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))
}

/// Messages with the system instruction in front, for APIs that take it inline
pub(crate) fn inline_system(system: Option<String>, messages: Vec<Message>) -> impl Iterator<Item = Message> {
    system.map(Message::system).into_iter().chain(messages)
}

pub(crate) fn trim_base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_inline_system_goes_first() {
        let roles: Vec<Role> = inline_system(Some("rules".into()), vec![Message::user("hi")])
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::System, Role::User]);

        assert_eq!(inline_system(None, vec![Message::user("hi")]).count(), 1);
    }

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(trim_base("https://api.openai.com/v1"), "https://api.openai.com/v1");
    }
}
