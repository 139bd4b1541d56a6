use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{ChatMessage, MessageRole};

const SYSTEM_PROMPT: &str = "You are NyayAI, a legal information assistant for India. \
You provide general legal information only, not legal advice. Use simple language, \
focus on Indian laws and procedures, and suggest actionable next steps. \
Always end responses with: \"For personalized legal advice, please consult a \
verified lawyer on our platform.\"";

const CONSULT_FOOTER: &str =
    "For personalized legal advice, please consult a verified lawyer on our platform.";

#[async_trait]
pub trait LegalAssistant: Send + Sync + 'static {
    /// Produce the assistant's reply to `message`, given the prior messages of
    /// the session in order.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String>;
}

/// Offline assistant: keyword-matched responses covering the common legal
/// topics, used in development and tests.
#[derive(Default)]
pub struct CannedAssistant;

impl CannedAssistant {
    pub fn new() -> Self {
        Self
    }
}

fn canned_body(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("rent") || lower.contains("tenant") || lower.contains("landlord") {
        "Tenants in India are protected by state Rent Control Acts and the Model Tenancy Act, 2021. \
         Your rent agreement should be registered, security deposits are typically capped at 2-3 \
         months of rent, and a landlord must give written notice before eviction. Keep rent \
         receipts and a copy of the signed agreement."
    } else if lower.contains("consumer") || lower.contains("refund") || lower.contains("defective") {
        "The Consumer Protection Act, 2019 lets you file a complaint against unfair trade \
         practices or defective goods and services. Complaints go to the District, State, or \
         National Consumer Commission depending on the claim value, and e-commerce purchases \
         are covered. Keep your invoice and any written communication with the seller."
    } else if lower.contains("fir") || lower.contains("police") {
        "An FIR (First Information Report) can be filed at any police station for a cognizable \
         offence, and the police cannot refuse to register it. You are entitled to a free copy \
         of the FIR. If the police refuse, you can approach the Superintendent of Police or file \
         a complaint before the Magistrate."
    } else if lower.contains("rti") || lower.contains("information") {
        "Under the Right to Information Act, 2005 any citizen can request information from a \
         public authority by applying to its Public Information Officer with a fee of Rs. 10. \
         A reply is due within 30 days, and appeals lie first within the authority and then to \
         the Information Commission."
    } else if lower.contains("property") || lower.contains("land") {
        "Property disputes usually turn on the title documents: sale deed, mutation records, and \
         the encumbrance certificate. Verify the chain of title before any purchase and register \
         the sale deed with the sub-registrar. For inherited property, a legal heir certificate \
         or succession certificate may be needed."
    } else if lower.contains("divorce") || lower.contains("maintenance") || lower.contains("custody")
    {
        "Family law matters such as divorce, maintenance, and custody are governed by the \
         personal law applicable to you along with the Family Courts Act. Mutual-consent divorce \
         is usually the quickest route. Interim maintenance can be sought while proceedings are \
         pending."
    } else if lower.contains("job") || lower.contains("salary") || lower.contains("employer") {
        "Employees are protected by the Payment of Wages Act and the new Labour Codes. Unpaid \
         salary can be recovered through the labour commissioner, and termination generally \
         requires notice or pay in lieu as per your appointment letter. Keep your contract, \
         payslips, and any termination letter."
    } else {
        "I can share general information about Indian laws and procedures, including tenant \
         rights, consumer protection, FIRs, RTI applications, property matters, family law, and \
         employment issues. Could you tell me a little more about your situation?"
    }
}

#[async_trait]
impl LegalAssistant for CannedAssistant {
    async fn reply(&self, _history: &[ChatMessage], message: &str) -> Result<String> {
        Ok(format!("{} {CONSULT_FOOTER}", canned_body(message)))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Assistant backed by an OpenAI-compatible chat-completions endpoint.
pub struct HttpAssistant {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpAssistant {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn build_messages(history: &[ChatMessage], message: &str) -> Vec<Value> {
        let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];
        for entry in history {
            let role = match entry.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            messages.push(json!({ "role": role, "content": entry.content }));
        }
        messages.push(json!({ "role": "user", "content": message }));
        messages
    }
}

#[async_trait]
impl LegalAssistant for HttpAssistant {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": Self::build_messages(history, message),
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach assistant API")?
            .error_for_status()
            .context("assistant API rejected request")?;

        let completion = response
            .json::<CompletionResponse>()
            .await
            .context("failed to decode assistant response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .context("assistant response contained no choices")?;
        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_replies_match_topics_and_carry_footer() {
        let assistant = CannedAssistant::new();

        let rent = assistant
            .reply(&[], "My landlord refuses to return my rent deposit")
            .await
            .unwrap();
        assert!(rent.contains("Model Tenancy Act"));
        assert!(rent.ends_with(CONSULT_FOOTER));

        let rti = assistant.reply(&[], "How do I file an RTI?").await.unwrap();
        assert!(rti.contains("Right to Information"));

        let fallback = assistant.reply(&[], "hello there").await.unwrap();
        assert!(fallback.contains("general information"));
        assert!(fallback.ends_with(CONSULT_FOOTER));
    }

    #[test]
    fn http_request_interleaves_history_after_system_prompt() {
        let history = vec![
            ChatMessage {
                role: MessageRole::User,
                content: "What is an FIR?".to_string(),
                timestamp: "2025-01-01T00:00:00Z".to_string(),
            },
            ChatMessage {
                role: MessageRole::Assistant,
                content: "An FIR is a First Information Report.".to_string(),
                timestamp: "2025-01-01T00:00:01Z".to_string(),
            },
        ];

        let messages = HttpAssistant::build_messages(&history, "Can I file one online?");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "Can I file one online?");
    }

    #[test]
    fn completion_response_decodes() {
        let raw = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        let parsed: CompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
