//! Category handlers: prompt templating and generation calls
//!
//! Each handler wraps the query in a fixed prompt, invokes the generation
//! backend, and stores the labeled response on the record. A backend
//! failure is caught here and converted into an error string; it never
//! propagates past the handler, so the record always reaches the finalizer.

use crate::llm::provider::{CompletionRequest, LlmProvider, Message, MessageRole};
use crate::observability::metrics::metrics;
use crate::pipeline::classifier::preview;
use crate::pipeline::record::{Category, RequestRecord, Stage};
use crate::pipeline::GenerationSettings;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Leading "summarize:" / "summary:" marker, colon optional
static SUMMARY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:summarize|summary):?\s*").unwrap());

/// Handler stage: template a prompt, call the backend, label the output
pub async fn run(
    service: &dyn LlmProvider,
    settings: &GenerationSettings,
    mut record: RequestRecord,
) -> RequestRecord {
    let category = match record.next {
        Stage::Handler(category) => category,
        // Only classified records reach this stage
        _ => return record,
    };

    let prompt = build_prompt(category, &record.input);
    let request = CompletionRequest {
        messages: vec![Message {
            role: MessageRole::User,
            content: prompt,
        }],
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    };

    let result = match service.complete(request).await {
        Ok(response) => {
            let text = response.content.unwrap_or_default();
            debug!(
                stage = category.as_str(),
                output = %preview(&text),
                "generation complete"
            );
            format!("{}\n{text}", result_label(category))
        }
        Err(error) => {
            metrics().record_generation_failure();
            warn!(
                stage = category.as_str(),
                error = %error,
                "generation failed"
            );
            format!("{}{error}", error_label(category))
        }
    };

    record.result = Some(result);
    record.push_transition(category.as_str(), Stage::Final.as_str());
    record.next = Stage::Final;
    record
}

/// Banner prepended to a successful response
fn result_label(category: Category) -> &'static str {
    match category {
        Category::Math => "Mathematical Solution:",
        Category::Summarizer => "Summary:",
        Category::Translator => "Translation:",
        Category::Fallback => "General Response:",
    }
}

/// Prefix used when the backend call fails
fn error_label(category: Category) -> &'static str {
    match category {
        Category::Math => "Error in math processing: ",
        Category::Summarizer => "Error in summarization: ",
        Category::Translator => "Error in translation: ",
        Category::Fallback => "Error in general processing: ",
    }
}

/// Build the fixed prompt for a category, embedding the raw query
///
/// The summarizer strips a leading summary marker before templating; no
/// other handler transforms its input.
pub fn build_prompt(category: Category, input: &str) -> String {
    match category {
        Category::Math => format!(
            "You are a mathematical problem solver. Solve the following math \
             problem step by step.\n\
             If it is a word problem, extract the mathematical components first.\n\
             \n\
             Problem: {input}\n\
             \n\
             Provide a clear, step-by-step solution with the final answer."
        ),
        Category::Summarizer => {
            let content = strip_summary_marker(input);
            format!(
                "Please provide a clear and concise summary of the following \
                 text or topic.\n\
                 If it is a topic, provide a brief explanation with key points.\n\
                 \n\
                 Content: {content}\n\
                 \n\
                 Provide a well-structured summary with the main points."
            )
        }
        Category::Translator => format!(
            "You are a language translator. Translate the following text based \
             on the request.\n\
             If the target language is not specified, infer it from the context.\n\
             \n\
             Translation request: {input}\n\
             \n\
             Provide the translation with the source and target language identified."
        ),
        Category::Fallback => format!(
            "You are a helpful assistant. Provide a thoughtful response to the \
             following query:\n\
             \n\
             Query: {input}\n\
             \n\
             Provide a helpful and informative response."
        ),
    }
}

/// Strip a leading "summarize:" / "summary:" marker from the query
fn strip_summary_marker(input: &str) -> &str {
    match SUMMARY_MARKER.find(input) {
        Some(found) if found.start() == 0 => input[found.end()..].trim(),
        _ => input.trim(),
    }
}
