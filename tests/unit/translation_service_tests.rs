/*!
 * Tests for the whole-file translation service
 */

use suberase::app_config::TranslationConfig;
use suberase::errors::ProviderError;
use suberase::translation::TranslationService;

use crate::common::mocks::ScriptedChatClient;

const ORIGINAL: &str = "1\n00:00:00,000 --> 00:00:03,000\n你好\n\n2\n00:00:04,000 --> 00:00:06,000\n再见\n";
const TRANSLATED: &str = "1\n00:00:00,000 --> 00:00:03,000\nHello\n\n2\n00:00:04,000 --> 00:00:06,000\nGoodbye\n";
const SUGGESTIONS: &str = "1. Use more natural phrasing in the second block.";

fn test_config() -> TranslationConfig {
    TranslationConfig {
        api_key: "sk-test".to_string(),
        retry_count: 3,
        retry_backoff_ms: 1,
        ..TranslationConfig::default()
    }
}

fn service(replies: Vec<Result<String, ProviderError>>) -> (TranslationService, ScriptedChatClient) {
    let client = ScriptedChatClient::new(replies);
    let service = TranslationService::with_client(Box::new(client.clone()), test_config());
    (service, client)
}

#[tokio::test]
async fn test_translate_srt_withCleanReplies_shouldAcceptFirstAttempt() {
    // One attempt is three calls: draft, critique, edited file.
    let (service, client) = service(vec![
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(TRANSLATED.to_string()),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_translate_srt_withCodeFencedReply_shouldUnwrapIt() {
    let fenced = format!("```srt\n{}```", TRANSLATED);
    let (service, _) = service(vec![
        Ok(fenced.clone()),
        Ok(SUGGESTIONS.to_string()),
        Ok(fenced),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert!(result.starts_with("1\n00:00:00,000"));
    assert!(result.contains("Goodbye"));
}

#[tokio::test]
async fn test_translate_srt_withFailingEditingPass_shouldKeepTheDraft() {
    // Only the draft reply is scripted; the critique call errors out and the
    // draft is accepted as-is.
    let (service, client) = service(vec![Ok(TRANSLATED.to_string())]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_translate_srt_withAlteredTimeline_shouldRetryThenAccept() {
    let shifted = TRANSLATED.replace("00:00:04,000", "00:00:04,500");
    let (service, client) = service(vec![
        Ok(shifted.clone()),
        Ok(SUGGESTIONS.to_string()),
        Ok(shifted),
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(TRANSLATED.to_string()),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
    assert_eq!(client.call_count(), 6);
}

#[tokio::test]
async fn test_translate_srt_withPersistentTimelineDamage_shouldExhaustRetries() {
    let shifted = TRANSLATED.replace("00:00:04,000", "00:00:04,500");
    let (service, client) = service((0..9).map(|_| Ok(shifted.clone())).collect());

    let error = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap_err();
    assert!(error.to_string().contains("timeline"));
    assert_eq!(client.call_count(), 9);
}

#[tokio::test]
async fn test_translate_srt_withExtraTextLine_shouldRejectTheReply() {
    // Same timestamps but one added dialogue line: the timeline check alone
    // cannot see it, the line count comparison must.
    let padded = format!("{}\nSee you\n", TRANSLATED.trim());
    let (service, client) = service((0..9).map(|_| Ok(padded.clone())).collect());

    let error = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap_err();
    assert!(error.to_string().contains("line count"));
    assert_eq!(client.call_count(), 9);
}

#[tokio::test]
async fn test_translate_srt_withLineMergingEdit_shouldRejectThenRetry() {
    // The editing pass merges everything into one block. The final output is
    // what gets verified, so the attempt is rejected even though the draft
    // was fine.
    let merged = "1\n00:00:00,000 --> 00:00:03,000\nHello\nGoodbye\n";
    let (service, client) = service(vec![
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(merged.to_string()),
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(TRANSLATED.to_string()),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
    assert_eq!(client.call_count(), 6);
}

#[tokio::test]
async fn test_translate_srt_withTransientRequestFailure_shouldRetry() {
    let (service, client) = service(vec![
        Err(ProviderError::RequestFailed("connection reset".to_string())),
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(TRANSLATED.to_string()),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
    assert_eq!(client.call_count(), 4);
}

#[tokio::test]
async fn test_translate_srt_withEmptyReply_shouldRejectIt() {
    let (service, _) = service(vec![
        Ok(String::new()),
        Ok(TRANSLATED.to_string()),
        Ok(SUGGESTIONS.to_string()),
        Ok(TRANSLATED.to_string()),
    ]);

    let result = service.translate_srt(ORIGINAL, "zh", "en").await.unwrap();
    assert_eq!(result, TRANSLATED.trim());
}

#[tokio::test]
async fn test_translate_srt_withInvalidLanguage_shouldFailBeforeAnyRequest() {
    let (service, client) = service(vec![Ok(TRANSLATED.to_string())]);

    assert!(service.translate_srt(ORIGINAL, "zz-invalid", "en").await.is_err());
    assert_eq!(client.call_count(), 0);
}
