mod test_utils;

use trivia_quiz::clients::mock::MockCall;
use trivia_quiz::core::{InstantAnswerResponse, PageSummary, RelatedTopic, SearchHit};
use trivia_quiz::error::TransportError;
use trivia_quiz::{make_snippet, CancellationToken, ExplainRequest, ExplanationSource};

use crate::test_utils::create_test_resolver;

fn mercury_request() -> ExplainRequest {
    ExplainRequest::new(
        "Which planet is closest to the Sun?",
        "Mercury",
        "Astronomy • hard",
    )
}

#[tokio::test]
async fn all_sources_failing_yields_deterministic_fallback() {
    let (resolver, handle) = create_test_resolver();

    let explanation = resolver
        .resolve(&mercury_request(), &CancellationToken::new())
        .await
        .expect("not cancelled");

    assert_eq!(explanation.source, ExplanationSource::Fallback);
    assert!(explanation.text.contains("Mercury"));
    assert!(explanation.text.contains("Astronomy • hard"));
    assert_eq!(
        explanation.source_url,
        "https://duckduckgo.com/?q=Which%20planet%20is%20closest%20to%20the%20Sun%3F"
    );

    let again = resolver.resolve(&mercury_request(), &CancellationToken::new()).await;
    assert_eq!(again.as_ref(), Some(&explanation));
    assert!(!handle.calls().is_empty());
}

#[tokio::test]
async fn direct_summary_wins_first() {
    let (resolver, handle) = create_test_resolver();
    handle.add_page("Mercury", "Mercury is the smallest planet.", Some("https://en.wikipedia.org/wiki/Mercury_(planet)"));

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.source, ExplanationSource::Encyclopedia);
    assert_eq!(explanation.text, "Mercury is the smallest planet.");
    assert_eq!(explanation.source_url, "https://en.wikipedia.org/wiki/Mercury_(planet)");
    assert_eq!(handle.calls(), vec![MockCall::Summary("Mercury".into())]);
}

#[tokio::test]
async fn sources_are_tried_in_order_per_candidate() {
    let (resolver, handle) = create_test_resolver();
    let question = "Which planet is closest to the Sun?";
    // Only the search for the question text finds anything.
    handle.set_search(question, Ok(vec![SearchHit { title: "Mercury (planet)".into() }]));
    handle.add_page("Mercury (planet)", "Mercury is the first planet from the Sun.", None);

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.source, ExplanationSource::EncyclopediaSearch);
    assert_eq!(explanation.source_url, "https://en.wikipedia.org/wiki/Mercury_%28planet%29");
    assert_eq!(
        handle.calls(),
        vec![
            MockCall::Summary("Mercury".into()),
            MockCall::InstantAnswer("Mercury".into()),
            MockCall::Search("Mercury".into()),
            MockCall::Summary(question.into()),
            MockCall::InstantAnswer(question.into()),
            MockCall::Search(question.into()),
            MockCall::Summary("Mercury (planet)".into()),
        ]
    );
}

#[tokio::test]
async fn instant_answer_uses_abstract_link() {
    let (resolver, handle) = create_test_resolver();
    handle.set_summary("Mercury", Ok(None));
    handle.set_instant_answer(
        "Mercury",
        Ok(InstantAnswerResponse {
            abstract_text: Some("Mercury is a planet.".into()),
            abstract_url: Some("https://en.wikipedia.org/wiki/Mercury".into()),
            related_topics: vec![],
        }),
    );

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.source, ExplanationSource::InstantAnswer);
    assert_eq!(explanation.source_url, "https://en.wikipedia.org/wiki/Mercury");
}

#[tokio::test]
async fn instant_answer_related_topic_without_link_gets_search_link() {
    let (resolver, handle) = create_test_resolver();
    handle.set_instant_answer(
        "Mercury",
        Ok(InstantAnswerResponse {
            abstract_text: None,
            abstract_url: None,
            related_topics: vec![RelatedTopic { text: Some("Mercury, a planet".into()), url: None }],
        }),
    );

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.text, "Mercury, a planet");
    assert_eq!(explanation.source_url, "https://duckduckgo.com/?q=Mercury");
}

#[tokio::test]
async fn empty_passages_count_as_no_result() {
    let (resolver, handle) = create_test_resolver();
    handle.set_summary(
        "Mercury",
        Ok(Some(PageSummary {
            title: "Mercury".into(),
            extract: Some("   ".into()),
            description: None,
            page_url: None,
        })),
    );
    handle.set_instant_answer("Mercury", Ok(InstantAnswerResponse::default()));
    handle.set_search("Mercury", Ok(vec![]));
    handle.set_summary("Which planet is closest to the Sun?", Err(TransportError::RateLimit));
    handle.add_page("Which planet is", "A planet is a large body orbiting a star.", None);

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.text, "A planet is a large body orbiting a star.");
    assert_eq!(explanation.source_url, "https://en.wikipedia.org/wiki/Which_planet_is");
}

#[tokio::test]
async fn description_is_used_when_extract_missing() {
    let (resolver, handle) = create_test_resolver();
    handle.set_summary(
        "Mercury",
        Ok(Some(PageSummary {
            title: "Mercury".into(),
            extract: None,
            description: Some("Planet in the Solar System".into()),
            page_url: None,
        })),
    );

    let explanation = resolver.resolve(&mercury_request(), &CancellationToken::new()).await.unwrap();
    assert_eq!(explanation.text, "Planet in the Solar System");
}

#[tokio::test]
async fn identical_answer_and_question_are_queried_once() {
    let (resolver, handle) = create_test_resolver();
    let request = ExplainRequest::new("Paris", "Paris", "");

    let explanation = resolver.resolve(&request, &CancellationToken::new()).await.unwrap();

    assert_eq!(explanation.text, "The correct answer is \"Paris\".");
    let summaries_for_paris = handle
        .calls()
        .iter()
        .filter(|c| **c == MockCall::Summary("Paris".into()))
        .count();
    assert_eq!(summaries_for_paris, 1);
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let (resolver, handle) = create_test_resolver();
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(resolver.resolve(&mercury_request(), &cancel).await.is_none());
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn cancellation_mid_pipeline_stops_lookups_and_delivery() {
    let (resolver, handle) = create_test_resolver();
    let cancel = CancellationToken::new();
    handle.cancel_after(2, cancel.clone());

    assert!(resolver.resolve(&mercury_request(), &cancel).await.is_none());
    assert_eq!(handle.calls().len(), 2);
}

#[tokio::test]
async fn cancellation_during_successful_call_suppresses_result() {
    let (resolver, handle) = create_test_resolver();
    let cancel = CancellationToken::new();
    handle.add_page("Mercury", "Mercury is a planet.", None);
    handle.cancel_after(1, cancel.clone());

    assert!(resolver.resolve(&mercury_request(), &cancel).await.is_none());
}

#[test]
fn snippet_of_three_sentences_keeps_two() {
    let text = "Mercury is the smallest planet in the Solar System and the nearest to the Sun. \
                It has no natural satellites and a very thin exosphere instead of an atmosphere. \
                Its surface is heavily cratered.";
    let snippet = make_snippet(text, 2, 400);
    assert!(snippet.chars().count() <= 400);
    assert!(snippet.ends_with("instead of an atmosphere."));
    assert!(!snippet.contains("cratered"));
}
