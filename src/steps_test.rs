// Unit tests for scenario steps

use super::*;
use crate::fake_session::{Dom, FakeSession, NodeTemplate};
use crate::sites::{AMAZON, MAGALU};
use pretty_assertions::assert_eq;

fn amazon_session() -> FakeSession {
    let session = FakeSession::new();
    let home = &AMAZON.home;
    session.add(&home.search_input, NodeTemplate::default());
    session.add(&home.search_button, NodeTemplate::default());
    session.add(&home.deals_link, NodeTemplate::text("Ofertas do Dia"));
    session
}

fn magalu_session() -> FakeSession {
    let session = FakeSession::new();
    let home = &MAGALU.home;
    session.add(&home.search_input, NodeTemplate::default());
    session.add(&home.search_button, NodeTemplate::default());
    session.add(&home.deals_link, NodeTemplate::default());
    session
}

fn kindle_results(dom: &mut Dom) {
    let results = &AMAZON.results;
    dom.add(&results.results_title, NodeTemplate::text("Resultados"));
    dom.add(&results.product_titles, NodeTemplate::text("Kindle 11ª Geração"));
    dom.add(
        results.search_term_echo.as_ref().unwrap(),
        NodeTemplate::text("\"Kindle\""),
    );
}

fn assertion_of(err: &anyhow::Error) -> (&str, &str) {
    match err.downcast_ref::<StorecheckError>() {
        Some(StorecheckError::Assertion {
            expected, actual, ..
        }) => (expected.as_str(), actual.as_str()),
        other => panic!("expected an assertion failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_results_scenario_passes() {
    let session = amazon_session();
    session.on_click(&AMAZON.home.search_button, kindle_results);
    let config = Config::default();
    let ctx = SyncContext::new(session, &config);
    let mut steps = Steps::new(&ctx, &config);

    for step in [
        Step::OpenStore(Store::Amazon),
        Step::Search("Kindle".to_string()),
        Step::ExpectReadinessConfirmed,
        Step::ExpectResults,
        Step::ExpectMoreThan(0),
        Step::ExpectFirstResultContains("kindle".to_string()),
    ] {
        steps.run(&step).await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_store_checks_host() {
    let session = amazon_session();
    let mut config = Config::default();
    config
        .store_urls
        .insert("amazon".to_string(), "https://example.test".to_string());
    let ctx = SyncContext::new(session, &config);
    let mut steps = Steps::new(&ctx, &config);

    let err = steps.open_store(Store::Amazon).await.unwrap_err();
    let (expected, actual) = assertion_of(&err);
    assert_eq!(expected, "URL on amazon.com.br");
    assert_eq!(actual, "https://example.test");
}

#[test]
fn test_on_host_matches_host_and_subdomains() {
    assert!(on_host("https://www.amazon.com.br/s?k=kindle", "amazon.com.br"));
    assert!(on_host("https://amazon.com.br", "amazon.com.br"));
    assert!(!on_host("https://example.test/?r=amazon.com.br", "amazon.com.br"));
    assert!(!on_host("https://notamazon.com.br", "amazon.com.br"));
    assert!(!on_host("about:blank", "amazon.com.br"));
}

#[tokio::test(start_paused = true)]
async fn test_no_results_amazon() {
    let session = amazon_session();
    session.on_click(&AMAZON.home.search_button, |dom| {
        let results = &AMAZON.results;
        dom.add(&results.empty_message, NodeTemplate::text("Nenhum resultado para"));
        dom.add(
            results.no_results_term.as_ref().unwrap(),
            NodeTemplate::text("produtoinexistenteklok456"),
        );
    });
    let config = Config::default();
    let ctx = SyncContext::new(session, &config);
    let mut steps = Steps::new(&ctx, &config);

    steps.open_store(Store::Amazon).await.unwrap();
    steps.search("produtoinexistenteklok456").await.unwrap();
    steps.expect_readiness_confirmed().unwrap();
    steps
        .expect_no_results("nenhum resultado para")
        .await
        .unwrap();

    let err = steps.expect_results().await.unwrap_err();
    let (expected, _) = assertion_of(&err);
    assert_eq!(expected, "visible");
}

#[tokio::test(start_paused = true)]
async fn test_no_results_magalu_requires_quoted_term() {
    let session = magalu_session();
    session.on_click(&MAGALU.home.search_button, |dom| {
        dom.add(
            &MAGALU.results.empty_message,
            NodeTemplate::text("Sua busca por \"ProdutoInexistenteKlok456\" não encontrou resultado algum :("),
        );
    });
    let config = Config::default();
    let ctx = SyncContext::new(session, &config);
    let mut steps = Steps::new(&ctx, &config);

    steps.open_store(Store::Magalu).await.unwrap();
    steps.search("produtoinexistenteklok456").await.unwrap();
    steps
        .expect_no_results("não encontrou resultado algum")
        .await
        .unwrap();

    let err = steps.expect_no_results("Nenhum resultado").await.unwrap_err();
    let (expected, _) = assertion_of(&err);
    assert_eq!(expected, "Nenhum resultado");
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_page_fails_with_assertion() {
    let config = Config::default();
    let ctx = SyncContext::new(amazon_session(), &config);
    let mut steps = Steps::new(&ctx, &config);

    steps.open_store(Store::Amazon).await.unwrap();
    steps.search("Kindle").await.unwrap();

    let err = steps.expect_readiness_confirmed().unwrap_err();
    assert_eq!(assertion_of(&err), ("confirmed", "unconfirmed"));

    let err = steps.expect_first_result_contains("Kindle").await.unwrap_err();
    let (_, actual) = assertion_of(&err);
    assert_eq!(actual, crate::pages::placeholder::NO_PRODUCT_TITLE);

    let err = steps.expect_more_than(0).await.unwrap_err();
    assert_eq!(assertion_of(&err), ("more than 0", "0"));
}

#[tokio::test(start_paused = true)]
async fn test_deals_flow() {
    let session = magalu_session();
    session.on_click(&MAGALU.home.deals_link, |dom| {
        let home = &MAGALU.home;
        dom.add(&home.deals_heading, NodeTemplate::text("Aproveite!"));
        dom.add(&home.deals_items, NodeTemplate::text("Smartphone"));
        dom.add(&home.deals_items, NodeTemplate::text("Notebook"));
    });
    let config = Config::default();
    let ctx = SyncContext::new(session, &config);
    let mut steps = Steps::new(&ctx, &config);

    steps.run(&Step::OpenStore(Store::Magalu)).await.unwrap();
    steps
        .run(&Step::ClickOption("Ofertas do Dia".to_string()))
        .await
        .unwrap();
    steps
        .run(&Step::ExpectPage("Ofertas do Dia".to_string()))
        .await
        .unwrap();
    steps.run(&Step::ExpectDealsListed).await.unwrap();
}

#[tokio::test]
async fn test_unknown_keywords_are_contract_errors() {
    let config = Config::default();
    let ctx = SyncContext::new(amazon_session(), &config);
    let steps = Steps::new(&ctx, &config);

    let err = steps.click_option("Mais Vendidos").await.unwrap_err();
    let err = StorecheckError::from(err);
    assert!(matches!(err, StorecheckError::Contract { kind: "option", .. }));

    let err = steps.expect_page("Checkout").await.unwrap_err();
    assert_eq!(StorecheckError::from(err).exit_code(), 3);
}

#[tokio::test]
async fn test_steps_need_a_page() {
    let config = Config::default();
    let ctx = SyncContext::new(FakeSession::new(), &config);
    let mut steps = Steps::new(&ctx, &config);

    let err = steps.search("Kindle").await.unwrap_err();
    assert!(err.to_string().contains("open a store first"));
    assert!(steps.expect_results().await.is_err());
    assert!(steps.results().is_none());
}

#[test]
fn test_step_display() {
    assert_eq!(
        Step::Search("Kindle".to_string()).to_string(),
        "When I search for \"Kindle\""
    );
    assert_eq!(
        Step::OpenStore(Store::Magalu).to_string(),
        "Given I am on the Magazine Luiza home page"
    );
}
