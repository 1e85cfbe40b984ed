//! End-to-end flow of the accumulator as an embedding harness drives it:
//! hooks before each test, checks, flush, and error enrichment.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use soft_assert::prelude::*;

fn shop_page() -> StaticDocument {
    let mut doc = StaticDocument::new();
    let body = doc.append(MockElement::new("body"));
    let nav = doc.append_child(body, MockElement::new("nav").id("menu"));
    doc.append_child(nav, MockElement::new("a").class("link").attr("href", "/"));
    doc.append_child(nav, MockElement::new("a").class("link").attr("href", "/cart"));
    let list = doc.append_child(body, MockElement::new("ul").class("products"));
    for sku in ["a1", "b2", "c3"] {
        doc.append_child(list, MockElement::new("li").class("item").attr("data-sku", sku));
    }
    doc.append_child(body, MockElement::new("div").id("toast").hidden());
    doc.append_child(body, MockElement::new("div").id("modal").display_none());
    doc
}

fn accumulator() -> SoftAssert<StaticDocument, StaticDocument> {
    soft_assert::init_tracing();
    let doc = shop_page();
    SoftAssert::new(doc.clone(), doc)
}

#[tokio::test]
async fn passing_test_flushes_silently() {
    let mut soft = accumulator();
    soft.on_test_start();

    soft.check_exists("#menu", "menu rendered").await.unwrap();
    soft.check_count(".item", 3, "three products").await.unwrap();
    soft.check_count("//ul[@class='products']/li", 3, "three products via xpath")
        .await
        .unwrap();
    soft.check_visible("nav a.link", true, "links visible").await.unwrap();
    soft.check_visible("#modal", false, "modal closed").await.unwrap();

    assert_eq!(soft.summary().total, 5);
    assert!(soft.flush().is_ok());
}

#[tokio::test]
async fn failing_checks_are_reported_together_in_order() {
    let mut soft = accumulator();
    soft.on_test_start();

    soft.check_exists(".checkout", "checkout button missing").await.unwrap();
    soft.check_count(".item", 2, "count mismatch").await.unwrap();
    soft.check_visible("#toast", true, "toast should be visible")
        .await
        .unwrap();
    soft.check_exists("#menu", "menu rendered").await.unwrap();

    let err = soft.flush().unwrap_err();
    assert_eq!(err.count, 3);
    assert_eq!(
        err.to_string(),
        "\n**SOFT ASSERTIONS ERRORS**\nAsserts down: 3\n\tcheckout button missing\n\tcount mismatch\n\ttoast should be visible\n**END SOFT ASSERTIONS ERRORS**\n"
    );

    let reported = soft.on_unhandled_error(TestFailure::from(err));
    assert_eq!(reported.name, "SoftAssertionError");
    assert!(reported.is_soft_assertion());
}

#[tokio::test]
async fn css_and_xpath_target_the_same_elements() {
    let doc = shop_page();
    let pairs = [
        ("#menu", "//nav[@id='menu']"),
        ("li[data-sku='b2']", "//li[@data-sku='b2']"),
        ("nav > a", "/body/nav/a"),
    ];
    for (css, xpath) in pairs {
        let by_css = resolve(&Locator::new(css), &doc).await.unwrap();
        let by_xpath = resolve(&Locator::new(xpath), &doc).await.unwrap();
        assert!(!by_css.is_empty(), "{css} matched nothing");
        assert_eq!(by_css, by_xpath, "{css} vs {xpath}");
    }
}

#[tokio::test]
async fn hard_failure_carries_pending_soft_failures() {
    let mut soft = accumulator();
    soft.on_test_start();

    soft.check_count(".item", 5, "expected five products").await.unwrap();
    let hard = soft
        .check_exists("//li[@data-sku='a1'", "never recorded")
        .await
        .unwrap_err();
    assert!(hard.is_resolution_error());

    let reported = soft.enrich_error(TestFailure::from_error(&hard), Some("open catalog"));
    assert_eq!(reported.name, "Error. STEP: open catalog");
    assert!(reported.message.starts_with("Invalid locator"));
    assert!(reported.message.contains("Asserts down: 1\n\texpected five products"));
}

#[tokio::test]
async fn next_test_starts_clean() {
    let mut soft = accumulator();

    soft.on_test_start();
    soft.check_exists(".missing", "first test failure").await.unwrap();
    assert_eq!(soft.failure_count(), 1);

    soft.on_test_start();
    soft.check_exists("#menu", "menu rendered").await.unwrap();
    assert!(soft.flush().is_ok());
}
