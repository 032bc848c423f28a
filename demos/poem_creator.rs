//! Example: Recording assertions and capturing errors
//!
//! This example drives a small poem creator through a spy service and shows
//! how issues are collected on a `TestContext` instead of aborting at the
//! first failure.

use std::sync::Arc;

use parking_lot::Mutex;
use tddkit::prelude::*;

#[derive(tddkit::CaseDebug, Clone, PartialEq)]
enum Message {
    GetUsername,
}

struct Spy {
    username: std::result::Result<String, AnyError>,
    messages: Mutex<Vec<Message>>,
}

impl Spy {
    fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    async fn get_username(&self) -> std::result::Result<String, BoxError> {
        self.messages.lock().push(Message::GetUsername);
        self.username.clone().map_err(Into::into)
    }
}

struct PoemCreator {
    service: Arc<Spy>,
}

impl PoemCreator {
    async fn create_poem(&self) -> std::result::Result<String, BoxError> {
        let name = self.service.get_username().await?;
        Ok(format!("Once upon a time... there was a {name}"))
    }
}

fn make_sut(cx: &TestContext, username: std::result::Result<String, AnyError>) -> (Arc<PoemCreator>, Arc<Spy>) {
    let spy = Arc::new(Spy {
        username,
        messages: Mutex::new(Vec::new()),
    });
    let sut = Arc::new(PoemCreator {
        service: Arc::clone(&spy),
    });
    cx.expect_deallocation(&sut, "");
    cx.expect_deallocation(&spy, "");
    (sut, spy)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tddkit::logging::init_test_logging();
    println!("🧰 tddkit - Poem creator\n");

    example_captured_error().await;
    example_collected_issues().await;

    println!("\n✅ All poem creator examples completed!");
}

/// Capture the error a failing service produces
async fn example_captured_error() {
    println!("📌 Example 1: Capturing an expected error");

    let cx = TestContext::new("poem_creator::captured_error");
    let error = AnyError::new();
    {
        let (sut, spy) = make_sut(&cx, Err(error));
        let captured = cx.capture_error_async(sut.create_poem(), "").await;

        assert_some_cast_eq!(cx, captured, error);
        assert_contains_eq!(cx, spy.messages(), [Message::GetUsername]);
    }

    match cx.finish() {
        Ok(()) => println!("   Captured {error} and released every object"),
        Err(err) => println!("   Unexpected: {err}"),
    }
}

/// Several broken expectations are reported together
async fn example_collected_issues() {
    println!("\n📌 Example 2: Collecting every failure");

    let cx = TestContext::with_config("poem_creator::collected_issues", ContextConfig::new().quiet());
    let (sut, spy) = make_sut(&cx, Ok("Ada".into()));

    let captured = cx.capture_error_async(sut.create_poem(), "a poem was expected to fail").await;
    assert!(captured.is_none());
    assert_count_eq!(cx, spy.messages(), [Message::GetUsername, Message::GetUsername]);

    // Keep both objects alive past teardown.
    let leaked = (sut, spy);

    if let Err(err) = cx.finish() {
        println!("   {err}");
    }
    drop(leaked);
}
