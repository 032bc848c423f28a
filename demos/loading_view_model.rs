//! Example: Sampling published state
//!
//! This example shows how to observe a view model's published properties
//! while an async action runs, and how to sample a derived value on every
//! change.

use std::sync::Arc;
use std::time::Duration;

use tddkit::capture::{capture_is_on_thread, capture_output_async, capture_output_of_async};
use tddkit::prelude::*;
use tddkit::publisher::values;

struct ViewModel {
    title: Published<String>,
    is_loading: Published<bool>,
}

impl ViewModel {
    fn new() -> Self {
        Self {
            title: Published::new(String::new()),
            is_loading: Published::new(false),
        }
    }

    fn loading_text(&self) -> &'static str {
        if self.is_loading.get() {
            "Loading..."
        } else {
            "Finished"
        }
    }

    async fn refresh_title(&self) {
        self.is_loading.set(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.title.set("Fresh title".into());
        self.is_loading.set(false);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tddkit::logging::init_test_logging();
    println!("🧰 tddkit - Loading view model\n");

    example_capture_output().await;
    example_capture_output_of().await;
    example_values_stream().await;
    example_delivery_thread();

    println!("\n✅ All view model examples completed!");
}

/// Record every change of a published flag
async fn example_capture_output() {
    println!("📌 Example 1: Capturing published output");

    let sut = ViewModel::new();
    let loading = capture_output_async(&sut.is_loading, DEFAULT_DROP_FIRST, sut.refresh_title()).await;

    println!("   is_loading went through {loading:?}");
    assert_eq!(loading, vec![true, false]);
}

/// Sample a derived property on each change
async fn example_capture_output_of() {
    println!("\n📌 Example 2: Sampling a derived value");

    let cx = TestContext::new("loading_view_model::capture_output_of");
    let sut = Arc::new(ViewModel::new());
    cx.expect_deallocation(&sut, "");

    let reader = Arc::clone(&sut);
    let text = capture_output_of_async(
        move || reader.loading_text(),
        &sut.is_loading,
        DEFAULT_DROP_FIRST,
        sut.refresh_title(),
    )
    .await;

    println!("   loading text went through {text:?}");
    assert_count_eq!(cx, text, ["Loading...", "Finished", "Finished"]);
    drop(sut);
    cx.finish_or_panic();
}

/// Await emissions one at a time
async fn example_values_stream() {
    use futures::StreamExt;

    println!("\n📌 Example 3: Awaiting emissions as a stream");

    let sut = Arc::new(ViewModel::new());
    let mut titles = values(&sut.title).skip(1);

    let worker = Arc::clone(&sut);
    tokio::spawn(async move { worker.refresh_title().await });

    if let Some(title) = titles.next().await {
        println!("   Received title {title:?}");
    }
}

/// Check which thread delivered each emission
fn example_delivery_thread() {
    println!("\n📌 Example 4: Delivery thread");

    let subject = PassthroughSubject::new();
    let here = std::thread::current().id();

    let on_this_thread = capture_is_on_thread(here, &subject, 0, || {
        subject.send("local");
        let remote = subject.clone();
        std::thread::spawn(move || remote.send("remote")).join().ok();
    });

    println!("   Delivered on this thread: {on_this_thread:?}");
    assert_eq!(on_this_thread, vec![true, false]);
}
