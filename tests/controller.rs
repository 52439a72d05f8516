//! Tests for the coroutine-to-promise controller.

use randevu::{Error, Promise, Runner, run_async, spawn_async};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn succ(value: &str) -> Promise<String> {
    let promise = Promise::new();
    let p = promise.clone();
    let value = value.to_string();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        p.complete(value);
    });
    promise
}

#[test]
fn test_body_without_suspension_completes_inline() {
    let result = run_async(async { Ok(1 + 1) });
    assert_eq!(result.try_get(), Some(Ok(2)));
}

#[test]
fn test_body_resumes_after_awaited_promise() {
    let result = run_async(async {
        let s = succ("O").await?;
        Ok(s + "K")
    });
    assert_eq!(result.get(), Ok("OK".to_string()));
}

#[test]
fn test_body_error_fails_promise() {
    let result: Promise<i32> = run_async(async { Err(Error::failure("exploded")) });
    assert_eq!(result.get(), Err(Error::failure("exploded")));
}

#[test]
fn test_awaited_failure_is_catchable() {
    let failing: Promise<String> = Promise::failed(Error::failure("O"));
    let result = run_async(async move {
        let s = match failing.await {
            Ok(v) => v,
            Err(e) => e.message().to_string(),
        };
        Ok(s + "K")
    });
    assert_eq!(result.get(), Ok("OK".to_string()));
}

#[test]
fn test_chained_awaits_preserve_order() {
    let result = run_async(async {
        let mut out = String::new();
        for part in ["a", "b", "c"] {
            out.push_str(&succ(part).await?);
        }
        Ok(out)
    });
    assert_eq!(result.get(), Ok("abc".to_string()));
}

#[test]
fn test_spawn_async_runs_on_pool() {
    let runner = Runner::pool(2);
    let result = spawn_async(&runner, async {
        let s = succ("pooled").await?;
        Ok(s)
    });
    assert_eq!(result.get(), Ok("pooled".to_string()));
}

#[test]
fn test_many_concurrent_controllers() {
    let total = Arc::new(AtomicUsize::new(0));
    let mut results = vec![];

    for i in 0..50 {
        let total = total.clone();
        results.push(run_async(async move {
            let s = succ(&i.to_string()).await?;
            total.fetch_add(1, Ordering::SeqCst);
            Ok(s.parse::<usize>().map_err(|e| Error::failure(e.to_string()))?)
        }));
    }

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.get(), Ok(i));
    }
    assert_eq!(total.load(Ordering::SeqCst), 50);
}
