//! End-to-end behaviour of pool runs
//!
//! Timing-sensitive tests run on a paused clock so sleeps complete in
//! deadline order.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{future, stream, StreamExt};
use racepool::prelude::*;

/// `1000 / x`, sleeping as many milliseconds as the result
async fn invert(x: u64) -> Result<u64, Infallible> {
    let value = 1000 / x;
    tokio::time::sleep(Duration::from_millis(value)).await;
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Items,
    Iter,
    Stream,
}

const SHAPES: [Shape; 3] = [Shape::Items, Shape::Iter, Shape::Stream];

fn source_of<E: Send + 'static>(shape: Shape, items: Vec<u64>) -> Source<u64, E> {
    match shape {
        Shape::Items => Source::items(items),
        Shape::Iter => Source::iter(items.into_iter()),
        Shape::Stream => Source::stream(stream::iter(items)),
    }
}

fn pool(concurrency: usize) -> TaskPool {
    TaskPool::new(PoolOptions::new().with_concurrency(concurrency))
}

#[tokio::test(start_paused = true)]
async fn test_collect_preserves_input_order_for_every_shape() {
    let inputs: Vec<u64> = vec![10, 25, 50, 8, 40, 125, 20];
    let expected: Vec<u64> = inputs.iter().map(|x| 1000 / x).collect();

    for shape in SHAPES {
        for concurrency in 1..=inputs.len() + 5 {
            let values = pool(concurrency)
                .collect(invert, source_of(shape, inputs.clone()))
                .await
                .unwrap();
            assert_eq!(values, expected, "shape {shape:?}, concurrency {concurrency}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_stream_yields_each_result_exactly_once() {
    let inputs: Vec<u64> = vec![10, 25, 50, 8, 40];
    let expected: HashSet<u64> = inputs.iter().map(|x| 1000 / x).collect();

    for shape in SHAPES {
        for concurrency in 1..=inputs.len() + 5 {
            let values: Vec<u64> = pool(concurrency)
                .stream(invert, source_of(shape, inputs.clone()))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
                .await;

            assert_eq!(values.len(), inputs.len());
            let unique: HashSet<u64> = values.into_iter().collect();
            assert_eq!(unique, expected, "shape {shape:?}, concurrency {concurrency}");
        }
    }
}

#[tokio::test]
async fn test_empty_input() {
    for shape in SHAPES {
        for concurrency in [1, 3, 10] {
            let values = pool(concurrency)
                .collect(invert, source_of(shape, vec![]))
                .await
                .unwrap();
            assert!(values.is_empty());

            let mut stream = pool(concurrency)
                .stream(invert, source_of(shape, vec![]))
                .unwrap();
            assert!(stream.next().await.is_none());
            assert_eq!(stream.retired(), concurrency);
            assert_eq!(stream.state(), RaceState::Done);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_reference_example_collect() {
    let values = pool(1)
        .collect(invert, Source::items([10, 25, 50]))
        .await
        .unwrap();
    assert_eq!(values, vec![100, 40, 20]);
}

#[tokio::test(start_paused = true)]
async fn test_reference_example_stream_completion_order() {
    for shape in SHAPES {
        let values: Vec<u64> = pool(2)
            .stream(invert, source_of(shape, vec![10, 25, 50]))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(values, vec![40, 20, 100], "shape {shape:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_excess_concurrency_does_not_change_results() {
    let mut stream = pool(8)
        .stream(invert, Source::items([10, 25, 50]))
        .unwrap();

    let mut values = Vec::new();
    while let Some(value) = stream.next().await {
        values.push(value.unwrap());
    }

    assert_eq!(values, vec![20, 40, 100]);
    assert_eq!(stream.retired(), 8);
}

#[tokio::test]
async fn test_multi_argument_operation() {
    let repeat = spread::<(usize, &'static str), _>(|count: usize, s: &'static str| async move {
        Ok::<_, Infallible>(s.repeat(count))
    });

    let values = pool(2)
        .collect(repeat, Source::items([(1, "a"), (2, "b"), (3, "c")]))
        .await
        .unwrap();
    assert_eq!(values, vec!["a", "bb", "ccc"]);
}

#[tokio::test(start_paused = true)]
async fn test_push_source_terminates_with_unit_results() {
    // Unit results look like "nothing"; the end marker still never leaks.
    let operation = |ms: u64| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok::<_, Infallible>(())
    };

    let values = pool(3)
        .collect(operation, Source::stream(stream::iter([30, 10, 20, 5])))
        .await
        .unwrap();
    assert_eq!(values, vec![(); 4]);

    let values: Vec<Option<u64>> = pool(2)
        .stream(
            |x: u64| async move { Ok::<_, Infallible>(if x % 2 == 0 { None } else { Some(x) }) },
            Source::stream(stream::iter(0..4u64)),
        )
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(values.len(), 4);
}

#[tokio::test]
async fn test_generator_source() {
    let values = pool(2)
        .collect(
            |x: u32| async move { Ok::<_, Infallible>(x + 1) },
            Source::generator(|| stream::iter(0..5u32)),
        )
        .await
        .unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("cannot process {0}")]
struct Rejected(u32);

#[tokio::test]
async fn test_failure_on_second_element_has_no_partial_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let operation = move |x: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if x == 2 {
                Err(Rejected(x))
            } else {
                Ok(x)
            }
        }
    };

    let err = pool(1)
        .collect(operation, Source::items([1, 2, 3]))
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::Operation { position: 1, .. }));
    assert_eq!(err.to_string(), "operation failed for element 1: cannot process 2");
    // The third element was never started.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stream_failure_is_terminal() {
    let operation = |x: u32| async move {
        tokio::time::sleep(Duration::from_millis(u64::from(x))).await;
        if x == 20 {
            Err(Rejected(x))
        } else {
            Ok(x)
        }
    };

    let mut stream = pool(2)
        .stream(operation, Source::items([10, 20, 30, 40]))
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), 10);
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.into_inner(), Some(Rejected(20)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_source_failure_surfaces() {
    let items = stream::iter(vec![Ok(1), Ok(2), Err(Rejected(99))]);

    let err = pool(2)
        .collect(
            |x: u32| async move { Ok::<_, Rejected>(x) },
            Source::try_stream(items),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::Source { position: 2, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_never_exceeds_concurrency() {
    for concurrency in [1, 2, 4, 16] {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (cur, pk) = (Arc::clone(&current), Arc::clone(&peak));
        let operation = move |ms: u64| {
            let (cur, pk) = (Arc::clone(&cur), Arc::clone(&pk));
            async move {
                let now = cur.fetch_add(1, Ordering::SeqCst) + 1;
                pk.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                cur.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, Infallible>(ms)
            }
        };

        let inputs: Vec<u64> = (1..=10).map(|i| (i * 7) % 11 + 1).collect();
        let values = pool(concurrency)
            .collect(operation, Source::items(inputs.clone()))
            .await
            .unwrap();

        assert_eq!(values, inputs);
        assert_eq!(
            peak.load(Ordering::SeqCst),
            concurrency.min(inputs.len()),
            "concurrency {concurrency}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_abandons_run() {
    let token = CancellationToken::new();
    let pool = pool(2).with_cancellation(token.clone());

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = pool
        .collect(invert, Source::iter((1..1000).map(|_| 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, PoolError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_collect_never_returns_partial_list() {
    for attempt in 0..500u32 {
        let token = CancellationToken::new();
        let pool = TaskPool::bounded(1).with_cancellation(token.clone());
        let run = tokio::spawn(pool.collect(
            |x: u32| async move { Ok::<_, Infallible>(x) },
            Source::items(0..200u32),
        ));

        // Fire from another OS thread at staggered points of the run.
        let spins = (attempt % 50) * 40;
        let canceller = std::thread::spawn(move || {
            for _ in 0..spins {
                std::hint::spin_loop();
            }
            token.cancel();
        });

        match run.await.unwrap() {
            Ok(values) => assert_eq!(values.len(), 200, "attempt {attempt}"),
            Err(err) => assert!(matches!(err, PoolError::Cancelled), "attempt {attempt}: {err}"),
        }
        canceller.join().unwrap();
    }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_failure_abandons_in_flight_siblings() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dropped);
    let operation = move |x: u32| {
        let flag = Arc::clone(&flag);
        async move {
            if x == 0 {
                let _guard = SetOnDrop(flag);
                future::pending::<()>().await;
                Ok(x)
            } else {
                Err(Rejected(x))
            }
        }
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        pool(2).collect(operation, Source::items([0, 1])),
    )
    .await
    .expect("collect should not wait on the pending sibling");

    let err = result.unwrap_err();
    assert!(matches!(err, PoolError::Operation { position: 1, .. }));
    assert!(dropped.load(Ordering::SeqCst));
}

#[test]
fn test_run_is_lazy_until_polled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let operation = move |x: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Infallible>(x) }
    };

    let mut collect = tokio_test::task::spawn(pool(2).collect(operation, Source::items([1, 2, 3])));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let values = tokio_test::assert_ready_ok!(collect.poll());
    assert_eq!(values, vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test_log::test(tokio::test)]
async fn test_run_dispatches_on_output_mode() {
    let collecting = TaskPool::new(PoolOptions::new().with_concurrency(3));
    let output = collecting
        .run(|x: u8| async move { Ok::<_, Infallible>(x) }, Source::items([3, 1, 2]))
        .unwrap();
    assert_eq!(output.mode(), OutputMode::Collect);
    assert_eq!(output.into_vec().await.unwrap(), vec![3, 1, 2]);

    let streaming = TaskPool::new(
        PoolOptions::new()
            .with_concurrency(3)
            .with_output(OutputMode::Stream),
    );
    let output = streaming
        .run(|x: u8| async move { Ok::<_, Infallible>(x) }, Source::items([3, 1, 2]))
        .unwrap();
    assert_eq!(output.mode(), OutputMode::Stream);
    let mut values = output.into_vec().await.unwrap();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn test_misuse_reported_before_any_work() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let operation = move |x: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Infallible>(x) }
    };

    let err = TaskPool::bounded(0)
        .run(operation, Source::items([1, 2]))
        .unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
