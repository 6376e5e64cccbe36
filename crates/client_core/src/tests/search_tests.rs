use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

fn counter_task(counter: &Arc<AtomicUsize>, value: usize) -> impl Future<Output = ()> + Send {
    let counter = Arc::clone(counter);
    async move {
        counter.store(value, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn only_the_last_scheduled_task_runs() {
    let debouncer = SearchDebouncer::default();
    let fired = Arc::new(AtomicUsize::new(0));

    debouncer.schedule(counter_task(&fired, 1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.schedule(counter_task(&fired, 2));
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.schedule(counter_task(&fired, 3));
    assert!(debouncer.is_pending());

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_the_pending_task() {
    let debouncer = SearchDebouncer::new(Duration::from_millis(50));
    let fired = Arc::new(AtomicUsize::new(0));

    debouncer.schedule(counter_task(&fired, 1));
    debouncer.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_debouncer_cancels_its_timer() {
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let debouncer = SearchDebouncer::default();
        debouncer.schedule(counter_task(&fired, 1));
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
