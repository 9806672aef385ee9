use super::*;

#[test]
fn events_fire_in_due_order_then_schedule_order() {
    let mut q = TimerQueue::new();
    q.schedule_at(TimeMs(300), "c");
    q.schedule_at(TimeMs(100), "a");
    q.schedule_at(TimeMs(100), "b");

    let mut order = Vec::new();
    while let Some(f) = q.pop_due(TimeMs(1_000)) {
        order.push(f.event);
    }
    assert_eq!(order, vec!["a", "b", "c"]);
    assert!(q.is_empty());
}

#[test]
fn nothing_fires_before_its_due_time() {
    let mut q = TimerQueue::new();
    q.schedule_at(TimeMs(500), ());
    assert!(q.pop_due(TimeMs(499)).is_none());
    assert_eq!(q.next_due(), Some(TimeMs(500)));
    let f = q.pop_due(TimeMs(500)).unwrap();
    assert_eq!(f.due, TimeMs(500));
}

#[test]
fn cancel_is_exact_and_idempotent() {
    let mut q = TimerQueue::new();
    let a = q.schedule_at(TimeMs(10), 1);
    let b = q.schedule_at(TimeMs(20), 2);
    assert!(q.cancel(a));
    assert!(!q.cancel(a));
    assert!(!q.is_pending(a));
    assert!(q.is_pending(b));
    assert_eq!(q.len(), 1);

    let f = q.pop_due(TimeMs(100)).unwrap();
    assert_eq!(f.event, 2);
    assert!(!q.cancel(b), "fired events are no longer cancellable");
}

#[test]
fn cancel_all_reports_outstanding_count() {
    let mut q = TimerQueue::new();
    for i in 0..5 {
        q.schedule_at(TimeMs(i * 10), i);
    }
    q.pop_due(TimeMs(0));
    assert_eq!(q.cancel_all(), 4);
    assert_eq!(q.cancel_all(), 0);
    assert!(q.pop_due(TimeMs(u64::MAX)).is_none());
}

#[test]
fn handlers_can_reschedule_while_draining() {
    let mut q = TimerQueue::new();
    q.schedule_at(TimeMs(0), 0u32);
    let mut fired = 0;
    while let Some(f) = q.pop_due(TimeMs(1_000)) {
        fired += 1;
        if f.event < 3 {
            q.schedule_at(f.due.saturating_add(TimeMs(400)), f.event + 1);
        }
    }
    assert_eq!(fired, 3, "0@0, 1@400, 2@800; 3@1200 is still pending");
    assert_eq!(q.len(), 1);
    assert_eq!(q.next_due(), Some(TimeMs(1_200)));
}
