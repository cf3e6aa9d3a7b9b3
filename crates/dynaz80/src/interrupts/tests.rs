use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use super::*;

/// Stand-in for the execution loop: acknowledge the halt, take one
/// interrupt and resume.
fn service_one(manager: &InterruptManager) -> u16 {
    while !manager.is_halted() {
        thread::yield_now();
    }
    manager.notify_halt();
    let address = manager.wait_for_next_interrupt();
    manager.notify_resume();
    address
}

#[test]
fn starts_running() {
    let manager = InterruptManager::new();
    assert_eq!(manager.phase(), InterruptPhase::Running);
    assert!(!manager.is_halted());
    assert!(!manager.interrupt_in_flight());
}

#[test]
fn halt_is_sticky_until_resume() {
    let manager = InterruptManager::new();
    manager.halt();
    manager.halt();
    assert_eq!(manager.phase(), InterruptPhase::Halted);
    manager.notify_halt();
    manager.notify_resume();
    assert_eq!(manager.phase(), InterruptPhase::Running);
}

#[test]
fn queued_request_ends_an_idle_halt() {
    let manager = InterruptManager::new();
    assert!(!manager.is_halted_without_request(), "running is not halted");
    manager.halt();
    assert!(manager.is_halted_without_request());

    assert!(manager.request_interrupt(0x0038));
    assert!(!manager.is_halted_without_request());
    manager.notify_halt();
    assert_eq!(manager.wait_for_next_interrupt(), 0x0038);
    manager.notify_resume();
    assert!(!manager.is_halted_without_request());
}

#[test]
fn interrupt_forces_a_halt_and_is_delivered_once() {
    let manager = InterruptManager::new();
    let producer = {
        let manager = manager.clone();
        thread::spawn(move || manager.interrupt(0x0038))
    };

    assert_eq!(service_one(&manager), 0x0038);
    assert!(producer.join().unwrap());
    assert!(!manager.is_halted());
    assert!(!manager.interrupt_in_flight());
}

#[test]
fn interrupt_waits_for_a_cpu_halt_to_be_acknowledged() {
    let manager = InterruptManager::new();
    manager.halt();
    let producer = {
        let manager = manager.clone();
        thread::spawn(move || manager.interrupt(0x0040))
    };

    while !manager.interrupt_in_flight() {
        thread::yield_now();
    }
    assert_eq!(manager.phase(), InterruptPhase::Halted, "nothing delivered before the halt is seen");
    manager.notify_halt();
    assert_eq!(manager.wait_for_next_interrupt(), 0x0040);
    assert_eq!(manager.phase(), InterruptPhase::DeliveringInterrupt);
    manager.notify_resume();
    assert!(producer.join().unwrap());
}

#[test]
fn second_request_is_dropped_while_one_is_in_flight() {
    let manager = InterruptManager::new();
    assert!(manager.request_interrupt(0x0048));
    assert!(!manager.request_interrupt(0x0050));
    assert!(!manager.interrupt(0x0058), "blocking requests are dropped too");

    manager.notify_halt();
    assert_eq!(manager.wait_for_next_interrupt(), 0x0048);
    manager.notify_resume();
    assert_eq!(manager.phase(), InterruptPhase::Running);

    assert!(manager.request_interrupt(0x0050), "accepted again once delivered");
}

#[test]
fn request_interrupt_does_not_block() {
    let manager = InterruptManager::new();
    assert!(manager.request_interrupt(0x0060));
    assert_eq!(manager.phase(), InterruptPhase::InterruptPending);
    assert!(manager.is_halted());
    assert!(manager.interrupt_in_flight());
}

#[test]
fn request_arriving_during_delivery_stays_pending_after_resume() {
    let manager = InterruptManager::new();
    manager.request_interrupt(0x0040);
    manager.notify_halt();
    manager.wait_for_next_interrupt();

    assert!(manager.request_interrupt(0x0048));
    manager.notify_resume();
    assert_eq!(manager.phase(), InterruptPhase::InterruptPending);
    assert_eq!(manager.wait_for_next_interrupt(), 0x0048);
}

#[test]
fn resume_tasks_run_exactly_once() {
    let manager = InterruptManager::new();
    let runs = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let runs = Arc::clone(&runs);
        manager.add_resume_task(move || {
            runs.fetch_add(1, Ordering::SeqCst);
        });
    }

    manager.halt();
    manager.notify_resume();
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    manager.halt();
    manager.notify_resume();
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn resume_task_may_use_the_manager() {
    let manager = InterruptManager::new();
    let handle = manager.clone();
    manager.add_resume_task(move || {
        handle.request_interrupt(0x0050);
    });
    manager.notify_resume();
    assert_eq!(manager.phase(), InterruptPhase::InterruptPending);
}

#[test]
fn many_producers_deliver_at_most_one_each() {
    let manager = InterruptManager::new();
    let producers: Vec<_> = (0..4u16)
        .map(|n| {
            let manager = manager.clone();
            thread::spawn(move || manager.interrupt(0x40 + n * 8))
        })
        .collect();

    let mut delivered = Vec::new();
    loop {
        if producers.iter().all(|p| p.is_finished()) && !manager.interrupt_in_flight() {
            break;
        }
        if manager.interrupt_in_flight() {
            delivered.push(service_one(&manager));
        } else {
            thread::yield_now();
        }
    }

    let accepted = producers
        .into_iter()
        .map(|p| p.join().unwrap())
        .filter(|accepted| *accepted)
        .count();
    assert_eq!(accepted, delivered.len());
    assert!(accepted >= 1);
}
