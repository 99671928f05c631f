//! Integration tests for the EventChain scheduling core

mod common;
use common::*;

use core::cell::RefCell;
use led_behavior::{EventChain, TimedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Act {
    A,
    B,
    C,
}

type TestChain<'t, const N: usize> =
    EventChain<'t, TestInstant, Act, MockTimer<'t>, MockTimeSource, N>;

fn event(delay: u64, act: Act) -> TimedEvent<TestDuration, Act> {
    TimedEvent::new(TestDuration(delay), act)
}

#[test]
fn start_fires_first_event_and_arms_the_second() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));

    // The first event runs immediately; its own delay is not waited out.
    assert_eq!(*log.borrow(), vec![Act::A]);
    assert_eq!(timer.armed(), Some(40));
    assert!(chain.is_running());
}

#[test]
fn events_fire_cyclically_in_insertion_order() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B), event(60, Act::C)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));
    for _ in 0..5 {
        let delay = timer.take_armed().expect("timer should be armed");
        clock.advance(delay);
        chain.tick(|a| log.borrow_mut().push(*a));
    }

    assert_eq!(
        *log.borrow(),
        vec![Act::A, Act::B, Act::C, Act::A, Act::B, Act::C]
    );
}

#[test]
fn armed_delay_is_reduced_by_action_execution_time() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(100, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    // Simulate an action that takes 40 ms to run.
    chain.start(|_| clock.advance(40));
    assert_eq!(timer.armed(), Some(60));

    // An action slower than the next delay floors the arm at zero.
    clock.advance(60);
    chain.tick(|_| clock.advance(250));
    assert_eq!(timer.armed(), Some(0));
}

#[test]
fn synchronous_runs_compensate_for_every_action() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(50, Act::A), event(0, Act::B), event(100, Act::C)],
        MockTimer(&timer),
        &clock,
    );

    // A and its zero-delay follower B run in one tick; both their run times
    // count against C's delay.
    chain.start(|a| match a {
        Act::A => clock.advance(10),
        Act::B => clock.advance(15),
        Act::C => {}
    });
    assert_eq!(timer.armed(), Some(75));
}

#[test]
fn zero_delay_events_run_synchronously_in_one_tick() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(0, Act::B), event(50, Act::C)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));

    // A fires, B follows immediately without an intervening timer arm.
    assert_eq!(*log.borrow(), vec![Act::A, Act::B]);
    assert_eq!(timer.armed(), Some(50));
    assert_eq!(timer.arm_count(), 1);
}

#[test]
#[should_panic(expected = "no nonzero delays")]
fn all_zero_delay_chain_panics_instead_of_spinning() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(0, Act::A), event(0, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|_| {});
}

#[test]
#[should_panic(expected = "out of range")]
fn change_delay_with_bad_index_fails_fast() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.change_delay(2, TestDuration(10));
}

#[test]
fn change_delay_applies_on_the_next_cycle() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|_| {});
    assert_eq!(timer.take_armed(), Some(40));

    chain.change_delay(0, TestDuration(500));

    clock.advance(40);
    chain.tick(|_| {});
    assert_eq!(timer.armed(), Some(500));
}

#[test]
fn start_then_stop_fires_at_most_one_event() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));
    chain.stop();

    assert!(!chain.is_running());
    assert_eq!(timer.armed(), None);

    // A stray wakeup that was already in flight must do nothing.
    chain.tick(|a| log.borrow_mut().push(*a));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn stop_is_idempotent() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> =
        EventChain::with_events(&[event(100, Act::A)], MockTimer(&timer), &clock);

    chain.stop(); // never started
    chain.start(|_| {});
    chain.stop();
    chain.stop();
    assert_eq!(timer.cancel_count(), 1);
}

#[test]
fn start_on_running_chain_is_a_no_op() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));
    chain.start(|a| log.borrow_mut().push(*a));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn start_resets_the_cursor_but_resume_continues() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));
    chain.stop();

    // Resume picks up with the event the chain was about to fire.
    chain.resume(|a| log.borrow_mut().push(*a));
    assert_eq!(*log.borrow(), vec![Act::A, Act::B]);
    chain.stop();

    // Start goes back to the first event.
    chain.start(|a| log.borrow_mut().push(*a));
    assert_eq!(*log.borrow(), vec![Act::A, Act::B, Act::A]);
}

#[test]
fn add_event_while_running_restarts_from_the_first_event() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();
    let log = RefCell::new(Vec::new());

    let mut chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    chain.start(|a| log.borrow_mut().push(*a));

    let index = chain
        .add_event(event(60, Act::C), |a| log.borrow_mut().push(*a))
        .unwrap();
    assert_eq!(index, 2);
    assert_eq!(chain.len(), 3);

    // Restart fired the first event again.
    assert_eq!(*log.borrow(), vec![Act::A, Act::A]);
    assert!(chain.is_running());
}

#[test]
fn add_event_past_capacity_is_rejected() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<2> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B)],
        MockTimer(&timer),
        &clock,
    );

    let result = chain.add_event(event(60, Act::C), |_| {});
    assert!(result.is_err());
    assert_eq!(chain.len(), 2);
}

#[test]
fn timing_queries_sum_relative_delays() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let chain: TestChain<4> = EventChain::with_events(
        &[event(100, Act::A), event(40, Act::B), event(60, Act::C)],
        MockTimer(&timer),
        &clock,
    );

    assert_eq!(chain.total_time(), TestDuration(200));
    assert_eq!(chain.total_time_before(0), TestDuration(0));
    assert_eq!(chain.total_time_before(2), TestDuration(140));
    assert_eq!(chain.delay_of(1), TestDuration(40));
}

#[test]
fn labeled_events_can_be_found_for_retiming() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    let mut chain: TestChain<4> = EventChain::with_events(
        &[
            TimedEvent::new(TestDuration(100), Act::A).with_label("warmup"),
            TimedEvent::new(TestDuration(40), Act::B).with_label("flash"),
        ],
        MockTimer(&timer),
        &clock,
    );

    assert_eq!(chain.position_of("flash"), Some(1));
    assert_eq!(chain.position_of("missing"), None);

    let index = chain.position_of("flash").unwrap();
    chain.change_delay(index, TestDuration(10));
    assert_eq!(chain.delay_of(1), TestDuration(10));
}

#[test]
fn dropping_a_running_chain_cancels_its_timer() {
    let timer = TimerState::new();
    let clock = MockTimeSource::new();

    {
        let mut chain: TestChain<4> = EventChain::with_events(
            &[event(100, Act::A), event(40, Act::B)],
            MockTimer(&timer),
            &clock,
        );
        chain.start(|_| {});
        assert!(timer.armed().is_some());
    }

    assert_eq!(timer.armed(), None);
    assert_eq!(timer.cancel_count(), 1);
}
