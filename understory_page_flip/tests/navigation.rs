// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end navigation scenarios for `BookFlip`.
//!
//! These drive the controller the way a host would: timestamps advance by the
//! flip duration between page turns, and pointer events arrive as mouse or
//! touch input.

use kurbo::Point;
use understory_page_flip::{BookFlip, FlipConfig, FlipEvent, FlipOptions, Page, PointerInput};

fn five_page_book() -> BookFlip<String> {
    let pages = (0..5)
        .map(|i| Page::new(format!("page-{i}-front.jpg"), format!("page-{i}-back.jpg")))
        .collect();
    BookFlip::new(pages, FlipConfig::default())
}

fn at(x: f64) -> PointerInput {
    PointerInput::mouse(Point::new(x, 240.0))
}

#[test]
fn reading_to_the_end_and_one_more() {
    let mut book = five_page_book();
    let duration = book.config().duration;

    for i in 0..5 {
        assert!(book.next_page(i * duration), "turn {i} should commit");
    }
    assert_eq!(book.current_page(), 5);
    assert!(!book.can_go_next());
    assert_eq!(book.progress(), 100.0);

    let revision = book.revision();
    assert!(!book.next_page(10 * duration));
    assert_eq!(book.current_page(), 5);
    // Only the pending flip-lock release changed state.
    assert_eq!(book.revision(), revision + 1);
}

#[test]
fn double_click_turns_once() {
    let mut book = five_page_book();
    assert!(book.next_page(1_000));
    assert!(!book.next_page(1_050));
    assert_eq!(book.current_page(), 1);
}

#[test]
fn short_drag_is_abandoned() {
    let mut book = five_page_book();
    assert!(book.handle_drag_start(&at(100.0), 0));
    book.handle_drag_move(&at(60.0));
    assert_eq!(book.drag_progress(), -0.1);

    assert!(!book.handle_drag_end(10));
    assert_eq!(book.current_page(), 0);
    assert_eq!(book.drag_progress(), 0.0);
    assert!(!book.is_dragging());
}

#[test]
fn long_drag_turns_forward() {
    let mut book = five_page_book();
    book.handle_drag_start(&at(100.0), 0);
    book.handle_drag_move(&at(-220.0));
    assert_eq!(book.drag_progress(), -0.8);

    assert!(book.handle_drag_end(10));
    assert_eq!(book.current_page(), 1);
    assert_eq!(book.drag_progress(), 0.0);
    assert!(book.is_flipping());
}

#[test]
fn drag_progress_stays_clamped() {
    let mut book = five_page_book();
    book.handle_drag_start(&at(0.0), 0);
    for x in [-5_000.0, -400.0, -1.0, 0.0, 250.0, 400.0, 9_000.0] {
        book.handle_drag_move(&at(x));
        let progress = book.drag_progress();
        assert!((-1.0..=1.0).contains(&progress), "{progress} escaped at x = {x}");
    }
    book.handle_drag_end(0);
    assert_eq!(book.drag_progress(), 0.0);
}

#[test]
fn drag_end_without_drag_is_a_no_op() {
    let mut book = five_page_book();
    let revision = book.revision();
    assert!(!book.handle_drag_end(0));
    assert!(!book.handle_drag_move(&at(50.0)));
    assert_eq!(book.drag_progress(), 0.0);
    assert_eq!(book.revision(), revision);
}

#[test]
fn every_out_of_range_target_is_ignored() {
    let mut book = five_page_book();
    book.go_to_page(2, 0);
    for target in 6..64 {
        assert!(!book.go_to_page(target, 10_000));
        assert_eq!(book.current_page(), 2);
    }
}

#[test]
fn drag_commit_respects_auto_play_flip() {
    let options = FlipOptions {
        auto_play: Some(true),
        auto_play_interval: Some(1_000),
        ..FlipOptions::default()
    };
    let mut book = BookFlip::new(
        vec![Page::new((), ()); 5],
        options.resolve().expect("valid options"),
    );
    book.mount(0);

    book.handle_drag_start(&at(400.0), 900);
    book.handle_drag_move(&at(0.0));
    // Auto-play turns the page mid-drag; the drag commit then hits the flip-lock.
    assert!(!book.handle_drag_end(1_200));
    assert_eq!(book.current_page(), 1);
    assert_eq!(book.drag_progress(), 0.0);
}

#[test]
fn notifications_follow_the_state_machine() {
    let mut book = five_page_book();
    book.go_to_page(3, 0);
    book.prev_page(800);
    book.tick(1_600);

    let events: Vec<_> = book.drain_events().collect();
    assert_eq!(
        events,
        [
            FlipEvent::FlipStart(3),
            FlipEvent::PageChange(3),
            FlipEvent::FlipEnd(3),
            FlipEvent::FlipStart(2),
            FlipEvent::PageChange(2),
            FlipEvent::FlipEnd(2),
        ]
    );
}
