use std::sync::Arc;

use tracescope::scrollback::{history_column, ScrollbackController};
use tracescope::{ScopeView, SourceBuffer, ViewConfig};

fn push(source: &SourceBuffer, samples: &[f32]) {
    source.begin_block(samples.len());
    for ch in 0..source.num_channels() {
        source.push_samples(ch, samples);
    }
    source.end_block();
}

#[test]
fn history_mapping_anchors_newest_left_of_the_playhead() {
    // playhead inside the view: newest ring column lands at playhead - 1
    assert_eq!(history_column(49, 50, 100, 200, 400), 199);
    assert_eq!(history_column(0, 50, 100, 200, 400), 150);
    // columns right of the playhead show the entries just before it
    assert_eq!(history_column(50, 50, 100, 200, 400), 100);
    assert_eq!(history_column(99, 50, 100, 200, 400), 149);
}

#[test]
fn history_mapping_scrolls_back_when_playhead_leaves_the_view() {
    // offset pushed the playhead 50 px past the right edge
    assert_eq!(history_column(99, 150, 100, 200, 400), 149);
    assert_eq!(history_column(0, 150, 100, 200, 400), 50);
    // wraps through the ring when looking back past column zero
    assert_eq!(history_column(0, 350, 100, 200, 400), 250);
}

#[test]
fn scroll_offset_is_clamped_to_three_screens() {
    let mut sc = ScrollbackController::new();
    sc.pause(10, 200);
    sc.set_offset(10_000.0, 100);
    assert_eq!(sc.offset(), 300.0);
    sc.set_offset(-50.0, 100);
    assert_eq!(sc.offset(), 0.0);
    sc.scroll_by(40.0, 100);
    sc.scroll_by(40.0, 100);
    assert_eq!(sc.offset(), 80.0);
    assert_eq!(sc.playhead(), 90);
}

#[test]
fn paused_view_stops_consuming_and_resumes_cleanly() {
    let config = ViewConfig {
        timebase: 0.1,
        display_width: 100,
        ..ViewConfig::default()
    };
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), config).unwrap();

    push(&source, &[7.0; 50]);
    view.refresh();
    let sbi = view.screen_buffer_index(0);

    view.pause(true);
    push(&source, &[9.0; 50]);
    view.refresh();
    assert!(view.is_paused());
    assert_eq!(
        view.screen_buffer_index(0),
        sbi,
        "paused view must not aggregate"
    );

    // scrubbing while paused repaints but still consumes nothing
    view.set_scroll_offset(120.0);
    view.refresh();
    assert_eq!(view.screen_buffer_index(0), sbi);
    assert_eq!(view.scroll_offset(), 120.0);

    view.pause(false);
    assert_eq!(view.scroll_offset(), 0.0, "resume resets the scroll offset");
    view.refresh();
    assert!(
        view.screen_buffer_index(0) > sbi,
        "live aggregation should continue after resume"
    );
}

#[test]
fn offset_change_repaints_the_full_width() {
    let config = ViewConfig {
        timebase: 0.1,
        display_width: 100,
        ..ViewConfig::default()
    };
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), config).unwrap();

    // a ramp makes every column visually distinct
    let ramp: Vec<f32> = (0..350).map(|i| ((i % 80) as f32) - 40.0).collect();
    push(&source, &ramp);
    view.refresh();
    view.pause(true);
    view.refresh();
    let anchored = view.bitmap().data().to_vec();

    view.set_scroll_offset(60.0);
    view.refresh();
    assert_ne!(
        view.bitmap().data(),
        &anchored[..],
        "scrolling back must show different history"
    );

    view.set_scroll_offset(0.0);
    view.refresh();
    assert_eq!(
        view.bitmap().data(),
        &anchored[..],
        "returning to offset zero restores the anchored render"
    );
}
