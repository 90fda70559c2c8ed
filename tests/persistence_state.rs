use std::sync::Arc;

use tracescope::{
    DrawMethod, ScopeView, SourceBuffer, TriggerPolarity, ViewConfig, ViewStateSerde,
};

fn make_view() -> ScopeView {
    let source = Arc::new(SourceBuffer::new(4, 4000, 1000.0));
    ScopeView::new(0, source, ViewConfig::default()).unwrap()
}

#[test]
fn view_state_round_trips_through_json() {
    let mut view = make_view();
    view.set_timebase(0.5);
    view.set_draw_method(DrawMethod::Supersampled);
    view.set_event_display(3, true);
    view.set_median_offset(true);
    view.set_channel_range(2, 500.0);
    view.set_channel_inverted(1, true);
    view.set_channel_enabled(3, false);
    view.set_averaging(true);
    view.set_trigger_channel(Some(5), TriggerPolarity::Falling);

    let state: ViewStateSerde = (&view).into();
    let json = serde_json::to_string(&state).expect("state should serialize");
    let restored: ViewStateSerde = serde_json::from_str(&json).expect("state should deserialize");

    let mut fresh = make_view();
    restored.apply_to(&mut fresh);

    assert_eq!(fresh.config().timebase, 0.5);
    assert_eq!(fresh.config().draw_method, DrawMethod::Supersampled);
    assert!(fresh.config().event_display[3]);
    assert!(fresh.config().median_offset);
    assert_eq!(fresh.channels()[2].range, 500.0);
    assert!(fresh.channels()[1].inverted);
    assert!(!fresh.channels()[3].enabled);
    assert!(fresh.averaging());
    assert_eq!(fresh.trigger_line(), Some(5));
    assert_eq!(fresh.trigger_polarity(), TriggerPolarity::Falling);
}

#[test]
fn apply_ignores_channel_entries_beyond_the_stream() {
    let mut view = make_view();
    let mut state: ViewStateSerde = (&view).into();
    state.ranges = vec![100.0; 16];
    state.enabled = vec![true; 16];
    state.inverted = vec![false; 16];

    state.apply_to(&mut view);
    assert_eq!(view.channels().len(), 4);
    assert_eq!(view.channels()[3].range, 100.0);
}
