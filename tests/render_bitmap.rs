use std::sync::Arc;

use tracescope::{ScopeView, SourceBuffer, ViewConfig};

fn unit_ratio_config() -> ViewConfig {
    ViewConfig {
        timebase: 0.1,
        display_width: 100,
        ..ViewConfig::default()
    }
}

fn push(source: &SourceBuffer, samples: &[f32]) {
    source.begin_block(samples.len());
    for ch in 0..source.num_channels() {
        source.push_samples(ch, samples);
    }
    source.end_block();
}

fn column_bytes(pixmap: &tiny_skia::Pixmap, x: usize) -> Vec<u8> {
    let w = pixmap.width() as usize;
    let data = pixmap.data();
    (0..pixmap.height() as usize)
        .flat_map(|y| data[(y * w + x) * 4..(y * w + x) * 4 + 4].to_vec())
        .collect()
}

#[test]
fn pixels_outside_the_dirty_span_are_untouched() {
    let source = Arc::new(SourceBuffer::new(2, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), unit_ratio_config()).unwrap();

    let ramp: Vec<f32> = (0..30).map(|i| (i as f32) * 3.0 - 40.0).collect();
    push(&source, &ramp);
    view.refresh();

    let before: Vec<Vec<u8>> = (0..100).map(|x| column_bytes(view.bitmap(), x)).collect();
    let playhead = view.bitmap_playhead();

    push(&source, &[25.0; 20]);
    view.refresh();

    // dirty columns: 20 filled plus the playhead marker column after them
    let dirty: Vec<usize> = (0..=20).map(|k| (playhead + k) % 100).collect();
    for x in 0..100usize {
        if dirty.contains(&x) {
            continue;
        }
        assert_eq!(
            column_bytes(view.bitmap(), x),
            before[x],
            "column {x} is outside the dirty span but changed"
        );
    }
}

#[test]
fn refresh_without_new_data_changes_nothing() {
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), unit_ratio_config()).unwrap();
    push(&source, &[12.0; 40]);
    view.refresh();

    let before = view.bitmap().data().to_vec();
    view.refresh();
    assert_eq!(view.bitmap().data(), &before[..], "idle poll must not repaint");
}

#[test]
fn playhead_marker_sits_after_the_newest_column() {
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), unit_ratio_config()).unwrap();
    push(&source, &[0.0; 30]);
    view.refresh();
    push(&source, &[0.0; 10]);
    view.refresh();

    let marker = view.color_scheme().playhead;
    let x = view.bitmap_playhead();
    let pixel = view.bitmap().pixels()[x]; // y = 0 is part of the dashed marker
    assert_eq!(
        (pixel.red(), pixel.green(), pixel.blue()),
        (marker.red(), marker.green(), marker.blue()),
        "dashed playhead marker missing at column {x}"
    );
}

#[test]
fn event_overlay_tints_the_channel_band() {
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), unit_ratio_config()).unwrap();
    view.set_event_display(0, true);

    source.begin_block(40);
    source.push_samples(0, &[0.0; 40]);
    source.add_event(0, 0, true);
    source.end_block();
    view.refresh();

    let background = view.color_scheme().background;
    // y = 1 carries neither zero line nor trace; only the overlay tints it
    let w = view.bitmap().width() as usize;
    let tinted = (0..view.bitmap_playhead()).any(|x| {
        let p = view.bitmap().pixels()[w + x];
        (p.red(), p.green(), p.blue())
            != (background.red(), background.green(), background.blue())
    });
    assert!(tinted, "enabled TTL overlay should tint the band");
}

#[test]
fn column_ring_wrap_forces_a_consistent_redraw() {
    // display 64 px, column ring 256; 300 samples at ratio 1 wrap it
    let config = ViewConfig {
        timebase: 0.064,
        display_width: 64,
        ..ViewConfig::default()
    };
    let source = Arc::new(SourceBuffer::new(1, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), config).unwrap();

    push(&source, &[5.0; 300]);
    view.refresh();

    assert_eq!(view.screen_buffer_index(0), 300 % 256);
    assert!(view.bitmap_playhead() < 64);
}

#[cfg(feature = "snapshot")]
#[test]
fn bitmap_snapshot_saves_as_png() {
    let source = Arc::new(SourceBuffer::new(2, 4000, 1000.0));
    let mut view = ScopeView::new(0, source.clone(), unit_ratio_config()).unwrap();
    push(&source, &[42.0; 60]);
    view.refresh();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.png");
    view.save_png(&path).unwrap();
    let written = std::fs::metadata(&path).unwrap().len();
    assert!(written > 0, "snapshot file is empty");
}
