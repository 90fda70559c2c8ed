use tracescope::aggregate::PixelAggregator;
use tracescope::config::ViewConfig;
use tracescope::source::SourceBuffer;
use tracescope::trigger::{TriggerController, TriggerPhase, TriggerPolarity};

// 1000 Hz * 0.1 s / 100 px = exactly 1 sample per pixel, so trigger
// alignment can be checked sample-for-sample.
fn unit_ratio_config() -> ViewConfig {
    ViewConfig {
        timebase: 0.1,
        display_width: 100,
        ..ViewConfig::default()
    }
}

fn push_with_event(source: &SourceBuffer, samples: &[f32], event_offset: Option<usize>) {
    source.begin_block(samples.len());
    source.push_samples(0, samples);
    if let Some(offset) = event_offset {
        source.add_event(offset, 0, true);
        source.add_event(offset + 1, 0, false);
    }
    source.end_block();
}

#[test]
fn rewind_places_trigger_a_third_across_the_view() {
    let source = SourceBuffer::new(1, 2000, 1000.0);
    let config = unit_ratio_config();
    let mut agg = PixelAggregator::new(1, config.display_width);
    let mut trig = TriggerController::new(0);
    agg.sync(&source);
    trig.set_line(&source, Some(0), TriggerPolarity::Rising);
    assert_eq!(trig.phase(), TriggerPhase::Armed);

    let ramp: Vec<f32> = (0..600).map(|i| i as f32).collect();
    push_with_event(&source, &ramp, Some(500));
    let outcome = agg.poll(&source, &config, &mut trig);

    // trigger at ring index 500, lookback = min(100 * 1 / 3, 1000) = 33
    assert!(outcome.rewound);
    assert_eq!(trig.trials(), 0, "first rewind starts trial zero");
    for col in 0..20 {
        let expected = (467 + col) as f32;
        let got = agg.columns().mean(0, col);
        assert!(
            (got - expected).abs() < 1e-3,
            "column {col} should hold sample {expected}, got {got}"
        );
    }
    // the sweep completed and holds at the far edge awaiting a new event
    assert_eq!(agg.screen_buffer_index(0), config.display_width - 1);
    assert_eq!(trig.phase(), TriggerPhase::Armed);
    assert!(trig.holding());
}

#[test]
fn lookback_is_clamped_to_half_the_source() {
    let trig = TriggerController::new(0);
    // screen third would be 1333 samples, but only half of 2000 may be used
    assert_eq!(trig.rewind_target(1500, 600, 20.0 / 3.0 * 2.0, 2000), 500);
    // un-clamped case
    assert_eq!(trig.rewind_target(500, 100, 1.0, 2000), 467);
    // wrap below zero
    assert_eq!(trig.rewind_target(10, 100, 1.0, 2000), 1977);
}

#[test]
fn incomplete_sweep_keeps_filling_on_later_polls() {
    let source = SourceBuffer::new(1, 2000, 1000.0);
    let config = unit_ratio_config();
    let mut agg = PixelAggregator::new(1, config.display_width);
    let mut trig = TriggerController::new(0);
    agg.sync(&source);
    trig.set_line(&source, Some(0), TriggerPolarity::Rising);

    // only 20 post-rewind samples exist, so the sweep cannot finish yet
    let ramp: Vec<f32> = (0..600).map(|i| i as f32).collect();
    push_with_event(&source, &ramp, Some(580));
    agg.poll(&source, &config, &mut trig);
    assert_eq!(trig.phase(), TriggerPhase::Filling);
    let partial = agg.screen_buffer_index(0);
    assert!(partial < config.display_width - 1);

    // more data arrives; the sweep runs to the far edge and re-arms
    push_with_event(&source, &vec![0.0; 200], None);
    agg.poll(&source, &config, &mut trig);
    assert_eq!(agg.screen_buffer_index(0), config.display_width - 1);
    assert_eq!(trig.phase(), TriggerPhase::Armed);
}

#[test]
fn identical_trials_average_to_a_single_trial() {
    let source = SourceBuffer::new(1, 8000, 1000.0);
    let config = unit_ratio_config();
    let mut agg = PixelAggregator::new(1, config.display_width);
    let mut trig = TriggerController::new(0);
    agg.sync(&source);
    trig.set_line(&source, Some(0), TriggerPolarity::Rising);
    trig.set_averaging(true);

    for trial in 0..4 {
        push_with_event(&source, &vec![60.0; 400], Some(100));
        agg.poll(&source, &config, &mut trig);
        assert_eq!(trig.trials(), trial);
    }

    for col in 0..config.display_width - 1 {
        let got = agg.columns().mean(0, col);
        assert!(
            (got - 60.0).abs() < 1e-3,
            "averaged column {col} drifted to {got}"
        );
    }
}

#[test]
fn alternating_trials_converge_toward_zero() {
    let source = SourceBuffer::new(1, 16_000, 1000.0);
    let config = unit_ratio_config();
    let mut agg = PixelAggregator::new(1, config.display_width);
    let mut trig = TriggerController::new(0);
    agg.sync(&source);
    trig.set_line(&source, Some(0), TriggerPolarity::Rising);
    trig.set_averaging(true);

    let amplitude = 80.0f32;
    let trials = 6;
    for trial in 0..trials {
        let value = if trial % 2 == 0 { amplitude } else { -amplitude };
        push_with_event(&source, &vec![value; 400], Some(100));
        agg.poll(&source, &config, &mut trig);
    }

    let bound = amplitude / trials as f32;
    for col in 1..config.display_width - 1 {
        let got = agg.columns().mean(0, col).abs();
        assert!(
            got <= bound + 1e-3,
            "column {col} = {got} has not converged (bound {bound})"
        );
    }
}

#[test]
fn disabling_averaging_restarts_the_trial_cycle() {
    let source = SourceBuffer::new(1, 8000, 1000.0);
    let config = unit_ratio_config();
    let mut agg = PixelAggregator::new(1, config.display_width);
    let mut trig = TriggerController::new(0);
    agg.sync(&source);
    trig.set_line(&source, Some(0), TriggerPolarity::Rising);
    trig.set_averaging(true);

    push_with_event(&source, &vec![10.0; 400], Some(100));
    agg.poll(&source, &config, &mut trig);
    push_with_event(&source, &vec![10.0; 400], Some(100));
    agg.poll(&source, &config, &mut trig);
    assert_eq!(trig.trials(), 1);

    trig.set_averaging(false);
    assert_eq!(trig.trials(), -1);

    // next trigger overwrites with a fresh, unaveraged trace
    push_with_event(&source, &vec![-30.0; 400], Some(100));
    agg.poll(&source, &config, &mut trig);
    assert_eq!(trig.trials(), 0);
    let got = agg.columns().mean(0, 10);
    assert!(
        (got + 30.0).abs() < 1e-3,
        "fresh trial should overwrite, got {got}"
    );
}
