//! End-to-end behaviour of the processor at 48 kHz in 512-frame blocks.

mod common;

use common::*;
use deliverb::dsp::{DuckGains, Ducker, ParamId};

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn output_is_bounded_for_hot_input() {
    let settings: [&[(ParamId, f32)]; 4] = [
        &[],
        &[
            (ParamId::DelayTime, 50.0),
            (ParamId::DelayRepeat, 0.95),
            (ParamId::DelayMix, 1.0),
            (ParamId::ReverbSize, 1.0),
            (ParamId::ReverbStyle, 1.0),
            (ParamId::ReverbMix, 1.0),
            (ParamId::DelayLowCut, 20.0),
            (ParamId::DelayHighCut, 20_000.0),
            (ParamId::ReverbLowCut, 20.0),
            (ParamId::ReverbHighCut, 20_000.0),
        ],
        &[
            (ParamId::DelayTime, 2000.0),
            (ParamId::DelayRepeat, 0.0),
            (ParamId::DelayMix, 0.0),
            (ParamId::ReverbSize, 0.0),
            (ParamId::ReverbMix, 0.0),
            (ParamId::DelayLowCut, 2000.0),
            (ParamId::DelayHighCut, 1000.0),
        ],
        &[
            (ParamId::DelayRepeat, 0.95),
            (ParamId::DelayMix, 1.0),
            (ParamId::ReverbMix, 1.0),
            (ParamId::DuckDelayAmount, 1.0),
            (ParamId::DuckReverbAmount, 1.0),
            (ParamId::DuckBehaviour, 1.0),
        ],
    ];

    for (i, params) in settings.iter().enumerate() {
        let mut p = processor(params);
        let left: Vec<f32> = white_noise(SAMPLE_RATE_USIZE, 11 + i as u32)
            .iter()
            .map(|x| x * 10.0)
            .collect();
        let right: Vec<f32> = white_noise(SAMPLE_RATE_USIZE, 97 + i as u32)
            .iter()
            .map(|x| x * 10.0)
            .collect();
        let (out_l, out_r) = render(&mut p, &left, &right);
        for &y in out_l.iter().chain(out_r.iter()) {
            assert!(y.is_finite(), "setting {i}: non-finite output");
            assert!(y.abs() <= OUTPUT_BOUND, "setting {i}: {y}");
        }
    }
}

#[test]
fn silence_after_input_decays_to_zero() {
    let mut p = processor(&[]);
    let mut input = pink_noise(SAMPLE_RATE_USIZE / 2, 777, 0.25);
    input.extend(silence(10 * SAMPLE_RATE_USIZE));

    let (out_l, out_r) = render(&mut p, &input, &input);
    let last_second = out_l.len() - SAMPLE_RATE_USIZE;
    assert!(peak(&out_l[last_second..]) < 1e-6);
    assert!(peak(&out_r[last_second..]) < 1e-6);

    let seconds = windowed_rms(&out_l[SAMPLE_RATE_USIZE / 2..], SAMPLE_RATE_USIZE);
    assert!(seconds.windows(2).all(|w| w[1] <= w[0]), "{seconds:?}");
}

#[test]
fn dry_only_settings_pass_soft_clipped_input() {
    let dry_settings = [
        (ParamId::DelayMix, 0.0),
        (ParamId::ReverbMix, 0.0),
        (ParamId::DuckDelayAmount, 0.0),
        (ParamId::DuckReverbAmount, 0.0),
    ];
    let left: Vec<f32> = white_noise(SAMPLE_RATE_USIZE, 5).iter().map(|x| x * 1.5).collect();
    let right = sine(220.0, 0.9, SAMPLE_RATE_USIZE, SAMPLE_RATE);

    let mut p = processor(&dry_settings);
    let (out_l, out_r) = render(&mut p, &left, &right);
    for i in 0..left.len() {
        assert!((out_l[i] - soft_clip(left[i])).abs() < 1e-6, "L[{i}]");
        assert!((out_r[i] - soft_clip(right[i])).abs() < 1e-6, "R[{i}]");
    }

    // Mono input lands on both channels
    let mut p = processor(&dry_settings);
    let (mono_l, mono_r) = render_mono(&mut p, &left);
    for i in 0..left.len() {
        assert!((mono_l[i] - soft_clip(left[i])).abs() < 1e-6);
        assert_eq!(mono_l[i], mono_r[i]);
    }
}

#[test]
fn zero_size_reverb_with_zero_mixes_is_dry() {
    let mut p = processor(&[
        (ParamId::ReverbSize, 0.0),
        (ParamId::ReverbMix, 0.0),
        (ParamId::DelayMix, 0.0),
    ]);
    let input = pink_noise(SAMPLE_RATE_USIZE, 31, 0.3);
    let (out_l, out_r) = render(&mut p, &input, &input);
    for i in 0..input.len() {
        let expected = soft_clip(input[i]);
        assert!((out_l[i] - expected).abs() < 1e-6);
        assert!((out_r[i] - expected).abs() < 1e-6);
    }
}

#[test]
fn maximum_feedback_impulse_decays_and_stays_bounded() {
    let mut p = processor(&[
        (ParamId::DelayRepeat, 0.95),
        (ParamId::ReverbSize, 1.0),
        (ParamId::ReverbStyle, 1.0),
    ]);
    let n = 60 * SAMPLE_RATE_USIZE;
    let (out_l, out_r) = render(&mut p, &impulse(n), &silence(n));

    assert!(out_l
        .iter()
        .chain(out_r.iter())
        .all(|y| y.is_finite() && y.abs() <= OUTPUT_BOUND));

    // One-second windows span several 300 ms echoes, so the envelope is
    // monotone at this resolution
    for out in [&out_l, &out_r] {
        let seconds = windowed_rms(out, SAMPLE_RATE_USIZE);
        assert_eq!(seconds.len(), 60);
        for (i, w) in seconds.windows(2).enumerate() {
            assert!(w[1] < w[0], "second {}: {} >= {}", i + 1, w[1], w[0]);
        }
        assert!(to_db(seconds[59]) < to_db(seconds[0]) - 60.0);
    }
}

#[test]
fn ducker_with_zero_amounts_is_transparent() {
    for &behaviour in &[0.0f32, 0.5, 1.0] {
        let mut ducker = Ducker::new();
        ducker.set_sample_rate(SAMPLE_RATE);
        ducker.set_behaviour(behaviour);

        let loud = white_noise(SAMPLE_RATE_USIZE / 4, 3);
        for &x in loud.iter().chain(silence(SAMPLE_RATE_USIZE / 4).iter()) {
            assert_eq!(ducker.process(x, -x), DuckGains::UNITY);
        }
    }
}

#[test]
fn reset_is_equivalent_to_a_fresh_instance() {
    let params = [
        (ParamId::DelayTime, 120.0),
        (ParamId::DelayRepeat, 0.7),
        (ParamId::ReverbStyle, 0.9),
        (ParamId::DuckDelayAmount, 0.5),
    ];
    let warmup = pink_noise(SAMPLE_RATE_USIZE, 8, 0.3);
    let probe_l = white_noise(4 * BLOCK_SIZE, 21);
    let probe_r = white_noise(4 * BLOCK_SIZE, 22);

    let mut used = processor(&params);
    render(&mut used, &warmup, &warmup);
    used.reset();
    let (used_l, used_r) = render(&mut used, &probe_l, &probe_r);

    let mut fresh = processor(&params);
    let (fresh_l, fresh_r) = render(&mut fresh, &probe_l, &probe_r);

    assert_eq!(used_l, fresh_l);
    assert_eq!(used_r, fresh_r);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn impulse_with_defaults_gives_echo_train_and_tail() {
    let n = SAMPLE_RATE_USIZE;
    let mut p = processor(&[]);
    let (out_l, out_r) = render(&mut p, &impulse(n), &silence(n));

    // 300 ms = 14400 samples between echoes; the EQ adds a few samples of lag
    let first = argmax_abs(&out_l, 14_350..14_450);
    let second = argmax_abs(&out_l, 28_750..28_850);
    assert!((14_400..=14_405).contains(&first), "{first}");
    assert!((28_800..=28_810).contains(&second), "{second}");

    let first_peak = out_l[first].abs();
    let second_peak = out_l[second].abs();
    assert!(first_peak > 4.0 * peak(&out_l[13_000..14_300]));
    // Second echo has passed the 0.3 repeat gain once more
    let ratio = second_peak / first_peak;
    assert!(ratio > 0.1 && ratio < 0.35, "{ratio}");

    // Reverb tail on both sides between the dry hit and the first echo
    assert!(rms(&out_l[3000..14_000]) > 1e-4);
    assert!(rms(&out_r[3000..14_000]) > 1e-4);

    assert!(peak(&out_l) <= 1.11 && peak(&out_r) <= 1.11);
}

#[test]
fn sine_into_dense_reverb_sustains_and_rings_out() {
    let amplitude = 10f32.powf(-6.0 / 20.0);
    let n = SAMPLE_RATE_USIZE;
    let mut input = sine(440.0, amplitude, n, SAMPLE_RATE);
    input.extend(silence(4 * n));

    let mut p = processor(&[
        (ParamId::DelayMix, 0.0),
        (ParamId::ReverbMix, 0.5),
        (ParamId::ReverbSize, 0.8),
        (ParamId::ReverbStyle, 1.0),
    ]);
    let (out_l, _) = render(&mut p, &input, &input);

    // Steady state: the reverb return adds to the dry level without running away
    let input_db = to_db(rms(&input[n / 2..n]));
    let output_db = to_db(rms(&out_l[n / 2..n]));
    assert!(output_db > input_db, "{output_db} vs {input_db}");
    assert!(output_db < input_db + 10.0, "{output_db} vs {input_db}");

    // Still audible two seconds after the tone stops
    let tail = rms(&out_l[3 * n..4 * n]);
    assert!(tail > 1e-3, "{tail}");
    assert!(rms(&out_l[4 * n..5 * n]) < tail);
}

#[test]
fn ducking_pulls_delay_down_during_bursts() {
    let n = SAMPLE_RATE_USIZE;
    let noise = pink_noise(2 * n, 12_345, 0.25);
    let mut input = noise[..n].to_vec();
    input.extend(silence(n));
    input.extend_from_slice(&noise[n..]);
    input.extend(silence(n));

    let params = [
        (ParamId::DuckDelayAmount, 1.0),
        (ParamId::DuckBehaviour, 0.0),
        (ParamId::DelayMix, 1.0),
        (ParamId::DelayRepeat, 0.5),
    ];
    let mut wet = processor(&params);
    let (with_delay, _) = render(&mut wet, &input, &input);

    let mut dry_params = params;
    dry_params[2] = (ParamId::DelayMix, 0.0);
    let mut dry = processor(&dry_params);
    let (without_delay, _) = render(&mut dry, &input, &input);

    // The only difference between the renders is the delay return
    let delay_wet: Vec<f32> = with_delay
        .iter()
        .zip(&without_delay)
        .map(|(a, b)| a - b)
        .collect();

    let settle = n / 10;
    for burst in [0, 2] {
        let gap = burst + 1;
        let burst_rms = rms(&delay_wet[burst * n + settle..(burst + 1) * n]);
        let gap_rms = rms(&delay_wet[gap * n + settle..(gap + 1) * n]);
        assert!(gap_rms > 1e-3, "gap {gap}: {gap_rms}");
        assert!(
            to_db(burst_rms) <= to_db(gap_rms) - 12.0,
            "burst {burst}: {} dB vs gap {} dB",
            to_db(burst_rms),
            to_db(gap_rms)
        );
    }
}

#[test]
fn short_delay_first_echo_position() {
    let n = SAMPLE_RATE_USIZE / 4;
    let params = [
        (ParamId::DelayTime, 50.0),
        (ParamId::DelayRepeat, 0.0),
        (ParamId::DelayMix, 1.0),
    ];
    let mut wet = processor(&params);
    let (with_delay, _) = render(&mut wet, &impulse(n), &impulse(n));

    let mut dry = processor(&[
        (ParamId::DelayTime, 50.0),
        (ParamId::DelayRepeat, 0.0),
        (ParamId::DelayMix, 0.0),
    ]);
    let (without_delay, _) = render(&mut dry, &impulse(n), &impulse(n));

    let first_echo = with_delay
        .iter()
        .zip(&without_delay)
        .position(|(a, b)| a != b)
        .unwrap();
    let expected = (50.0 * SAMPLE_RATE / 1000.0).round() as usize;
    assert!(first_echo.abs_diff(expected) <= 1, "{first_echo}");
}

#[test]
fn silence_in_gives_exact_silence_out() {
    let mut p = processor(&[]);
    let zeros = silence(BLOCK_SIZE);
    let mut out_l = vec![1.0f32; BLOCK_SIZE];
    let mut out_r = vec![1.0f32; BLOCK_SIZE];
    for _ in 0..1000 {
        p.process_stereo(&zeros, &zeros, &mut out_l, &mut out_r);
        assert!(out_l.iter().chain(out_r.iter()).all(|&x| x == 0.0));
    }
}

#[test]
fn style_opens_up_reverb_damping() {
    const FFT_SIZE: usize = 32_768;
    let freqs = [
        bin_frequency(1000.0, FFT_SIZE, SAMPLE_RATE),
        bin_frequency(10_000.0, FFT_SIZE, SAMPLE_RATE),
    ];
    let n = 2 * SAMPLE_RATE_USIZE;
    let tone: Vec<f32> = {
        let a = sine(freqs[0], 0.1, 2 * n, SAMPLE_RATE);
        let b = sine(freqs[1], 0.1, 2 * n, SAMPLE_RATE);
        a.iter().zip(&b).map(|(x, y)| x + y).collect()
    };

    let mut p = processor(&[
        (ParamId::DelayMix, 0.0),
        (ParamId::ReverbMix, 1.0),
        (ParamId::ReverbStyle, 0.0),
    ]);
    assert_eq!(p.reverb().damping_hz(), 4000.0);

    // Reverb return only: remove the (soft-clipped) dry path
    let wet_spectrum = |p: &mut deliverb::dsp::DeliVerbProcessor, input: &[f32]| {
        let (out, _) = render(p, input, input);
        let tail = out.len() - FFT_SIZE;
        let wet: Vec<f32> = out[tail..]
            .iter()
            .zip(&input[tail..])
            .map(|(y, x)| y - soft_clip(*x))
            .collect();
        let spectrum = magnitude_spectrum(&wet);
        let low = magnitude_at(&spectrum, freqs[0], FFT_SIZE, SAMPLE_RATE);
        let high = magnitude_at(&spectrum, freqs[1], FFT_SIZE, SAMPLE_RATE);
        to_db(high) - to_db(low)
    };

    let dark = wet_spectrum(&mut p, &tone[..n]);
    p.set_parameter(ParamId::ReverbStyle, 1.0);
    assert_eq!(p.reverb().damping_hz(), 12_000.0);
    let bright = wet_spectrum(&mut p, &tone[n..]);

    assert!(bright > dark + 6.0, "dark {dark} dB, bright {bright} dB");
}
