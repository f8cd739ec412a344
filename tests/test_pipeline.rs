mod common;
use common::{max_abs_diff, multi_sine};
use epochset::transform::{RawPipeline, Transform, WindowPipeline};
use epochset::transform::raw::{FilterRawTransformer, ZscoreRawTransformer};
use epochset::transform::window::{FilterWindowTransformer, ZscoreWindowTransformer};
use epochset::{Error, Event, RawRecording};
use ndarray::Array2;

fn raw_chain() -> RawPipeline {
    RawPipeline::empty()
        .step("bandpass_filter", FilterRawTransformer::bandpass(1.0, 80.0)).unwrap()
        .step("zscorer", ZscoreRawTransformer).unwrap()
}

fn window_chain() -> WindowPipeline {
    WindowPipeline::empty()
        .step("FIR_filter", FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0)).unwrap()).unwrap()
        .step("zscorer", ZscoreWindowTransformer).unwrap()
}

#[test]
fn raw_chain_keeps_metadata() {
    let events = vec![Event::new(100, 500, 2), Event::new(1500, 500, 3)];
    let raw = multi_sine(&[10.0, 20.0], 250.0, 4000, events.clone())
        .with_ch_names(vec!["C3".into(), "C4".into()]);
    let out = raw_chain().transform(raw).unwrap();
    assert_eq!(out.data.dim(), (2, 4000));
    assert_eq!(out.sfreq, 250.0);
    assert_eq!(out.ch_names, vec!["C3", "C4"]);
    assert_eq!(out.events, events);

    for row in out.data.rows() {
        let m = row.sum() / row.len() as f32;
        assert!(m.abs() < 1e-4, "channel mean {m}");
    }
}

#[test]
fn window_chain_is_deterministic() {
    let x = Array2::from_shape_fn((22, 200), |(c, t)| ((c * 13 + t * 5) % 23) as f32 - 11.0);
    let chain = window_chain();
    let a = chain.transform(x.clone()).unwrap();
    let b = chain.transform(x).unwrap();
    assert_eq!(a.dim(), (22, 200));
    assert_eq!(max_abs_diff(&a, &b), 0.0);
}

#[test]
fn window_chain_output_is_standardised() {
    let x = multi_sine(&[9.0, 10.0, 11.0], 250.0, 200, vec![]).data * 30.0;
    let y = window_chain().transform(x).unwrap();
    for row in y.rows() {
        let n = row.len() as f32;
        let m = row.sum() / n;
        let sd = (row.iter().map(|v| (v - m).powi(2)).sum::<f32>() / n).sqrt();
        assert!(m.abs() < 1e-4);
        approx::assert_abs_diff_eq!(sd, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn raw_filter_rejects_cutoff_above_nyquist() {
    let raw = RawRecording::new(Array2::zeros((1, 1000)), 100.0);
    let chain = RawPipeline::empty()
        .step("bandpass_filter", FilterRawTransformer::bandpass(1.0, 80.0)).unwrap();
    let err = chain.transform(raw).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidFilter(_))));
}

#[test]
fn step_names_are_unique() {
    let err = WindowPipeline::empty()
        .step("zscorer", ZscoreWindowTransformer).unwrap()
        .step("zscorer", ZscoreWindowTransformer)
        .unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::DuplicateStep("zscorer".into())));
}

#[test]
fn named_step_can_be_applied_alone() {
    let chain = window_chain();
    assert_eq!(chain.len(), 2);
    let z = chain.named_step("zscorer").unwrap();
    let x = Array2::from_shape_fn((1, 10), |(_, t)| t as f32);
    let y = z.transform(x).unwrap();
    approx::assert_abs_diff_eq!(y.sum(), 0.0, epsilon = 1e-4);
}
