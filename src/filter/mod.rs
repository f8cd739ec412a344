//! FIR filter design and application.
//!
//! - [`design`]: Hamming-windowed sinc high-pass / low-pass / band-pass FIR
//!   design, matching `mne.filter.create_filter(fir_window='hamming', phase='zero')`.
//! - [`apply`]: Overlap-add zero-phase convolution, matching MNE's
//!   `_overlap_add_filter` / `_1d_overlap_filter`.

pub mod apply;
pub mod design;

pub use design::{
    auto_trans_bandwidth, auto_trans_bandwidth_low, auto_filter_length, check_cutoffs,
    design_filter, design_highpass, design_lowpass, design_bandpass,
};
pub use apply::{apply_fir_zero_phase, filter_1d, OverlapAdd};
