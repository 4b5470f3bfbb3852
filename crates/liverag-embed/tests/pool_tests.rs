use candle_core::{DType, Device, Tensor};
use liverag_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding_per_row() {
    let dev = Device::Cpu;
    // Two rows, two tokens, hidden dim 2. Row 0 masks its second token.
    let h = Tensor::from_slice(&[3.0f32, 4.0,  100.0, 100.0,
                                 1.0, 0.0,    3.0, 0.0],
                               (2, 2, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0, 1, 1], (2, 2), &dev).unwrap()
        .to_dtype(DType::F32).unwrap();
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();

    // Row 0: mean = [3,4] -> [0.6, 0.8]
    assert!((out[0][0] - 0.6).abs() < 1e-5 && (out[0][1] - 0.8).abs() < 1e-5, "row0={:?}", out[0]);
    // Row 1: mean = [2,0] -> [1, 0]
    assert!((out[1][0] - 1.0).abs() < 1e-5 && out[1][1].abs() < 1e-5, "row1={:?}", out[1]);
}

#[test]
fn mismatched_mask_is_rejected() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((1, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
