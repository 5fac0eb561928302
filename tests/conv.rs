use rand::rngs::StdRng;
use rand::SeedableRng;
use vanillagan::layers::{Conv2d, ConvError, Layer, Mode, Padding, Shape};
use vanillagan::math::Matrix;
use vanillagan::GanError;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

#[test]
fn conv_forward_accepts_valid_square() {
    let mut conv = Conv2d::new(1, 1, 1, 1, Padding::Valid, &mut rng());
    let x = Matrix::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]);
    assert!(conv.forward(&x, Mode::Infer).is_ok());
}

#[test]
fn conv_forward_errors_on_channel_mismatch() {
    let mut conv = Conv2d::new(3, 1, 1, 1, Padding::Valid, &mut rng());
    let x = Matrix::from_vec(1, 7, vec![0.0; 7]);
    assert!(matches!(
        conv.forward(&x, Mode::Infer),
        Err(GanError::Conv(ConvError::ChannelMismatch { .. }))
    ));
}

#[test]
fn conv_forward_errors_on_non_square_input() {
    let mut conv = Conv2d::new(1, 1, 1, 1, Padding::Valid, &mut rng());
    let x = Matrix::from_vec(1, 3, vec![0.0; 3]);
    assert!(matches!(
        conv.forward(&x, Mode::Infer),
        Err(GanError::Conv(ConvError::NonSquareInput { .. }))
    ));
}

#[test]
fn valid_kernel_larger_than_input_is_rejected() {
    let conv = Conv2d::new(1, 1, 5, 1, Padding::Valid, &mut rng());
    assert!(conv.output_shape(Shape::new(1, 4, 4)).is_err());
}

#[test]
fn same_padding_keeps_spatial_size_for_even_kernels() {
    for k in [4, 5, 6] {
        let conv = Conv2d::new(2, 3, k, 1, Padding::Same, &mut rng());
        assert_eq!(
            conv.output_shape(Shape::new(2, 14, 14)).unwrap(),
            Shape::new(3, 14, 14)
        );
    }
}

#[test]
fn valid_padding_shrinks_by_kernel_minus_one() {
    let conv = Conv2d::new(1, 16, 5, 1, Padding::Valid, &mut rng());
    assert_eq!(
        conv.output_shape(Shape::new(1, 28, 28)).unwrap(),
        Shape::new(16, 24, 24)
    );
}

#[test]
fn same_padding_with_even_kernel_pads_after() {
    // 2x2 all-ones kernel over a 2x2 input: TF-style padding adds the extra
    // row/column at the bottom/right, so output (0,0) sees the full input.
    let mut conv = Conv2d::new(1, 1, 2, 1, Padding::Same, &mut rng());
    conv.w.value.data.iter_mut().for_each(|w| *w = 1.0);
    let x = Matrix::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]);
    let out = conv.forward(&x, Mode::Infer).unwrap();
    assert_eq!(out.data, vec![10.0, 6.0, 7.0, 4.0]);
}

#[test]
fn bias_is_added_per_output_channel() {
    let mut conv = Conv2d::new(1, 2, 1, 1, Padding::Valid, &mut rng());
    conv.w.value.data.iter_mut().for_each(|w| *w = 0.0);
    conv.b.value.data = vec![0.5, -1.0];
    let x = Matrix::from_vec(1, 4, vec![1.0; 4]);
    let out = conv.forward(&x, Mode::Infer).unwrap();
    assert_eq!(out.data, vec![0.5, 0.5, 0.5, 0.5, -1.0, -1.0, -1.0, -1.0]);
}
