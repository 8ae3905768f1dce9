//! Row-level GF(2^8) vector operations.
//!
//! These three routines are the hot paths of encoding, recoding and row
//! reduction. They are written as straight slice loops with scalar early-outs
//! so the compiler can vectorise them; addition in particular lowers to plain
//! bytewise XOR.

use crate::common::gf256::Gf256;

/// Multiplies each byte of `vec` by `scalar`, over GF(2^8), in place.
pub fn gf256_inplace_mul_vec_by_scalar(vec: &mut [u8], scalar: u8) {
    if vec.is_empty() {
        return;
    }
    if scalar == 0 {
        vec.fill(0);
        return;
    }
    if scalar == 1 {
        return;
    }

    vec.iter_mut().for_each(|src_symbol| {
        *src_symbol = Gf256::mul_const(*src_symbol, scalar);
    });
}

/// Element-wise addition of two equal-length byte vectors over GF(2^8),
/// mutating `vec_dst`. Addition over GF(2^8) is nothing but XOR.
pub fn gf256_inplace_add_vectors(vec_dst: &mut [u8], vec_src: &[u8]) {
    vec_dst.iter_mut().zip(vec_src).for_each(|(a, b)| {
        *a ^= b;
    });
}

/// Multiplies each byte of `mul_vec` by `scalar` and adds the scaled value
/// into the corresponding byte of `add_into_vec`, over GF(2^8).
///
/// `add_into_vec[i] ^= scalar * mul_vec[i]` — the elementary row operation of
/// the decoder engine, fused so the scaled row never materialises.
pub fn gf256_mul_vec_by_scalar_then_add_into_vec(add_into_vec: &mut [u8], mul_vec: &[u8], scalar: u8) {
    if add_into_vec.is_empty() {
        return;
    }
    if scalar == 0 {
        return;
    }
    if scalar == 1 {
        gf256_inplace_add_vectors(add_into_vec, mul_vec);
        return;
    }

    add_into_vec
        .iter_mut()
        .zip(mul_vec.iter().map(|&src_symbol| Gf256::mul_const(src_symbol, scalar)))
        .for_each(|(res, scaled)| *res ^= scaled);
}

#[cfg(test)]
mod tests {
    use super::{gf256_inplace_add_vectors, gf256_inplace_mul_vec_by_scalar, gf256_mul_vec_by_scalar_then_add_into_vec};
    use crate::common::gf256::Gf256;
    use rand::Rng;

    const VEC_BYTE_LEN: usize = 1024;
    const NUM_TEST_ITERATIONS: usize = 100;

    #[test]
    fn prop_test_mul_vec_by_scalar_matches_elementwise() {
        let mut rng = rand::rng();

        (0..NUM_TEST_ITERATIONS).for_each(|_| {
            let mut vec = vec![0u8; VEC_BYTE_LEN];
            rng.fill(&mut vec[..]);
            let scalar: u8 = rng.random();

            let expected: Vec<u8> = vec.iter().map(|&symbol| (Gf256::new(symbol) * Gf256::new(scalar)).get()).collect();

            gf256_inplace_mul_vec_by_scalar(&mut vec, scalar);
            assert_eq!(vec, expected);
        });
    }

    #[test]
    fn prop_test_add_vectors_matches_elementwise() {
        let mut rng = rand::rng();

        (0..NUM_TEST_ITERATIONS).for_each(|_| {
            let mut dst = vec![0u8; VEC_BYTE_LEN];
            let mut src = vec![0u8; VEC_BYTE_LEN];
            rng.fill(&mut dst[..]);
            rng.fill(&mut src[..]);

            let expected: Vec<u8> = dst.iter().zip(&src).map(|(&a, &b)| (Gf256::new(a) + Gf256::new(b)).get()).collect();

            gf256_inplace_add_vectors(&mut dst, &src);
            assert_eq!(dst, expected);
        });
    }

    #[test]
    fn prop_test_fused_mul_add_matches_two_step() {
        let mut rng = rand::rng();

        (0..NUM_TEST_ITERATIONS).for_each(|_| {
            let mut dst = vec![0u8; VEC_BYTE_LEN];
            let mut src = vec![0u8; VEC_BYTE_LEN];
            rng.fill(&mut dst[..]);
            rng.fill(&mut src[..]);
            let scalar: u8 = rng.random();

            let mut expected = dst.clone();
            let mut scaled = src.clone();
            gf256_inplace_mul_vec_by_scalar(&mut scaled, scalar);
            gf256_inplace_add_vectors(&mut expected, &scaled);

            gf256_mul_vec_by_scalar_then_add_into_vec(&mut dst, &src, scalar);
            assert_eq!(dst, expected);
        });
    }
}
