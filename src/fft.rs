use num_complex::Complex64;
use std::f64::consts::PI;

/// Smallest power of two greater than or equal to `n`.
pub fn next_pow2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut p = 1usize;
    while p < n {
        p <<= 1;
    }
    p
}

fn bit_reverse_permute(buf: &mut [Complex64]) {
    let n = buf.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            buf.swap(i, j);
        }
    }
}

fn fft_inplace(buf: &mut [Complex64], inverse: bool) {
    let n = buf.len();
    assert!(n.is_power_of_two(), "FFT length must be a power of two");
    if n <= 1 {
        return;
    }

    bit_reverse_permute(buf);

    let mut len = 2;
    while len <= n {
        let ang = 2.0 * PI / len as f64 * if inverse { 1.0 } else { -1.0 };
        let wlen = Complex64::new(ang.cos(), ang.sin());
        let mut start = 0;
        while start < n {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = buf[start + k];
                let v = buf[start + k + len / 2] * w;
                buf[start + k] = u + v;
                buf[start + k + len / 2] = u - v;
                w *= wlen;
            }
            start += len;
        }
        len <<= 1;
    }

    if inverse {
        let scale = 1.0 / n as f64;
        for x in buf.iter_mut() {
            *x *= scale;
        }
    }
}

/// Forward FFT of a power-of-two-length complex buffer, in place.
pub fn fft(buf: &mut [Complex64]) {
    fft_inplace(buf, false);
}

/// Inverse FFT of a power-of-two-length complex buffer, in place.
pub fn ifft(buf: &mut [Complex64]) {
    fft_inplace(buf, true);
}

/// Zero-pad a real slice to length `n` (a power of two) and return it as a
/// complex buffer ready for [`fft`].
pub fn pad_real(x: &[f64], n: usize) -> Vec<Complex64> {
    let mut buf = vec![Complex64::new(0.0, 0.0); n];
    for (i, &v) in x.iter().enumerate() {
        buf[i] = Complex64::new(v, 0.0);
    }
    buf
}
