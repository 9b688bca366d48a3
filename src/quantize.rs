//! Scalar quantization helpers for vertex attributes.
//!
//! Pure, branch-light functions; callers use these to pack positions,
//! normals and texture coordinates into smaller-than-`f32` wire formats
//! before upload. None of this crate's optimizers or analyzers depend on
//! these, they are exposed purely as a convenience for callers preparing
//! vertex buffers for the optimizers to consume.

/// Quantize a float in `[0..1]` range into an N-bit fixed point unorm value.
///
/// Assumes reconstruction function `q / (2^N-1)`, which is the case for
/// fixed-function normalized fixed point conversion.
///
/// Maximum reconstruction error: `1/2^(N+1)`.
#[inline(always)]
pub fn quantize_unorm(v: f32, n: i32) -> i32 {
    let scale = ((1i32 << n) - 1i32) as f32;
    let v = if v >= 0f32 { v } else { 0f32 };
    let v = if v <= 1f32 { v } else { 1f32 };
    (v * scale + 0.5f32) as i32
}

/// Quantize a float in `[-1..1]` range into an N-bit fixed point snorm value.
///
/// Assumes reconstruction function `q / (2^(N-1)-1)`, which is the case for
/// fixed-function normalized fixed point conversion (except early OpenGL
/// versions). Rounds half away from zero; the representable range excludes
/// one codeword on the negative side, matching D3D/Vulkan SNORM.
///
/// Maximum reconstruction error: `1/2^N`.
#[inline(always)]
pub fn quantize_snorm(v: f32, n: u32) -> i32 {
    let scale = ((1 << (n - 1)) - 1) as f32;
    let round = if v >= 0f32 { 0.5f32 } else { -0.5f32 };
    let v = if v >= -1f32 { v } else { -1f32 };
    let v = if v <= 1f32 { v } else { 1f32 };
    (v * scale + round) as i32
}

/// Quantize a float into half-precision floating point value.
///
/// Generates +-inf for overflow, collapses NaN to the canonical qNaN
/// `0x7e00` (sign dropped), flushes denormals to zero, rounds to nearest.
/// Representable magnitude range: `[6e-5; 65504]`.
/// Maximum relative reconstruction error: `5e-4`.
#[inline(always)]
pub fn quantize_half(v: f32) -> u16 {
    let ui = f32::to_bits(v);
    let s = ((ui >> 16) & 0x8000) as i32;
    let em = (ui & 0x7fff_ffff) as i32;

    // bias exponent and round to nearest; 112 is relative exponent bias (127-15)
    let mut h = (em - (112 << 23) + (1 << 12)) >> 13;

    // underflow: flush to zero; 113 encodes exponent -14
    h = if em < (113 << 23) { 0 } else { h };

    // overflow: infinity; 143 encodes exponent 16
    h = if em >= (143 << 23) { 0x7c00 } else { h };

    // NaN; note that we convert all types of NaN to qNaN
    h = if em > (255 << 23) { 0x7e00 } else { h };

    (s | h) as u16
}

/// Quantize a float into a floating point value with a limited number of
/// significant mantissa bits.
///
/// Generates +-inf for overflow, preserves NaN, flushes denormals to zero,
/// rounds to nearest. Assumes `n` is in the valid mantissa precision range,
/// `1..23`.
#[inline(always)]
pub fn quantize_float(v: f32, n: i32) -> f32 {
    let mut ui = f32::to_bits(v);

    let mask = (1 << (23 - n)) - 1;
    let round = (1 << (23 - n)) >> 1;

    let e = (ui & 0x7f80_0000) as i32;
    let rui: u32 = ((ui as i32 + round) & !mask) as u32;

    // round all numbers except inf/nan; this is important to make
    // sure nan doesn't overflow into -0
    ui = if e == 0x7f80_0000 { ui } else { rui };

    // flush denormals to zero
    ui = if e == 0 { 0 } else { ui };

    f32::from_bits(ui)
}

/// Reverse quantization of a half-precision (IEEE-754 fp16) floating point
/// value.
///
/// Preserves Inf/NaN, flushes denormals to zero.
#[inline(always)]
pub fn dequantize_half(h: u16) -> f32 {
    let s = ((h & 0x8000) as u32) << 16;
    let em = (h & 0x7fff) as u32;

    // bias exponent and pad mantissa with 0; 112 is relative exponent bias (127-15)
    let mut r = (em + (112 << 10)) << 13;

    // denormal: flush to zero
    if em < (1 << 10) {
        r = 0;
    }

    // infinity/NaN; note that we preserve NaN payload as a byproduct of unifying inf/nan cases
    // 112 is an exponent bias fixup; since we already applied it once, applying it twice converts 31 to 255
    if em >= (31 << 10) {
        r += 112 << 23;
    }

    let bits = s | r;
    f32::from_bits(bits)
}

/// Safe reciprocal: `0` for a zero input instead of `inf`.
#[inline(always)]
pub fn rcp_safe(v: f32) -> f32 {
    if v.abs() as u32 == 0 {
        0f32
    } else {
        1f32 / v
    }
}
