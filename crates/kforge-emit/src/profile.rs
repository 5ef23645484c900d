//! The intrinsic profile capability and four illustrative built-in profiles
//! exercising every branch of the emitter's per-kind logic.
//!
//! Each concrete profile here targets exactly one tier, since one generator
//! invocation targets exactly one tier: the `vector_type`/`load_fn`/`store_fn`
//! methods are simplified to take no tier argument, since a profile instance
//! already *is* a tier. See DESIGN.md for this design decision.
//!
//! These are reference implementations for float32 kernels, not an
//! exhaustive production mnemonic table -- real deployments supply their own
//! `IntrinsicProfile` with full coverage of the target's intrinsic surface.

use std::sync::Arc;

use indexmap::IndexMap;

/// FMA operand ordering a profile's fused multiply-add intrinsic expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmaArgOrder {
    /// `intrinsic(acc, a, b)` computes `acc + a*b` (NEON's `vfmaq_f32`).
    AccFirst,
    /// `intrinsic(a, b, acc)` computes `a*b + acc` (AVX2/AVX-512's `_mm256_fmadd_ps`).
    AccLast,
}

/// Injected capability supplying per-target vector type names, lane widths,
/// load/store/op mnemonics, FMA operand order, and cast quirks. Profiles are
/// immutable and safely shared by reference or `Arc` across concurrent
/// invocations.
pub trait IntrinsicProfile: Send + Sync {
    /// Short tag identifying this target ("q", "ymm", "zmm", "fallback").
    fn tier(&self) -> &str;
    /// Element count per vector register.
    fn lanes(&self) -> u32;
    /// C type name for a full vector register.
    fn vector_type(&self) -> &str;
    /// C type name for a scalar of this profile's element type.
    fn scalar_type(&self) -> &str;
    /// C intrinsic name for a contiguous vector load, or empty to fall back
    /// to a plain array read (exercised by the fallback profile).
    fn load_fn(&self) -> &str;
    /// C intrinsic name for a contiguous vector store, or empty to fall back
    /// to a plain array write.
    fn store_fn(&self) -> &str;
    /// C intrinsic for a given op mnemonic (e.g. `"Add"`, `"ReduceSum"`,
    /// `"Set"`), or empty if none is registered (Emitter falls back to the
    /// corresponding C operator).
    fn intrinsic(&self, op: &str) -> &str;
    /// Operand order this profile's fused multiply-add intrinsic expects.
    fn fma_arg_order(&self) -> FmaArgOrder;
    /// Optional C preamble (macros, inline helpers) emitted before the
    /// generated function.
    fn inline_helpers(&self) -> &str;
    /// `true` if load/store addresses need a pointer-cast wrapper for this
    /// target's aliasing rules.
    fn requires_cast(&self) -> bool;
    /// Wraps `expr` in this profile's required pointer cast.
    fn cast_expr(&self, expr: &str) -> String;
    /// Initializer expression producing a zero vector, used to seed a
    /// `MapReduce` fusion's accumulator.
    fn zero_init(&self) -> &str;
}

/// 128-bit NEON profile (AArch64), 4 lanes of `float32`.
pub struct NeonProfile {
    intrinsics: IndexMap<&'static str, &'static str>,
}

impl NeonProfile {
    pub fn new() -> Self {
        let mut intrinsics = IndexMap::new();
        intrinsics.insert("Add", "vaddq_f32");
        intrinsics.insert("Sub", "vsubq_f32");
        intrinsics.insert("Mul", "vmulq_f32");
        intrinsics.insert("Div", "vdivq_f32");
        intrinsics.insert("Min", "vminq_f32");
        intrinsics.insert("Max", "vmaxq_f32");
        intrinsics.insert("MulAdd", "vfmaq_f32");
        intrinsics.insert("ReduceSum", "vaddvq_f32");
        intrinsics.insert("ReduceMin", "vminvq_f32");
        intrinsics.insert("ReduceMax", "vmaxvq_f32");
        intrinsics.insert("Set", "vdupq_n_f32");
        NeonProfile { intrinsics }
    }
}

impl Default for NeonProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrinsicProfile for NeonProfile {
    fn tier(&self) -> &str {
        "q"
    }
    fn lanes(&self) -> u32 {
        4
    }
    fn vector_type(&self) -> &str {
        "float32x4_t"
    }
    fn scalar_type(&self) -> &str {
        "float"
    }
    fn load_fn(&self) -> &str {
        "vld1q_f32"
    }
    fn store_fn(&self) -> &str {
        "vst1q_f32"
    }
    fn intrinsic(&self, op: &str) -> &str {
        self.intrinsics.get(op).copied().unwrap_or("")
    }
    fn fma_arg_order(&self) -> FmaArgOrder {
        FmaArgOrder::AccFirst
    }
    fn inline_helpers(&self) -> &str {
        ""
    }
    fn requires_cast(&self) -> bool {
        false
    }
    fn cast_expr(&self, expr: &str) -> String {
        expr.to_string()
    }
    fn zero_init(&self) -> &str {
        "vdupq_n_f32(0.0f)"
    }
}

/// AVX2 profile, 8 lanes of `float32`.
pub struct Avx2Profile {
    intrinsics: IndexMap<&'static str, &'static str>,
}

impl Avx2Profile {
    pub fn new() -> Self {
        let mut intrinsics = IndexMap::new();
        intrinsics.insert("Add", "_mm256_add_ps");
        intrinsics.insert("Sub", "_mm256_sub_ps");
        intrinsics.insert("Mul", "_mm256_mul_ps");
        intrinsics.insert("Div", "_mm256_div_ps");
        intrinsics.insert("Min", "_mm256_min_ps");
        intrinsics.insert("Max", "_mm256_max_ps");
        intrinsics.insert("MulAdd", "_mm256_fmadd_ps");
        intrinsics.insert("Set", "_mm256_set1_ps");
        intrinsics.insert("ReduceSum", "kforge_reduce_add_ps256");
        intrinsics.insert("ReduceMin", "kforge_reduce_min_ps256");
        intrinsics.insert("ReduceMax", "kforge_reduce_max_ps256");
        Avx2Profile { intrinsics }
    }
}

impl Default for Avx2Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrinsicProfile for Avx2Profile {
    fn tier(&self) -> &str {
        "ymm"
    }
    fn lanes(&self) -> u32 {
        8
    }
    fn vector_type(&self) -> &str {
        "__m256"
    }
    fn scalar_type(&self) -> &str {
        "float"
    }
    fn load_fn(&self) -> &str {
        "_mm256_loadu_ps"
    }
    fn store_fn(&self) -> &str {
        "_mm256_storeu_ps"
    }
    fn intrinsic(&self, op: &str) -> &str {
        self.intrinsics.get(op).copied().unwrap_or("")
    }
    fn fma_arg_order(&self) -> FmaArgOrder {
        FmaArgOrder::AccLast
    }
    fn inline_helpers(&self) -> &str {
        AVX2_REDUCE_HELPERS
    }
    fn requires_cast(&self) -> bool {
        false
    }
    fn cast_expr(&self, expr: &str) -> String {
        expr.to_string()
    }
    fn zero_init(&self) -> &str {
        "_mm256_setzero_ps()"
    }
}

const AVX2_REDUCE_HELPERS: &str = "\
static inline float kforge_reduce_add_ps256(__m256 v) {
\t__m128 lo = _mm256_castps256_ps128(v);
\t__m128 hi = _mm256_extractf128_ps(v, 1);
\tlo = _mm_add_ps(lo, hi);
\t__m128 shuf = _mm_movehdup_ps(lo);
\t__m128 sums = _mm_add_ps(lo, shuf);
\tshuf = _mm_movehl_ps(shuf, sums);
\tsums = _mm_add_ss(sums, shuf);
\treturn _mm_cvtss_f32(sums);
}
static inline float kforge_reduce_min_ps256(__m256 v) {
\t__m128 lo = _mm256_castps256_ps128(v);
\t__m128 hi = _mm256_extractf128_ps(v, 1);
\tlo = _mm_min_ps(lo, hi);
\t__m128 shuf = _mm_movehdup_ps(lo);
\t__m128 mins = _mm_min_ps(lo, shuf);
\tshuf = _mm_movehl_ps(shuf, mins);
\tmins = _mm_min_ss(mins, shuf);
\treturn _mm_cvtss_f32(mins);
}
static inline float kforge_reduce_max_ps256(__m256 v) {
\t__m128 lo = _mm256_castps256_ps128(v);
\t__m128 hi = _mm256_extractf128_ps(v, 1);
\tlo = _mm_max_ps(lo, hi);
\t__m128 shuf = _mm_movehdup_ps(lo);
\t__m128 maxs = _mm_max_ps(lo, shuf);
\tshuf = _mm_movehl_ps(shuf, maxs);
\tmaxs = _mm_max_ss(maxs, shuf);
\treturn _mm_cvtss_f32(maxs);
}
";

/// AVX-512 profile, 16 lanes of `float32`.
pub struct Avx512Profile {
    intrinsics: IndexMap<&'static str, &'static str>,
}

impl Avx512Profile {
    pub fn new() -> Self {
        let mut intrinsics = IndexMap::new();
        intrinsics.insert("Add", "_mm512_add_ps");
        intrinsics.insert("Sub", "_mm512_sub_ps");
        intrinsics.insert("Mul", "_mm512_mul_ps");
        intrinsics.insert("Div", "_mm512_div_ps");
        intrinsics.insert("Min", "_mm512_min_ps");
        intrinsics.insert("Max", "_mm512_max_ps");
        intrinsics.insert("MulAdd", "_mm512_fmadd_ps");
        intrinsics.insert("Set", "_mm512_set1_ps");
        intrinsics.insert("ReduceSum", "_mm512_reduce_add_ps");
        intrinsics.insert("ReduceMin", "_mm512_reduce_min_ps");
        intrinsics.insert("ReduceMax", "_mm512_reduce_max_ps");
        Avx512Profile { intrinsics }
    }
}

impl Default for Avx512Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrinsicProfile for Avx512Profile {
    fn tier(&self) -> &str {
        "zmm"
    }
    fn lanes(&self) -> u32 {
        16
    }
    fn vector_type(&self) -> &str {
        "__m512"
    }
    fn scalar_type(&self) -> &str {
        "float"
    }
    fn load_fn(&self) -> &str {
        "_mm512_loadu_ps"
    }
    fn store_fn(&self) -> &str {
        "_mm512_storeu_ps"
    }
    fn intrinsic(&self, op: &str) -> &str {
        self.intrinsics.get(op).copied().unwrap_or("")
    }
    fn fma_arg_order(&self) -> FmaArgOrder {
        FmaArgOrder::AccLast
    }
    fn inline_helpers(&self) -> &str {
        ""
    }
    fn requires_cast(&self) -> bool {
        false
    }
    fn cast_expr(&self, expr: &str) -> String {
        expr.to_string()
    }
    fn zero_init(&self) -> &str {
        "_mm512_setzero_ps()"
    }
}

/// Portable scalar fallback, 1 lane of `float32`, no registered intrinsics:
/// every `Elementwise`/`Reduction`/`Broadcast` falls back to a plain C
/// operator, and `Load`/`Store` fall back to array indexing. Exercises the
/// Emitter's operator-fallback path end to end.
pub struct FallbackProfile;

impl FallbackProfile {
    pub fn new() -> Self {
        FallbackProfile
    }
}

impl Default for FallbackProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrinsicProfile for FallbackProfile {
    fn tier(&self) -> &str {
        "fallback"
    }
    fn lanes(&self) -> u32 {
        1
    }
    fn vector_type(&self) -> &str {
        "float"
    }
    fn scalar_type(&self) -> &str {
        "float"
    }
    fn load_fn(&self) -> &str {
        ""
    }
    fn store_fn(&self) -> &str {
        ""
    }
    fn intrinsic(&self, _op: &str) -> &str {
        ""
    }
    fn fma_arg_order(&self) -> FmaArgOrder {
        FmaArgOrder::AccLast
    }
    fn inline_helpers(&self) -> &str {
        ""
    }
    fn requires_cast(&self) -> bool {
        false
    }
    fn cast_expr(&self, expr: &str) -> String {
        expr.to_string()
    }
    fn zero_init(&self) -> &str {
        "0.0f"
    }
}

/// Resolves a built-in profile by tier name, the CLI's profile-selection
/// registry: a small enum-keyed registry, since the available profiles are
/// a closed, compiled-in set.
pub fn profile_by_name(name: &str) -> Option<Arc<dyn IntrinsicProfile>> {
    match name {
        "neon" => Some(Arc::new(NeonProfile::new())),
        "avx2" => Some(Arc::new(Avx2Profile::new())),
        "avx512" => Some(Arc::new(Avx512Profile::new())),
        "fallback" => Some(Arc::new(FallbackProfile::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neon_profile_shape() {
        let p = NeonProfile::new();
        assert_eq!(p.tier(), "q");
        assert_eq!(p.lanes(), 4);
        assert_eq!(p.intrinsic("Add"), "vaddq_f32");
        assert_eq!(p.intrinsic("NoSuchOp"), "");
        assert_eq!(p.fma_arg_order(), FmaArgOrder::AccFirst);
    }

    #[test]
    fn avx_profiles_use_acc_last_fma() {
        assert_eq!(Avx2Profile::new().fma_arg_order(), FmaArgOrder::AccLast);
        assert_eq!(Avx512Profile::new().fma_arg_order(), FmaArgOrder::AccLast);
    }

    #[test]
    fn fallback_profile_has_no_intrinsics() {
        let p = FallbackProfile::new();
        assert_eq!(p.lanes(), 1);
        assert_eq!(p.intrinsic("Add"), "");
        assert_eq!(p.load_fn(), "");
        assert_eq!(p.store_fn(), "");
    }

    #[test]
    fn profile_by_name_resolves_known_tiers() {
        assert!(profile_by_name("neon").is_some());
        assert!(profile_by_name("avx2").is_some());
        assert!(profile_by_name("avx512").is_some());
        assert!(profile_by_name("fallback").is_some());
        assert!(profile_by_name("sse2").is_none());
    }
}
