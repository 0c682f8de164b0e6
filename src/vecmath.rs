use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Sub};

/// A fixed-dimension vector over `f32`, used for positions, velocities and
/// steering forces. `N` is 2 or 3 for a given simulation run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vector<const N: usize>(pub [f32; N]);

// `Default`, `Serialize` and `Deserialize` cannot be derived for
// const-generic arrays, so these impls reproduce what the derives would
// emit: zeros for default, and a transparent fixed-size sequence (tuple)
// for serde, matching how `[f32; N]` itself serializes.
impl<const N: usize> Default for Vector<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> Serialize for Vector<N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(N)?;
        for component in &self.0 {
            tuple.serialize_element(component)?;
        }
        tuple.end()
    }
}

impl<'de, const N: usize> Deserialize<'de> for Vector<N> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArrayVisitor<const N: usize>;

        impl<'de, const N: usize> serde::de::Visitor<'de> for ArrayVisitor<N> {
            type Value = Vector<N>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "an array of {N} f32 components")
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut out = [0.0f32; N];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(Vector(out))
            }
        }

        deserializer.deserialize_tuple(N, ArrayVisitor::<N>)
    }
}

impl<const N: usize> Vector<N> {
    #[inline(always)]
    pub fn new(components: [f32; N]) -> Self {
        Self(components)
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self([0.0; N])
    }

    #[inline(always)]
    pub fn length_squared(self) -> f32 {
        self.0.iter().map(|c| c * c).sum()
    }

    #[inline(always)]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline(always)]
    pub fn distance_squared(self, other: Self) -> f32 {
        let mut sum = 0.0;
        for k in 0..N {
            let d = self.0[k] - other.0[k];
            sum += d * d;
        }
        sum
    }

    #[inline(always)]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        let mut out = self.0;
        for k in 0..N {
            out[k] += other.0[k];
        }
        Self(out)
    }

    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        let mut out = self.0;
        for k in 0..N {
            out[k] -= other.0[k];
        }
        Self(out)
    }

    #[inline(always)]
    pub fn scale(self, scalar: f32) -> Self {
        let mut out = self.0;
        for c in out.iter_mut() {
            *c *= scalar;
        }
        Self(out)
    }

    #[inline(always)]
    pub fn dot(self, other: Self) -> f32 {
        let mut sum = 0.0;
        for k in 0..N {
            sum += self.0[k] * other.0[k];
        }
        sum
    }

    /// Normalizes the vector, returning a zero vector if the length is zero
    /// or very small. Several steering behaviors normalize a possibly-zero
    /// accumulator, so the degenerate case must never divide by zero.
    pub fn normalize_or_zero(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > 1e-12 {
            self.scale(1.0 / len_sq.sqrt())
        } else {
            Self::zero()
        }
    }

    /// Rescales the vector to the given length, or returns zero if the
    /// vector itself is (near-)zero.
    #[inline(always)]
    pub fn rescaled(self, length: f32) -> Self {
        self.normalize_or_zero().scale(length)
    }

    /// Clamps the vector's length to `max_length`, preserving direction.
    pub fn clamp_length(self, max_length: f32) -> Self {
        let len_sq = self.length_squared();
        if len_sq > max_length * max_length {
            self.scale(max_length / len_sq.sqrt())
        } else {
            self
        }
    }
}

impl<const N: usize> Index<usize> for Vector<N> {
    type Output = f32;
    #[inline(always)]
    fn index(&self, axis: usize) -> &f32 {
        &self.0[axis]
    }
}

impl<const N: usize> IndexMut<usize> for Vector<N> {
    #[inline(always)]
    fn index_mut(&mut self, axis: usize) -> &mut f32 {
        &mut self.0[axis]
    }
}

// Standard operators for convenience alongside the named methods.
impl<const N: usize> Add for Vector<N> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Vector::add(self, other)
    }
}

impl<const N: usize> Sub for Vector<N> {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Vector::sub(self, other)
    }
}

impl<const N: usize> Mul<f32> for Vector<N> {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        self.scale(scalar)
    }
}

impl<const N: usize> Div<f32> for Vector<N> {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        self.scale(1.0 / scalar)
    }
}

impl<const N: usize> AddAssign for Vector<N> {
    fn add_assign(&mut self, other: Self) {
        *self = Vector::add(*self, other);
    }
}
