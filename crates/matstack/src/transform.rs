use glam::{Mat4, Quat, Vec3};

/// Local factor of one hierarchy level: translation, rotation, scale.
///
/// Converted to a matrix with [`LocalTransform::matrix`] before being pushed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// A zero scale axis flattens space; the resulting factor has no inverse.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.scale.x == 0.0 || self.scale.y == 0.0 || self.scale.z == 0.0
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<LocalTransform> for Mat4 {
    fn from(t: LocalTransform) -> Self {
        t.matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invert::{DEFAULT_SINGULAR_EPSILON, is_singular};

    #[test]
    fn identity_is_identity_matrix() {
        assert_eq!(LocalTransform::IDENTITY.matrix(), Mat4::IDENTITY);
        assert_eq!(LocalTransform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_matrix() {
        let t = LocalTransform::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::splat(2.0),
        );
        let m = t.matrix().to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 2.0).abs() < 1e-6);
        assert!((m[5] - 2.0).abs() < 1e-6);
        assert!((m[10] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_scale_is_degenerate_and_singular() {
        let t = LocalTransform::from_scale(Vec3::new(1.0, 1.0, 0.0));
        assert!(t.is_degenerate());
        assert!(is_singular(&t.matrix(), DEFAULT_SINGULAR_EPSILON));
    }

    #[test]
    fn rotation_is_not_degenerate() {
        let t = LocalTransform::from_rotation(Quat::from_rotation_y(1.2));
        assert!(!t.is_degenerate());
        assert!(!is_singular(&Mat4::from(t), DEFAULT_SINGULAR_EPSILON));
    }
}
