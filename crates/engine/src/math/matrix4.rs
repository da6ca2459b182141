use super::Vec3;

/// Column-major 4x4 matrix; translation lives in elements 12..15.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    data: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn data(&self) -> &[f32; 16] {
        &self.data
    }

    pub fn translation(position: Vec3) -> Self {
        let mut m = Self::identity();
        m.data[12] = position.x;
        m.data[13] = position.y;
        m.data[14] = position.z;
        m
    }

    pub fn rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut m = Self::identity();
        m.data[5] = c;
        m.data[6] = s;
        m.data[9] = -s;
        m.data[10] = c;
        m
    }

    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut m = Self::identity();
        m.data[0] = c;
        m.data[2] = -s;
        m.data[8] = s;
        m.data[10] = c;
        m
    }

    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut m = Self::identity();
        m.data[0] = c;
        m.data[1] = s;
        m.data[4] = -s;
        m.data[5] = c;
        m
    }

    /// Rz * Ry * Rx.
    pub fn rotation_xyz(x_radians: f32, y_radians: f32, z_radians: f32) -> Self {
        Self::rotation_z(z_radians)
            .multiply(&Self::rotation_y(y_radians))
            .multiply(&Self::rotation_x(x_radians))
    }

    pub fn scale(scale: Vec3) -> Self {
        let mut m = Self::identity();
        m.data[0] = scale.x;
        m.data[5] = scale.y;
        m.data[10] = scale.z;
        m
    }

    /// Returns `self * rhs`, so `rhs` is applied first.
    pub fn multiply(&self, rhs: &Matrix4) -> Matrix4 {
        let a = &self.data;
        let b = &rhs.data;
        let mut out = [0.0_f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
            }
        }
        Matrix4 { data: out }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3::new(
            m[0] * point.x + m[4] * point.y + m[8] * point.z + m[12],
            m[1] * point.x + m[5] * point.y + m[9] * point.z + m[13],
            m[2] * point.x + m[6] * point.y + m[10] * point.z + m[14],
        )
    }

    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(self.data[12], self.data[13], self.data[14])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5
    }

    #[test]
    fn identity_is_neutral_for_multiply() {
        let m = Matrix4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Matrix4::identity().multiply(&m), m);
        assert_eq!(m.multiply(&Matrix4::identity()), m);
    }

    #[test]
    fn translations_compose_additively() {
        let a = Matrix4::translation(Vec3::new(10.0, 0.0, 0.0));
        let b = Matrix4::translation(Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(a.multiply(&b).translation_part(), Vec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn multiply_applies_right_hand_side_first() {
        let rotate = Matrix4::rotation_z(std::f32::consts::FRAC_PI_2);
        let shift = Matrix4::translation(Vec3::new(10.0, 0.0, 0.0));

        // Translate, then rotate a quarter turn: (10, 0) ends up at (0, 10).
        let p = rotate.multiply(&shift).transform_point(Vec3::ZERO);
        assert!(approx_eq(p, Vec3::new(0.0, 10.0, 0.0)));

        // Rotate, then translate: the origin only moves by the translation.
        let q = shift.multiply(&rotate).transform_point(Vec3::ZERO);
        assert!(approx_eq(q, Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn scale_scales_points() {
        let m = Matrix4::scale(Vec3::new(2.0, 3.0, 1.0));
        assert!(approx_eq(
            m.transform_point(Vec3::new(1.0, 1.0, 1.0)),
            Vec3::new(2.0, 3.0, 1.0)
        ));
    }
}
