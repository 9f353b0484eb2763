//! 全アナライザ共通の3Dベクトル/角度プリミティブ

use nalgebra::{Vector2, Vector3};

/// 長さゼロのベクトル同士でも NaN にならないための分母ガード
pub const ANGLE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// vertex における point_a-vertex-point_c の角度（度, 0〜180）
///
/// 分母に [`ANGLE_EPSILON`] を足し、cos を [-1, 1] にクリップしてから acos を取る。
/// 点が重なっていても有限値（ゼロベクトルなら90°）を返す。
/// 内積とノルムは f64 で計算する（f32 だと座標 1e19 程度で inf/inf になる）。
pub fn angle_at(vertex: &Vector3<f32>, point_a: &Vector3<f32>, point_c: &Vector3<f32>) -> f32 {
    let vertex = vertex.cast::<f64>();
    let ba = point_a.cast::<f64>() - vertex;
    let bc = point_c.cast::<f64>() - vertex;
    let cosine = ba.dot(&bc) / (ba.norm() * bc.norm() + f64::from(ANGLE_EPSILON));
    cosine.clamp(-1.0, 1.0).acos().to_degrees() as f32
}

/// 2Dベクトル間の角度（度）。どちらかが長さゼロなら 0
pub fn angle_between_2d(u: &Vector2<f32>, v: &Vector2<f32>) -> f32 {
    let u = u.cast::<f64>();
    let v = v.cast::<f64>();
    let norm_u = u.norm();
    let norm_v = v.norm();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    let cosine = u.dot(&v) / (norm_u * norm_v);
    if cosine.is_nan() {
        // inf 成分を含むベクトル（f32 での差分がオーバーフローした場合）
        return 0.0;
    }
    cosine.clamp(-1.0, 1.0).acos().to_degrees().abs() as f32
}

pub fn midpoint(p: &Vector3<f32>, q: &Vector3<f32>) -> Vector3<f32> {
    (p + q) / 2.0
}

/// XY平面上の距離（奥行きは無視）
pub fn distance_xy(p: &Vector3<f32>, q: &Vector3<f32>) -> f32 {
    (p.xy() - q.xy()).norm()
}

pub fn abs_diff_component(p: &Vector3<f32>, q: &Vector3<f32>, axis: Axis) -> f32 {
    let i = axis.index();
    (p[i] - q[i]).abs()
}

/// from→to のXY成分
pub fn vector_xy(from: &Vector3<f32>, to: &Vector3<f32>) -> Vector2<f32> {
    (to - from).xy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn v(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at(&v(0.0, 0.0, 0.0), &v(1.0, 0.0, 0.0), &v(0.0, 1.0, 0.0));
        assert_relative_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_straight_line() {
        let angle = angle_at(&v(0.0, 0.0, 0.0), &v(-1.0, 0.0, 0.0), &v(1.0, 0.0, 0.0));
        // ε ガードのため厳密な180°にはならない
        assert_relative_eq!(angle, 180.0, epsilon = 0.1);
    }

    #[test]
    fn test_coincident_points_are_finite() {
        let p = v(0.3, 0.3, 0.3);
        let angle = angle_at(&p, &p, &p);
        assert!(angle.is_finite());
        assert_relative_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_one_degenerate_arm_is_finite() {
        let p = v(0.5, 0.5, 0.0);
        let angle = angle_at(&p, &p, &v(1.0, 0.5, 0.0));
        assert!(angle.is_finite());
    }

    #[test]
    fn test_angle_between_2d_degenerate() {
        let zero = Vector2::new(0.0, 0.0);
        assert_eq!(angle_between_2d(&zero, &Vector2::new(1.0, 0.0)), 0.0);
        assert_eq!(angle_between_2d(&Vector2::new(1.0, 0.0), &zero), 0.0);
    }

    #[test]
    fn test_angle_between_2d_parallel_and_tilted() {
        let a = Vector2::new(0.4, 0.0);
        assert_relative_eq!(angle_between_2d(&a, &Vector2::new(0.3, 0.0)), 0.0, epsilon = 1e-3);
        assert_relative_eq!(angle_between_2d(&a, &Vector2::new(0.3, 0.3)), 45.0, epsilon = 1e-3);
    }

    #[test]
    fn test_helpers() {
        let p = v(0.0, 0.0, 1.0);
        let q = v(0.3, 0.4, -1.0);
        assert_relative_eq!(distance_xy(&p, &q), 0.5, epsilon = 1e-6);
        assert_eq!(midpoint(&p, &q), v(0.15, 0.2, 0.0));
        assert_relative_eq!(abs_diff_component(&p, &q, Axis::Y), 0.4);
        assert_relative_eq!(abs_diff_component(&p, &q, Axis::Z), 2.0);
        assert_eq!(vector_xy(&p, &q), Vector2::new(0.3, 0.4));
    }

    #[test]
    fn test_huge_finite_coordinates_stay_in_range() {
        let angle = angle_at(&v(0.0, 0.0, 0.0), &v(3e19, 3e19, 0.0), &v(3e19, 0.0, 0.0));
        assert_relative_eq!(angle, 45.0, epsilon = 1e-3);

        let extreme = angle_at(
            &v(-f32::MAX, 0.0, 0.0),
            &v(f32::MAX, 0.0, 0.0),
            &v(f32::MAX, f32::MAX, 0.0),
        );
        assert_relative_eq!(extreme, 26.565, epsilon = 1e-2);

        let tilted = angle_between_2d(&Vector2::new(3e19, 0.0), &Vector2::new(3e19, 3e19));
        assert_relative_eq!(tilted, 45.0, epsilon = 1e-3);
        let overflowed =
            angle_between_2d(&Vector2::new(f32::INFINITY, 0.0), &Vector2::new(1.0, 0.0));
        assert_eq!(overflowed, 0.0);
    }

    fn point() -> impl Strategy<Value = Vector3<f32>> {
        (-2.0f32..2.0, -2.0f32..2.0, -2.0f32..2.0).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    fn wide_point() -> impl Strategy<Value = Vector3<f32>> {
        (-1e30f32..1e30, -1e30f32..1e30, -1e30f32..1e30).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_angle_in_range(vertex in point(), a in point(), c in point()) {
            let angle = angle_at(&vertex, &a, &c);
            prop_assert!(angle.is_finite());
            prop_assert!((0.0..=180.0).contains(&angle));
        }

        #[test]
        fn prop_angle_in_range_for_large_coordinates(
            vertex in wide_point(),
            a in wide_point(),
            c in wide_point(),
        ) {
            let angle = angle_at(&vertex, &a, &c);
            prop_assert!((0.0..=180.0).contains(&angle));
        }

        #[test]
        fn prop_angle_symmetric(vertex in point(), a in point(), c in point()) {
            prop_assert_eq!(angle_at(&vertex, &a, &c), angle_at(&vertex, &c, &a));
        }
    }
}
