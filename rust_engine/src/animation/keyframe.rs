//! 相机关键帧

use glam::Vec3;

use super::BezierCurve;

/// 插值控制字节数（6 组 × 4 字节）
pub const CAMERA_BEZIER_LEN: usize = 24;

/// 相机关键帧
///
/// `rotation` 以角度存储（解析时已由弧度转换），`position` 为注视点坐标（MMD 单位）。
#[derive(Clone, Debug, PartialEq)]
pub struct CameraKeyframe {
    pub frame_index: u32,
    pub distance: f32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub field_of_view: f32,
    pub bezier: [u8; CAMERA_BEZIER_LEN],
    /// 原始关键帧为 true，稠密化补出的帧为 false
    pub is_authored: bool,
}

impl CameraKeyframe {
    pub fn new(frame_index: u32) -> Self {
        Self {
            frame_index,
            distance: 0.0,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            field_of_view: 30.0,
            bezier: CameraInterpolation::LINEAR_BYTES,
            is_authored: true,
        }
    }

    /// 解出六组插值曲线
    pub fn interpolation(&self) -> CameraInterpolation {
        CameraInterpolation::from_bytes(&self.bezier)
    }
}

/// 相机插值曲线
///
/// 顺序: 注视点 X, Y, Z, 旋转, 距离, FOV
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInterpolation {
    pub lookat_x: BezierCurve,
    pub lookat_y: BezierCurve,
    pub lookat_z: BezierCurve,
    pub angle: BezierCurve,
    pub distance: BezierCurve,
    pub fov: BezierCurve,
}

impl CameraInterpolation {
    /// MMD 默认的线性曲线 (20, 20) - (107, 107)
    pub const LINEAR_BYTES: [u8; CAMERA_BEZIER_LEN] = [
        20, 107, 20, 107, 20, 107, 20, 107, 20, 107, 20, 107,
        20, 107, 20, 107, 20, 107, 20, 107, 20, 107, 20, 107,
    ];

    pub fn from_bytes(raw: &[u8; CAMERA_BEZIER_LEN]) -> Self {
        let group = |k: usize| {
            BezierCurve::from_control_bytes(&[raw[4 * k], raw[4 * k + 1], raw[4 * k + 2], raw[4 * k + 3]])
        };

        Self {
            lookat_x: group(0),
            lookat_y: group(1),
            lookat_z: group(2),
            angle: group(3),
            distance: group(4),
            fov: group(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_layout() {
        let mut raw = [0u8; CAMERA_BEZIER_LEN];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let interp = CameraInterpolation::from_bytes(&raw);

        // 第 4 组（旋转）：P1 = (12, 14)，P2 = (13, 15)
        assert_eq!(interp.angle.x1, 12.0 / 127.0);
        assert_eq!(interp.angle.y1, 14.0 / 127.0);
        assert_eq!(interp.angle.x2, 13.0 / 127.0);
        assert_eq!(interp.angle.y2, 15.0 / 127.0);
        assert_eq!(interp.fov.x1, 20.0 / 127.0);
    }

    #[test]
    fn test_default_keyframe_is_linear() {
        let kf = CameraKeyframe::new(3);
        let interp = kf.interpolation();
        assert!(interp.lookat_x.is_linear());
        assert!(interp.fov.is_linear());
        assert!(kf.is_authored);
    }
}
