//! 相机绑定姿态
//!
//! MMD 相机模型：相机挂在注视点（pivot）下，pivot 按角度旋转，相机沿本地 Z 轴偏移 distance。

use glam::{EulerRot, Quat, Vec3};

use crate::config::CameraRigConfig;

use super::keyframe::CameraKeyframe;

/// 场景空间中的相机姿态
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// 帧号
    pub frame_index: u32,
    /// 注视点位置（场景单位）
    pub pivot: Vec3,
    /// 注视点旋转
    pub rotation: Quat,
    /// 相机相对注视点的本地偏移
    pub camera_offset: Vec3,
    /// 垂直视野（角度）
    pub field_of_view: f32,
}

impl CameraPose {
    pub fn from_keyframe(keyframe: &CameraKeyframe, rig: &CameraRigConfig) -> Self {
        Self::with_origin(keyframe, rig, Vec3::ZERO)
    }

    /// 以 `origin`（通常为模型位置）为基准计算姿态
    pub fn with_origin(keyframe: &CameraKeyframe, rig: &CameraRigConfig, origin: Vec3) -> Self {
        let scale = rig.world_scale;
        // 坐标系转换：角度取反，按 Y、X、Z 顺序组合
        let angle = -keyframe.rotation;
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            angle.y.to_radians(),
            angle.x.to_radians(),
            angle.z.to_radians(),
        );

        Self {
            frame_index: keyframe.frame_index,
            pivot: keyframe.position / scale + origin,
            rotation,
            camera_offset: Vec3::new(0.0, 0.0, keyframe.distance / scale),
            field_of_view: keyframe.field_of_view,
        }
    }

    /// 相机在场景中的位置
    pub fn eye_position(&self) -> Vec3 {
        self.pivot + self.rotation * self.camera_offset
    }
}
