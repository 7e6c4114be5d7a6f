//! 可步进的姿态计算器

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::animation::{CameraPose, CameraTimeline};
use crate::config::CameraRigConfig;

use super::lock;

/// 姿态计算器
///
/// 由后台线程反复调用 `step`。实现方自行管理内部状态，不能等待工作线程的注册表锁。
pub trait PoseCalculator: Send + Sync {
    /// 执行一步计算；返回 true 表示做了工作，应尽快再次调用
    fn step(&self) -> bool;
}

/// 相机姿态预计算
///
/// 渲染线程调用 [`request`](Self::request) 提交目标帧，后台线程在 `step` 中计算，
/// 渲染线程通过 [`latest`](Self::latest) 读取最近一次完成的结果。
pub struct CameraPosePreCalculator {
    timeline: Arc<CameraTimeline>,
    rig: CameraRigConfig,
    requested: Mutex<Option<usize>>,
    latest: Mutex<Option<CameraPose>>,
    computed: AtomicUsize,
}

impl CameraPosePreCalculator {
    pub fn new(timeline: Arc<CameraTimeline>, rig: CameraRigConfig) -> Self {
        Self {
            timeline,
            rig,
            requested: Mutex::new(None),
            latest: Mutex::new(None),
            computed: AtomicUsize::new(0),
        }
    }

    /// 请求计算指定帧；未被处理的旧请求会被覆盖
    pub fn request(&self, frame: usize) {
        *lock(&self.requested) = Some(frame);
    }

    /// 最近一次计算完成的姿态
    pub fn latest(&self) -> Option<CameraPose> {
        *lock(&self.latest)
    }

    /// 已计算的姿态数量
    pub fn computed_count(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    pub fn timeline(&self) -> &Arc<CameraTimeline> {
        &self.timeline
    }
}

impl PoseCalculator for CameraPosePreCalculator {
    fn step(&self) -> bool {
        let Some(frame) = lock(&self.requested).take() else {
            return false;
        };

        let keyframe = self.timeline.frame_clamped(frame);
        if matches!(self.latest(), Some(pose) if pose.frame_index == keyframe.frame_index) {
            return false;
        }

        let pose = CameraPose::from_keyframe(keyframe, &self.rig);
        *lock(&self.latest) = Some(pose);
        self.computed.fetch_add(1, Ordering::Relaxed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{CameraKeyframe, InterpolationMode};
    use glam::Vec3;

    fn calculator() -> CameraPosePreCalculator {
        let a = CameraKeyframe::new(0);
        let b = CameraKeyframe {
            position: Vec3::new(125.0, 0.0, 0.0),
            ..CameraKeyframe::new(10)
        };
        let timeline = CameraTimeline::build(vec![a, b], InterpolationMode::Linear).unwrap();
        CameraPosePreCalculator::new(Arc::new(timeline), CameraRigConfig::default())
    }

    #[test]
    fn test_step_without_request() {
        let calc = calculator();
        assert!(!calc.step());
        assert!(calc.latest().is_none());
    }

    #[test]
    fn test_request_then_step() {
        let calc = calculator();
        calc.request(10);
        assert!(calc.step());
        assert!(!calc.step());

        let pose = calc.latest().unwrap();
        assert_eq!(pose.frame_index, 10);
        assert!((pose.pivot.x - 10.0).abs() < 1e-5);

        // 相同帧不重复计算，越界帧钳制到末帧
        calc.request(500);
        assert!(!calc.step());
        assert_eq!(calc.computed_count(), 1);

        calc.request(5);
        assert!(calc.step());
        assert_eq!(calc.latest().unwrap().frame_index, 5);
        assert_eq!(calc.computed_count(), 2);
    }
}
