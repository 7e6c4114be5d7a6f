//! 引擎配置
//!
//! 所有参数扁平化，默认值即为 MMD 标准行为。配置由 [`crate::MotionPlayer`] 持有，
//! 不存在全局实例。

use std::time::Duration;

use crate::animation::{DuplicateFramePolicy, InterpolationMode};

/// 播放配置
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// 帧率，默认 30.0（VMD 固定 30fps）
    pub frame_rate: f64,
    /// 播放速度倍率，默认 1.0
    pub speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            speed: 1.0,
        }
    }
}

/// 时间轴构建配置
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// 关键帧之间的插值方式，默认使用 VMD 自带的贝塞尔曲线
    pub interpolation: InterpolationMode,
    /// 稠密数组允许的最大帧数，默认 1048576（30fps 下约 9.7 小时）
    pub max_frame_count: u32,
    /// 同一帧出现多个关键帧时的处理方式，默认报错
    pub duplicate_policy: DuplicateFramePolicy,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMode::Bezier,
            max_frame_count: 1 << 20,
            duplicate_policy: DuplicateFramePolicy::Reject,
        }
    }
}

/// 后台计算线程配置
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 无任务时的最长等待时间，默认 100ms
    /// 超时后重新轮询一次，防止漏掉唤醒
    pub idle_wait: Duration,
    /// shutdown 等待线程退出的上限，默认 1s
    pub join_timeout: Duration,
    /// 线程名称
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_millis(100),
            join_timeout: Duration::from_secs(1),
            thread_name: "mmd-pose-worker".to_string(),
        }
    }
}

/// 相机绑定配置
#[derive(Debug, Clone)]
pub struct CameraRigConfig {
    /// MMD 单位与场景单位的比例，默认 12.5（MMD 中 12.5 单位约为 1 米）
    pub world_scale: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self { world_scale: 12.5 }
    }
}

/// 引擎总配置
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub playback: PlaybackConfig,
    pub timeline: TimelineConfig,
    pub worker: WorkerConfig,
    pub camera_rig: CameraRigConfig,
}
